//! Integration tests for download links, streaming downloads and
//! multipart uploads.

use cloudxfer_core::domain::{DuplicateMode, RemoteError, RemotePath};
use cloudxfer_core::ports::{IRemoteStorage, UploadOptions};
use futures_util::StreamExt;
use wiremock::matchers::{body_string_contains, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{self, MemorySource, TEST_TOKEN};

fn remote(p: &str) -> RemotePath {
    RemotePath::new(p.to_string()).unwrap()
}

fn upload_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "result": 0,
        "fileids": [1234],
        "metadata": [{ "name": "notes.txt", "isfolder": false, "size": 11 }]
    }))
}

#[tokio::test]
async fn test_download_link_uses_first_host() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("GET"))
        .and(path("/getfilelink"))
        .and(query_param("path", "/docs/a.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": 0,
            "hosts": ["c123.example.net", "c456.example.net"],
            "path": "/cBZk/a.txt",
            "expires": "Thu, 19 Sep 2013 07:31:46 +0000"
        })))
        .mount(&server)
        .await;

    let link = client.get_download_link(&remote("/docs/a.txt")).await.unwrap();
    // Scheme follows the configured base URL (plain http for the mock server)
    assert_eq!(link, "http://c123.example.net/cBZk/a.txt");
}

#[tokio::test]
async fn test_download_link_for_missing_file() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("GET"))
        .and(path("/getfilelink"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": 2009,
            "error": "File not found."
        })))
        .mount(&server)
        .await;

    let err = client
        .get_download_link(&remote("/docs/missing.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::NotFound(_)));
}

#[tokio::test]
async fn test_open_download_streams_body() {
    let (server, client) = common::setup_api_mock().await;
    let content = vec![7u8; 50_000];

    Mock::given(method("GET"))
        .and(path("/blob/big.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.clone()))
        .mount(&server)
        .await;

    let url = format!("{}/blob/big.bin", server.uri());
    let mut download = client.open_download(&url).await.unwrap();
    assert_eq!(download.content_length, Some(50_000));

    let mut received = Vec::new();
    while let Some(chunk) = download.body.next().await {
        received.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(received, content);
}

#[tokio::test]
async fn test_open_download_404_is_not_found() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("GET"))
        .and(path("/blob/gone.bin"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/blob/gone.bin", server.uri());
    let err = client.open_download(&url).await.unwrap_err();
    assert!(matches!(err, RemoteError::NotFound(_)));
}

#[tokio::test]
async fn test_upload_rename_mode_sends_flag_and_content() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("POST"))
        .and(path("/uploadfile"))
        .and(query_param("path", "/Backups"))
        .and(query_param("auth", TEST_TOKEN))
        .and(query_param("renameifexists", "1"))
        .and(query_param_is_missing("nopartial"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("hello world"))
        .respond_with(upload_ok())
        .expect(1)
        .mount(&server)
        .await;

    let source = MemorySource::new(&b"hello world"[..]);
    client
        .upload_stream(
            &remote("/Backups"),
            "notes.txt",
            &source,
            UploadOptions::for_mode(DuplicateMode::Rename),
        )
        .await
        .unwrap();
    assert_eq!(source.opens(), 1);
}

#[tokio::test]
async fn test_upload_overwrite_mode_sends_nopartial() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("POST"))
        .and(path("/uploadfile"))
        .and(query_param("nopartial", "1"))
        .and(query_param_is_missing("renameifexists"))
        .respond_with(upload_ok())
        .expect(1)
        .mount(&server)
        .await;

    let source = MemorySource::new(&b"hello world"[..]);
    client
        .upload_stream(
            &RemotePath::root(),
            "notes.txt",
            &source,
            UploadOptions::for_mode(DuplicateMode::Overwrite),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_upload_api_error_is_reported() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("POST"))
        .and(path("/uploadfile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": 2008,
            "error": "User is over quota."
        })))
        .mount(&server)
        .await;

    let source = MemorySource::new(&b"data"[..]);
    let err = client
        .upload_stream(&RemotePath::root(), "d.bin", &source, UploadOptions::default())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RemoteError::Api {
            code: 2008,
            message: "User is over quota.".into()
        }
    );
}
