//! Remote storage API client
//!
//! Provides a typed client for the storage service's JSON API. Every call is
//! addressed by method name under the regional base URL, carries the session
//! token as the `auth` query parameter, and answers with an integer `result`
//! (0 on success) plus a method-specific payload.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cloudxfer_api::{ApiClient, TransportSettings};
//! use cloudxfer_core::domain::{Region, RemotePath, Token};
//! use cloudxfer_core::ports::IRemoteStorage;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let token = Token::new("session-token")?;
//! let client = ApiClient::new(Region::Eu, Some(token), TransportSettings::default())?;
//! for entry in client.list_folder(&RemotePath::root()).await? {
//!     println!("{}", entry.name);
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cloudxfer_core::domain::{AccountInfo, Region, RemoteEntry, RemoteError, RemotePath, Token};
use cloudxfer_core::ports::{
    DownloadStream, FolderId, IRemoteStorage, UploadOptions, UploadSource,
};
use futures_util::TryStreamExt;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::transport::{RequestKind, RetryingTransport, TransportSettings};

/// Result code for "folder already exists"
const RESULT_FOLDER_EXISTS: i64 = 2004;

// ============================================================================
// API response types
// ============================================================================

/// Status fields present in every response
#[derive(Debug, Deserialize)]
struct ApiStatus {
    result: i64,
    #[serde(default)]
    error: Option<String>,
}

/// A decoded response: either the payload or the service's error
#[derive(Debug)]
pub enum ApiReply<T> {
    Ok(T),
    Err { code: i64, message: String },
}

impl<T: DeserializeOwned> ApiReply<T> {
    /// Decodes a response body, checking `result` before the payload
    pub fn parse(method: &str, body: &[u8]) -> Result<Self, RemoteError> {
        let status: ApiStatus = serde_json::from_slice(body)
            .map_err(|e| RemoteError::InvalidResponse(format!("{method}: {e}")))?;
        if status.result != 0 {
            return Ok(ApiReply::Err {
                code: status.result,
                message: status.error.unwrap_or_else(|| "unknown error".to_string()),
            });
        }
        let payload = serde_json::from_slice(body)
            .map_err(|e| RemoteError::InvalidResponse(format!("{method}: {e}")))?;
        Ok(ApiReply::Ok(payload))
    }

    pub fn into_result(self) -> Result<T, RemoteError> {
        match self {
            ApiReply::Ok(payload) => Ok(payload),
            ApiReply::Err { code, message } => Err(result_error(code, message)),
        }
    }
}

/// Maps a non-zero `result` code to a `RemoteError`
pub fn result_error(code: i64, message: String) -> RemoteError {
    match code {
        1000 | 2000 | 2094 => RemoteError::Unauthorized(format!("{message} (code {code})")),
        2002 | 2005 | 2009 | 2010 => RemoteError::NotFound(format!("{message} (code {code})")),
        _ => RemoteError::Api { code, message },
    }
}

#[derive(Debug, Deserialize)]
struct FolderResponse {
    metadata: FolderMetadata,
}

#[derive(Debug, Deserialize)]
struct FolderMetadata {
    #[serde(default)]
    folderid: Option<u64>,
    #[serde(default)]
    contents: Vec<EntryMetadata>,
}

#[derive(Debug, Deserialize)]
struct EntryMetadata {
    name: String,
    #[serde(default)]
    isfolder: bool,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    modified: Option<String>,
    #[serde(default)]
    hash: Option<u64>,
}

impl From<EntryMetadata> for RemoteEntry {
    fn from(meta: EntryMetadata) -> Self {
        RemoteEntry {
            name: meta.name,
            is_folder: meta.isfolder,
            size: meta.size,
            modified: meta.modified.as_deref().and_then(parse_modified),
            hash: meta.hash,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileLinkResponse {
    hosts: Vec<String>,
    path: String,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    quota: Option<u64>,
    #[serde(default)]
    usedquota: Option<u64>,
    #[serde(default)]
    premium: Option<bool>,
    #[serde(default)]
    auth: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    metadata: Vec<EntryMetadata>,
}

/// Parses the listing timestamp format (RFC 2822, RFC 3339 tolerated)
fn parse_modified(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ============================================================================
// ApiClient
// ============================================================================

/// HTTP client for the storage API
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    transport: RetryingTransport,
    base_url: String,
    token: Option<Token>,
}

impl ApiClient {
    /// Creates a client for the given region
    pub fn new(
        region: Region,
        token: Option<Token>,
        settings: TransportSettings,
    ) -> Result<Self, RemoteError> {
        Self::with_base_url(region.endpoint(), token, settings)
    }

    /// Creates a client with a custom base URL (useful for testing)
    pub fn with_base_url(
        base_url: impl Into<String>,
        token: Option<Token>,
        settings: TransportSettings,
    ) -> Result<Self, RemoteError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            transport: RetryingTransport::new(settings)?,
            base_url,
            token,
        })
    }

    /// Replaces the session token (e.g., after login)
    pub fn set_token(&mut self, token: Token) {
        self.token = Some(token);
        debug!("Updated ApiClient token");
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &RetryingTransport {
        &self.transport
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    fn auth_param(&self) -> Result<(&'static str, String), RemoteError> {
        self.token
            .as_ref()
            .map(|t| ("auth", t.expose().to_string()))
            .ok_or_else(|| RemoteError::Unauthorized("not logged in".to_string()))
    }

    /// Sends a GET for `method` and returns the raw decoded reply
    async fn call_raw<T: DeserializeOwned>(
        &self,
        method: &str,
        mut params: Vec<(&'static str, String)>,
        authenticated: bool,
    ) -> Result<ApiReply<T>, RemoteError> {
        if authenticated {
            params.push(self.auth_param()?);
        }
        let url = self.method_url(method);
        let client = self.transport.client();

        let response = self
            .transport
            .send(method, RequestKind::Metadata, || {
                std::future::ready(Ok(client.get(&url).query(&params)))
            })
            .await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Transient(format!("{method}: {e}")))?;

        ApiReply::parse(method, &body)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<(&'static str, String)>,
    ) -> Result<T, RemoteError> {
        self.call_raw(method, params, true).await?.into_result()
    }

    /// Exchanges credentials for a session token
    ///
    /// The returned token is not stored on this client; call
    /// [`ApiClient::set_token`] and persist it through a token store.
    pub async fn login(&self, username: &str, password: &str) -> Result<Token, RemoteError> {
        debug!(username, "Logging in");
        let params = vec![
            ("getauth", "1".to_string()),
            ("logout", "1".to_string()),
            ("username", username.to_string()),
            ("password", password.to_string()),
        ];
        let info: UserInfoResponse = self.call_raw("userinfo", params, false).await?.into_result()?;
        let auth = info
            .auth
            .ok_or_else(|| RemoteError::InvalidResponse("userinfo: missing auth token".into()))?;
        let token =
            Token::new(auth).map_err(|e| RemoteError::InvalidResponse(format!("userinfo: {e}")))?;
        info!(username, "Login succeeded");
        Ok(token)
    }
}

#[async_trait]
impl IRemoteStorage for ApiClient {
    async fn list_folder(&self, path: &RemotePath) -> Result<Vec<RemoteEntry>, RemoteError> {
        debug!(path = %path, "Listing folder");
        let response: FolderResponse = self
            .call("listfolder", vec![("path", path.to_string())])
            .await?;
        Ok(response
            .metadata
            .contents
            .into_iter()
            .map(RemoteEntry::from)
            .collect())
    }

    async fn create_folder(&self, path: &RemotePath) -> Result<FolderId, RemoteError> {
        debug!(path = %path, "Creating folder");
        let params = vec![("path", path.to_string())];
        let reply: ApiReply<FolderResponse> =
            self.call_raw("createfolderifnotexists", params, true).await?;

        let metadata = match reply {
            ApiReply::Err {
                code: RESULT_FOLDER_EXISTS,
                ..
            } => {
                let params = vec![("path", path.to_string()), ("nofiles", "1".to_string())];
                self.call::<FolderResponse>("listfolder", params).await?.metadata
            }
            other => other.into_result()?.metadata,
        };

        metadata.folderid.ok_or_else(|| {
            RemoteError::InvalidResponse(format!("createfolderifnotexists: no folderid for {path}"))
        })
    }

    async fn get_download_link(&self, path: &RemotePath) -> Result<String, RemoteError> {
        let link: FileLinkResponse = self
            .call("getfilelink", vec![("path", path.to_string())])
            .await?;
        let host = link
            .hosts
            .first()
            .ok_or_else(|| RemoteError::InvalidResponse(format!("getfilelink: no hosts for {path}")))?;

        let scheme = url::Url::parse(&self.base_url)
            .map(|u| u.scheme().to_string())
            .unwrap_or_else(|_| "https".to_string());
        Ok(format!("{scheme}://{host}{}", link.path))
    }

    async fn open_download(&self, url: &str) -> Result<DownloadStream, RemoteError> {
        let client = self.transport.client();
        let response = self
            .transport
            .send("download", RequestKind::Transfer, || {
                std::future::ready(Ok(client.get(url)))
            })
            .await?;

        let content_length = response.content_length();
        let body = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));

        Ok(DownloadStream {
            content_length,
            body: Box::pin(body),
        })
    }

    async fn upload_stream(
        &self,
        folder: &RemotePath,
        name: &str,
        source: &dyn UploadSource,
        options: UploadOptions,
    ) -> Result<(), RemoteError> {
        let mut params = vec![("path", folder.to_string())];
        if options.rename_if_exists {
            params.push(("renameifexists", "1".to_string()));
        }
        if options.no_partial {
            params.push(("nopartial", "1".to_string()));
        }
        params.push(self.auth_param()?);

        let url = self.method_url("uploadfile");
        let client = self.transport.client();
        let size = source.size();
        let (url, params) = (&url, &params);

        let response = self
            .transport
            .send("uploadfile", RequestKind::Transfer, move || async move {
                let stream = source.open().await?;
                let part = Part::stream_with_length(reqwest::Body::wrap_stream(stream), size)
                    .file_name(name.to_string())
                    .mime_str("application/octet-stream")
                    .map_err(|e| RemoteError::InvalidResponse(format!("uploadfile: {e}")))?;
                let form = Form::new().part("file", part);
                Ok::<_, RemoteError>(client.post(url.as_str()).query(params).multipart(form))
            })
            .await?;

        let body = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Transient(format!("uploadfile: {e}")))?;
        let uploaded: UploadResponse = ApiReply::parse("uploadfile", &body)?.into_result()?;

        if let Some(stored) = uploaded.metadata.first() {
            if stored.name != name {
                info!(requested = name, stored = %stored.name, "Server renamed upload");
            }
        }
        Ok(())
    }

    async fn account_info(&self) -> Result<AccountInfo, RemoteError> {
        let info: UserInfoResponse = self.call("userinfo", Vec::new()).await?;
        Ok(AccountInfo {
            email: info.email.unwrap_or_default(),
            quota: info.quota.unwrap_or(0),
            used_quota: info.usedquota.unwrap_or(0),
            premium: info.premium.unwrap_or(false),
        })
    }
}
