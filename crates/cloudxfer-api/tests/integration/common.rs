//! Shared test helpers for API integration tests
//!
//! Provides wiremock-based mock server setup and an in-memory upload source.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cloudxfer_api::{ApiClient, RetryPolicy, TransportSettings};
use cloudxfer_core::domain::Token;
use cloudxfer_core::ports::{ByteStream, UploadSource};
use wiremock::MockServer;

/// Token the mock server expects in the `auth` query parameter
pub const TEST_TOKEN: &str = "test-auth-token";

/// Retry policy with the default shape but millisecond waits
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 4,
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(100),
    }
}

/// Starts a mock server and returns a client pointed at it.
pub async fn setup_api_mock() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = client_for(&server);
    (server, client)
}

/// Builds an authenticated client for an already running server
pub fn client_for(server: &MockServer) -> ApiClient {
    let settings = TransportSettings::default()
        .with_workers(2)
        .with_retry(fast_retry());
    ApiClient::with_base_url(
        server.uri(),
        Some(Token::new(TEST_TOKEN).expect("valid token")),
        settings,
    )
    .expect("client builds")
}

/// In-memory upload content that counts how often it was opened
pub struct MemorySource {
    data: Bytes,
    chunk: usize,
    opens: AtomicU32,
}

impl MemorySource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            chunk: 8192,
            opens: AtomicU32::new(0),
        }
    }

    pub fn opens(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UploadSource for MemorySource {
    async fn open(&self) -> std::io::Result<ByteStream> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let chunks: Vec<std::io::Result<Bytes>> = self
            .data
            .chunks(self.chunk)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Ok(Box::pin(futures_util::stream::iter(chunks)))
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
