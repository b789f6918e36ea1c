use std::io::Cursor;
use std::net::SocketAddr;

use chrono::Duration;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, LOCATION};
use serde_json::Value;
use tempfile::TempDir;

use fragments_core::config::{StorageBackend, StorageConfig};
use fragments_server::config::{AppConfig, AuthConfig, CorsConfig, ServerConfig};
use fragments_server::state::AppState;
use fragments_server::utils::jwt;

const JWT_SECRET: &str = "test-secret-for-integration-tests";

pub mod routes {
    pub const HEALTH: &str = "/";
    pub const FRAGMENTS: &str = "/v1/fragments";

    pub fn fragment(id: &str) -> String {
        format!("/v1/fragments/{id}")
    }

    pub fn fragment_as(id: &str, ext: &str) -> String {
        format!("/v1/fragments/{id}.{ext}")
    }

    pub fn fragment_info(id: &str) -> String {
        format!("/v1/fragments/{id}/info")
    }
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    /// Keeps the filesystem backend's directory alive for the app's lifetime.
    _data_dir: Option<TempDir>,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    pub headers: HeaderMap,
    /// Raw response body.
    pub bytes: Vec<u8>,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let bytes = res
            .bytes()
            .await
            .expect("Failed to read response body")
            .to_vec();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Self {
            status,
            headers,
            bytes,
            text,
            body,
        }
    }

    pub fn content_type(&self) -> &str {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    pub fn location(&self) -> &str {
        self.headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

fn test_config(storage: StorageConfig) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors: CorsConfig {
                allow_origins: vec![],
                max_age: 3600,
            },
        },
        auth: AuthConfig {
            jwt_secret: JWT_SECRET.to_string(),
        },
        storage,
    }
}

impl TestApp {
    /// Spawn a server backed by the in-memory store.
    pub async fn spawn() -> Self {
        Self::spawn_with(StorageConfig::default(), None).await
    }

    /// Spawn a server backed by a filesystem store in a fresh temp directory.
    pub async fn spawn_filesystem() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let storage = StorageConfig {
            backend: StorageBackend::Filesystem,
            path: dir.path().to_path_buf(),
            ..Default::default()
        };
        Self::spawn_with(storage, Some(dir)).await
    }

    /// Spawn a server whose fragments may hold at most `max_blob_size` bytes.
    pub async fn spawn_with_limit(max_blob_size: u64) -> Self {
        let storage = StorageConfig {
            max_blob_size,
            ..Default::default()
        };
        Self::spawn_with(storage, None).await
    }

    async fn spawn_with(storage: StorageConfig, data_dir: Option<TempDir>) -> Self {
        let store = fragments_core::storage::open(&storage)
            .await
            .expect("Failed to open storage");
        let state = AppState::new(store, test_config(storage));
        let app = fragments_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            _data_dir: data_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Issue a valid token for `subject`.
    pub fn token_for(&self, subject: &str) -> String {
        jwt::sign(JWT_SECRET, subject, Duration::hours(1)).expect("Failed to sign token")
    }

    pub async fn post_raw(
        &self,
        path: &str,
        content_type: &str,
        body: impl Into<reqwest::Body>,
        token: &str,
    ) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_without_token(
        &self,
        path: &str,
        content_type: &str,
        body: &'static str,
    ) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn put_raw(
        &self,
        path: &str,
        content_type: &str,
        body: impl Into<reqwest::Body>,
        token: &str,
    ) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_raw_auth(&self, path: &str, authorization: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header(AUTHORIZATION, authorization)
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// Create a fragment and return its id.
    pub async fn create_fragment(
        &self,
        content_type: &str,
        body: impl Into<reqwest::Body>,
        token: &str,
    ) -> String {
        let res = self.post_raw(routes::FRAGMENTS, content_type, body, token).await;
        assert_eq!(res.status, 201, "Create failed: {}", res.text);
        res.body["fragment"]["id"]
            .as_str()
            .expect("Response missing fragment id")
            .to_string()
    }
}

/// Encode a small solid-colour image in `format`.
pub fn sample_image(format: image::ImageFormat) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(8, 6, image::Rgb([30, 144, 255]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, format)
        .expect("Failed to encode sample image");
    out.into_inner()
}
