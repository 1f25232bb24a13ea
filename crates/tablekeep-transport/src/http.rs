//! HTTP transport implementation using `reqwest`.

use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Serialize, de::DeserializeOwned};
use tablekeep_protocol::{
    ApiError, AuthResponse, Codec, Credentials, JsonCodec, SignupPayload, UNEXPECTED_ERROR,
};

use crate::{Transport, TransportError, endpoints};

/// A [`Transport`] that talks to the REST API over HTTP.
///
/// The underlying client keeps a cookie store, so the session cookie set
/// by `/auth/login` or `/auth/signup` rides along on every later request
/// without the caller handling tokens.
pub struct HttpTransport<C: Codec = JsonCodec> {
    http: reqwest::Client,
    base_url: String,
    codec: C,
}

impl HttpTransport {
    /// Creates a transport for the API rooted at `base_url`
    /// (e.g. `http://localhost:3000/api`).
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        Self::with_codec(base_url, JsonCodec)
    }
}

impl<C: Codec> HttpTransport<C> {
    /// Creates a transport that encodes bodies with `codec`.
    pub fn with_codec(base_url: &str, codec: C) -> Result<Self, TransportError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(TransportError::InvalidBaseUrl(base_url));
        }

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(TransportError::ClientBuild)?;

        tracing::debug!(%base_url, "http transport ready");
        Ok(Self {
            http,
            base_url,
            codec,
        })
    }

    /// The base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends one request and returns the status and raw body of a 2xx
    /// response. Every failure comes back as an [`ApiError`].
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<(u16, Vec<u8>), ApiError> {
        let url = self.url(path);
        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(ACCEPT, self.codec.content_type());
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, self.codec.content_type())
                .body(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::debug!(%method, path, error = %e, "request failed before a response");
            ApiError::network(e.to_string())
        })?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::network(e.to_string()))?;

        if !(200..300).contains(&status) {
            let err = ApiError::from_response(status, &bytes);
            tracing::debug!(%method, path, status, message = %err.message, "request rejected");
            return Err(err);
        }

        tracing::debug!(%method, path, status, "request succeeded");
        Ok((status, bytes.to_vec()))
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ApiError> {
        self.codec.encode(value).map_err(|e| {
            tracing::debug!(error = %e, "failed to encode request body");
            ApiError::default()
        })
    }

    fn decode<T: DeserializeOwned>(&self, status: u16, bytes: &[u8]) -> Result<T, ApiError> {
        self.codec.decode(bytes).map_err(|e| {
            tracing::debug!(status, error = %e, "failed to decode response body");
            ApiError::new(status, UNEXPECTED_ERROR)
        })
    }
}

impl<C: Codec> Transport for HttpTransport<C> {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        let body = self.encode(credentials)?;
        let (status, bytes) = self.send(Method::POST, endpoints::LOGIN, Some(body)).await?;
        self.decode(status, &bytes)
    }

    async fn signup(&self, payload: &SignupPayload) -> Result<AuthResponse, ApiError> {
        let body = self.encode(payload)?;
        let (status, bytes) = self.send(Method::POST, endpoints::SIGNUP, Some(body)).await?;
        self.decode(status, &bytes)
    }

    async fn me(&self) -> Result<AuthResponse, ApiError> {
        let (status, bytes) = self.send(Method::GET, endpoints::ME, None).await?;
        self.decode(status, &bytes)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.send(Method::POST, endpoints::LOGOUT, None).await?;
        Ok(())
    }

    async fn get_json(&self, path: &str) -> Result<serde_json::Value, ApiError> {
        let (status, bytes) = self.send(Method::GET, path, None).await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::Value::Null);
        }
        self.decode(status, &bytes)
    }
}
