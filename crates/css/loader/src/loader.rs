//! Transport seam: fetch a `ResourceRequest` and hand back a checked `Response`.

use bytes::{Bytes, BytesMut};
use core::future::Future;
use log::debug;
use reqwest::Client;
use reqwest::header::{HeaderValue, ORIGIN};
use std::collections::HashMap;
use tokio::fs;
use tokio_stream::StreamExt as _;

use crate::config::LoaderConfig;
use crate::cors::check_response;
use crate::error::LoadError;
use crate::request::{CorsSetting, OriginBehavior, ResourceRequest, Response};

/// Something that can fetch resources.
///
/// Dropping the returned future cancels the fetch and releases its transport
/// resources.
pub trait ResourceLoader: Send + Sync + 'static {
    /// Fetch `request`, applying the cross-origin policy to the response.
    fn fetch(
        &self,
        request: &ResourceRequest,
        cors: CorsSetting,
        behavior: OriginBehavior,
    ) -> impl Future<Output = Result<Response, LoadError>> + Send;
}

/// Loader for `http`, `https` and `file` URLs.
///
/// HTTP bodies are read through `reqwest` as a stream; files are read with
/// `tokio::fs` in one chunk.
#[derive(Clone, Debug)]
pub struct HttpResourceLoader {
    client: Client,
}

impl HttpResourceLoader {
    /// Build a loader from `config`.
    ///
    /// # Errors
    /// Returns `LoadError::Task` if the HTTP client cannot be constructed.
    pub fn new(config: &LoaderConfig) -> Result<Self, LoadError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|err| LoadError::Task(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client })
    }

    async fn fetch_http(&self, request: &ResourceRequest, cors: CorsSetting) -> Result<Response, LoadError> {
        let url = &request.url;
        let network = |err: reqwest::Error| LoadError::Network {
            url: url.clone(),
            message: err.to_string(),
        };
        let mut builder = self.client.get(url.clone());
        if cors != CorsSetting::None && request.is_cross_origin() {
            let origin = request
                .initiator
                .as_ref()
                .map(|initiator| initiator.origin().ascii_serialization());
            if let Some(value) = origin.and_then(|text| HeaderValue::from_str(&text).ok()) {
                builder = builder.header(ORIGIN, value);
            }
        }
        let response = builder.send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }
        let final_url = response.url().clone();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|text| (name.as_str().to_ascii_lowercase(), text.to_owned()))
            })
            .collect();
        let mut body = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk.map_err(network)?);
        }
        Ok(Response {
            url: final_url,
            status: status.as_u16(),
            headers,
            body: body.freeze(),
            tainted: false,
        })
    }

    async fn fetch_file(request: &ResourceRequest) -> Result<Response, LoadError> {
        let url = &request.url;
        let path = url.to_file_path().map_err(|()| LoadError::Io {
            url: url.clone(),
            message: "invalid file path".to_owned(),
        })?;
        let data = fs::read(path).await.map_err(|err| LoadError::Io {
            url: url.clone(),
            message: err.to_string(),
        })?;
        Ok(Response::ok(url.clone(), Bytes::from(data)).with_header("content-type", "text/css"))
    }
}

impl ResourceLoader for HttpResourceLoader {
    async fn fetch(
        &self,
        request: &ResourceRequest,
        cors: CorsSetting,
        behavior: OriginBehavior,
    ) -> Result<Response, LoadError> {
        debug!("Fetching {} (cors: {cors:?})", request.url);
        let response = match request.url.scheme() {
            "http" | "https" => self.fetch_http(request, cors).await?,
            "file" => Self::fetch_file(request).await?,
            _ => {
                return Err(LoadError::UnsupportedScheme {
                    url: request.url.clone(),
                });
            }
        };
        check_response(request, response, cors, behavior)
    }
}
