//! `reqwest`-backed [`HttpTransport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};

use crate::auth::signer::{encode_params, HttpMethod};
use crate::error::HttpError;
use crate::http::{HttpRequest, HttpTransport};

/// Default HTTP transport: 30 s timeout, pooled connections.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()?;
        Ok(Self { client })
    }
}

fn method_for(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn error_for_status(status: u16, body: String) -> HttpError {
    match status {
        401 | 403 => HttpError::Unauthorized(body),
        404 => HttpError::NotFound(body),
        429 => HttpError::RateLimited { body },
        400..=499 => HttpError::BadRequest(body),
        _ => HttpError::ServerError { status, body },
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn call(&self, request: HttpRequest) -> Result<String, HttpError> {
        let url = request
            .full_url()
            .map_err(|e| HttpError::InvalidUrl(e.to_string()))?;
        tracing::debug!(method = %request.method, url = %url, "HTTP request");

        let mut req = self.client.request(method_for(request.method), &url);
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            let encoded =
                encode_params(&request.body).map_err(|e| HttpError::BadRequest(e.to_string()))?;
            req = req
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(encoded);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status.is_success() {
            return Ok(body);
        }
        tracing::debug!(status = status.as_u16(), "HTTP request failed");
        Err(error_for_status(status.as_u16(), body))
    }
}
