#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

pub mod error;
pub mod ratelimit;
pub mod route;
pub mod transport;

use hyper::{
    body::{self, Buf},
    client::HttpConnector,
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE},
    Body, Client as HyperClient, Method as HyperMethod, Request as HyperRequest, StatusCode,
};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use serde::Deserialize;
use serde_json::Value;
use std::{result::Result as StdResult, time::Duration};
use tracing::debug;

pub use error::Error;
pub use ratelimit::{BucketKey, RatelimitInfo, RatelimitMode, Ratelimited, Ratelimiter};
pub use route::{Method, Route};
pub use transport::{Request, Response, ResponseFuture, Transport};

type Result<T> = StdResult<T, Error>;

pub const API_BASE: &str = "https://discord.com/api/v6";

#[derive(Deserialize)]
struct RatelimitBody {
    #[serde(default)]
    retry_after: Option<f64>,
    #[serde(default)]
    global: bool,
}

/// The default [`Transport`], a hyper client over rustls
#[derive(Clone)]
pub struct Client {
    client: HyperClient<HttpsConnector<HttpConnector>>,
    token: String,
    api_base: String,
}

impl Client {
    pub fn new(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();
        let client = HyperClient::builder().build(connector);
        Self {
            client,
            token: token.into(),
            api_base: api_base.into().trim_end_matches('/').to_owned(),
        }
    }

    pub async fn send(&self, request: Request) -> Result<Response> {
        let url = format!("{}/{}", self.api_base, request.path);
        debug!(method = %request.method, url = %url, "Sending request");

        let builder = HyperRequest::builder()
            .uri(&url)
            .method(to_hyper_method(request.method))
            .header(AUTHORIZATION, HeaderValue::from_str(&self.token).map_err(hyper::http::Error::from)?);
        let req = if let Some(json) = request.body {
            let bytes = serde_json::to_vec(&json)?;
            builder
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .header(CONTENT_LENGTH, bytes.len())
                .body(Body::from(bytes))?
        } else {
            builder.header(CONTENT_LENGTH, 0).body(Body::empty())?
        };

        let res = self.client.request(req).await?;
        let status = res.status();
        let ratelimit = ratelimit_headers(res.headers());
        let header_retry = res
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<f64>().ok());
        let global_header = res.headers().contains_key("x-ratelimit-global");

        let mut buf = body::aggregate(res.into_body()).await?;
        let mut bytes = vec![0; buf.remaining()];
        buf.copy_to_slice(&mut bytes);

        match status {
            s if s.is_success() => {
                let payload = if bytes.is_empty() {
                    Value::Null
                } else {
                    serde_json::from_slice(&bytes)?
                };
                Ok(Response { payload, ratelimit })
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let rejection = serde_json::from_slice::<RatelimitBody>(&bytes).ok();
                let retry_after = rejection
                    .as_ref()
                    .and_then(|b| b.retry_after)
                    .or(header_retry)
                    .and_then(seconds);
                Err(Error::RateLimited {
                    retry_after,
                    global: global_header || rejection.map_or(false, |b| b.global),
                })
            }
            StatusCode::FORBIDDEN => Err(Error::Forbidden),
            StatusCode::NOT_FOUND => Err(Error::NotFound),
            s => Err(Error::APIError(s)),
        }
    }
}

impl Transport for Client {
    fn request(&self, request: Request) -> ResponseFuture<'_> {
        Box::pin(self.send(request))
    }
}

const fn to_hyper_method(method: Method) -> HyperMethod {
    match method {
        Method::Get => HyperMethod::GET,
        Method::Post => HyperMethod::POST,
        Method::Put => HyperMethod::PUT,
        Method::Patch => HyperMethod::PATCH,
        Method::Delete => HyperMethod::DELETE,
    }
}

fn ratelimit_headers(headers: &HeaderMap) -> Option<RatelimitInfo> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let limit = header("x-ratelimit-limit")?.parse().ok()?;
    let remaining = header("x-ratelimit-remaining")?.parse().ok()?;
    let reset_after = header("x-ratelimit-reset-after")?.parse::<f64>().ok()?;
    Some(RatelimitInfo {
        limit,
        remaining,
        reset_after: seconds(reset_after)?,
    })
}

fn seconds(value: f64) -> Option<Duration> {
    (value.is_finite() && value >= 0.0).then(|| Duration::from_secs_f64(value))
}
