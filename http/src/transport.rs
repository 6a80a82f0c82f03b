use serde_json::Value;
use std::{future::Future, pin::Pin};

use crate::{error::Error, ratelimit::RatelimitInfo, route::Method};

#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub method: Method,
    /// Path relative to the API base, without a leading slash
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Response {
    /// Parsed JSON body, `Value::Null` for empty responses
    pub payload: Value,
    pub ratelimit: Option<RatelimitInfo>,
}

impl Response {
    pub fn new(payload: Value) -> Self {
        Self {
            payload,
            ratelimit: None,
        }
    }
}

pub type ResponseFuture<'a> = Pin<Box<dyn Future<Output = Result<Response, Error>> + Send + 'a>>;

/// Issues authenticated calls against the service
pub trait Transport: Send + Sync {
    fn request(&self, request: Request) -> ResponseFuture<'_>;
}
