//! Resource Loader
//!
//! HTTP requests over reqwest's blocking client, moved off the executor
//! with `smol::unblock`.

use crate::{NetError, Response};
use std::collections::HashMap;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Request configuration
#[derive(Debug, Default, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn get(url: &str) -> Self {
        Self {
            method: Method::Get,
            url: url.to_string(),
            ..Default::default()
        }
    }

    pub fn put(url: &str) -> Self {
        Self {
            method: Method::Put,
            url: url.to_string(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `value` as the JSON body
    pub fn with_json<T: serde::Serialize>(self, value: &T) -> Result<Self, NetError> {
        let body = serde_json::to_vec(value).map_err(|e| NetError::Network(e.to_string()))?;
        Ok(self
            .with_header("Content-Type", "application/json")
            .with_body(body))
    }
}

/// Load resources from network
#[derive(Debug, Clone)]
pub struct ResourceLoader {
    client: reqwest::blocking::Client,
}

impl ResourceLoader {
    pub fn new() -> Result<Self, NetError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("mesh/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Fetch a URL with GET
    pub async fn fetch(&self, url: &str) -> Result<Response, NetError> {
        self.request(Request::get(url)).await
    }

    /// Make an HTTP request
    pub async fn request(&self, req: Request) -> Result<Response, NetError> {
        let client = self.client.clone();
        smol::unblock(move || execute(&client, req)).await
    }
}

fn execute(client: &reqwest::blocking::Client, req: Request) -> Result<Response, NetError> {
    tracing::info!("HTTP {} {}", req.method.as_str(), req.url);

    let url = url::Url::parse(&req.url)?;
    let mut builder = client.request(req.method.to_reqwest(), url);
    for (key, value) in &req.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    if let Some(body) = req.body {
        builder = builder.body(body);
    }

    let response = builder.send()?;
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(k, v)| Some((k.to_string(), v.to_str().ok()?.to_string())))
        .collect();
    let body = response.bytes()?.to_vec();

    let response = Response {
        status,
        headers,
        body,
    };
    if !response.ok() {
        return Err(NetError::HttpError { status });
    }
    Ok(response)
}
