use anyhow::Context;
use reqwest::Method;
use serde::Serialize;

/// The request an attack issues over and over.
#[derive(Debug, Clone)]
pub struct Target {
    method: Method,
    path: String,
    body: Option<Vec<u8>>,
}

impl Target {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            body: None,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    /// Attach a JSON body, sent with every request of the attack.
    pub fn with_json_body<T: Serialize + ?Sized>(mut self, body: &T) -> anyhow::Result<Self> {
        self.body = Some(serde_json::to_vec(body).context("Failed to serialize request body")?);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}
