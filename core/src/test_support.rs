//! In-memory transport for unit tests.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

enum Scripted {
    Respond(HttpResponse),
    Fail(String),
}

/// Answers by exact URL; anything unscripted gets a FastAPI-style 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: HashMap<String, Scripted>,
    seen: RefCell<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, response: HttpResponse) -> Self {
        self.routes.insert(url.to_string(), Scripted::Respond(response));
        self
    }

    pub fn json(self, url: &str, body: serde_json::Value) -> Self {
        self.with(url, response(200, &body.to_string()))
    }

    pub fn failing(mut self, url: &str, reason: &str) -> Self {
        self.routes.insert(url.to_string(), Scripted::Fail(reason.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.seen.borrow().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.seen.borrow().iter().map(|r| r.url.clone()).collect()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.seen.borrow_mut().push(request.clone());
        match self.routes.get(&request.url) {
            Some(Scripted::Respond(resp)) => Ok(resp.clone()),
            Some(Scripted::Fail(reason)) => Err(TransportError(reason.clone())),
            None => {
                let mut resp = response(404, r#"{"detail":"Not Found"}"#);
                resp.status_text = "Not Found".to_string();
                Ok(resp)
            }
        }
    }
}

pub fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        status_text: String::new(),
        headers: Vec::new(),
        body: body.to_string(),
    }
}
