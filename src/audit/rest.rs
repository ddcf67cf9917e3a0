//! REST insert sink for WASM targets.
//!
//! Posts rows to the hosted database's PostgREST endpoint
//! (`{base_url}/rest/v1/{table}`).

use super::{AuditError, AuditSink};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

/// Inserts rows through `fetch`.
#[derive(Clone)]
pub struct RestSink {
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

impl RestSink {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: None,
        }
    }

    /// Uses the signed-in session's token instead of the anon key for
    /// `Authorization`.
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }

    fn endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

fn describe(value: &JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .unwrap_or_else(|| format!("{:?}", value))
}

impl AuditSink for RestSink {
    async fn insert(&self, table: &str, row: &Value) -> Result<(), AuditError> {
        let body =
            serde_json::to_string(row).map_err(|e| AuditError::Serialization(e.to_string()))?;

        let headers = web_sys::Headers::new().map_err(|e| AuditError::Network(describe(&e)))?;
        let bearer = format!(
            "Bearer {}",
            self.access_token.as_deref().unwrap_or(&self.api_key)
        );
        for (name, value) in [
            ("apikey", self.api_key.as_str()),
            ("Authorization", bearer.as_str()),
            ("Content-Type", "application/json"),
            ("Prefer", "return=minimal"),
        ] {
            headers
                .set(name, value)
                .map_err(|e| AuditError::Network(describe(&e)))?;
        }

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_mode(RequestMode::Cors);
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(&body));

        let request = Request::new_with_str_and_init(&self.endpoint(table), &init)
            .map_err(|e| AuditError::Network(describe(&e)))?;

        let window = web_sys::window().ok_or_else(|| AuditError::Network("No window".into()))?;
        let response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| AuditError::Network(describe(&e)))?;
        let response: Response = response
            .dyn_into()
            .map_err(|_| AuditError::Network("fetch did not return a Response".into()))?;

        if response.ok() {
            return Ok(());
        }

        let message = match response.text() {
            Ok(promise) => JsFuture::from(promise)
                .await
                .ok()
                .and_then(|text| text.as_string())
                .unwrap_or_default(),
            Err(_) => String::new(),
        };

        Err(AuditError::Rejected {
            status: response.status(),
            message,
        })
    }
}
