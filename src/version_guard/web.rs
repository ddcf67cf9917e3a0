//! `Browser` implementation backed by `web-sys` for WASM targets.

use super::browser::{timer_delay_millis, Browser};
use super::types::{FetchError, PlatformError};
use crate::storage::{BrowserStorage, KeyValueStore, StorageError};
use futures_util::future::{select, Either};
use js_sys::{Array, Promise, Reflect};
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestCache, RequestInit, Response};

/// The real browser window.
#[derive(Clone, Copy, Default)]
pub struct WebBrowser;

impl WebBrowser {
    pub fn new() -> Self {
        Self
    }
}

fn window() -> Result<web_sys::Window, PlatformError> {
    web_sys::window().ok_or(PlatformError::Unsupported("Window"))
}

fn js_error(value: JsValue) -> PlatformError {
    PlatformError::Failed(describe(&value))
}

fn describe(value: &JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}

/// Resolves after `timeout` via `setTimeout`.
///
/// If the timer cannot be scheduled the future resolves immediately, so a
/// fetch raced against it still ends.
fn sleep(timeout: Duration) -> JsFuture {
    let millis = timer_delay_millis(timeout);
    let promise = Promise::new(&mut |resolve, _reject| {
        let scheduled = match web_sys::window() {
            Some(window) => window
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis)
                .map(|_| ())
                .map_err(|e| describe(&e)),
            None => Err("No window".to_string()),
        };

        if let Err(e) = scheduled {
            log::warn!("Failed to schedule fetch timeout, expiring now: {}", e);
            if let Err(e) = resolve.call0(&JsValue::UNDEFINED) {
                log::error!("Failed to expire fetch timeout: {}", describe(&e));
            }
        }
    });
    JsFuture::from(promise)
}

impl Browser for WebBrowser {
    fn local_storage(&self) -> Result<Box<dyn KeyValueStore>, StorageError> {
        Ok(Box::new(BrowserStorage::local()?))
    }

    fn session_storage(&self) -> Result<Box<dyn KeyValueStore>, StorageError> {
        Ok(Box::new(BrowserStorage::session()?))
    }

    async fn cache_names(&self) -> Result<Vec<String>, PlatformError> {
        let window = window()?;
        if !Reflect::has(&window, &JsValue::from_str("caches")).unwrap_or(false) {
            return Err(PlatformError::Unsupported("CacheStorage"));
        }

        let caches = window.caches().map_err(js_error)?;
        let keys = JsFuture::from(caches.keys()).await.map_err(js_error)?;

        Ok(Array::from(&keys)
            .iter()
            .filter_map(|name| name.as_string())
            .collect())
    }

    async fn delete_cache(&self, name: &str) -> Result<bool, PlatformError> {
        let caches = window()?.caches().map_err(js_error)?;
        let deleted = JsFuture::from(caches.delete(name))
            .await
            .map_err(js_error)?;
        Ok(deleted.as_bool().unwrap_or(false))
    }

    async fn unregister_service_workers(&self) -> Result<usize, PlatformError> {
        let navigator = window()?.navigator();
        if !Reflect::has(&navigator, &JsValue::from_str("serviceWorker")).unwrap_or(false) {
            return Err(PlatformError::Unsupported("ServiceWorkerContainer"));
        }

        let registrations = JsFuture::from(navigator.service_worker().get_registrations())
            .await
            .map_err(js_error)?;

        let mut removed = 0;
        let mut failures = Vec::new();

        for registration in Array::from(&registrations).iter() {
            let Ok(registration) = registration.dyn_into::<web_sys::ServiceWorkerRegistration>()
            else {
                continue;
            };

            let result = match registration.unregister() {
                Ok(promise) => JsFuture::from(promise).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(done) if done.as_bool().unwrap_or(false) => removed += 1,
                Ok(_) => log::debug!("Service worker {} was already gone", registration.scope()),
                Err(e) => {
                    log::warn!(
                        "Failed to unregister service worker {}: {}",
                        registration.scope(),
                        describe(&e)
                    );
                    failures.push(describe(&e));
                }
            }
        }

        if failures.is_empty() {
            Ok(removed)
        } else {
            Err(PlatformError::Failed(failures.join("; ")))
        }
    }

    async fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let window = web_sys::window().ok_or_else(|| FetchError::Network("No window".into()))?;

        let headers = web_sys::Headers::new().map_err(|e| FetchError::Network(describe(&e)))?;
        for (name, value) in [("Cache-Control", "no-cache"), ("Pragma", "no-cache")] {
            headers
                .set(name, value)
                .map_err(|e| FetchError::Network(describe(&e)))?;
        }

        let init = RequestInit::new();
        init.set_method("GET");
        init.set_cache(RequestCache::NoStore);
        init.set_headers(&headers);

        let request = Request::new_with_str_and_init(url, &init)
            .map_err(|e| FetchError::Network(describe(&e)))?;

        let fetch = async {
            let response = JsFuture::from(window.fetch_with_request(&request))
                .await
                .map_err(|e| FetchError::Network(describe(&e)))?;
            let response: Response = response
                .dyn_into()
                .map_err(|_| FetchError::Network("fetch did not return a Response".into()))?;

            if !response.ok() {
                return Err(FetchError::Status(response.status()));
            }

            let text = response
                .text()
                .map_err(|e| FetchError::InvalidBody(describe(&e)))?;
            let text = JsFuture::from(text)
                .await
                .map_err(|e| FetchError::InvalidBody(describe(&e)))?;

            text.as_string()
                .ok_or_else(|| FetchError::InvalidBody("body was not text".into()))
        };

        match select(Box::pin(fetch), sleep(timeout)).await {
            Either::Left((result, _)) => result,
            Either::Right(_) => Err(FetchError::Timeout),
        }
    }

    fn navigate(&self, url: &str) -> Result<(), PlatformError> {
        window()?.location().set_href(url).map_err(js_error)
    }

    fn reload(&self) -> Result<(), PlatformError> {
        window()?.location().reload().map_err(js_error)
    }

    fn now_millis(&self) -> i64 {
        js_sys::Date::now() as i64
    }
}
