//! One-time loading of external scripts.
//!
//! Several widgets may need the same third-party script (the places
//! autocomplete, for instance) but it must be injected only once per page.
//! `OnceLoader` is the shared state machine:
//!
//! ```text
//! Uninitialized ──subscribe──> Loading(waiters) ──Ok──> Ready
//!       ^                            │
//!       └────────────Err─────────────┘  (waiters get the error)
//! ```

use std::cell::RefCell;
use std::rc::Rc;

/// Error delivered to subscribers when loading fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptLoadError {
    /// The script element could not be created or inserted.
    Injection(String),
    /// The browser fired `error` on the script element.
    LoadFailed(String),
}

impl std::fmt::Display for ScriptLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScriptLoadError::Injection(msg) => write!(f, "Failed to inject script: {}", msg),
            ScriptLoadError::LoadFailed(src) => write!(f, "Failed to load script {}", src),
        }
    }
}

impl std::error::Error for ScriptLoadError {}

type Waiter = Box<dyn FnOnce(Result<(), ScriptLoadError>)>;

enum LoadState {
    Uninitialized,
    Loading(Vec<Waiter>),
    Ready,
}

/// Handed to the start function; completes the pending load.
pub struct LoadHandle {
    state: Rc<RefCell<LoadState>>,
}

impl LoadHandle {
    /// Finishes the load and notifies every waiter in subscription order.
    ///
    /// On failure the loader returns to `Uninitialized` so a later
    /// subscription retries. Completing a loader that is not loading is
    /// ignored.
    pub fn complete(self, result: Result<(), ScriptLoadError>) {
        let waiters = {
            let mut state = self.state.borrow_mut();
            match std::mem::replace(&mut *state, LoadState::Uninitialized) {
                LoadState::Loading(waiters) => {
                    if result.is_ok() {
                        *state = LoadState::Ready;
                    }
                    waiters
                }
                other => {
                    *state = other;
                    log::debug!("Ignoring completion of a loader that is not loading");
                    return;
                }
            }
        };

        if let Err(e) = &result {
            log::warn!("{} ({} waiter(s) notified)", e, waiters.len());
        }

        for waiter in waiters {
            waiter(result.clone());
        }
    }
}

/// Process-wide singleton initializer with a pending-subscriber list.
///
/// Clones share state, so one loader can be handed to every widget that
/// needs the script.
#[derive(Clone)]
pub struct OnceLoader {
    state: Rc<RefCell<LoadState>>,
    start: Rc<dyn Fn(LoadHandle)>,
}

impl OnceLoader {
    /// Creates a loader that calls `start` when the first subscriber
    /// arrives. `start` must eventually call `LoadHandle::complete`; it may
    /// do so synchronously.
    pub fn new(start: impl Fn(LoadHandle) + 'static) -> Self {
        Self {
            state: Rc::new(RefCell::new(LoadState::Uninitialized)),
            start: Rc::new(start),
        }
    }

    /// Runs `callback` once the script is available.
    ///
    /// - Ready: invoked immediately.
    /// - Loading: queued until the load finishes.
    /// - Uninitialized: queued, and the load starts.
    pub fn subscribe(&self, callback: impl FnOnce(Result<(), ScriptLoadError>) + 'static) {
        let mut state = self.state.borrow_mut();

        if let LoadState::Loading(waiters) = &mut *state {
            waiters.push(Box::new(callback));
            return;
        }

        if matches!(*state, LoadState::Ready) {
            drop(state);
            callback(Ok(()));
            return;
        }

        *state = LoadState::Loading(vec![Box::new(callback)]);
        drop(state);

        (self.start)(LoadHandle {
            state: Rc::clone(&self.state),
        });
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state.borrow(), LoadState::Ready)
    }

    pub fn is_loading(&self) -> bool {
        matches!(*self.state.borrow(), LoadState::Loading(_))
    }
}

/// Creates a loader that injects `<script async src="...">` into `<head>`.
#[cfg(target_arch = "wasm32")]
pub fn script_tag_loader(src: impl Into<String>) -> OnceLoader {
    let src = src.into();
    OnceLoader::new(move |handle| {
        if let Err(e) = inject_script(&src, handle) {
            log::error!("{}", e);
        }
    })
}

#[cfg(target_arch = "wasm32")]
fn inject_script(src: &str, handle: LoadHandle) -> Result<(), ScriptLoadError> {
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;

    let handle = Rc::new(RefCell::new(Some(handle)));

    let fail = |handle: &Rc<RefCell<Option<LoadHandle>>>, error: ScriptLoadError| {
        if let Some(handle) = handle.borrow_mut().take() {
            handle.complete(Err(error.clone()));
        }
        error
    };

    let document = match web_sys::window().and_then(|w| w.document()) {
        Some(document) => document,
        None => return Err(fail(&handle, ScriptLoadError::Injection("No document".into()))),
    };

    let script = match document
        .create_element("script")
        .map_err(|e| format!("{:?}", e))
        .and_then(|el| {
            el.dyn_into::<web_sys::HtmlScriptElement>()
                .map_err(|_| "not a script element".to_string())
        }) {
        Ok(script) => script,
        Err(msg) => return Err(fail(&handle, ScriptLoadError::Injection(msg))),
    };

    script.set_src(src);
    script.set_async(true);

    let on_load_handle = handle.clone();
    let onload = Closure::wrap(Box::new(move |_event: web_sys::Event| {
        if let Some(handle) = on_load_handle.borrow_mut().take() {
            log::info!("External script loaded");
            handle.complete(Ok(()));
        }
    }) as Box<dyn FnMut(_)>);

    let on_error_handle = handle.clone();
    let failed_src = src.to_string();
    let onerror = Closure::wrap(Box::new(move |_event: web_sys::Event| {
        if let Some(handle) = on_error_handle.borrow_mut().take() {
            handle.complete(Err(ScriptLoadError::LoadFailed(failed_src.clone())));
        }
    }) as Box<dyn FnMut(_)>);

    script.set_onload(Some(onload.as_ref().unchecked_ref()));
    script.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onload.forget(); // The element owns the handlers for the page lifetime
    onerror.forget();

    let head = match document.head() {
        Some(head) => head,
        None => return Err(fail(&handle, ScriptLoadError::Injection("No <head>".into()))),
    };

    if let Err(e) = head.append_child(&script) {
        return Err(fail(&handle, ScriptLoadError::Injection(format!("{:?}", e))));
    }

    log::info!("Injected script {}", src);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// A loader whose start calls are counted and whose handle is parked
    /// for the test to complete.
    fn parked_loader() -> (OnceLoader, Rc<Cell<usize>>, Rc<RefCell<Option<LoadHandle>>>) {
        let starts = Rc::new(Cell::new(0));
        let parked = Rc::new(RefCell::new(None));
        let (s, p) = (starts.clone(), parked.clone());
        let loader = OnceLoader::new(move |handle| {
            s.set(s.get() + 1);
            *p.borrow_mut() = Some(handle);
        });
        (loader, starts, parked)
    }

    type Calls = Rc<RefCell<Vec<(u32, Result<(), ScriptLoadError>)>>>;

    fn recorder() -> (Calls, impl Fn(u32) -> Waiter) {
        let calls: Calls = Rc::new(RefCell::new(Vec::new()));
        let c = calls.clone();
        let make = move |id: u32| -> Waiter {
            let c = c.clone();
            Box::new(move |result: Result<(), ScriptLoadError>| {
                c.borrow_mut().push((id, result))
            })
        };
        (calls, make)
    }

    #[test]
    fn test_waiters_queue_until_loaded() {
        let (loader, starts, parked) = parked_loader();
        let (calls, make) = recorder();

        loader.subscribe(make(1));
        loader.subscribe(make(2));

        assert_eq!(starts.get(), 1);
        assert!(loader.is_loading());
        assert!(calls.borrow().is_empty());

        parked.borrow_mut().take().unwrap().complete(Ok(()));

        assert!(loader.is_ready());
        assert_eq!(*calls.borrow(), vec![(1, Ok(())), (2, Ok(()))]);

        // Ready: immediate, no new start
        loader.subscribe(make(3));
        assert_eq!(starts.get(), 1);
        assert_eq!(calls.borrow().last(), Some(&(3, Ok(()))));
    }

    #[test]
    fn test_failure_notifies_and_allows_retry() {
        let (loader, starts, parked) = parked_loader();
        let (calls, make) = recorder();
        let error = ScriptLoadError::LoadFailed("https://maps.example/places.js".into());

        loader.subscribe(make(1));
        loader.subscribe(make(2));
        parked.borrow_mut().take().unwrap().complete(Err(error.clone()));

        assert!(!loader.is_loading());
        assert!(!loader.is_ready());
        assert_eq!(
            *calls.borrow(),
            vec![(1, Err(error.clone())), (2, Err(error))]
        );

        loader.subscribe(make(3));
        assert_eq!(starts.get(), 2);
        parked.borrow_mut().take().unwrap().complete(Ok(()));
        assert_eq!(calls.borrow().last(), Some(&(3, Ok(()))));
    }

    #[test]
    fn test_synchronous_completion() {
        let loader = OnceLoader::new(|handle| handle.complete(Ok(())));
        let (calls, make) = recorder();

        loader.subscribe(make(1));

        assert!(loader.is_ready());
        assert_eq!(*calls.borrow(), vec![(1, Ok(()))]);
    }

    #[test]
    fn test_clones_share_state() {
        let (loader, starts, parked) = parked_loader();
        let other = loader.clone();
        let (calls, make) = recorder();

        loader.subscribe(make(1));
        other.subscribe(make(2));
        assert_eq!(starts.get(), 1);

        parked.borrow_mut().take().unwrap().complete(Ok(()));
        assert!(other.is_ready());
        assert_eq!(calls.borrow().len(), 2);
    }

    #[test]
    fn test_waiter_can_resubscribe_during_drain() {
        let loader = OnceLoader::new(|handle| handle.complete(Ok(())));
        let inner_ran = Rc::new(Cell::new(false));

        let (l, flag) = (loader.clone(), inner_ran.clone());
        loader.subscribe(move |_| {
            l.subscribe(move |result| flag.set(result.is_ok()));
        });

        assert!(inner_ran.get());
    }
}
