//! Scriptable browser driver and session for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::browser::{BrowserDriver, BrowserError, BrowserSession};

/// Mock implementation of the [`BrowserDriver`] trait.
///
/// Every `new_session` hands out a handle onto the same scripted
/// session, so a test can configure the page before a run and inspect
/// the interactions afterwards.
pub struct MockBrowserDriver {
    session: MockBrowserSession,
    fail_next_session: Mutex<Option<BrowserError>>,
    sessions_created: AtomicU32,
}

impl Default for MockBrowserDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBrowserDriver {
    pub fn new() -> Self {
        Self {
            session: MockBrowserSession::new(),
            fail_next_session: Mutex::new(None),
            sessions_created: AtomicU32::new(0),
        }
    }

    /// Handle onto the shared scripted session.
    pub fn session(&self) -> MockBrowserSession {
        self.session.clone()
    }

    /// Fail the next `new_session` call.
    pub fn fail_next_session(&self, error: BrowserError) {
        *self.fail_next_session.lock().unwrap() = Some(error);
    }

    pub fn sessions_created(&self) -> u32 {
        self.sessions_created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserDriver for MockBrowserDriver {
    async fn new_session(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        if let Some(err) = self.fail_next_session.lock().unwrap().take() {
            return Err(err);
        }
        self.sessions_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.session.clone()))
    }
}

#[derive(Debug)]
struct SessionState {
    present: Mutex<HashMap<String, bool>>,
    visited: Mutex<Vec<String>>,
    typed: Mutex<Vec<(String, String)>>,
    enter_presses: Mutex<Vec<String>>,
    page_source: Mutex<String>,
    current_url: Mutex<Option<String>>,
    screenshot: Mutex<Vec<u8>>,
    fail_goto: Mutex<Option<BrowserError>>,
    fail_screenshot: AtomicBool,
    fail_close: Mutex<Option<BrowserError>>,
    close_calls: AtomicU32,
}

/// Mock implementation of the [`BrowserSession`] trait.
///
/// Elements only exist once marked present; typing into an unknown
/// selector fails the way a real page would.
#[derive(Clone, Debug)]
pub struct MockBrowserSession {
    state: Arc<SessionState>,
}

impl Default for MockBrowserSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBrowserSession {
    pub fn new() -> Self {
        Self {
            state: Arc::new(SessionState {
                present: Mutex::new(HashMap::new()),
                visited: Mutex::new(Vec::new()),
                typed: Mutex::new(Vec::new()),
                enter_presses: Mutex::new(Vec::new()),
                page_source: Mutex::new(String::new()),
                current_url: Mutex::new(None),
                screenshot: Mutex::new(b"png".to_vec()),
                fail_goto: Mutex::new(None),
                fail_screenshot: AtomicBool::new(false),
                fail_close: Mutex::new(None),
                close_calls: AtomicU32::new(0),
            }),
        }
    }

    /// Mark a selector as matching (or not) on the current page.
    pub fn set_element(&self, selector: &str, present: bool) {
        self.state
            .present
            .lock()
            .unwrap()
            .insert(selector.to_string(), present);
    }

    pub fn set_page_source(&self, html: &str) {
        *self.state.page_source.lock().unwrap() = html.to_string();
    }

    /// Override what `current_url` reports; otherwise it is the last
    /// navigated URL.
    pub fn set_current_url(&self, url: &str) {
        *self.state.current_url.lock().unwrap() = Some(url.to_string());
    }

    pub fn set_screenshot(&self, bytes: Vec<u8>) {
        *self.state.screenshot.lock().unwrap() = bytes;
    }

    /// Fail the next `goto` call.
    pub fn fail_next_goto(&self, error: BrowserError) {
        *self.state.fail_goto.lock().unwrap() = Some(error);
    }

    /// Make every screenshot call fail.
    pub fn fail_screenshots(&self) {
        self.state.fail_screenshot.store(true, Ordering::SeqCst);
    }

    /// Fail the next `close` call.
    pub fn fail_next_close(&self, error: BrowserError) {
        *self.state.fail_close.lock().unwrap() = Some(error);
    }

    /// URLs navigated to, in order.
    pub fn visited(&self) -> Vec<String> {
        self.state.visited.lock().unwrap().clone()
    }

    /// `(selector, text)` pairs typed, in order.
    pub fn typed(&self) -> Vec<(String, String)> {
        self.state.typed.lock().unwrap().clone()
    }

    /// Selectors Enter was pressed on, in order.
    pub fn enter_presses(&self) -> Vec<String> {
        self.state.enter_presses.lock().unwrap().clone()
    }

    pub fn close_calls(&self) -> u32 {
        self.state.close_calls.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> bool {
        self.close_calls() > 0
    }

    fn is_present(&self, selector: &str) -> bool {
        self.state
            .present
            .lock()
            .unwrap()
            .get(selector)
            .copied()
            .unwrap_or(false)
    }

    fn require_present(&self, selector: &str) -> Result<(), BrowserError> {
        if self.is_present(selector) {
            Ok(())
        } else {
            Err(BrowserError::ElementNotFound {
                selector: selector.to_string(),
            })
        }
    }
}

#[async_trait]
impl BrowserSession for MockBrowserSession {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        if let Some(err) = self.state.fail_goto.lock().unwrap().take() {
            return Err(err);
        }
        self.state.visited.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        if let Some(url) = self.state.current_url.lock().unwrap().clone() {
            return Ok(url);
        }
        Ok(self
            .state
            .visited
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn exists(&self, selector: &str) -> Result<bool, BrowserError> {
        Ok(self.is_present(selector))
    }

    async fn type_into(&self, selector: &str, text: &str) -> Result<(), BrowserError> {
        self.require_present(selector)?;
        self.state
            .typed
            .lock()
            .unwrap()
            .push((selector.to_string(), text.to_string()));
        Ok(())
    }

    async fn press_enter(&self, selector: &str) -> Result<(), BrowserError> {
        self.require_present(selector)?;
        self.state
            .enter_presses
            .lock()
            .unwrap()
            .push(selector.to_string());
        Ok(())
    }

    async fn page_source(&self) -> Result<String, BrowserError> {
        Ok(self.state.page_source.lock().unwrap().clone())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError> {
        if self.state.fail_screenshot.load(Ordering::SeqCst) {
            return Err(BrowserError::Api {
                status: 500,
                message: "scripted screenshot failure".to_string(),
            });
        }
        Ok(self.state.screenshot.lock().unwrap().clone())
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.state.close_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.state.fail_close.lock().unwrap().take() {
            return Err(err);
        }
        Ok(())
    }
}
