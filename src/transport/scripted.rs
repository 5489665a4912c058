use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use url::Url;

use crate::error::{Error, Result};
use crate::session::cookies::CookieStore;

use super::{PortalRequest, PortalResponse, Transport};

/// Canned reply for one request.
#[derive(Debug, Clone)]
pub struct ScriptedResponse {
    pub status: u16,
    pub body: Vec<u8>,
    /// Raw `Set-Cookie` headers, applied relative to the request URL.
    pub set_cookies: Vec<String>,
}

impl ScriptedResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::with_status(200, body)
    }

    pub fn with_status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
            set_cookies: Vec::new(),
        }
    }

    pub fn set_cookie(mut self, header: impl Into<String>) -> Self {
        self.set_cookies.push(header.into());
        self
    }
}

#[derive(Default)]
struct Script {
    responses: VecDeque<ScriptedResponse>,
    sent: Vec<(PortalRequest, Option<String>)>,
}

/// Offline transport replaying queued responses in order.
///
/// Clones share the same script, so a test can keep one handle and give
/// another to the session, then inspect what was sent.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    inner: Rc<RefCell<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: ScriptedResponse) {
        self.inner.borrow_mut().responses.push_back(response);
    }

    /// Every request executed so far, in order.
    pub fn requests(&self) -> Vec<PortalRequest> {
        self.inner
            .borrow()
            .sent
            .iter()
            .map(|(request, _)| request.clone())
            .collect()
    }

    /// `Cookie` header the n-th request would have carried.
    pub fn cookie_header(&self, index: usize) -> Option<String> {
        self.inner
            .borrow()
            .sent
            .get(index)
            .and_then(|(_, header)| header.clone())
    }

    pub fn remaining(&self) -> usize {
        self.inner.borrow().responses.len()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &PortalRequest, cookies: &mut CookieStore) -> Result<PortalResponse> {
        let url = Url::parse(&request.url)?;
        let host = url.host_str().unwrap_or_default();
        let header = cookies.header_for(host, url.path(), url.scheme() == "https");

        let mut script = self.inner.borrow_mut();
        script.sent.push((request.clone(), header));

        let response = script.responses.pop_front().ok_or_else(|| {
            Error::Transport(format!(
                "no scripted response for {} {}",
                request.method, request.url
            ))
        })?;

        for set_cookie in &response.set_cookies {
            cookies.store_set_cookie(set_cookie, host, url.path());
        }

        Ok(PortalResponse {
            status: response.status,
            url: request.url.clone(),
            body: response.body,
        })
    }
}
