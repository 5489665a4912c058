pub mod cookies;
pub mod extract;
mod login;
pub mod tokens;

use chrono::Duration;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::{Endpoints, PORTAL_COOKIE_PATH, SEEDED_COOKIE_TTL_HOURS};
use crate::error::{Error, Result};
use crate::transport::{PortalRequest, PortalResponse, Transport};

use cookies::{CookieEntry, CookieStore};
use tokens::{SessionTokens, COOKIE_DATA_COOKIE, SERVER_SESSION_COOKIE, SESSION_COOKIE};

pub use login::ExtractionContext;

/// Authenticated (or not yet authenticated) connection to the portal.
///
/// Owns the cookie store; only the login pipeline, token seeding and the
/// transport ever write to it.
pub struct Session {
    transport: Box<dyn Transport>,
    cookies: CookieStore,
    tokens: Option<SessionTokens>,
    endpoints: Endpoints,
}

impl Session {
    pub fn new(transport: Box<dyn Transport>, endpoints: Endpoints) -> Self {
        Self {
            transport,
            cookies: CookieStore::new(),
            tokens: None,
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn cookies(&self) -> &CookieStore {
        &self.cookies
    }

    pub fn tokens(&self) -> Option<&SessionTokens> {
        self.tokens.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_some()
    }

    pub(crate) fn send(&mut self, request: PortalRequest) -> Result<PortalResponse> {
        debug!(method = %request.method, url = %request.url, "portal request");
        let response = self.transport.execute(&request, &mut self.cookies)?;
        debug!(status = response.status, bytes = response.body.len(), "portal response");
        response.error_for_status()
    }

    /// Tokens for an operation that needs a session. Logs a warning and
    /// fails without touching the network when there is none.
    pub(crate) fn require_tokens(&self, operation: &'static str) -> Result<SessionTokens> {
        match &self.tokens {
            Some(tokens) => Ok(tokens.clone()),
            None => {
                warn!(operation, "login tokens are empty, login first");
                Err(Error::NotAuthenticated { operation })
            }
        }
    }

    /// Reuse a previously obtained session without repeating the login
    /// handshake. Re-seeds the three portal session cookies.
    pub fn set_login_tokens(&mut self, tokens: SessionTokens) {
        let host = self.endpoints.portal_host().to_string();
        let ttl = Duration::hours(SEEDED_COOKIE_TTL_HOURS);

        for (name, value) in [
            (SESSION_COOKIE, &tokens.session_cookie_id),
            (COOKIE_DATA_COOKIE, &tokens.session_cookie_data),
            (SERVER_SESSION_COOKIE, &tokens.server_session_id),
        ] {
            self.cookies.set(
                CookieEntry::new(name, value.as_str(), PORTAL_COOKIE_PATH, host.as_str())
                    .expires_in(ttl),
            );
        }

        debug!("session tokens seeded");
        self.tokens = Some(tokens);
    }

    /// Ask the portal to end the session and drop the local tokens.
    pub fn logout(&mut self) -> Result<()> {
        let tokens = self.require_tokens("logout")?;

        let request = PortalRequest::get(self.endpoints.logout())
            .query("rand", rand::thread_rng().gen_range(1000..=9999).to_string())
            .referer(self.endpoints.reports_home(&tokens.csrf_token));
        let result = self.send(request);

        // The tokens are useless after a logout attempt either way.
        self.tokens = None;
        result?;

        info!("logged out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Method, ScriptedResponse, ScriptedTransport};

    fn endpoints() -> Endpoints {
        Endpoints::new("https://portal.test", "https://id.test").unwrap()
    }

    fn tokens() -> SessionTokens {
        SessionTokens {
            session_cookie_id: "j".into(),
            session_cookie_data: "d".into(),
            server_session_id: "s".into(),
            csrf_token: "CSRF".into(),
        }
    }

    #[test]
    fn test_set_login_tokens_seeds_cookies() {
        let mut session = Session::new(Box::new(ScriptedTransport::new()), endpoints());
        session.set_login_tokens(tokens());

        assert!(session.is_authenticated());
        assert_eq!(session.cookies().value("JSESSIONID", "/isvportal"), Some("j"));
        assert_eq!(session.cookies().value("ISV_COOKIE_DATA", "/isvportal"), Some("d"));
        assert_eq!(session.cookies().value("ISV_SESSION_ID", "/isvportal"), Some("s"));

        let seeded = session.cookies().get("ISV_SESSION_ID", "/isvportal").unwrap();
        assert_eq!(seeded.domain, "portal.test");
        assert!(seeded.expires.is_some());
    }

    #[test]
    fn test_logout_clears_tokens() {
        let transport = ScriptedTransport::new();
        transport.push(ScriptedResponse::ok("bye"));
        let mut session = Session::new(Box::new(transport.clone()), endpoints());
        session.set_login_tokens(tokens());

        session.logout().unwrap();

        assert!(!session.is_authenticated());
        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::Get);
        assert_eq!(sent[0].url, "https://portal.test/isvportal/logout.do");
        let rand: u32 = sent[0].query_value("rand").unwrap().parse().unwrap();
        assert!((1000..=9999).contains(&rand));
    }

    #[test]
    fn test_logout_without_tokens_sends_nothing() {
        let transport = ScriptedTransport::new();
        let mut session = Session::new(Box::new(transport.clone()), endpoints());

        let err = session.logout().unwrap_err();

        assert!(matches!(err, Error::NotAuthenticated { operation: "logout" }));
        assert!(transport.requests().is_empty());
    }
}
