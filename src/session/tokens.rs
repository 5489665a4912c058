use std::fmt;

use serde::{Deserialize, Serialize};

pub const SESSION_COOKIE: &str = "JSESSIONID";
pub const COOKIE_DATA_COOKIE: &str = "ISV_COOKIE_DATA";
pub const SERVER_SESSION_COOKIE: &str = "ISV_SESSION_ID";

/// The four values that make up an authenticated portal session.
///
/// A session is either fully present or absent (`Option<SessionTokens>`),
/// never partial. Field names serialize the way the portal names the
/// cookies so saved sessions stay readable.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    #[serde(rename = "JSESSIONID")]
    pub session_cookie_id: String,
    #[serde(rename = "ISV_COOKIE_DATA")]
    pub session_cookie_data: String,
    #[serde(rename = "ISV_SESSION_ID")]
    pub server_session_id: String,
    #[serde(rename = "csrfToken")]
    pub csrf_token: String,
}

impl fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokens")
            .field("session_cookie_id", &"<redacted>")
            .field("session_cookie_data", &"<redacted>")
            .field("server_session_id", &"<redacted>")
            .field("csrf_token", &self.csrf_token)
            .finish()
    }
}

/// Login credentials, held only for the duration of one login attempt.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
