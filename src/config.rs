use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;
use crate::reports::naming::NamingTemplates;

pub const DEFAULT_PORTAL_ORIGIN: &str = "https://appworld.blackberry.com";
pub const DEFAULT_IDENTITY_ORIGIN: &str = "https://blackberryid.blackberry.com";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 6.1; WOW64; rv:37.0) Gecko/20100101 Firefox/37.0";

/// Path every portal session cookie is scoped to.
pub const PORTAL_COOKIE_PATH: &str = "/isvportal";

/// Lifetime given to cookies this crate writes itself (resumed sessions and
/// the identity provider's script-set check cookie).
pub const SEEDED_COOKIE_TTL_HOURS: i64 = 24;

/// Maximum redirect hops the HTTP transport follows for one request.
pub const MAX_REDIRECTS: usize = 10;

/// Client settings. Everything has a working default; the CLI reads
/// overrides from the `[client]` table of `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub portal_origin: String,
    pub identity_origin: String,
    pub user_agent: String,
    /// Skip TLS certificate verification (the portal has served broken
    /// chains in the past).
    pub accept_invalid_certs: bool,
    /// Downloaded archives are stored and extracted here. Must be writable.
    pub scratch_dir: PathBuf,
    pub templates: NamingTemplates,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            portal_origin: DEFAULT_PORTAL_ORIGIN.to_string(),
            identity_origin: DEFAULT_IDENTITY_ORIGIN.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: false,
            scratch_dir: std::env::temp_dir().join("bbstats"),
            templates: NamingTemplates::default(),
        }
    }
}

/// Resolved URLs of the two cooperating hosts.
#[derive(Debug, Clone)]
pub struct Endpoints {
    portal: Url,
    identity: Url,
}

impl Endpoints {
    pub fn new(portal_origin: &str, identity_origin: &str) -> Result<Self> {
        Ok(Self {
            portal: Url::parse(portal_origin)?,
            identity: Url::parse(identity_origin)?,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(&config.portal_origin, &config.identity_origin)
    }

    /// Portal origin without a trailing slash, e.g. `https://appworld.blackberry.com`.
    pub fn portal_origin(&self) -> &str {
        self.portal.as_str().trim_end_matches('/')
    }

    pub fn portal_host(&self) -> &str {
        self.portal.host_str().unwrap_or_default()
    }

    pub fn identity_host(&self) -> &str {
        self.identity.host_str().unwrap_or_default()
    }

    pub fn portal_url(&self, path: &str) -> String {
        format!("{}{}", self.portal_origin(), path)
    }

    pub fn identity_url(&self, path: &str) -> String {
        format!("{}{}", self.identity.as_str().trim_end_matches('/'), path)
    }

    // -- Login handshake ------------------------------------------------------

    pub fn home(&self) -> String {
        self.portal_url("/isvportal/home.do")
    }

    pub fn login_initiator(&self, jsessionid: &str) -> String {
        self.portal_url(&format!(
            "/isvportal/sso/loginInitiator.do;jsessionid={}",
            jsessionid
        ))
    }

    pub fn openid_auth(&self) -> String {
        self.identity_url("/openid/auth")
    }

    pub fn identity_login(&self) -> String {
        self.identity_url("/bbid/login")
    }

    pub fn verify_login(&self) -> String {
        self.portal_url("/isvportal/sso/verifyLogin.do")
    }

    pub fn logout(&self) -> String {
        self.portal_url("/isvportal/logout.do")
    }

    // -- Reports --------------------------------------------------------------

    pub fn reports_home(&self, csrf_token: &str) -> String {
        self.portal_url(&format!("/isvportal/reports/home.do?csrfToken={}", csrf_token))
    }

    pub fn schedule_page(&self, csrf_token: &str) -> String {
        self.portal_url(&format!(
            "/isvportal/reports/scheduleDataPage.do?csrfToken={}",
            csrf_token
        ))
    }

    pub fn schedule(&self) -> String {
        self.portal_url("/isvportal/reports/scheduleData.do")
    }

    pub fn download_list(&self) -> String {
        self.portal_url("/isvportal/reports/fetchDownloadListAction.do")
    }

    pub fn download(&self, csrf_token: &str, file_name: &str) -> String {
        self.portal_url(&format!(
            "/isvportal/reports/downloadData.do?csrfToken={}&fileName={}",
            csrf_token, file_name
        ))
    }

    pub fn delete(&self, csrf_token: &str, file_name: &str) -> String {
        self.portal_url(&format!(
            "/isvportal/reports/deleteData.do?csrfToken={}&fileName={}",
            csrf_token, file_name
        ))
    }

    pub fn delete_all(&self) -> String {
        self.portal_url("/isvportal/reports/deleteAllData.do")
    }

    pub fn products(&self) -> String {
        self.portal_url("/isvportal/reports/fetchProductsAction.do")
    }
}
