use chrono::Duration;
use tracing::{debug, info, warn};

use crate::config::{Endpoints, PORTAL_COOKIE_PATH, SEEDED_COOKIE_TTL_HOURS};
use crate::error::Result;
use crate::transport::PortalRequest;

use super::cookies::{CookieEntry, CookieStore};
use super::extract::{
    adjacent_field, client_side_cookie, extract, hidden_field, CLIENT_SIDE_COOKIE_NAME,
    CLIENT_SIDE_COOKIE_PATH,
};
use super::tokens::{
    Credentials, SessionTokens, COOKIE_DATA_COOKIE, SERVER_SESSION_COOKIE, SESSION_COOKIE,
};
use super::Session;

/// How one hidden input is located in a scraped form.
#[derive(Debug, Clone, Copy)]
enum FieldRule {
    /// `name="…"` followed somewhere later on the line by `value="…"`.
    Hidden(&'static str),
    /// `name="…" value="…"` with nothing in between.
    Adjacent(&'static str),
}

impl FieldRule {
    fn name(self) -> &'static str {
        match self {
            FieldRule::Hidden(name) | FieldRule::Adjacent(name) => name,
        }
    }

    fn extract(self, text: &str) -> String {
        match self {
            FieldRule::Hidden(name) => hidden_field(text, name),
            FieldRule::Adjacent(name) => adjacent_field(text, name),
        }
    }

    fn extract_all(rules: &[FieldRule], text: &str) -> Vec<(&'static str, String)> {
        rules
            .iter()
            .map(|rule| (rule.name(), rule.extract(text)))
            .collect()
    }
}

/// Hidden inputs of the identity provider's login form, in submission order.
const LOGIN_FORM_FIELDS: &[FieldRule] = &[
    FieldRule::Hidden("formId:logincommandLink"),
    FieldRule::Hidden("callbackuri"),
    FieldRule::Hidden("userdata"),
    FieldRule::Hidden("authtype"),
    FieldRule::Hidden("openidmode"),
    FieldRule::Hidden("css"),
    FieldRule::Hidden("realm"),
    FieldRule::Hidden("requireConfirmedEmail"),
    FieldRule::Adjacent("email"),
    FieldRule::Hidden("rpid"),
    FieldRule::Hidden("sig"),
    FieldRule::Hidden("azEdit"),
    FieldRule::Hidden("javax.faces.ViewState"),
];

/// Signed OpenID positive assertion relayed back to the portal verbatim.
const ASSERTION_FIELDS: &[FieldRule] = &[
    FieldRule::Hidden("openid.ns"),
    FieldRule::Hidden("openid.op_endpoint"),
    FieldRule::Hidden("openid.claimed_id"),
    FieldRule::Hidden("openid.response_nonce"),
    FieldRule::Hidden("openid.mode"),
    FieldRule::Hidden("openid.identity"),
    FieldRule::Hidden("openid.return_to"),
    FieldRule::Adjacent("openid.assoc_handle"),
    FieldRule::Hidden("openid.signed"),
    FieldRule::Hidden("openid.sig"),
    FieldRule::Hidden("openid.ns.ext1"),
    FieldRule::Hidden("openid.ext1.auth_policies"),
    FieldRule::Hidden("openid.ext1.auth_time"),
    FieldRule::Hidden("openid.ns.ext2"),
    FieldRule::Hidden("openid.ext2.mode"),
    FieldRule::Hidden("openid.ext2.type.email"),
    FieldRule::Hidden("openid.ext2.value.email"),
    FieldRule::Hidden("openid.ext2.type.firstname"),
    FieldRule::Hidden("openid.ext2.value.firstname"),
    FieldRule::Hidden("openid.ext2.type.lastname"),
    FieldRule::Hidden("openid.ext2.value.lastname"),
    FieldRule::Hidden("openid.ext2.type.nickname"),
    FieldRule::Hidden("openid.ext2.value.nickname"),
    FieldRule::Hidden("openid.ext2.type.confirmedemail"),
    FieldRule::Hidden("openid.ext2.value.confirmedemail"),
];

/// OpenID 2.0 checkid_setup with attribute exchange, as the portal's own
/// login button sends it.
fn openid_auth_fields(endpoints: &Endpoints, assoc_handle: &str) -> Vec<(&'static str, String)> {
    vec![
        ("openid.ns", "http://specs.openid.net/auth/2.0".into()),
        ("openid.claimed_id", "http://specs.openid.net/auth/2.0/identifier_select".into()),
        ("openid.identity", "http://specs.openid.net/auth/2.0/identifier_select".into()),
        ("openid.return_to", endpoints.verify_login()),
        ("openid.realm", endpoints.portal_origin().to_string()),
        ("openid.assoc_handle", assoc_handle.to_string()),
        ("openid.mode", "checkid_setup".into()),
        ("openid.ns.ext1", "http://openid.net/srv/ax/1.0".into()),
        ("openid.ext1.mode", "fetch_request".into()),
        ("openid.ext1.type.email", "http://axschema.org/contact/email".into()),
        ("openid.ext1.type.firstname", "http://axschema.org/namePerson/first".into()),
        ("openid.ext1.type.lastname", "http://axschema.org/namePerson/last".into()),
        ("openid.ext1.type.nickname", "http://axschema.org/namePerson/friendly".into()),
        ("openid.ext1.type.confirmedemail", "http://axschema.org/contact/confirmedemail".into()),
        ("openid.ext1.required", "email,firstname,lastname,nickname,confirmedemail".into()),
        ("openid.ns.ext2", "http://specs.openid.net/extensions/pape/1.0".into()),
        ("openid.ext2.preferred_auth_policies", String::new()),
        ("openid.ext2.max_auth_age", "60".into()),
    ]
}

/// Values scraped during one login attempt. Dropped when `login` returns.
#[derive(Debug, Clone, Default)]
pub struct ExtractionContext {
    /// Portal session cookie issued on the anonymous home page.
    pub jsessionid: String,
    /// CSRF token linked from the anonymous home page.
    pub csrf_token: String,
    pub assoc_handle: String,
    pub login_form: Vec<(&'static str, String)>,
    /// Value of the script-set `bbidcchk` cookie.
    pub client_side_cookie: String,
    pub assertion: Vec<(&'static str, String)>,
    /// CSRF token of the authenticated portal home page.
    pub session_csrf_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginStep {
    Home,
    LoginInitiator,
    IdentityAuth,
    CredentialSubmit,
    VerifyLogin,
}

/// Each step needs values scraped by every step before it.
const LOGIN_PIPELINE: [LoginStep; 5] = [
    LoginStep::Home,
    LoginStep::LoginInitiator,
    LoginStep::IdentityAuth,
    LoginStep::CredentialSubmit,
    LoginStep::VerifyLogin,
];

impl LoginStep {
    fn request(
        self,
        ctx: &ExtractionContext,
        credentials: &Credentials,
        endpoints: &Endpoints,
    ) -> PortalRequest {
        match self {
            LoginStep::Home => PortalRequest::get(endpoints.home()),
            LoginStep::LoginInitiator => {
                PortalRequest::get(endpoints.login_initiator(&ctx.jsessionid))
                    .query("csrfToken", ctx.csrf_token.as_str())
            }
            LoginStep::IdentityAuth => PortalRequest::post(endpoints.openid_auth())
                .query("csrfToken", ctx.csrf_token.as_str())
                .fields(openid_auth_fields(endpoints, &ctx.assoc_handle)),
            LoginStep::CredentialSubmit => PortalRequest::post(endpoints.identity_login())
                .field("formId", "formId")
                .field("formId:email", credentials.username.as_str())
                .field("formId:password", credentials.password.as_str())
                .fields(ctx.login_form.iter().cloned())
                .field("conversationPropagation", "join"),
            LoginStep::VerifyLogin => {
                PortalRequest::post(endpoints.verify_login()).fields(ctx.assertion.iter().cloned())
            }
        }
    }

    fn absorb(
        self,
        body: &str,
        ctx: &mut ExtractionContext,
        cookies: &mut CookieStore,
        endpoints: &Endpoints,
    ) {
        match self {
            LoginStep::Home => {
                ctx.jsessionid = cookies
                    .value(SESSION_COOKIE, PORTAL_COOKIE_PATH)
                    .unwrap_or_default()
                    .to_string();
                ctx.csrf_token = extract(body, r"\?csrfToken=", "\">");
            }
            LoginStep::LoginInitiator => {
                ctx.assoc_handle = extract(body, r#"openid\.assoc_handle" value=""#, "\"/>");
            }
            LoginStep::IdentityAuth => {
                ctx.login_form = FieldRule::extract_all(LOGIN_FORM_FIELDS, body);
                ctx.client_side_cookie = client_side_cookie(body);
                cookies.set(
                    CookieEntry::new(
                        CLIENT_SIDE_COOKIE_NAME,
                        ctx.client_side_cookie.as_str(),
                        CLIENT_SIDE_COOKIE_PATH,
                        endpoints.identity_host(),
                    )
                    .secure(true)
                    .expires_in(Duration::hours(SEEDED_COOKIE_TTL_HOURS)),
                );
            }
            LoginStep::CredentialSubmit => {
                ctx.assertion = FieldRule::extract_all(ASSERTION_FIELDS, body);
            }
            LoginStep::VerifyLogin => {
                ctx.session_csrf_token = extract(body, r"home\.do\?csrfToken=", "\"");
            }
        }
    }

    /// Number of scraped values that came back empty, for diagnostics.
    fn misses(self, ctx: &ExtractionContext) -> usize {
        fn empty(fields: &[(&str, String)]) -> usize {
            fields.iter().filter(|(_, v)| v.is_empty()).count()
        }

        match self {
            LoginStep::Home => [&ctx.jsessionid, &ctx.csrf_token]
                .iter()
                .filter(|v| v.is_empty())
                .count(),
            LoginStep::LoginInitiator => usize::from(ctx.assoc_handle.is_empty()),
            LoginStep::IdentityAuth => {
                empty(&ctx.login_form) + usize::from(ctx.client_side_cookie.is_empty())
            }
            LoginStep::CredentialSubmit => empty(&ctx.assertion),
            LoginStep::VerifyLogin => usize::from(ctx.session_csrf_token.is_empty()),
        }
    }
}

impl Session {
    /// Run the federated login handshake.
    ///
    /// Returns `Ok(None)` when the portal does not hand out a server session
    /// (wrong credentials look exactly like this). Transport and HTTP
    /// failures are returned as errors. Any previous session is dropped.
    pub fn login(&mut self, username: &str, password: &str) -> Result<Option<SessionTokens>> {
        let credentials = Credentials::new(username, password);

        self.tokens = None;
        self.cookies.clear();

        let ctx = self.run_login_pipeline(&credentials)?;
        self.tokens = self.collect_tokens(&ctx);

        match &self.tokens {
            Some(_) => info!(username, "login succeeded"),
            None => warn!(username, "login failed, portal issued no server session"),
        }
        Ok(self.tokens.clone())
    }

    fn run_login_pipeline(&mut self, credentials: &Credentials) -> Result<ExtractionContext> {
        let mut ctx = ExtractionContext::default();

        for step in LOGIN_PIPELINE {
            let request = step.request(&ctx, credentials, &self.endpoints);
            let response = self.send(request)?;
            step.absorb(&response.text(), &mut ctx, &mut self.cookies, &self.endpoints);
            debug!(step = ?step, missing = step.misses(&ctx), "login step complete");
        }

        Ok(ctx)
    }

    fn collect_tokens(&self, ctx: &ExtractionContext) -> Option<SessionTokens> {
        let server_session_id = self.cookies.value(SERVER_SESSION_COOKIE, PORTAL_COOKIE_PATH)?;

        let session_cookie_id = self.cookies.value(SESSION_COOKIE, PORTAL_COOKIE_PATH);
        let session_cookie_data = self.cookies.value(COOKIE_DATA_COOKIE, PORTAL_COOKIE_PATH);
        let (Some(session_cookie_id), Some(session_cookie_data)) =
            (session_cookie_id, session_cookie_data)
        else {
            warn!("server session issued without the portal session cookies");
            return None;
        };

        Some(SessionTokens {
            session_cookie_id: session_cookie_id.to_string(),
            session_cookie_data: session_cookie_data.to_string(),
            server_session_id: server_session_id.to_string(),
            csrf_token: ctx.session_csrf_token.clone(),
        })
    }
}
