use reqwest::blocking::{Client, ClientBuilder};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, COOKIE, LOCATION, PRAGMA,
    SET_COOKIE,
};
use reqwest::redirect::Policy;
use tracing::debug;
use url::Url;

use crate::config::{ClientConfig, MAX_REDIRECTS};
use crate::error::{Error, Result};
use crate::session::cookies::CookieStore;

use super::{Method, PortalRequest, PortalResponse, Transport};

/// Blocking HTTP transport that looks like a desktop browser to the portal.
///
/// Redirects are followed here instead of inside reqwest so that cookies set
/// on intermediate hops (the OpenID handshake bounces between both hosts)
/// end up in the session's cookie store.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = client_builder(config).build()?;
        Ok(Self { client })
    }
}

/// Browser-like defaults. Redirects stay off; `execute` follows them.
fn client_builder(config: &ClientConfig) -> ClientBuilder {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert("DNT", HeaderValue::from_static("1"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .redirect(Policy::none())
        .danger_accept_invalid_certs(config.accept_invalid_certs)
}

impl Transport for HttpTransport {
    fn execute(&self, request: &PortalRequest, cookies: &mut CookieStore) -> Result<PortalResponse> {
        let mut url = Url::parse(&request.url)?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        let mut method = request.method;

        for _ in 0..=MAX_REDIRECTS {
            let host = url.host_str().unwrap_or_default().to_string();
            let path = url.path().to_string();

            let mut builder = match method {
                Method::Get => self.client.get(url.clone()),
                Method::Post => self.client.post(url.clone()).form(&request.form),
            };
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(cookie) = cookies.header_for(&host, &path, url.scheme() == "https") {
                builder = builder.header(COOKIE, cookie);
            }

            let response = builder.send()?;

            for value in response.headers().get_all(SET_COOKIE) {
                if let Ok(header) = value.to_str() {
                    cookies.store_set_cookie(header, &host, &path);
                }
            }

            let status = response.status();
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            if let Some(location) = location.filter(|_| status.is_redirection()) {
                let next = url.join(&location)?;
                if matches!(status.as_u16(), 301..=303) {
                    method = Method::Get;
                }
                debug!(status = status.as_u16(), from = %url, to = %next, "following redirect");
                url = next;
                continue;
            }

            let body = response.bytes()?.to_vec();
            return Ok(PortalResponse {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        Err(Error::Transport(format!(
            "more than {} redirects for {}",
            MAX_REDIRECTS, request.url
        )))
    }
}
