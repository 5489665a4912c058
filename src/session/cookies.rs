use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieEntry {
    pub name: String,
    pub value: String,
    pub path: String,
    /// Host the cookie belongs to, lowercase, without a leading dot.
    pub domain: String,
    pub expires: Option<DateTime<Utc>>,
    pub secure: bool,
}

impl CookieEntry {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        path: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: path.into(),
            domain: normalize_domain(&domain.into()),
            expires: None,
            secure: false,
        }
    }

    pub fn expires_in(mut self, ttl: Duration) -> Self {
        self.expires = Some(Utc::now() + ttl);
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn is_expired(&self) -> bool {
        self.expires.is_some_and(|at| at <= Utc::now())
    }

    /// Build an entry from a `Set-Cookie` header received for `host` + `request_path`.
    pub fn from_set_cookie(header: &str, host: &str, request_path: &str) -> Option<Self> {
        let parsed = cookie::Cookie::parse(header.to_string()).ok()?;

        let path = match parsed.path() {
            Some(p) if p.starts_with('/') => p.to_string(),
            _ => default_path(request_path),
        };
        let domain = parsed.domain().unwrap_or(host);

        let expires = match parsed.max_age() {
            Some(max_age) => Some(Utc::now() + Duration::seconds(max_age.whole_seconds())),
            None => parsed
                .expires_datetime()
                .and_then(|at| DateTime::from_timestamp(at.unix_timestamp(), 0)),
        };

        Some(Self {
            name: parsed.name().to_string(),
            value: parsed.value().to_string(),
            path,
            domain: normalize_domain(domain),
            expires,
            secure: parsed.secure().unwrap_or(false),
        })
    }

    fn matches_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        host == self.domain || host.ends_with(&format!(".{}", self.domain))
    }

    fn matches_path(&self, request_path: &str) -> bool {
        if request_path == self.path {
            return true;
        }
        request_path.starts_with(&self.path)
            && (self.path.ends_with('/') || request_path[self.path.len()..].starts_with('/'))
    }
}

/// Session cookies carried across requests. Keyed by (name, path, domain);
/// a later `set` for the same key overwrites in place. Nothing is ever
/// swept: expired entries stay queryable until overwritten.
#[derive(Debug, Clone, Default)]
pub struct CookieStore {
    entries: Vec<CookieEntry>,
}

impl CookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, entry: CookieEntry) {
        match self.entries.iter_mut().find(|e| {
            e.name == entry.name && e.path == entry.path && e.domain == entry.domain
        }) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// First cookie named `name` whose path starts with `path_prefix`.
    pub fn get(&self, name: &str, path_prefix: &str) -> Option<&CookieEntry> {
        self.entries
            .iter()
            .find(|e| e.path.starts_with(path_prefix) && e.name == name)
    }

    pub fn value(&self, name: &str, path_prefix: &str) -> Option<&str> {
        self.get(name, path_prefix).map(|e| e.value.as_str())
    }

    /// Record a `Set-Cookie` header. Unparsable headers are ignored.
    pub fn store_set_cookie(&mut self, header: &str, host: &str, request_path: &str) {
        match CookieEntry::from_set_cookie(header, host, request_path) {
            Some(entry) => self.set(entry),
            None => tracing::debug!(header, "ignoring unparsable Set-Cookie"),
        }
    }

    /// `Cookie` header value for a request, or `None` when nothing applies.
    pub fn header_for(&self, host: &str, path: &str, https: bool) -> Option<String> {
        let pairs: Vec<String> = self
            .entries
            .iter()
            .filter(|e| !e.is_expired())
            .filter(|e| https || !e.secure)
            .filter(|e| e.matches_host(host) && e.matches_path(path))
            .map(|e| format!("{}={}", e.name, e.value))
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn normalize_domain(domain: &str) -> String {
    domain.trim_start_matches('.').to_ascii_lowercase()
}

/// Default cookie path: the request path up to, not including, its last `/`.
fn default_path(request_path: &str) -> String {
    if !request_path.starts_with('/') {
        return "/".to_string();
    }
    match request_path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => request_path[..idx].to_string(),
    }
}
