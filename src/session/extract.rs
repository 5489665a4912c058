//! Single-capture field extraction from scraped HTML and inline scripts.
//!
//! Every function here returns an empty string when nothing matches. An
//! absent field is not an error at this layer; it travels on as an empty
//! parameter and the remote side decides whether the request is acceptable.

use std::sync::LazyLock;

use regex::Regex;

/// Identity-provider login page sets its cookie-support check from script:
///
/// ```text
/// var name = "bbidcchk";
/// document.cookie = name + " = 1; secure; path=/bbid";
/// ```
///
/// A plain HTTP client never runs that script, so the value is scraped and
/// written into the cookie store by hand. Breaks if the page stops using
/// exactly this shape.
static CLIENT_SIDE_COOKIE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)"bbidcchk";.+?document\.cookie *=.+?= *([^;]*) *;"#).unwrap()
});

pub const CLIENT_SIDE_COOKIE_NAME: &str = "bbidcchk";
pub const CLIENT_SIDE_COOKIE_PATH: &str = "/bbid";

/// Capture everything between the first match of `prefix` and the next
/// `suffix`, URL-decoded.
///
/// `prefix` and `suffix` are regex fragments. The capture stops at the first
/// occurrence of the suffix's first character, so `('value="', '"')`
/// captures an attribute value.
pub fn extract(text: &str, prefix: &str, suffix: &str) -> String {
    let Some(stop) = suffix.chars().next() else {
        return String::new();
    };
    let pattern = format!(
        "{}([^{}]*){}",
        prefix,
        regex::escape(&stop.to_string()),
        suffix
    );

    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            tracing::debug!(pattern, error = %e, "invalid extraction pattern");
            return String::new();
        }
    };

    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| url_decode(m.as_str()))
        .unwrap_or_default()
}

/// Value of the hidden input `name`, allowing other attributes between
/// `name` and `value`.
pub fn hidden_field(text: &str, name: &str) -> String {
    extract(text, &format!(r#"name="{}".+?value=""#, regex::escape(name)), "\"")
}

/// Value of the hidden input `name` whose `value` attribute follows
/// immediately. Needed where a looser match would hit a longer field name
/// first (`email` vs `confirmedemail`).
pub fn adjacent_field(text: &str, name: &str) -> String {
    extract(text, &format!(r#"name="{}" value=""#, regex::escape(name)), "\"")
}

pub fn client_side_cookie(text: &str) -> String {
    CLIENT_SIDE_COOKIE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Raw percent-decoding; `+` is left alone.
fn url_decode(value: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(value.as_bytes())).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTH_PAGE: &str = r#"
<form id="formId" method="post" action="/bbid/login">
<input type="hidden" name="callbackuri" id="cb" value="https%3A%2F%2Fappworld.blackberry.com%2Fverify" />
<input type="hidden" name="sig" value="a+b%2Fc" />
<input type="hidden" name="email" value="" />
<input type="hidden" name="requireConfirmedEmail" value="true" />
</form>
<script type="text/javascript">
    var name = "bbidcchk";
    document.cookie = name + " = 1; secure; path=/bbid";
</script>
"#;

    #[test]
    fn test_extract_decodes_capture() {
        assert_eq!(
            hidden_field(AUTH_PAGE, "callbackuri"),
            "https://appworld.blackberry.com/verify"
        );
        assert_eq!(hidden_field(AUTH_PAGE, "sig"), "a+b/c");
    }

    #[test]
    fn test_extract_missing_is_empty() {
        assert_eq!(hidden_field(AUTH_PAGE, "javax.faces.ViewState"), "");
        assert_eq!(extract("", "csrfToken=", "\""), "");
        assert_eq!(extract(AUTH_PAGE, "sig", ""), "");
    }

    #[test]
    fn test_extract_invalid_pattern_is_empty() {
        assert_eq!(extract(AUTH_PAGE, "name=(", "\""), "");
    }

    #[test]
    fn test_extract_first_occurrence_only() {
        let text = r#"<a href="home.do?csrfToken=FIRST">x</a><a href="home.do?csrfToken=SECOND">"#;
        assert_eq!(extract(text, r"home\.do\?csrfToken=", "\""), "FIRST");
    }

    #[test]
    fn test_extract_is_deterministic() {
        let a = extract(AUTH_PAGE, r#"name="sig" value=""#, "\"");
        let b = extract(AUTH_PAGE, r#"name="sig" value=""#, "\"");
        assert_eq!(a, b);
    }

    #[test]
    fn test_multi_char_suffix() {
        let text = r#"<a href="/isvportal/home.do?csrfToken=AB-CD">Home</a>"#;
        assert_eq!(extract(text, r"\?csrfToken=", "\">"), "AB-CD");
    }

    #[test]
    fn test_adjacent_field() {
        assert_eq!(adjacent_field(AUTH_PAGE, "email"), "");
        let text = r#"<input name="openid.assoc_handle" value="h-1"/>"#;
        assert_eq!(adjacent_field(text, "openid.assoc_handle"), "h-1");
    }

    #[test]
    fn test_client_side_cookie() {
        assert_eq!(client_side_cookie(AUTH_PAGE), "1");
        assert_eq!(client_side_cookie("<html></html>"), "");
    }
}
