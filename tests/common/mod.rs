#![allow(dead_code)]

use std::path::Path;

use bbstats::transport::{ScriptedResponse, ScriptedTransport};
use bbstats::{ClientConfig, SessionTokens, StatsClient};

pub const PORTAL: &str = "https://portal.test";
pub const IDENTITY: &str = "https://id.test";

pub fn config(scratch_dir: &Path) -> ClientConfig {
    ClientConfig {
        portal_origin: PORTAL.into(),
        identity_origin: IDENTITY.into(),
        scratch_dir: scratch_dir.to_path_buf(),
        ..Default::default()
    }
}

pub fn client(transport: &ScriptedTransport, scratch_dir: &Path) -> StatsClient {
    StatsClient::with_transport(config(scratch_dir), Box::new(transport.clone())).unwrap()
}

pub fn tokens() -> SessionTokens {
    SessionTokens {
        session_cookie_id: "J1".into(),
        session_cookie_data: "D1".into(),
        server_session_id: "S1".into(),
        csrf_token: "CSRF".into(),
    }
}

/// Client that already holds a session.
pub fn authenticated(transport: &ScriptedTransport, scratch_dir: &Path) -> StatsClient {
    let mut client = client(transport, scratch_dir);
    client.set_login_tokens(tokens());
    client
}

pub fn download_anchor(file_name: &str) -> String {
    format!(
        r#"<tr><td><a href="/isvportal/reports/downloadData.do?csrfToken=CSRF&fileName={0}" class="data-dump data-ready">{0}</a></td></tr>"#,
        file_name
    )
}

pub const IDENTITY_LOGIN_PAGE: &str = r#"
<form id="formId" method="post" action="/bbid/login">
<input type="hidden" name="callbackuri" value="https%3A%2F%2Fportal.test%2Fcb" />
<input type="hidden" name="realm" value="https://portal.test" />
<input type="hidden" name="sig" value="SIG" />
<input type="hidden" name="javax.faces.ViewState" id="javax.faces.ViewState" value="j_id1:j_id2" />
</form>
<script type="text/javascript">
var name = "bbidcchk";
document.cookie = name + " = 1; secure; path=/bbid";
</script>"#;

pub const ASSERTION_PAGE: &str = r#"
<form method="post" action="https://portal.test/isvportal/sso/verifyLogin.do">
<input type="hidden" name="openid.ns" value="http://specs.openid.net/auth/2.0"/>
<input type="hidden" name="openid.mode" value="id_res"/>
<input type="hidden" name="openid.assoc_handle" value="HANDLE"/>
<input type="hidden" name="openid.sig" value="ASSERTED"/>
</form>"#;

/// Queue the five login responses. `server_session` decides whether the
/// portal hands out ISV_SESSION_ID at the end.
pub fn script_login(transport: &ScriptedTransport, server_session: bool) {
    transport.push(
        ScriptedResponse::ok(r#"<a href="/isvportal/sso/loginInitiator.do?csrfToken=T-1">Log in</a>"#)
            .set_cookie("JSESSIONID=J1; Path=/isvportal; Secure; HttpOnly"),
    );
    transport.push(ScriptedResponse::ok(
        r#"<input type="hidden" name="openid.assoc_handle" value="HANDLE"/>"#,
    ));
    transport.push(
        ScriptedResponse::ok(IDENTITY_LOGIN_PAGE).set_cookie("JSESSIONID=IDP; Path=/bbid; Secure"),
    );
    transport.push(ScriptedResponse::ok(ASSERTION_PAGE));

    let mut verify = ScriptedResponse::ok(r#"<a href="/isvportal/home.do?csrfToken=FRESH">Home</a>"#);
    if server_session {
        verify = verify
            .set_cookie("ISV_COOKIE_DATA=D1; Path=/isvportal; Secure")
            .set_cookie("ISV_SESSION_ID=S1; Path=/isvportal; Secure");
    }
    transport.push(verify);
}
