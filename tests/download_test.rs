mod common;

use std::fs;
use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use bbstats::transport::{ScriptedResponse, ScriptedTransport};
use bbstats::{Error, ReportDescriptor, ReportState};

use common::{authenticated, client};

const FILE_NAME: &str = "Game_Downloads_for_23_Apr_2015_to_07_May_2015_by_date.zip";
const CSV: &str = "Date,Country,Downloads\n2015-04-23,DE,42\n";

fn archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn report() -> ReportDescriptor {
    ReportDescriptor {
        file_name: FILE_NAME.into(),
        download_link: format!(
            "https://portal.test/isvportal/reports/downloadData.do?csrfToken=CSRF&fileName={}",
            FILE_NAME
        ),
        delete_link: String::new(),
        state: ReportState::Ready,
    }
}

fn scratch_is_empty(dir: &std::path::Path) -> bool {
    fs::read_dir(dir).map(|mut d| d.next().is_none()).unwrap_or(true)
}

#[test]
fn test_download_parses_rows_and_cleans_up() {
    let scratch = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    transport.push(ScriptedResponse::ok(archive(&[(
        "Game_Downloads_for_23_Apr_2015_to_07_May_2015_by_date.csv",
        CSV,
    )])));
    let mut client = authenticated(&transport, scratch.path());

    let rows = client.download_report(&report(), None, true).unwrap().unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), 3);
    assert_eq!(rows[0]["Date"], "2015-04-23");
    assert_eq!(rows[0]["Country"], "DE");
    assert_eq!(rows[0]["Downloads"], "42");

    assert!(!scratch.path().join(FILE_NAME).exists());
    assert!(!scratch
        .path()
        .join("Game_Downloads_for_23_Apr_2015_to_07_May_2015_by_date")
        .exists());
    assert!(scratch_is_empty(scratch.path()));

    let sent = transport.requests();
    assert_eq!(sent[0].url, report().download_link);
}

#[test]
fn test_download_to_destination_keeps_csv() {
    let scratch = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let destination = out.path().join("reports").join("game.csv");
    let transport = ScriptedTransport::new();
    transport.push(ScriptedResponse::ok(archive(&[("data.csv", CSV)])));
    let mut client = authenticated(&transport, scratch.path());

    let rows = client
        .download_report(&report(), Some(&destination), false)
        .unwrap();

    assert!(rows.is_none());
    assert_eq!(fs::read_to_string(&destination).unwrap(), CSV);
    assert!(scratch_is_empty(scratch.path()));
}

#[test]
fn test_download_without_destination_leaves_nothing() {
    let scratch = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    transport.push(ScriptedResponse::ok(archive(&[("data.csv", CSV)])));
    let mut client = authenticated(&transport, scratch.path());

    assert!(client.download_report(&report(), None, false).unwrap().is_none());
    assert!(scratch_is_empty(scratch.path()));
}

#[test]
fn test_download_picks_csv_entry() {
    let scratch = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    transport.push(ScriptedResponse::ok(archive(&[
        ("README.txt", "not data"),
        ("report.CSV", CSV),
    ])));
    let mut client = authenticated(&transport, scratch.path());

    let rows = client.download_report(&report(), None, true).unwrap().unwrap();
    assert_eq!(rows[0]["Downloads"], "42");
}

#[test]
fn test_download_rejects_invalid_archive() {
    let scratch = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    transport.push(ScriptedResponse::ok("<html>session expired</html>"));
    let mut client = authenticated(&transport, scratch.path());

    let err = client.download_report(&report(), None, true).unwrap_err();

    assert!(matches!(err, Error::Archive(_)), "{:?}", err);
    assert!(scratch_is_empty(scratch.path()));
}

#[test]
fn test_download_archive_without_csv() {
    let scratch = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    transport.push(ScriptedResponse::ok(archive(&[("notes.txt", "nothing")])));
    let mut client = authenticated(&transport, scratch.path());

    let err = client.download_report(&report(), None, true).unwrap_err();

    assert!(matches!(err, Error::MissingCsv(ref name) if name == FILE_NAME));
    assert!(scratch_is_empty(scratch.path()));
}

#[test]
fn test_download_http_error_leaves_no_scratch() {
    let scratch = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    transport.push(ScriptedResponse::with_status(404, "gone"));
    let mut client = authenticated(&transport, scratch.path());

    let err = client.download_report(&report(), None, true).unwrap_err();

    assert!(matches!(err, Error::Status { status: 404, .. }));
    assert!(scratch_is_empty(scratch.path()));
}

#[test]
fn test_download_without_session_sends_nothing() {
    let scratch = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    let mut client = client(&transport, scratch.path());

    let err = client.download_report(&report(), None, true).unwrap_err();

    assert!(matches!(err, Error::NotAuthenticated { operation: "download_report" }));
    assert!(transport.requests().is_empty());
}

#[test]
fn test_download_refuses_dot_only_file_name() {
    let outer = tempfile::tempdir().unwrap();
    let scratch = outer.path().join("scratch");
    fs::create_dir_all(&scratch).unwrap();
    let neighbour = outer.path().join("keep.txt");
    fs::write(&neighbour, "keep").unwrap();

    let transport = ScriptedTransport::new();
    transport.push(ScriptedResponse::ok(archive(&[("data.csv", CSV)])));
    let mut client = authenticated(&transport, &scratch);

    for name in ["...zip", ".zip"] {
        let report = ReportDescriptor {
            file_name: name.into(),
            ..report()
        };
        let err = client.download_report(&report, None, true).unwrap_err();
        assert!(matches!(err, Error::InvalidFileName(_)), "{:?}", err);
    }

    assert!(transport.requests().is_empty());
    assert!(neighbour.exists());
    assert!(scratch.exists());
}
