//! Integration tests for the harvest run loop.
//!
//! The listing page, documents and CDX index are wiremock endpoints; the
//! browser is the in-memory fake from `support`.

mod support;

use letter_harvester::driver::{DriverFailure, DriverStatus};
use letter_harvester::exit::{ProcessExit, exit_for_report};
use letter_harvester::harvest::{HarvestError, Harvester, LinkOutcome};
use letter_harvester::{FetchFailureKind, HarvestSettings};
use support::{FakeBrowser, closed_port_url, start_mock_server_or_skip, test_settings};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SNAPSHOT_TS: &str = "20230607080910";

fn listing_html(hrefs: &[&str]) -> String {
    let anchors: String = hrefs
        .iter()
        .map(|href| format!(r#"<li><a href="{href}">Letter</a></li>"#))
        .collect();
    format!(
        r#"<html><body><h1>Letters</h1><ul>{anchors}</ul><a href="/about">About</a></body></html>"#
    )
}

async fn mount_listing(server: &MockServer, hrefs: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/letters"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(hrefs)))
        .mount(server)
        .await;
}

async fn mount_document(server: &MockServer, doc_path: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(doc_path))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(b"%PDF-1.4".to_vec()))
        .mount(server)
        .await;
}

async fn mount_cdx(server: &MockServer, url: &str, body: String, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/cdx"))
        .and(query_param("url", url))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn cdx_hit(original: &str) -> String {
    format!(r#"[["timestamp","original"],["20190101000000","{original}"],["{SNAPSHOT_TS}","{original}"]]"#)
}

fn snapshot_url(original: &str) -> String {
    format!("https://web.archive.org/web/{SNAPSHOT_TS}/{original}")
}

fn harvester(settings: HarvestSettings) -> Harvester {
    Harvester::new(settings).unwrap()
}

#[tokio::test]
async fn test_end_to_end_original_snapshot_and_miss() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let uri = server.uri();
    let (a, b, c) = (
        format!("{uri}/a.pdf"),
        format!("{uri}/b.pdf"),
        format!("{uri}/c.pdf"),
    );

    mount_listing(&server, &["/a.pdf", "/b.pdf", "/c.pdf"]).await;
    mount_document(&server, "/a.pdf", 200).await;
    mount_document(&server, "/b.pdf", 404).await;
    mount_document(&server, "/c.pdf", 403).await;
    mount_cdx(&server, &b, cdx_hit(&b), 1).await;
    mount_cdx(&server, &c, "[]".to_string(), 1).await;

    let temp = TempDir::new().unwrap();
    let output_dir = temp.path().join("letters");
    let browser = FakeBrowser::new();

    let report = harvester(test_settings(&uri, &output_dir))
        .run(&browser, browser.opener())
        .await
        .unwrap();

    let outcomes: Vec<LinkOutcome> = report.records().iter().map(|r| r.outcome.clone()).collect();
    assert_eq!(
        outcomes,
        vec![
            LinkOutcome::Downloaded,
            LinkOutcome::DownloadedFromArchive {
                snapshot: snapshot_url(&b)
            },
            LinkOutcome::SkippedArchiveMiss,
        ]
    );
    assert_eq!(browser.visited(), vec![a, snapshot_url(&b)]);
    assert_eq!(browser.launches(), 1);
    assert_eq!(browser.quits(), 1, "driver must be closed exactly once");
    assert!(output_dir.is_dir());
    assert!(browser.download_dirs()[0].is_absolute());
    assert_eq!(exit_for_report(&report), ProcessExit::Success);
}

#[tokio::test]
async fn test_ok_links_never_query_archive() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let uri = server.uri();
    mount_listing(&server, &["/a.pdf", "/b.pdf"]).await;
    mount_document(&server, "/a.pdf", 200).await;
    mount_document(&server, "/b.pdf", 200).await;
    Mock::given(method("GET"))
        .and(path("/cdx"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(0)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let browser = FakeBrowser::new();
    let report = harvester(test_settings(&uri, temp.path()))
        .run(&browser, browser.opener())
        .await
        .unwrap();

    assert_eq!(report.downloaded(), 2);
    assert_eq!(report.from_archive(), 0);
}

#[tokio::test]
async fn test_broken_link_queries_archive_exactly_once() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let uri = server.uri();
    let b = format!("{uri}/b.pdf");
    mount_listing(&server, &["/b.pdf"]).await;
    mount_document(&server, "/b.pdf", 404).await;
    mount_cdx(&server, &b, String::new(), 1).await;

    let temp = TempDir::new().unwrap();
    let browser = FakeBrowser::new();
    let report = harvester(test_settings(&uri, temp.path()))
        .run(&browser, browser.opener())
        .await
        .unwrap();

    assert_eq!(report.records()[0].outcome, LinkOutcome::SkippedArchiveMiss);
    assert!(browser.visited().is_empty());
    assert_eq!(exit_for_report(&report), ProcessExit::Success);
}

#[tokio::test]
async fn test_archive_error_skips_link_and_continues() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let uri = server.uri();
    mount_listing(&server, &["/b.pdf", "/a.pdf"]).await;
    mount_document(&server, "/b.pdf", 403).await;
    mount_document(&server, "/a.pdf", 200).await;
    Mock::given(method("GET"))
        .and(path("/cdx"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let browser = FakeBrowser::new();
    let report = harvester(test_settings(&uri, temp.path()))
        .run(&browser, browser.opener())
        .await
        .unwrap();

    assert!(matches!(
        report.records()[0].outcome,
        LinkOutcome::SkippedArchiveError { .. }
    ));
    assert_eq!(report.records()[1].outcome, LinkOutcome::Downloaded);
    assert_eq!(exit_for_report(&report), ProcessExit::Partial);
}

#[tokio::test]
async fn test_unreachable_link_is_skipped_without_archive() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let uri = server.uri();
    let dead = closed_port_url("/gone.pdf");
    mount_listing(&server, &[dead.as_str()]).await;
    Mock::given(method("GET"))
        .and(path("/cdx"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(0)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let browser = FakeBrowser::new();
    let report = harvester(test_settings(&uri, temp.path()))
        .run(&browser, browser.opener())
        .await
        .unwrap();

    assert_eq!(report.records()[0].outcome, LinkOutcome::SkippedUnreachable);
    assert!(browser.visited().is_empty());
    assert_eq!(exit_for_report(&report), ProcessExit::Failure);
}

#[tokio::test]
async fn test_cipher_mismatch_does_not_stop_loop() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let uri = server.uri();
    let a = format!("{uri}/a.pdf");
    mount_listing(&server, &["/a.pdf", "/b.pdf"]).await;
    mount_document(&server, "/a.pdf", 200).await;
    mount_document(&server, "/b.pdf", 200).await;

    let temp = TempDir::new().unwrap();
    let browser =
        FakeBrowser::new().fail_with_net_error(a.clone(), "ERR_SSL_VERSION_OR_CIPHER_MISMATCH");
    let report = harvester(test_settings(&uri, temp.path()))
        .run(&browser, browser.opener())
        .await
        .unwrap();

    assert_eq!(report.records()[0].outcome, LinkOutcome::SkippedCipherMismatch);
    assert_eq!(report.records()[1].outcome, LinkOutcome::Downloaded);
    assert_eq!(browser.visited().len(), 2);
    assert_eq!(browser.quits(), 1);
    assert_eq!(exit_for_report(&report), ProcessExit::Partial);
}

#[tokio::test]
async fn test_download_handoff_counts_as_download() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let uri = server.uri();
    let a = format!("{uri}/a.pdf");
    mount_listing(&server, &["/a.pdf"]).await;
    mount_document(&server, "/a.pdf", 200).await;

    let temp = TempDir::new().unwrap();
    let browser = FakeBrowser::new().fail_with_net_error(a, "ERR_ABORTED");
    let report = harvester(test_settings(&uri, temp.path()))
        .run(&browser, browser.opener())
        .await
        .unwrap();

    assert_eq!(report.records()[0].outcome, LinkOutcome::Downloaded);
}

#[tokio::test]
async fn test_missing_element_opens_manually_and_continues() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let uri = server.uri();
    let a = format!("{uri}/a.pdf");
    mount_listing(&server, &["/a.pdf", "/b.pdf"]).await;
    mount_document(&server, "/a.pdf", 200).await;
    mount_document(&server, "/b.pdf", 200).await;

    let temp = TempDir::new().unwrap();
    let browser = FakeBrowser::new().fail_on(
        a.clone(),
        DriverFailure::new(DriverStatus::NoSuchElement, "no such element"),
    );
    let report = harvester(test_settings(&uri, temp.path()))
        .run(&browser, browser.opener())
        .await
        .unwrap();

    assert_eq!(report.records()[0].outcome, LinkOutcome::OpenedManually);
    assert_eq!(report.records()[1].outcome, LinkOutcome::Downloaded);
    assert_eq!(browser.opened(), vec![a]);
}

#[tokio::test]
async fn test_fatal_failure_aborts_loop_but_closes_driver() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let uri = server.uri();
    let b = format!("{uri}/b.pdf");
    mount_listing(&server, &["/a.pdf", "/b.pdf", "/c.pdf"]).await;
    mount_document(&server, "/a.pdf", 200).await;
    mount_document(&server, "/b.pdf", 200).await;
    mount_document(&server, "/c.pdf", 200).await;

    let temp = TempDir::new().unwrap();
    let browser = FakeBrowser::new().fail_on(
        b,
        DriverFailure::new(DriverStatus::InvalidSession, "invalid session id"),
    );
    let result = harvester(test_settings(&uri, temp.path()))
        .run(&browser, browser.opener())
        .await;

    match result {
        Err(HarvestError::Aborted { processed, .. }) => assert_eq!(processed, 1),
        other => panic!("expected Aborted, got {other:?}"),
    }
    assert_eq!(browser.visited().len(), 2, "c.pdf must not be attempted");
    assert_eq!(browser.quits(), 1, "driver must still be closed");
}

#[tokio::test]
async fn test_driver_closed_once_when_every_link_fails() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let uri = server.uri();
    let (a, b) = (format!("{uri}/a.pdf"), format!("{uri}/b.pdf"));
    mount_listing(&server, &["/a.pdf", "/b.pdf"]).await;
    mount_document(&server, "/a.pdf", 200).await;
    mount_document(&server, "/b.pdf", 200).await;

    let temp = TempDir::new().unwrap();
    let browser = FakeBrowser::new()
        .fail_with_net_error(a, "ERR_SSL_PROTOCOL_ERROR")
        .fail_with_net_error(b, "ERR_SSL_VERSION_OR_CIPHER_MISMATCH");
    let report = harvester(test_settings(&uri, temp.path()))
        .run(&browser, browser.opener())
        .await
        .unwrap();

    assert_eq!(report.failed(), 2);
    assert_eq!(browser.quits(), 1);
    assert_eq!(exit_for_report(&report), ProcessExit::Failure);
}

#[tokio::test]
async fn test_relative_and_duplicate_links_are_processed_in_order() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let uri = server.uri();
    let a = format!("{uri}/a.pdf");
    mount_listing(&server, &["a.pdf", "/notes.txt", "/a.pdf"]).await;
    mount_document(&server, "/a.pdf", 200).await;

    let temp = TempDir::new().unwrap();
    let browser = FakeBrowser::new();
    let report = harvester(test_settings(&uri, temp.path()))
        .run(&browser, browser.opener())
        .await
        .unwrap();

    assert_eq!(report.total(), 2);
    assert_eq!(browser.visited(), vec![a.clone(), a]);
}

#[tokio::test]
async fn test_listing_page_error_status_aborts_before_browser() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let uri = server.uri();
    Mock::given(method("GET"))
        .and(path("/letters"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let browser = FakeBrowser::new();
    let result = harvester(test_settings(&uri, temp.path()))
        .run(&browser, browser.opener())
        .await;

    assert!(matches!(
        result,
        Err(HarvestError::ListingStatus { status: 503, .. })
    ));
    assert_eq!(browser.launches(), 0);
    assert_eq!(browser.quits(), 0);
}

#[tokio::test]
async fn test_listing_page_unreachable_aborts() {
    let temp = TempDir::new().unwrap();
    let mut settings = test_settings("http://127.0.0.1:9", temp.path());
    settings.source_url = closed_port_url("/letters");
    settings.max_retries = 2;

    let browser = FakeBrowser::new();
    let result = harvester(settings).run(&browser, browser.opener()).await;

    assert!(matches!(
        result,
        Err(HarvestError::ListingUnreachable {
            kind: FetchFailureKind::Connect,
            ..
        })
    ));
    assert_eq!(browser.launches(), 0);
}

#[tokio::test]
async fn test_driver_launch_failure_is_reported() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let uri = server.uri();
    mount_listing(&server, &["/a.pdf"]).await;

    let temp = TempDir::new().unwrap();
    let browser = FakeBrowser::refusing_launch();
    let result = harvester(test_settings(&uri, temp.path()))
        .run(&browser, browser.opener())
        .await;

    assert!(matches!(result, Err(HarvestError::DriverLaunch { .. })));
}
