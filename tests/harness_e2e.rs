//! End-to-end tests for the session harness against a real HTTP server.
//!
//! These start an actual mock login service and drive the create and
//! validate phases through the public `harness::run` entry point, checking
//! the on-disk cookie files and the requests the service observed.

mod common;

use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::start_mock_service;
use seshload::config::ProtocolConfig;
use seshload::cookies::read_cookies;
use seshload::harness::{self, HarnessError, HarnessOptions};

/// Options wired to the mock service: no throttle, both phases off.
fn options(host: String, dir: &Path) -> HarnessOptions {
    HarnessOptions {
        iterations: 0,
        create: false,
        validate: false,
        mobile: true,
        desktop: true,
        host,
        email_template: "qa.tester+{}@example.com".to_string(),
        xsrf: "2345".to_string(),
        password: "qwerty12".to_string(),
        mobile_file: dir.join("MobileCookies.txt"),
        desktop_file: dir.join("DesktopCookies.txt"),
        throttle: Duration::ZERO,
        concurrency: 4,
        protocol: ProtocolConfig::default(),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn create_launches_one_attempt_per_iteration() {
    let (host, state) = start_mock_service().await;
    let dir = tempfile::tempdir().unwrap();

    let mut opts = options(host, dir.path());
    opts.create = true;
    opts.iterations = 6;
    let summary = harness::run(opts.clone()).await.unwrap();

    assert_eq!(state.logins.load(Ordering::SeqCst), 6);
    assert_eq!(summary.mobile + summary.desktop, 6);

    let mobile = read_cookies(&opts.mobile_file).await.unwrap();
    let desktop = read_cookies(&opts.desktop_file).await.unwrap();
    assert_eq!(mobile.len() as u64, summary.mobile);
    assert_eq!(desktop.len() as u64, summary.desktop);

    let issued = state.issued.lock().unwrap();
    for cookie in mobile.iter().chain(desktop.iter()) {
        assert!(issued.contains(cookie), "unknown cookie {cookie}");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn create_truncates_cookies_from_prior_runs() {
    let (host, _state) = start_mock_service().await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("MobileCookies.txt"), "\nstale-mobile").unwrap();
    std::fs::write(dir.path().join("DesktopCookies.txt"), "\nstale-desktop").unwrap();

    let mut opts = options(host, dir.path());
    opts.create = true;
    opts.iterations = 4;
    harness::run(opts.clone()).await.unwrap();

    let mobile = read_cookies(&opts.mobile_file).await.unwrap();
    let desktop = read_cookies(&opts.desktop_file).await.unwrap();
    assert!(!mobile.iter().any(|c| c.contains("stale")));
    assert!(!desktop.iter().any(|c| c.contains("stale")));
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_iterations_still_truncates_and_launches_nothing() {
    let (host, state) = start_mock_service().await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("MobileCookies.txt"), "\nstale").unwrap();

    let mut opts = options(host, dir.path());
    opts.create = true;
    opts.iterations = 0;
    let summary = harness::run(opts.clone()).await.unwrap();

    assert_eq!(state.logins.load(Ordering::SeqCst), 0);
    assert_eq!(summary.mobile + summary.desktop, 0);
    assert!(read_cookies(&opts.mobile_file).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn create_then_validate_submits_each_cookie_exactly_once() {
    let (host, state) = start_mock_service().await;
    let dir = tempfile::tempdir().unwrap();

    let mut opts = options(host, dir.path());
    opts.create = true;
    opts.validate = true;
    opts.iterations = 8;
    harness::run(opts).await.unwrap();

    let mut issued = state.issued.lock().unwrap().clone();
    let mut validated = state.validated.lock().unwrap().clone();
    issued.sort();
    validated.sort();
    assert_eq!(validated, issued);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_logins_produce_no_cookie_lines() {
    let (host, state) = start_mock_service().await;
    state.reject_logins.store(true, Ordering::SeqCst);
    let dir = tempfile::tempdir().unwrap();

    let mut opts = options(host, dir.path());
    opts.create = true;
    opts.iterations = 3;
    harness::run(opts.clone()).await.unwrap();

    assert_eq!(state.logins.load(Ordering::SeqCst), 3);
    assert!(read_cookies(&opts.mobile_file).await.unwrap().is_empty());
    assert!(read_cookies(&opts.desktop_file).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn validate_only_reads_whatever_the_files_hold() {
    let (host, state) = start_mock_service().await;
    let dir = tempfile::tempdir().unwrap();

    // Cookies from "a previous run": known to the service, never created here.
    state
        .issued
        .lock()
        .unwrap()
        .extend(["old-1".to_string(), "old-2".to_string(), "old-3".to_string()]);
    std::fs::write(dir.path().join("MobileCookies.txt"), "\nold-1\nold-2").unwrap();
    std::fs::write(dir.path().join("DesktopCookies.txt"), "\nold-3").unwrap();

    let mut opts = options(host, dir.path());
    opts.validate = true;
    harness::run(opts).await.unwrap();

    let mut validated = state.validated.lock().unwrap().clone();
    validated.sort();
    assert_eq!(validated, vec!["old-1", "old-2", "old-3"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn validate_skips_disabled_categories() {
    let (host, state) = start_mock_service().await;
    let dir = tempfile::tempdir().unwrap();

    state
        .issued
        .lock()
        .unwrap()
        .extend(["m-1".to_string(), "d-1".to_string()]);
    std::fs::write(dir.path().join("MobileCookies.txt"), "\nm-1").unwrap();
    std::fs::write(dir.path().join("DesktopCookies.txt"), "\nd-1").unwrap();

    let mut opts = options(host, dir.path());
    opts.validate = true;
    opts.desktop = false;
    harness::run(opts).await.unwrap();

    let validated = state.validated.lock().unwrap().clone();
    assert_eq!(validated, vec!["m-1"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn validate_with_missing_files_is_not_fatal() {
    let (host, state) = start_mock_service().await;
    let dir = tempfile::tempdir().unwrap();

    let mut opts = options(host, dir.path());
    opts.validate = true;
    harness::run(opts).await.unwrap();

    assert!(state.validated.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_email_template_is_rejected_before_any_request() {
    let (host, state) = start_mock_service().await;
    let dir = tempfile::tempdir().unwrap();

    let mut opts = options(host, dir.path());
    opts.create = true;
    opts.iterations = 5;
    opts.email_template = "no-placeholder@example.com".to_string();
    let err = harness::run(opts).await.unwrap_err();

    assert!(matches!(err, HarnessError::InvalidEmailTemplate(_)));
    assert_eq!(state.logins.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn disabling_both_categories_is_rejected() {
    let (host, _state) = start_mock_service().await;
    let dir = tempfile::tempdir().unwrap();

    let mut opts = options(host, dir.path());
    opts.mobile = false;
    opts.desktop = false;
    let err = harness::run(opts).await.unwrap_err();

    assert!(matches!(err, HarnessError::NoCategoriesEnabled));
}
