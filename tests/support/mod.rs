//! Shared helpers for integration tests: socket guard and in-memory browser.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use letter_harvester::config::HarvestSettings;
use letter_harvester::driver::{
    BrowserSession, DriverError, DriverFailure, DriverStatus, ManualOpener, SessionLauncher,
};
use wiremock::MockServer;

/// Returns true (and logs why) when localhost sockets cannot be bound here.
#[track_caller]
pub fn should_skip_socket_bound_test() -> bool {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return false;
    }
    let location = std::panic::Location::caller();
    eprintln!(
        "[socket-bound-test] cannot bind localhost socket at {}:{}; skipping",
        location.file(),
        location.line()
    );
    true
}

pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if should_skip_socket_bound_test() {
        None
    } else {
        Some(MockServer::start().await)
    }
}

/// A localhost URL on a port nothing listens on.
pub fn closed_port_url(path: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}{path}")
}

/// Settings pointed at a mock server, with zero delays.
pub fn test_settings(server_uri: &str, output_dir: &Path) -> HarvestSettings {
    HarvestSettings {
        source_url: format!("{server_uri}/letters"),
        output_dir: output_dir.to_path_buf(),
        retry_delay_secs: 0,
        download_settle_secs: 0,
        archive_endpoint: format!("{server_uri}/cdx"),
        connect_timeout_secs: 2,
        read_timeout_secs: 5,
        ..HarvestSettings::default()
    }
}

/// Everything the fake browser saw.
#[derive(Debug, Default)]
pub struct BrowserLog {
    pub launches: usize,
    pub quits: usize,
    pub visited: Vec<String>,
    pub opened: Vec<String>,
    pub download_dirs: Vec<PathBuf>,
}

/// In-memory browser whose navigations fail for configured URLs.
#[derive(Clone, Default)]
pub struct FakeBrowser {
    log: Arc<Mutex<BrowserLog>>,
    failures: Arc<Mutex<HashMap<String, DriverFailure>>>,
    refuse_launch: bool,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// A browser that cannot start a session.
    pub fn refusing_launch() -> Self {
        Self {
            refuse_launch: true,
            ..Self::default()
        }
    }

    /// Makes navigation to `url` fail with `failure`.
    pub fn fail_on(self, url: impl Into<String>, failure: DriverFailure) -> Self {
        self.failures.lock().unwrap().insert(url.into(), failure);
        self
    }

    /// Makes navigation to `url` fail with a Chromium `net::ERR_*` code.
    pub fn fail_with_net_error(self, url: impl Into<String>, code: &str) -> Self {
        let failure = DriverFailure::new(DriverStatus::UnknownError, format!("unknown error: net::{code}"));
        self.fail_on(url, failure)
    }

    pub fn opener(&self) -> Box<dyn ManualOpener> {
        Box::new(FakeOpener {
            log: Arc::clone(&self.log),
        })
    }

    pub fn launches(&self) -> usize {
        self.log.lock().unwrap().launches
    }

    pub fn quits(&self) -> usize {
        self.log.lock().unwrap().quits
    }

    pub fn visited(&self) -> Vec<String> {
        self.log.lock().unwrap().visited.clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.log.lock().unwrap().opened.clone()
    }

    pub fn download_dirs(&self) -> Vec<PathBuf> {
        self.log.lock().unwrap().download_dirs.clone()
    }
}

#[async_trait]
impl SessionLauncher for FakeBrowser {
    async fn launch(&self, download_dir: &Path) -> Result<Box<dyn BrowserSession>, DriverError> {
        if self.refuse_launch {
            return Err(DriverError::session_start(
                "http://localhost:9515",
                "connection refused",
            ));
        }
        let mut log = self.log.lock().unwrap();
        log.launches += 1;
        log.download_dirs.push(download_dir.to_path_buf());
        Ok(Box::new(FakeSession {
            log: Arc::clone(&self.log),
            failures: Arc::clone(&self.failures),
        }))
    }
}

struct FakeSession {
    log: Arc<Mutex<BrowserLog>>,
    failures: Arc<Mutex<HashMap<String, DriverFailure>>>,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverFailure> {
        self.log.lock().unwrap().visited.push(url.to_string());
        match self.failures.lock().unwrap().get(url) {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }

    async fn quit(&mut self) -> Result<(), DriverFailure> {
        self.log.lock().unwrap().quits += 1;
        Ok(())
    }
}

struct FakeOpener {
    log: Arc<Mutex<BrowserLog>>,
}

impl ManualOpener for FakeOpener {
    fn open(&self, url: &str) -> io::Result<()> {
        self.log.lock().unwrap().opened.push(url.to_string());
        Ok(())
    }
}
