//! Owned chromedriver child process.
//!
//! Only local endpoints can be autostarted. The process is killed on
//! [`DriverProcess::shutdown`] or, failing that, on drop.

use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use super::DriverError;

/// Default chromedriver port.
pub const DEFAULT_DRIVER_PORT: u16 = 9515;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(200);
const CONNECT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// A running chromedriver owned by the current run.
#[derive(Debug)]
pub struct DriverProcess {
    child: Option<Child>,
    port: u16,
}

impl DriverProcess {
    /// Spawns `binary` listening on the port of `endpoint` and waits until it
    /// accepts connections.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::ProcessStart`] when the endpoint is not local, the
    /// binary cannot be spawned, it exits early, or it is not ready within
    /// `startup_timeout`.
    pub async fn spawn(
        binary: &Path,
        endpoint: &str,
        startup_timeout: Duration,
    ) -> Result<Self, DriverError> {
        let (host, port) = local_endpoint(endpoint).ok_or_else(|| {
            DriverError::process_start(
                binary,
                format!("cannot autostart for non-local endpoint {endpoint}"),
            )
        })?;

        let child = Command::new(binary)
            .arg(format!("--port={port}"))
            .arg("--log-level=SEVERE")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| DriverError::process_start(binary, e.to_string()))?;
        let mut process = Self {
            child: Some(child),
            port,
        };
        debug!(binary = %binary.display(), port, "Spawned browser driver");

        let steps = (startup_timeout.as_millis() / READY_POLL_INTERVAL.as_millis()).max(1);
        for _ in 0..steps {
            if endpoint_reachable(&host, port).await {
                info!(port, "Browser driver ready");
                return Ok(process);
            }
            if let Some(status) = process.exit_status() {
                return Err(DriverError::process_start(
                    binary,
                    format!("exited early with status {status}"),
                ));
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }

        process.kill();
        Err(DriverError::process_start(
            binary,
            format!("not ready within {}s", startup_timeout.as_secs()),
        ))
    }

    /// Returns the port the driver listens on.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Stops the driver process.
    pub fn shutdown(mut self) {
        self.kill();
    }

    fn exit_status(&mut self) -> Option<std::process::ExitStatus> {
        self.child.as_mut().and_then(|child| child.try_wait().ok().flatten())
    }

    fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(error) = child.kill() {
                debug!(error = %error, "Browser driver already stopped");
            }
            if let Err(error) = child.wait() {
                warn!(error = %error, "Failed to reap browser driver process");
            }
        }
    }
}

impl Drop for DriverProcess {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Returns host and port when `endpoint` points at this machine.
fn local_endpoint(endpoint: &str) -> Option<(String, u16)> {
    let parsed = Url::parse(endpoint).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    if host != "localhost" && host != "127.0.0.1" {
        return None;
    }
    let port = parsed.port().unwrap_or(DEFAULT_DRIVER_PORT);
    Some((host, port))
}

async fn endpoint_reachable(host: &str, port: u16) -> bool {
    matches!(
        tokio::time::timeout(
            CONNECT_PROBE_TIMEOUT,
            tokio::net::TcpStream::connect((host, port))
        )
        .await,
        Ok(Ok(_))
    )
}
