//! Hand-off of a URL to the desktop's default handler.

use std::io;

/// Opens a URL outside the automated session.
pub trait ManualOpener: Send + Sync {
    /// Opens `url`.
    ///
    /// # Errors
    ///
    /// Returns the IO error reported by the platform launcher.
    fn open(&self, url: &str) -> io::Result<()>;
}

/// Opens URLs in the system default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl ManualOpener for SystemOpener {
    fn open(&self, url: &str) -> io::Result<()> {
        webbrowser::open(url)
    }
}
