//! Browser launch for the interactive authorization step

use tracing::info;

use crate::error::{Error, Result};

/// Opens the authorization URL for the user.
pub trait BrowserLauncher: Send + Sync {
    fn open(&self, url: &str) -> Result<()>;
}

/// The platform's default browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        open::that_detached(url).map_err(|e| Error::Browser(e.to_string()))
    }
}

/// Logs the URL instead of opening it, for headless hosts where the user
/// copies the link by hand.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogBrowser;

impl BrowserLauncher for LogBrowser {
    fn open(&self, url: &str) -> Result<()> {
        info!(url, "open this URL in a browser to authorize");
        Ok(())
    }
}
