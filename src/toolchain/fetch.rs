//! HTTP transport for release archives.
//!
//! Retries live here and only here: the resolver calls `fetch` once and
//! treats any error as fatal for the run.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cli::output;
use crate::error::InstallError;

/// Retrieve the bytes at a URL into a file.
pub trait Fetch {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), InstallError>;
}

/// Maximum number of attempts per download.
const MAX_ATTEMPTS: u32 = 3;

/// Base delay between attempts; doubled after each failure.
const BASE_RETRY_DELAY_MS: u64 = 1000;

/// Whole-request timeout.
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Blocking reqwest client with a small retry budget.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, InstallError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("agent-env/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| InstallError::Download {
                url: String::new(),
                reason: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    fn attempt(&self, url: &str, dest: &Path) -> Result<u64, String> {
        let mut response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?;

        let mut file = File::create(dest)
            .map_err(|e| format!("failed to create {}: {e}", dest.display()))?;
        let written = response.copy_to(&mut file).map_err(|e| e.to_string())?;
        file.flush()
            .map_err(|e| format!("failed to write {}: {e}", dest.display()))?;
        Ok(written)
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), InstallError> {
        let pb = output::spinner(&format!("Downloading {url}"));
        let mut last_error = String::new();

        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                let delay = BASE_RETRY_DELAY_MS * 2u64.pow(attempt - 2);
                warn!(attempt, max = MAX_ATTEMPTS, "retrying download in {delay}ms");
                pb.set_message(format!(
                    "Downloading {url} (attempt {attempt}/{MAX_ATTEMPTS})"
                ));
                std::thread::sleep(Duration::from_millis(delay));
            }

            match self.attempt(url, dest) {
                Ok(bytes) => {
                    pb.finish_and_clear();
                    debug!(url, bytes, "download complete");
                    return Ok(());
                }
                Err(e) => {
                    debug!(url, attempt, error = %e, "download attempt failed");
                    let _ = std::fs::remove_file(dest);
                    last_error = e;
                }
            }
        }

        pb.finish_and_clear();
        Err(InstallError::Download {
            url: url.to_string(),
            reason: format!("{last_error} (after {MAX_ATTEMPTS} attempts)"),
        })
    }
}
