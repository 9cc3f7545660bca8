//! Page fetcher that shells out to an external HTTP client binary.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::StatusCode;
use tokio::process::Command;
use tracing::debug;

use crate::fetcher::PageFetcher;
use crate::fetcher_http::{check_status, USER_AGENT};
use crate::{Result, SearchError};

const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
];

const LYNX_USER_AGENT: &str = "Lynx/2.8.9rel.1 libwww-FM/2.14 SSL-MM/1.4.1";

/// External HTTP client binaries the fetcher knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellClient {
    /// `curl`, with a rotating browser user agent.
    Curl,
    /// `lynx -source`.
    Lynx,
}

impl ShellClient {
    /// Executable name looked up in `PATH`.
    pub fn binary_name(&self) -> &'static str {
        match self {
            Self::Curl => "curl",
            Self::Lynx => "lynx",
        }
    }

    fn args(&self, url: &str) -> Vec<String> {
        match self {
            Self::Curl => {
                let agent = BROWSER_USER_AGENTS
                    .choose(&mut rand::thread_rng())
                    .copied()
                    .unwrap_or(USER_AGENT);
                vec![
                    "-s".to_string(),
                    "-L".to_string(),
                    "--compressed".to_string(),
                    "-H".to_string(),
                    format!("User-Agent: {}", agent),
                    "-H".to_string(),
                    "Accept: text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
                    "-H".to_string(),
                    "Accept-Language: en-US,en;q=0.5".to_string(),
                    "-w".to_string(),
                    "\n%{http_code}".to_string(),
                    url.to_string(),
                ]
            }
            Self::Lynx => vec![
                "-source".to_string(),
                format!("-useragent={}", LYNX_USER_AGENT),
                url.to_string(),
            ],
        }
    }
}

/// A page fetcher that runs `curl` or `lynx` as a child process.
///
/// The child is killed if the fetch future is dropped, so an abandoned
/// adapter call does not leave processes behind.
pub struct ShellFetcher {
    client: ShellClient,
    binary: Option<PathBuf>,
}

impl ShellFetcher {
    /// Locates `curl` in `PATH`.
    pub fn curl() -> Self {
        Self::locate(ShellClient::Curl)
    }

    /// Locates `lynx` in `PATH`.
    pub fn lynx() -> Self {
        Self::locate(ShellClient::Lynx)
    }

    /// Locates the client's binary in `PATH`. The fetcher is unavailable if none is found.
    pub fn locate(client: ShellClient) -> Self {
        let binary = which::which(client.binary_name()).ok();
        match &binary {
            Some(path) => debug!("{} found at {}", client.binary_name(), path.display()),
            None => debug!("{} not found in PATH", client.binary_name()),
        }
        Self { client, binary }
    }

    /// Uses an explicit binary path.
    pub fn with_binary(client: ShellClient, binary: impl Into<PathBuf>) -> Self {
        Self {
            client,
            binary: Some(binary.into()),
        }
    }

    /// Returns the resolved binary, if any.
    pub fn binary(&self) -> Option<&Path> {
        self.binary.as_deref()
    }

    /// Returns which client this fetcher drives.
    pub fn client(&self) -> ShellClient {
        self.client
    }
}

#[async_trait]
impl PageFetcher for ShellFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let name = self.client.binary_name();
        let binary = self.binary.as_ref().ok_or_else(|| {
            SearchError::AdapterUnavailable(format!("{} not found in PATH", name))
        })?;

        let output = Command::new(binary)
            .args(self.client.args(url))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SearchError::Process(format!("failed to run {}: {}", name, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SearchError::Process(format!(
                "{} exited with {}: {}",
                name,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        match self.client {
            ShellClient::Curl => {
                let (body, code) = split_status_line(&stdout);
                if let Some(code) = code {
                    let status = StatusCode::from_u16(code)
                        .map_err(|e| SearchError::Parse(format!("bad status {}: {}", code, e)))?;
                    check_status(url, status)?;
                }
                Ok(body.to_string())
            }
            ShellClient::Lynx => Ok(stdout),
        }
    }

    fn is_available(&self) -> bool {
        self.binary.is_some()
    }
}

/// Splits the trailing `-w "\n%{http_code}"` line off curl's output.
fn split_status_line(stdout: &str) -> (&str, Option<u16>) {
    match stdout.rsplit_once('\n') {
        Some((body, last)) => match last.trim().parse::<u16>() {
            Ok(code) => (body, Some(code)),
            Err(_) => (stdout, None),
        },
        None => match stdout.trim().parse::<u16>() {
            Ok(code) => ("", Some(code)),
            Err(_) => (stdout, None),
        },
    }
}
