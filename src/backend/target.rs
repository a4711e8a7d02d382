//! `--backend` values: a local MCP server command line, or a URL.
//!
//! Only local commands can be served today; URLs are recognized so the user
//! gets a clear error instead of a failed spawn of "https://...".

use std::fmt;

use anyhow::{Context, Result, bail};
use url::Url;

/// Where console data calls go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// Server process to spawn for each call.
    LocalCommand { program: String, args: Vec<String> },
    /// http(s) / ws(s) endpoint.
    RemoteUrl(Url),
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSpec::LocalCommand { program, args } => {
                write!(f, "local: {}", shell_words::join(std::iter::once(program).chain(args)))
            }
            TargetSpec::RemoteUrl(url) => write!(f, "remote: {url}"),
        }
    }
}

fn remote_url(raw: &str) -> Option<Url> {
    Url::parse(raw)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https" | "ws" | "wss"))
}

/// Classify a backend target. Anything that is not a web URL is split with
/// shell rules into program and arguments.
pub fn parse_target(raw: &str) -> Result<TargetSpec> {
    let raw = raw.trim();
    if raw.is_empty() {
        bail!("Backend target is empty");
    }
    if let Some(url) = remote_url(raw) {
        return Ok(TargetSpec::RemoteUrl(url));
    }

    let mut words = shell_words::split(raw)
        .context("Failed to parse backend command line (unbalanced quotes?)")?
        .into_iter();
    match words.next() {
        Some(program) if !program.is_empty() => Ok(TargetSpec::LocalCommand {
            program,
            args: words.collect(),
        }),
        _ => bail!("Empty program name in backend command"),
    }
}
