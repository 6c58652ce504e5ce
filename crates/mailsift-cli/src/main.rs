//! `mailsift` - print the messages whose headers match a filter.
//!
//! ```text
//! mailsift [--filter FILE] MESSAGE...
//! ```
//!
//! Without `--filter`, the filter is read from `<config dir>/mailsift/filter.json`
//! when that file exists; otherwise every message matches.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use mailsift::{FilterFile, HeaderMap, resolve_path};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: mailsift [--filter FILE] MESSAGE...";

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays a clean list of paths
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailsift=info,mailsift_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(args) = Args::parse(std::env::args().skip(1))? else {
        println!("{USAGE}");
        return Ok(());
    };

    let filter = load_filter(args.filter.as_deref())?;
    let messages: Vec<String> = filter
        .messages
        .iter()
        .cloned()
        .chain(args.messages)
        .collect();
    if messages.is_empty() {
        bail!("no messages given\n{USAGE}");
    }

    let mut matched = 0usize;
    for name in &messages {
        let path = resolve_path(name)?;
        if select(&filter, &path)? {
            println!("{}", path.display());
            matched += 1;
        }
    }

    info!("{matched} of {} messages matched", messages.len());
    Ok(())
}

/// Parsed command-line arguments.
#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    /// Explicit filter file.
    filter: Option<PathBuf>,
    /// Message files given on the command line.
    messages: Vec<String>,
}

impl Args {
    /// Parses arguments; `None` means help was requested.
    fn parse(args: impl IntoIterator<Item = String>) -> anyhow::Result<Option<Self>> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(None),
                "-f" | "--filter" => {
                    let Some(file) = args.next() else {
                        bail!("{arg} needs a file argument\n{USAGE}");
                    };
                    parsed.filter = Some(PathBuf::from(file));
                }
                flag if flag.starts_with('-') && flag.len() > 1 => {
                    bail!("unknown option {flag}\n{USAGE}");
                }
                _ => parsed.messages.push(arg),
            }
        }

        Ok(Some(parsed))
    }
}

/// Default filter location in the user's config directory.
fn default_filter_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailsift")
        .join("filter.json")
}

fn load_filter(explicit: Option<&Path>) -> anyhow::Result<FilterFile> {
    if let Some(path) = explicit {
        return FilterFile::load(path)
            .with_context(|| format!("Failed to load filter {}", path.display()));
    }

    let path = default_filter_path();
    if !path.exists() {
        debug!("No filter at {}, matching everything", path.display());
        return Ok(FilterFile::default());
    }

    FilterFile::load(&path).with_context(|| format!("Failed to load filter {}", path.display()))
}

/// Reads the header block of the message at `path` and checks it.
fn select(filter: &FilterFile, path: &Path) -> anyhow::Result<bool> {
    let raw = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let headers = HeaderMap::parse(&String::from_utf8_lossy(&raw));

    filter
        .criteria
        .matches(&headers)
        .with_context(|| format!("Failed to match {}", path.display()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> anyhow::Result<Option<Args>> {
        Args::parse(list.iter().map(ToString::to_string))
    }

    #[test]
    fn test_parse_messages_and_filter() {
        let parsed = args(&["a.eml", "--filter", "f.json", "b.eml"]).unwrap().unwrap();
        assert_eq!(
            parsed,
            Args {
                filter: Some(PathBuf::from("f.json")),
                messages: vec!["a.eml".to_string(), "b.eml".to_string()],
            }
        );
    }

    #[test]
    fn test_parse_help() {
        assert!(args(&["a.eml", "-h"]).unwrap().is_none());
    }

    #[test]
    fn test_parse_errors() {
        assert!(args(&["--filter"]).is_err());
        assert!(args(&["--verbose"]).is_err());
    }

    #[test]
    fn test_select_reads_headers() {
        let dir = tempfile::tempdir().unwrap();
        let message = dir.path().join("m.eml");
        std::fs::write(&message, "Subject: invoice 7\r\n\r\nbody\r\n").unwrap();

        let mut filter = FilterFile::default();
        filter.criteria = filter.criteria.subject("invoice");
        assert!(select(&filter, &message).unwrap());

        filter.criteria = filter.criteria.subject("receipt");
        assert!(!select(&filter, &message).unwrap());
    }

    #[test]
    fn test_explicit_filter_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_filter(Some(dir.path().join("nope.json").as_path())).unwrap_err();
        assert!(err.to_string().contains("Failed to load filter"));
    }
}
