use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Initializes a `tracing_subscriber` on stderr using `FOSSIL_LOG` first, then `RUST_LOG`,
/// then a default.
///
/// Log field contract for the fossil tools:
/// - Include `collection` and `key` on any event about a stored value.
/// - Include `version` whenever one specific version is read, saved or deleted.
/// - Include `rpc` on client-side RPC events.
pub fn init_tracing() {
    let filter = env_filter();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Same filter rules as [`init_tracing`], but appends to `path`.
///
/// Used by full-screen front ends where stderr shares the terminal.
pub fn init_tracing_to_file(path: &Path) -> std::io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("FOSSIL_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
