//! Log subscriber setup.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "cepet=info,cepet_rag=info";

/// Install the global `fmt` subscriber.
///
/// `RUST_LOG` wins when set; `verbose` raises the default to `debug`.
/// Logs go to stderr so answers on stdout can be piped.
pub fn init(verbose: bool) {
    let default = if verbose { "cepet=debug,cepet_rag=debug" } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
