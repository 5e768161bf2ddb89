//! Tracing setup for the CLI. Logs go to stderr so replies on stdout stay clean.

use tracing_subscriber::EnvFilter;

/// Installs a stderr subscriber when `verbose`; otherwise logging stays off.
///
/// `RUST_LOG` overrides the default filter `warn,chatgraph=debug`.
pub fn init_tracing(verbose: bool) {
    if !verbose {
        return;
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,chatgraph=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
