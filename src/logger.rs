use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Installs the global `tracing` subscriber. The filter comes from
/// `SKILLSTAT_LOG`, then `RUST_LOG`, else `debug` when verbose and `info`
/// otherwise.
pub fn init_logging(verbose: bool) {
    let filter = std::env::var("SKILLSTAT_LOG")
        .or_else(|_err| std::env::var("RUST_LOG"))
        .map_or_else(
            |_err| {
                if verbose {
                    EnvFilter::new("debug")
                } else {
                    EnvFilter::new("info")
                }
            },
            |value| EnvFilter::try_new(value).unwrap_or_else(|_err| EnvFilter::new("info")),
        );

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_is_idempotent() {
        init_logging(false);
        init_logging(true);
        tracing::debug!("logging installed");
    }
}
