use tracing_subscriber::EnvFilter;

pub const ENV_LOG: &str = "TRAINDAY_LOG";

/// Logs go to stderr so `--json` output on stdout stays clean.
/// `TRAINDAY_LOG` takes the usual `EnvFilter` syntax, default `warn`.
pub fn init() {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("warn"));

    // Fails only when a subscriber is already set.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
