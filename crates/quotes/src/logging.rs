use tracing_subscriber::EnvFilter;

/// Log to stderr; stdout carries the protocol.
pub fn setup_logging(verbose: u8) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info,quotes=debug,mcp=debug",
            _ => "debug,quotes=trace,mcp=trace",
        })
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
