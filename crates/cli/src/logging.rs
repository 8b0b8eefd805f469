use tracing_subscriber::EnvFilter;

/// Send logs to stderr so they stay out of the answers on stdout.
pub fn setup_logging(verbose: u8) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "warn,quotebot=info,runtime=info,mcp=info",
            _ => "info,quotebot=trace,runtime=trace,mcp=debug",
        })
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
