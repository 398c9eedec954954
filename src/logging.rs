use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the stderr subscriber. `RUST_LOG` wins over `verbose`.
pub fn init(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_ansi(console::colors_enabled_stderr());

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init();
}
