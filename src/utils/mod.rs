use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber with sensible defaults.
///
/// Logs go to stderr so they never interleave with anything a caller may
/// pipe from stdout.
pub fn init_tracing(verbose: bool) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let directive = if verbose {
            "homebank2hledger=debug"
        } else {
            "homebank2hledger=info"
        };
        let filter = EnvFilter::from_default_env().add_directive(directive.parse().unwrap());

        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    });
}
