use tracing_subscriber::{fmt, EnvFilter};

/// Installs the stderr subscriber. `RUST_LOG` overrides the default level,
/// which is `info` for this crate or `debug` with `verbose`.
pub fn init(verbose: bool) {
    let default = if verbose {
        "student_progress=debug"
    } else {
        "student_progress=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
