use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

/// Route `tracing` events to stderr.
///
/// `verbosity` counts `-v` flags: warnings by default, then info, debug and
/// trace. `quiet` silences everything.
pub fn setup_logging(verbosity: u8, quiet: bool) {
    let subscriber = tracing_subscriber::registry()
        .with(level_filter(verbosity, quiet))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        );

    // A second initialisation (e.g. from the Python module) keeps the first.
    let _ = subscriber.try_init();
}

fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::OFF;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}
