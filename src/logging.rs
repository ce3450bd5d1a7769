use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Logs to stderr so stdout only carries decoded output. Each `-v` raises the level by one.
pub fn setup_logging(verbosity: u64) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let format = tracing_subscriber::fmt::format()
        .with_target(false)
        .with_line_number(false)
        .without_time();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .event_format(format);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(Targets::new().with_default(level))
        .init();
}
