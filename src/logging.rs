use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn verbosity_to_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the verbosity flag.
pub fn setup_tracing(verbosity: u8, json: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity_to_level(verbosity).into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(verbosity_to_level(0), LevelFilter::INFO);
        assert_eq!(verbosity_to_level(1), LevelFilter::DEBUG);
        assert_eq!(verbosity_to_level(5), LevelFilter::TRACE);
    }
}
