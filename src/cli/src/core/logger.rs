use env_logger::{Builder, Target};
use log::LevelFilter;

/// Installs the process logger on stderr. `--debug` forces `debug`; a `RUST_LOG`
/// variable overrides both. Later calls are ignored.
pub fn init(level: LevelFilter, debug: bool) {
    let level = if debug { LevelFilter::Debug } else { level };

    let mut builder = Builder::new();
    builder
        .filter_level(level)
        .target(Target::Stderr)
        .format_timestamp_millis();
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init(LevelFilter::Info, false);
        init(LevelFilter::Warn, true);
        log::info!("logger installed");
    }
}
