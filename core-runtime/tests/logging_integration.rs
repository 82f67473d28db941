//! Integration tests for logging system

use core_runtime::logging::{init_logging, strip_path, LogFormat, LogLevel, LoggingConfig};

#[test]
fn test_logging_config() {
    // Only one subscriber per process, so most checks stay on the builder
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_spans(false);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.enable_spans);
    assert!(config.filter.is_none());
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/home/user/music/song.mp3"), "song.mp3");
    assert_eq!(strip_path("C:\\Users\\John\\Music\\song.mp3"), "song.mp3");
    assert_eq!(strip_path("song.mp3"), "song.mp3");
    assert_eq!(strip_path("/var/log/"), "");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    assert_eq!(LogFormat::default(), LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LogFormat::default(), LogFormat::Json);
}

#[test]
fn test_second_initialization_fails() {
    let first = init_logging(LoggingConfig::default().with_format(LogFormat::Compact));
    let second = init_logging(LoggingConfig::default().with_format(LogFormat::Compact));

    // Another test binary may own the global subscriber, but two in a row never both succeed
    assert!(!(first.is_ok() && second.is_ok()));
    assert!(second.is_err());
}

#[test]
fn test_invalid_filter_rejected() {
    let result = init_logging(LoggingConfig::default().with_filter("core_library=[[["));
    assert!(result.is_err());
}
