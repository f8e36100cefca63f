use log::LevelFilter;

/// `env_logger` を初期化します。
///
/// 引数のレベル、`RUST_LOG`、`info` の順に採用します。
pub fn init_logging(level: Option<&str>) {
    let log_level = level
        .and_then(|l| l.parse::<LevelFilter>().ok())
        .or_else(|| std::env::var("RUST_LOG").ok().and_then(|v| v.parse().ok()))
        .unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_secs()
        .format_target(false)
        .init();
    log::debug!("ロガーを初期化しました (level: {})", log_level);
}
