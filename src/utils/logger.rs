use env_logger::{Builder, Env};
use log::LevelFilter;
use std::str::FromStr;

/// 初始化日志。`RUST_LOG` 存在时优先于 `level`；重复初始化返回错误而不是 panic
pub fn setup_logger(level: LevelFilter) -> Result<(), String> {
    let default_filter = level.to_string().to_lowercase();

    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .try_init()
        .map_err(|e| format!("Logger already initialised: {}", e))
}

/// 解析配置或命令行中的日志级别（不区分大小写）
pub fn parse_log_level(level: &str) -> Result<LevelFilter, String> {
    LevelFilter::from_str(level.trim()).map_err(|_| format!("Invalid log level: {}", level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("DEBUG"), Ok(LevelFilter::Debug));
        assert_eq!(parse_log_level(" warn "), Ok(LevelFilter::Warn));
        assert_eq!(parse_log_level("off"), Ok(LevelFilter::Off));
        assert!(parse_log_level("loud").is_err());
    }
}
