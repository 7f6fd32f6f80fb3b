mod config;
mod logger;

pub use config::{Config, ConfigError};
pub use logger::{parse_log_level, setup_logger};

/// 程序名与版本，用于启动日志
pub fn banner() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// 上传暂存文件名：不可预测，且不含任何来自客户端的内容
pub fn upload_file_name() -> String {
    use rand::RngCore;
    let mut id = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut id);
    format!("upload-{}", hex::encode(id))
}

/// 以 1024 为进制的可读大小，保留一位小数
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
