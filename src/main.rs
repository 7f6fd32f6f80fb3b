use aadhaar_kyc::crypto::PinnedKey;
use aadhaar_kyc::pipeline::{Extraction, Pipeline, Rejection};
use aadhaar_kyc::qr::RawPayload;
use aadhaar_kyc::storage::UploadedArtifact;
use aadhaar_kyc::utils::{self, parse_log_level, setup_logger, Config};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use colored::*;
use log::{debug, info};
use std::path::PathBuf;
use std::sync::Arc;

/// 命令行参数
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// 配置文件路径
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// 签发机构公钥（覆盖配置）
    #[clap(short, long)]
    key: Option<PathBuf>,

    /// 日志级别
    #[clap(long)]
    log_level: Option<String>,

    /// 启用详细日志
    #[clap(short, long)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 扫描身份证件图片中的二维码并提取身份信息
    Scan {
        /// 图片文件
        image: PathBuf,
    },

    /// 对已解码的二维码文本运行格式判断与验证
    Decode {
        /// 包含二维码文本的文件
        payload: PathBuf,
    },

    /// 显示公钥加载情况
    KeyInfo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 加载配置文件
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    if let Some(key) = &args.key {
        config.override_key_path(key, &std::env::current_dir()?);
    }
    config.validate()?;

    // 初始化日志
    let level = if args.verbose {
        "debug".to_string()
    } else {
        args.log_level.clone().unwrap_or_else(|| config.log_level.clone())
    };
    setup_logger(parse_log_level(&level).map_err(|e| anyhow!(e))?).map_err(|e| anyhow!(e))?;

    info!("{}", utils::banner());
    debug!("Config: {:?}", config);

    match args.command {
        Command::Scan { image } => {
            let pipeline = Arc::new(Pipeline::from_config(&config));
            let upload_dir = config.ensure_upload_dir()?;

            // 复制到暂存目录，原文件不受影响
            let bytes = std::fs::read(&image).with_context(|| format!("reading {}", image.display()))?;
            info!(
                "Scanning {} ({}, limit {})",
                image.display(),
                utils::format_size(bytes.len() as u64),
                utils::format_size(config.max_upload_bytes)
            );
            let artifact = UploadedArtifact::stage(&upload_dir, &bytes)?;

            report(pipeline.process_upload_async(artifact).await)
        }
        Command::Decode { payload } => {
            let pipeline = Pipeline::from_config(&config);
            let text = std::fs::read_to_string(&payload)
                .with_context(|| format!("reading {}", payload.display()))?;

            report(pipeline.decode_payload(&RawPayload::new(text.trim())))
        }
        Command::KeyInfo => match config.key_path() {
            Some(path) => match PinnedKey::load(&path) {
                Ok(key) => {
                    println!("{} {}", "Key loaded:".green().bold(), path.display());
                    println!("  modulus:     {} bits", key.modulus_bits());
                    println!("  fingerprint: {}", key.fingerprint());
                    Ok(())
                }
                Err(e) => {
                    println!("{} {}: {}", "Key unavailable:".yellow().bold(), path.display(), e);
                    println!("  Secure QR payloads will be treated as unrecognized.");
                    Ok(())
                }
            },
            None => {
                println!("{}", "No public key configured.".yellow().bold());
                Ok(())
            }
        },
    }
}

/// 输出结果：成功时打印 JSON，失败时打印面向用户的信息
fn report(result: Result<Extraction, Rejection>) -> anyhow::Result<()> {
    match result {
        Ok(extraction) => {
            let label = if extraction.is_verified() {
                "Verified".green().bold()
            } else {
                "Unverified".yellow().bold()
            };
            println!("{} {} payload", label, extraction.format);
            println!("{}", serde_json::to_string_pretty(&extraction)?);
            Ok(())
        }
        Err(rejection) => {
            println!(
                "{} [{}] {}",
                "Rejected".red().bold(),
                rejection.status_code(),
                rejection.user_message()
            );
            Err(anyhow!(rejection))
        }
    }
}
