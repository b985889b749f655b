// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use handsign_rs::{logging, prepare, HandsignConfig};

/// 数据准备: 中心裁剪 + 缩放
///
/// 运行: cargo run --bin handsign-prepare -- --crop-from raw_photos
#[derive(Parser, Debug)]
#[command(author, version, about = "手势数据准备 (裁剪 + 缩放)", long_about = None)]
struct Args {
    /// JSON配置文件
    #[arg(short, long, default_value = "handsign.json")]
    config: PathBuf,

    /// 原始照片目录, 指定时先裁剪到 new_images
    #[arg(long)]
    crop_from: Option<PathBuf>,

    /// 数据根目录
    #[arg(long)]
    root: Option<PathBuf>,

    /// 将最终生效的配置写回配置文件
    #[arg(long)]
    save_config: bool,
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let args = Args::parse();

    let mut config = HandsignConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(root) = args.root {
        config.layout.root = root;
    }
    if args.save_config {
        config.save(&args.config)?;
    }

    let summary = prepare::prepare_dir(&config.layout, &config.prepare, args.crop_from.as_deref())
        .context("preparing images")?;
    println!(
        "✅ 裁剪 {} 张, 缩放 {} 张, 失败 {} 张",
        summary.cropped, summary.resized, summary.failed
    );
    Ok(())
}
