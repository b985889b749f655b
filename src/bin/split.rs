// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use handsign_rs::config::MissingLabelPolicy;
use handsign_rs::{logging, split, HandsignConfig};

/// 训练/验证集划分
#[derive(Parser, Debug)]
#[command(author, version, about = "划分训练集与验证集", long_about = None)]
struct Args {
    /// JSON配置文件
    #[arg(short, long, default_value = "handsign.json")]
    config: PathBuf,

    /// 数据根目录
    #[arg(long)]
    root: Option<PathBuf>,

    /// 训练集比例
    #[arg(long)]
    ratio: Option<f64>,

    /// 打乱用的随机种子
    #[arg(long)]
    seed: Option<u64>,

    /// 缺少标注时直接报错
    #[arg(long)]
    strict: bool,
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let args = Args::parse();

    let mut config = HandsignConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(root) = args.root {
        config.layout.root = root;
    }
    if let Some(ratio) = args.ratio {
        anyhow::ensure!(
            ratio > 0.0 && ratio <= 1.0,
            "ratio must be in (0, 1], got {}",
            ratio
        );
        config.split.ratio = ratio;
    }
    if args.seed.is_some() {
        config.split.seed = args.seed;
    }
    if args.strict {
        config.split.missing_label = MissingLabelPolicy::Error;
    }

    let summary = split::split_dataset(&config.layout, &config.split).context("splitting dataset")?;
    if summary.total > 0 {
        println!(
            "✅ train {} / valid {} (共 {}, 缺标注 {})",
            summary.train, summary.valid, summary.total, summary.missing_labels
        );
    }
    Ok(())
}
