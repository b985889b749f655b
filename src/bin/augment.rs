// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use handsign_rs::config::MissingLabelPolicy;
use handsign_rs::{augment, logging, HandsignConfig};

/// 数据增强: 旋转 → 对比度 → 亮度 → 噪声 → 汇总到 augmented/
#[derive(Parser, Debug)]
#[command(author, version, about = "手势数据增强", long_about = None)]
struct Args {
    /// JSON配置文件
    #[arg(short, long, default_value = "handsign.json")]
    config: PathBuf,

    /// 数据根目录
    #[arg(long)]
    root: Option<PathBuf>,

    /// 噪声随机种子 (不指定则每次不同)
    #[arg(long)]
    seed: Option<u64>,

    /// 缺少标注时直接报错, 默认跳过并警告
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
    if args.seed.is_some() {
        config.augment.seed = args.seed;
    }
    if args.strict {
        config.augment.missing_label = MissingLabelPolicy::Error;
    }

    let summary =
        augment::augment_dataset(&config.layout, &config.augment).context("augmenting dataset")?;
    for (stage, count) in &summary.stages {
        println!("📊 {:<12} {} 张", stage, count);
    }
    println!(
        "✅ 汇总 {} 张到 {} (跳过 {} 张)",
        summary.consolidated,
        config.layout.augmented().images.display(),
        summary.skipped
    );
    Ok(())
}
