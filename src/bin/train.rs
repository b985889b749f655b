// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use handsign_rs::train::{write_data_yaml, TrainPlan};
use handsign_rs::{logging, HandsignConfig};

/// 训练驱动: yolo train → val → export
#[derive(Parser, Debug)]
#[command(author, version, about = "调用 yolo 命令行训练手势检测模型", long_about = None)]
struct Args {
    /// JSON配置文件
    #[arg(short, long, default_value = "handsign.json")]
    config: PathBuf,

    /// 数据集描述文件 (data.yaml)
    #[arg(long)]
    data: Option<PathBuf>,

    /// 训练轮数
    #[arg(long)]
    epochs: Option<u32>,

    /// 根据 class_names 生成 data.yaml
    #[arg(long)]
    write_descriptor: bool,

    /// 只打印命令, 不执行
    #[arg(long)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let args = Args::parse();

    let mut config = HandsignConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(data) = args.data {
        config.train.data = data;
    }
    if let Some(epochs) = args.epochs {
        config.train.epochs = epochs;
    }

    let plan = TrainPlan::new(&config.layout, &config.train);
    if args.write_descriptor {
        write_data_yaml(plan.data(), &config.layout, &config.train.class_names)
            .context("writing dataset descriptor")?;
    }

    if args.dry_run {
        for step in plan.steps() {
            println!("{}", step);
        }
        return Ok(());
    }

    let exported = plan.run().context("training failed")?;
    println!("✅ 模型已导出: {}", exported.display());
    Ok(())
}
