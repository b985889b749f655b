// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use handsign_rs::{gen_time_string, layout, logging, HandsignConfig, LiveContext};

/// 实时手势检测演示
///
/// 逐帧读取图片 (单个文件或按文件名排序的帧目录), 检测后写出标注帧。
/// 浏览器推流 (WebRTC) 由外部负责, 这里只实现每帧回调。
#[derive(Parser, Debug)]
#[command(author, version, about = "实时手势检测 (逐帧)", long_about = None)]
struct Args {
    /// 输入图片或帧目录
    input: PathBuf,

    /// JSON配置文件
    #[arg(short, long, default_value = "handsign.json")]
    config: PathBuf,

    /// ONNX模型路径
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// 置信度阈值
    #[arg(long)]
    conf: Option<f32>,

    /// 标签字体 (TTF/OTF)
    #[arg(long)]
    font: Option<PathBuf>,

    /// 输出目录, 默认 runs/live/<时间>
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn frames(input: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if input.is_dir() {
        Ok(layout::list_images(input)?)
    } else {
        Ok(vec![input.to_path_buf()])
    }
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let args = Args::parse();

    let mut config = HandsignConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(model) = args.model {
        config.live.model = model;
    }
    if let Some(conf) = args.conf {
        config.live.conf = conf;
    }
    if args.font.is_some() {
        config.live.font = args.font;
    }

    log::info!(
        "🌐 streaming boundary: stun={} video={} audio={}",
        config.live.stun_server,
        config.live.video,
        config.live.audio
    );

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from("runs/live").join(gen_time_string("-")));
    layout::create_dir(&output)?;

    let ctx = LiveContext::new(config.live).context("creating live context")?;
    let frames = frames(&args.input)?;
    anyhow::ensure!(!frames.is_empty(), "no frames found in {}", args.input.display());

    let t_start = Instant::now();
    let mut written = 0usize;
    for path in &frames {
        let frame = match image::open(path) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                log::warn!("⚠️ 跳过无法解码的帧 {}: {}", path.display(), e);
                continue;
            }
        };

        let t_frame = Instant::now();
        let annotated = ctx
            .process_frame(&frame)
            .with_context(|| format!("processing {}", path.display()))?;
        log::debug!("[Frame] {}: {:?}", path.display(), t_frame.elapsed());

        let Some(name) = path.file_name() else {
            continue;
        };
        let dest = output.join(name);
        annotated
            .save(&dest)
            .with_context(|| format!("saving {}", dest.display()))?;
        written += 1;
    }

    let elapsed = t_start.elapsed().as_secs_f64();
    let fps = if elapsed > 0.0 {
        written as f64 / elapsed
    } else {
        0.0
    };
    println!(
        "✅ {} 帧已写入 {} ({:.1} FPS)",
        written,
        output.display(),
        fps
    );
    Ok(())
}
