// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 日志初始化 (`RUST_LOG` 优先, 默认 info)

use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;

pub fn init() {
    let mut builder = pretty_env_logger::formatted_builder();
    match std::env::var("RUST_LOG") {
        Ok(filters) => {
            builder.parse_filters(&filters);
        }
        Err(_) => {
            builder.filter_level(LevelFilter::Info);
        }
    }
    // 重复初始化 (例如测试中) 时忽略
    let _ = builder.try_init();
}

/// 逐文件处理的进度条
pub fn progress_bar(len: usize, prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::with_template("{prefix:>12.cyan} [{bar:40.green}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_prefix(prefix.to_string());
    pb
}
