// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 模型统一接口与实现
//!
//! # 架构说明
//!
//! - **YOLOv8**: ONNX Runtime 推理引擎 + 预处理/后处理, 加载 `yolo export format=onnx` 导出的模型
//! - **YOLOv8Postprocessor**: 纯后处理 (不依赖推理引擎), 便于单独测试
//!
//! ## 使用示例
//! ```no_run
//! use handsign_rs::config::LiveConfig;
//! use handsign_rs::models::{Model, YOLOv8};
//!
//! let mut model = YOLOv8::new(&LiveConfig::default())?;
//! let img = image::open("hand.jpg")?;
//! let results = model.forward(&[img])?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use image::DynamicImage;

use crate::error::Result;
use crate::DetectionResult;

/// 统一的检测模型接口
///
/// ```text
/// 原始图片 → preprocess → 张量 → 推理 → postprocess → 检测结果
/// ```
pub trait Model: Send {
    /// 完整的推理流程, 每张输入图片对应一个结果
    fn forward(&mut self, images: &[DynamicImage]) -> Result<Vec<DetectionResult>>;

    /// 类别名称 (下标即 class id)
    fn names(&self) -> &[String];

    /// 打印模型信息
    fn summary(&self) {}
}

pub mod yolov8;

pub use yolov8::{YOLOv8, YOLOv8Postprocessor};
