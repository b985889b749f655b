// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 流水线配置 - 通过JSON文件调整参数

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::Layout;

/// 缺失标注文件时的处理策略 (增强与划分共用)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingLabelPolicy {
    /// 打印警告并继续
    #[default]
    Warn,
    /// 立即失败
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareConfig {
    pub crop_size: (u32, u32), // (宽, 高)
    pub resize: (u32, u32),
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            crop_size: (3000, 3000),
            resize: (640, 640),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    pub contrast_factors: Vec<f32>,
    pub brightness_offsets: Vec<i16>,
    pub noise_levels: Vec<u32>,
    /// 噪声随机种子, 为空则每次运行不同
    pub seed: Option<u64>,
    pub missing_label: MissingLabelPolicy,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            contrast_factors: vec![0.5, 1.5],
            brightness_offsets: vec![-75, -35, 35, 75],
            noise_levels: vec![1, 2, 3],
            seed: None,
            missing_label: MissingLabelPolicy::Warn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub ratio: f64,
    /// 划分随机种子, 为空则每次运行不同
    pub seed: Option<u64>,
    pub missing_label: MissingLabelPolicy,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            ratio: 0.8,
            seed: None,
            missing_label: MissingLabelPolicy::Warn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// yolo 可执行文件
    pub yolo_bin: String,
    pub model: String,
    pub data: PathBuf,
    pub epochs: u32,
    pub imgsz: u32,
    pub batch: u32,
    pub patience: u32,
    pub project: PathBuf,
    pub name: String,
    pub export_format: String,
    pub class_names: Vec<String>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            yolo_bin: "yolo".into(),
            model: "yolov8n.pt".into(),
            data: PathBuf::from("HandSigns_v2/data.yaml"),
            epochs: 100,
            imgsz: 640,
            batch: 16,
            patience: 20,
            project: PathBuf::from("runs/detect"),
            name: "handsign".into(),
            export_format: "onnx".into(),
            class_names: default_class_names(),
        }
    }
}

impl TrainConfig {
    /// 训练完成后的最佳权重: `<project>/<name>/weights/best.pt`
    pub fn best_weights(&self) -> PathBuf {
        self.project.join(&self.name).join("weights").join("best.pt")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    pub model: PathBuf,
    pub input_size: u32,
    pub conf: f32,
    pub iou: f32,
    pub intra_threads: usize,
    pub class_names: Vec<String>,
    /// 标签字体 (TTF/OTF), 为空时只画框
    pub font: Option<PathBuf>,
    // 以下参数交给外部推流层 (WebRTC) 使用
    pub stun_server: String,
    pub video: bool,
    pub audio: bool,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            model: PathBuf::from("weights/best.onnx"),
            input_size: 640,
            conf: 0.25,
            iou: 0.45,
            intra_threads: 4,
            class_names: default_class_names(),
            font: None,
            stun_server: "stun:stun.l.google.com:19302".into(),
            video: true,
            audio: false,
        }
    }
}

/// 10 种手势: 🤚👌🤞🖖☝️🤟👍✌️🤙🤏
pub fn default_class_names() -> Vec<String> {
    [
        "raised_hand",
        "ok",
        "crossed_fingers",
        "vulcan_salute",
        "index_up",
        "love_you",
        "thumbs_up",
        "victory",
        "call_me",
        "pinch",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandsignConfig {
    pub layout: Layout,
    pub prepare: PrepareConfig,
    pub augment: AugmentConfig,
    pub split: SplitConfig,
    pub train: TrainConfig,
    pub live: LiveConfig,
}

impl HandsignConfig {
    /// 从JSON文件加载配置, 文件不存在时使用默认值
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("📝 配置文件 {} 不存在, 使用默认配置", path.display());
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config = serde_json::from_str(&json).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("✅ 配置已从 {} 加载", path.display());
        Ok(config)
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|e| Error::io(path, e))?;
        log::info!("💾 配置已保存到 {}", path.display());
        Ok(())
    }
}
