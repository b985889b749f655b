// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! YOLO 标注文件 (Label files)
//!
//! 每行一个目标: `class_id x_center y_center width height`, 坐标归一化到 [0,1]。

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// 归一化的中心点/宽高标注框
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelBox {
    pub class_id: u32,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl LabelBox {
    pub fn new(class_id: u32, x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            class_id,
            x,
            y,
            w,
            h,
        }
    }

    /// 解析一行标注, 空行返回 `None`
    pub fn parse_line(line: &str, path: &Path, line_num: usize) -> Result<Option<Self>> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(None);
        }
        if parts.len() != 5 {
            return Err(Error::LabelParse {
                path: path.to_path_buf(),
                line: line_num,
                message: format!("expected 5 fields, found {}", parts.len()),
            });
        }

        let class_id = parts[0].parse::<u32>().map_err(|e| Error::LabelParse {
            path: path.to_path_buf(),
            line: line_num,
            message: format!("invalid class id '{}': {}", parts[0], e),
        })?;

        let mut coords = [0f64; 4];
        for (slot, raw) in coords.iter_mut().zip(&parts[1..]) {
            *slot = raw.parse::<f64>().map_err(|e| Error::LabelParse {
                path: path.to_path_buf(),
                line: line_num,
                message: format!("invalid coordinate '{}': {}", raw, e),
            })?;
        }
        let [x, y, w, h] = coords;

        Ok(Some(Self::new(class_id, x, y, w, h)))
    }
}

impl fmt::Display for LabelBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.class_id, self.x, self.y, self.w, self.h
        )
    }
}

/// 一张图片对应的全部标注框
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelFile {
    pub boxes: Vec<LabelBox>,
}

impl LabelFile {
    pub fn new(boxes: Vec<LabelBox>) -> Self {
        Self { boxes }
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let mut boxes = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if let Some(bbox) = LabelBox::parse_line(line, path, idx + 1)? {
                boxes.push(bbox);
            }
        }
        Ok(Self { boxes })
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&content, path)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_string()).map_err(|e| Error::io(path, e))
    }

    /// 对每个框应用同一个坐标变换
    pub fn map(&self, f: impl Fn(&LabelBox) -> LabelBox) -> Self {
        Self {
            boxes: self.boxes.iter().map(f).collect(),
        }
    }
}

impl fmt::Display for LabelFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bbox in &self.boxes {
            writeln!(f, "{}", bbox)?;
        }
        Ok(())
    }
}

/// 图片对应的标注路径: `<labels_dir>/<stem>.txt`
pub fn label_path_for(labels_dir: &Path, image_path: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    labels_dir.join(format!("{}.txt", stem))
}
