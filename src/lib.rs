// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod augment; // 数据增强 (旋转/对比度/亮度/噪声)
pub mod config; // JSON 配置
pub mod error; // 错误类型
pub mod label; // YOLO 标注文件
pub mod layout; // 数据集目录布局
pub mod live; // 逐帧实时检测
pub mod logging; // 日志/进度条
pub mod models; // 模型接口与具体实现
pub mod overlay; // 检测框绘制
pub mod prepare; // 裁剪 + 缩放
pub mod split; // 训练/验证集划分
pub mod train; // 调用 yolo CLI 训练

pub use crate::config::{HandsignConfig, MissingLabelPolicy};
pub use crate::error::{Error, Result};
pub use crate::label::{LabelBox, LabelFile};
pub use crate::layout::Layout;
pub use crate::live::LiveContext;
pub use crate::models::{Model, YOLOv8};

pub fn non_max_suppression(xs: &mut Vec<Bbox>, iou_threshold: f32) {
    xs.sort_by(|b1, b2| b2.confidence().total_cmp(&b1.confidence()));

    let mut current_index = 0;
    for index in 0..xs.len() {
        let mut drop = false;
        for prev_index in 0..current_index {
            let iou = xs[prev_index].iou(&xs[index]);
            if iou > iou_threshold {
                drop = true;
                break;
            }
        }
        if !drop {
            xs.swap(current_index, index);
            current_index += 1;
        }
    }
    xs.truncate(current_index);
}

pub fn gen_time_string(delimiter: &str) -> String {
    let t_now = chrono::Local::now();
    let fmt = format!(
        "%Y{}%m{}%d{}%H{}%M{}%S",
        delimiter, delimiter, delimiter, delimiter, delimiter
    );
    t_now.format(&fmt).to_string()
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectionResult {
    // 单张图片的检测结果
    pub bboxes: Vec<Bbox>,
}

impl DetectionResult {
    pub fn new(bboxes: Vec<Bbox>) -> Self {
        Self { bboxes }
    }

    pub fn bboxes(&self) -> &[Bbox] {
        &self.bboxes
    }

    pub fn is_empty(&self) -> bool {
        self.bboxes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bbox {
    // 像素坐标系下的检测框
    xmin: f32,
    ymin: f32,
    width: f32,
    height: f32,
    id: usize,
    confidence: f32,
}

impl Bbox {
    pub fn new(xmin: f32, ymin: f32, width: f32, height: f32, id: usize, confidence: f32) -> Self {
        Self {
            xmin,
            ymin,
            width,
            height,
            id,
            confidence,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn xmin(&self) -> f32 {
        self.xmin
    }

    pub fn ymin(&self) -> f32 {
        self.ymin
    }

    pub fn xmax(&self) -> f32 {
        self.xmin + self.width
    }

    pub fn ymax(&self) -> f32 {
        self.ymin + self.height
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn intersection_area(&self, another: &Bbox) -> f32 {
        let l = self.xmin.max(another.xmin);
        let r = (self.xmin + self.width).min(another.xmin + another.width);
        let t = self.ymin.max(another.ymin);
        let b = (self.ymin + self.height).min(another.ymin + another.height);
        (r - l).max(0.) * (b - t).max(0.)
    }

    pub fn union(&self, another: &Bbox) -> f32 {
        self.area() + another.area() - self.intersection_area(another)
    }

    pub fn iou(&self, another: &Bbox) -> f32 {
        let union = self.union(another);
        if union <= 0. {
            return 0.;
        }
        self.intersection_area(another) / union
    }
}
