// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 实时检测上下文 (Live inference)
//!
//! 模型在第一帧到来时加载一次, 之后每帧复用同一个实例。
//! 视频采集与推流 (WebRTC) 在外部完成, 这里只负责 `帧 → 标注帧`。

use std::sync::Mutex;

use ab_glyph::FontVec;
use image::{DynamicImage, RgbImage};
use once_cell::sync::OnceCell;

use crate::config::LiveConfig;
use crate::error::{Error, Result};
use crate::models::{Model, YOLOv8};
use crate::overlay;
use crate::DetectionResult;

pub type BoxedModel = Box<dyn Model + Send>;
type Loader = Box<dyn Fn(&LiveConfig) -> Result<BoxedModel> + Send + Sync>;

pub struct LiveContext {
    config: LiveConfig,
    model: OnceCell<Mutex<BoxedModel>>,
    loader: Loader,
    font: Option<FontVec>,
}

impl LiveContext {
    /// 默认从 `config.model` 加载 ONNX 模型
    pub fn new(config: LiveConfig) -> Result<Self> {
        Self::with_loader(config, |c| Ok(Box::new(YOLOv8::new(c)?) as BoxedModel))
    }

    pub fn with_loader<F>(config: LiveConfig, loader: F) -> Result<Self>
    where
        F: Fn(&LiveConfig) -> Result<BoxedModel> + Send + Sync + 'static,
    {
        let font = match &config.font {
            Some(path) => Some(overlay::load_font(path)?),
            None => None,
        };
        Ok(Self {
            config,
            model: OnceCell::new(),
            loader: Box::new(loader),
            font,
        })
    }

    pub fn config(&self) -> &LiveConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    /// 懒加载模型, 失败时下次调用会重试
    pub fn model(&self) -> Result<&Mutex<BoxedModel>> {
        self.model.get_or_try_init(|| {
            log::info!("📦 加载模型 {}", self.config.model.display());
            let model = (self.loader)(&self.config)?;
            model.summary();
            Ok(Mutex::new(model))
        })
    }

    pub fn detect(&self, frame: &RgbImage) -> Result<DetectionResult> {
        let model = self.model()?;
        let mut model = model
            .lock()
            .map_err(|_| Error::Inference("model lock poisoned".into()))?;
        let input = [DynamicImage::ImageRgb8(frame.clone())];
        let mut ys = model.forward(&input)?;
        Ok(ys.pop().unwrap_or_default())
    }

    /// 每帧回调: 检测并返回画好框的新帧, 输入帧不变
    pub fn process_frame(&self, frame: &RgbImage) -> Result<RgbImage> {
        let result = self.detect(frame)?;
        let mut annotated = frame.clone();
        if result.is_empty() {
            return Ok(annotated);
        }
        let model = self.model()?;
        let names = model
            .lock()
            .map_err(|_| Error::Inference("model lock poisoned".into()))?
            .names()
            .to_vec();
        overlay::draw_detections(&mut annotated, result.bboxes(), &names, self.font.as_ref());
        Ok(annotated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bbox;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedModel {
        names: Vec<String>,
    }

    impl Model for FixedModel {
        fn forward(&mut self, images: &[DynamicImage]) -> Result<Vec<DetectionResult>> {
            Ok(images
                .iter()
                .map(|_| DetectionResult::new(vec![Bbox::new(4., 4., 8., 8., 0, 0.9)]))
                .collect())
        }

        fn names(&self) -> &[String] {
            &self.names
        }
    }

    fn counting_context(count: Arc<AtomicUsize>) -> LiveContext {
        LiveContext::with_loader(LiveConfig::default(), move |c| {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FixedModel {
                names: c.class_names.clone(),
            }) as BoxedModel)
        })
        .unwrap()
    }

    #[test]
    fn model_loads_once_across_frames() {
        let count = Arc::new(AtomicUsize::new(0));
        let ctx = counting_context(count.clone());
        assert!(!ctx.is_loaded());

        let frame = RgbImage::new(20, 20);
        for _ in 0..5 {
            ctx.process_frame(&frame).unwrap();
        }
        assert!(ctx.is_loaded());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn frame_is_annotated_not_mutated() {
        let ctx = counting_context(Arc::new(AtomicUsize::new(0)));
        let frame = RgbImage::new(20, 20);
        let out = ctx.process_frame(&frame).unwrap();
        assert_eq!(out.dimensions(), frame.dimensions());
        assert_eq!(*out.get_pixel(4, 4), overlay::color_for(0));
        assert_eq!(*frame.get_pixel(4, 4), image::Rgb([0, 0, 0]));
    }

    struct EmptyModel;

    impl Model for EmptyModel {
        fn forward(&mut self, images: &[DynamicImage]) -> Result<Vec<DetectionResult>> {
            Ok(images.iter().map(|_| DetectionResult::default()).collect())
        }

        fn names(&self) -> &[String] {
            &[]
        }
    }

    #[test]
    fn frame_without_detections_is_unchanged() {
        let ctx = LiveContext::with_loader(LiveConfig::default(), |_| {
            Ok(Box::new(EmptyModel) as BoxedModel)
        })
        .unwrap();
        let frame = RgbImage::from_pixel(16, 16, image::Rgb([7, 8, 9]));
        assert_eq!(ctx.process_frame(&frame).unwrap(), frame);
    }

    #[test]
    fn failed_load_is_retried() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let ctx = LiveContext::with_loader(LiveConfig::default(), move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Err(Error::Inference("no model".into()))
        })
        .unwrap();

        let frame = RgbImage::new(8, 8);
        assert!(ctx.process_frame(&frame).is_err());
        assert!(ctx.process_frame(&frame).is_err());
        assert!(!ctx.is_loaded());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
