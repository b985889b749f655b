// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// YOLOv8 检测模型实现 (ONNX Runtime)
// 包含: 模型加载、预处理、推理、后处理

use image::{DynamicImage, GenericImageView};
use ndarray::{s, Array, Axis, IxDyn};
use ort::inputs;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;

use crate::config::LiveConfig;
use crate::error::{Error, Result};
use crate::{non_max_suppression, Bbox, DetectionResult};

/// `yolo export format=onnx` 导出模型的输入名
const INPUT_NAME: &str = "images";
const CXYWH_OFFSET: usize = 4;

fn scale_wh(w0: f32, h0: f32, w1: f32, h1: f32) -> (f32, f32, f32) {
    let r = (w1 / w0).min(h1 / h0);
    (r, (w0 * r).round(), (h0 * r).round())
}

/// YOLOv8 后处理器: `[batch, 4 + nc, anchors]` → 检测框
#[derive(Debug, Clone)]
pub struct YOLOv8Postprocessor {
    pub width: u32,
    pub height: u32,
    pub conf: f32,
    pub iou: f32,
}

impl YOLOv8Postprocessor {
    pub fn new(width: u32, height: u32, conf: f32, iou: f32) -> Self {
        Self {
            width,
            height,
            conf,
            iou,
        }
    }

    /// `sizes0` 为每张原图的 (宽, 高), 用于坐标还原
    pub fn postprocess(
        &self,
        preds: &Array<f32, IxDyn>,
        sizes0: &[(u32, u32)],
    ) -> Result<Vec<DetectionResult>> {
        if preds.ndim() != 3 || preds.shape()[1] <= CXYWH_OFFSET {
            return Err(Error::Inference(format!(
                "unexpected output shape {:?}",
                preds.shape()
            )));
        }
        let nc = preds.shape()[1] - CXYWH_OFFSET;

        let mut ys = Vec::new();
        for (idx, anchor) in preds.axis_iter(Axis(0)).enumerate() {
            let Some(&(w0, h0)) = sizes0.get(idx) else {
                break;
            };
            let width_original = w0 as f32;
            let height_original = h0 as f32;
            let ratio = (self.width as f32 / width_original)
                .min(self.height as f32 / height_original);

            let mut data: Vec<Bbox> = Vec::new();
            for pred in anchor.axis_iter(Axis(1)) {
                let bbox = pred.slice(s![0..CXYWH_OFFSET]);
                let clss = pred.slice(s![CXYWH_OFFSET..CXYWH_OFFSET + nc]);

                let Some((id, &confidence)) = clss
                    .into_iter()
                    .enumerate()
                    .reduce(|max, x| if x.1 > max.1 { x } else { max })
                else {
                    continue;
                };

                if confidence < self.conf {
                    continue;
                }

                let cx = bbox[0] / ratio;
                let cy = bbox[1] / ratio;
                let w = bbox[2] / ratio;
                let h = bbox[3] / ratio;
                let x0 = (cx - w / 2.).clamp(0.0, width_original);
                let y0 = (cy - h / 2.).clamp(0.0, height_original);
                let x1 = (cx + w / 2.).clamp(0.0, width_original);
                let y1 = (cy + h / 2.).clamp(0.0, height_original);
                // 完全落在画面外
                if x1 <= x0 || y1 <= y0 {
                    continue;
                }
                data.push(Bbox::new(x0, y0, x1 - x0, y1 - y0, id, confidence));
            }

            non_max_suppression(&mut data, self.iou);
            ys.push(DetectionResult::new(data));
        }

        Ok(ys)
    }
}

/// YOLOv8 完整模型结构
pub struct YOLOv8 {
    session: Session,
    post: YOLOv8Postprocessor,
    names: Vec<String>,
}

impl YOLOv8 {
    /// 从配置创建 YOLOv8 模型
    pub fn new(config: &LiveConfig) -> Result<Self> {
        #[allow(unused_mut)]
        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.intra_threads)?;

        #[cfg(feature = "cuda")]
        {
            builder = builder.with_execution_providers([
                ort::execution_providers::CUDAExecutionProvider::default().build(),
            ])?;
        }

        let session = builder.commit_from_file(&config.model)?;
        log::info!("✅ 模型加载成功: {}", config.model.display());

        Ok(Self {
            session,
            post: YOLOv8Postprocessor::new(
                config.input_size,
                config.input_size,
                config.conf,
                config.iou,
            ),
            names: config.class_names.clone(),
        })
    }

    fn width(&self) -> u32 {
        self.post.width
    }

    fn height(&self) -> u32 {
        self.post.height
    }

    /// 等比缩放后贴到左上角, 其余区域填充 144/255
    pub fn preprocess(&self, xs: &[DynamicImage]) -> Array<f32, IxDyn> {
        let mut ys =
            Array::ones((xs.len(), 3, self.height() as usize, self.width() as usize)).into_dyn();
        ys.fill(144.0 / 255.0);
        for (idx, x) in xs.iter().enumerate() {
            let (w0, h0) = x.dimensions();
            let (_, w_new, h_new) = scale_wh(
                w0 as f32,
                h0 as f32,
                self.width() as f32,
                self.height() as f32,
            );
            let img = x.resize_exact(
                w_new as u32,
                h_new as u32,
                image::imageops::FilterType::Triangle,
            );

            for (x, y, rgb) in img.pixels() {
                let x = x as usize;
                let y = y as usize;
                let [r, g, b, _] = rgb.0;
                ys[[idx, 0, y, x]] = (r as f32) / 255.0;
                ys[[idx, 1, y, x]] = (g as f32) / 255.0;
                ys[[idx, 2, y, x]] = (b as f32) / 255.0;
            }
        }
        ys
    }

    /// 执行 ONNX Runtime 推理, 返回第一个输出
    pub fn run(&mut self, xs: Array<f32, IxDyn>) -> Result<Array<f32, IxDyn>> {
        let shape = xs.shape().to_vec();
        let (data, _offset) = xs.into_raw_vec_and_offset();
        let input = Tensor::from_array(([shape[0], shape[1], shape[2], shape[3]], data))?;
        let outputs = self.session.run(inputs![INPUT_NAME => input])?;

        let (out_shape, out_data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = out_shape.iter().map(|&d| d as usize).collect();
        Ok(Array::from_shape_vec(IxDyn(&dims), out_data.to_vec())?)
    }

    pub fn summary(&self) {
        log::info!(
            "\nSummary:\n\
            > Input: {}x{}\n\
            > Classes: {} {:?}\n\
            > conf: {}, iou: {}",
            self.width(),
            self.height(),
            self.names.len(),
            self.names,
            self.post.conf,
            self.post.iou,
        );
    }
}

// 实现统一的 Model trait
impl super::Model for YOLOv8 {
    fn forward(&mut self, images: &[DynamicImage]) -> Result<Vec<DetectionResult>> {
        let t_pre = std::time::Instant::now();
        let xs = self.preprocess(images);
        log::trace!("[Model Preprocess]: {:?}", t_pre.elapsed());

        let t_run = std::time::Instant::now();
        let ys = self.run(xs)?;
        log::trace!("[Model Inference]: {:?}", t_run.elapsed());

        let t_post = std::time::Instant::now();
        let sizes: Vec<(u32, u32)> = images.iter().map(|x| x.dimensions()).collect();
        let ys = self.post.postprocess(&ys, &sizes)?;
        log::trace!("[Model Postprocess]: {:?}", t_post.elapsed());

        Ok(ys)
    }

    fn names(&self) -> &[String] {
        &self.names
    }

    fn summary(&self) {
        YOLOv8::summary(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 构造 `[1, 4 + nc, anchors]` 的输出, 每个 anchor 为 (cx, cy, w, h, scores...)
    fn output(anchors: &[[f32; 6]]) -> Array<f32, IxDyn> {
        let mut ys = Array::zeros((1, 6, anchors.len())).into_dyn();
        for (a, row) in anchors.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                ys[[0, c, a]] = *v;
            }
        }
        ys
    }

    #[test]
    fn scale_wh_keeps_aspect() {
        let (r, w, h) = scale_wh(1280., 720., 640., 640.);
        assert_eq!(r, 0.5);
        assert_eq!((w, h), (640., 360.));
    }

    #[test]
    fn postprocess_filters_and_rescales() {
        let post = YOLOv8Postprocessor::new(640, 640, 0.25, 0.45);
        let preds = output(&[
            [320., 320., 64., 64., 0.1, 0.9],  // class 1, 保留
            [322., 321., 64., 64., 0.8, 0.1],  // 与上一个重叠, NMS 去掉
            [100., 100., 20., 20., 0.05, 0.2], // 低于阈值
        ]);
        // 原图 1280x1280 → ratio 0.5
        let ys = post.postprocess(&preds, &[(1280, 1280)]).unwrap();
        assert_eq!(ys.len(), 1);
        let boxes = ys[0].bboxes();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].id(), 1);
        assert!((boxes[0].xmin() - 576.).abs() < 1e-3);
        assert!((boxes[0].width() - 128.).abs() < 1e-3);
    }

    #[test]
    fn postprocess_clips_boxes_to_frame() {
        let post = YOLOv8Postprocessor::new(640, 640, 0.25, 0.45);
        // 左边越界 15px, 底部越界 15px
        let preds = output(&[[5., 635., 40., 40., 0.9, 0.0]]);
        let ys = post.postprocess(&preds, &[(640, 640)]).unwrap();
        let b = &ys[0].bboxes()[0];
        assert_eq!(b.xmin(), 0.);
        assert_eq!(b.xmax(), 25.);
        assert_eq!(b.ymin(), 615.);
        assert_eq!(b.ymax(), 640.);
    }

    #[test]
    fn postprocess_clips_top_right_corner() {
        let post = YOLOv8Postprocessor::new(640, 640, 0.25, 0.45);
        let preds = output(&[[630., 10., 40., 40., 0.0, 0.8]]);
        let ys = post.postprocess(&preds, &[(640, 640)]).unwrap();
        let b = &ys[0].bboxes()[0];
        assert_eq!((b.xmin(), b.xmax()), (610., 640.));
        assert_eq!((b.ymin(), b.ymax()), (0., 30.));
    }

    #[test]
    fn postprocess_rejects_bad_shape() {
        let post = YOLOv8Postprocessor::new(640, 640, 0.25, 0.45);
        let preds = Array::zeros((1, 4)).into_dyn();
        assert!(matches!(
            post.postprocess(&preds, &[(640, 640)]),
            Err(Error::Inference(_))
        ));
    }
}
