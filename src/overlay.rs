// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 检测结果绘制: 彩色边框 + 类别/置信度标签

use std::fs;
use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::error::{Error, Result};
use crate::Bbox;

// color palette
const BRIGHT_COLORS: [(u8, u8, u8); 12] = [
    (255, 0, 0),     // 红色
    (0, 255, 0),     // 绿色
    (0, 0, 255),     // 蓝色
    (255, 255, 0),   // 黄色
    (255, 0, 255),   // 品红
    (0, 255, 255),   // 青色
    (255, 128, 0),   // 橙色
    (255, 0, 128),   // 粉红
    (128, 255, 0),   // 黄绿
    (0, 128, 255),   // 天蓝
    (255, 255, 255), // 白色
    (128, 0, 255),   // 紫色
];

const LABEL_SCALE: f32 = 20.0;
const THICKNESS: i32 = 2;

pub fn color_for(id: usize) -> Rgb<u8> {
    let (r, g, b) = BRIGHT_COLORS[id % BRIGHT_COLORS.len()];
    Rgb([r, g, b])
}

pub fn load_font(path: &Path) -> Result<FontVec> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    FontVec::try_from_vec(bytes).map_err(|_| Error::Font {
        path: path.to_path_buf(),
    })
}

/// 标签文本, 例如 `ok 0.87`
pub fn label_text(bbox: &Bbox, names: &[String]) -> String {
    let name = names
        .get(bbox.id())
        .cloned()
        .unwrap_or_else(|| bbox.id().to_string());
    format!("{} {:.2}", name, bbox.confidence())
}

/// 将框裁剪到画面内, 宽或高为 0 时返回 None
fn clip_rect(bbox: &Bbox, width: u32, height: u32, inset: i32) -> Option<Rect> {
    let x0 = (bbox.xmin().round() as i32 + inset).max(0);
    let y0 = (bbox.ymin().round() as i32 + inset).max(0);
    let x1 = (bbox.xmax().round() as i32 - inset).min(width as i32);
    let y1 = (bbox.ymax().round() as i32 - inset).min(height as i32);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(Rect::at(x0, y0).of_size((x1 - x0) as u32, (y1 - y0) as u32))
}

/// 在图像上绘制检测框; 提供字体时额外绘制标签
pub fn draw_detections(
    img: &mut RgbImage,
    bboxes: &[Bbox],
    names: &[String],
    font: Option<&FontVec>,
) {
    let (width, height) = img.dimensions();
    for bbox in bboxes {
        let color = color_for(bbox.id());
        for t in 0..THICKNESS {
            if let Some(rect) = clip_rect(bbox, width, height, t) {
                draw_hollow_rect_mut(img, rect, color);
            }
        }

        let Some(font) = font else {
            continue;
        };
        let text = label_text(bbox, names);
        let scale = PxScale::from(LABEL_SCALE);
        let (tw, th) = text_size(scale, font, &text);
        let x = (bbox.xmin().round() as i32).max(0);
        // 标签放在框上方, 贴顶时放到框内
        let y = if bbox.ymin() as i32 >= th as i32 + 2 {
            bbox.ymin() as i32 - th as i32 - 2
        } else {
            (bbox.ymin().round() as i32).max(0)
        };
        draw_filled_rect_mut(
            img,
            Rect::at(x, y).of_size(tw.max(1) + 4, th.max(1) + 2),
            color,
        );
        draw_text_mut(img, Rgb([0, 0, 0]), x + 2, y + 1, scale, font, &text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_cycle() {
        assert_eq!(color_for(0), Rgb([255, 0, 0]));
        assert_eq!(color_for(12), color_for(0));
        assert_eq!(color_for(13), Rgb([0, 255, 0]));
    }

    #[test]
    fn label_falls_back_to_id() {
        let names = vec!["ok".to_string()];
        assert_eq!(label_text(&Bbox::new(0., 0., 1., 1., 0, 0.873), &names), "ok 0.87");
        assert_eq!(label_text(&Bbox::new(0., 0., 1., 1., 7, 0.5), &names), "7 0.50");
    }

    #[test]
    fn draws_box_border_only() {
        let mut img = RgbImage::new(100, 100);
        let bbox = Bbox::new(10., 10., 50., 40., 1, 0.9);
        draw_detections(&mut img, &[bbox], &[], None);

        let green = Rgb([0, 255, 0]);
        assert_eq!(*img.get_pixel(10, 10), green);
        assert_eq!(*img.get_pixel(11, 30), green);
        assert_eq!(*img.get_pixel(59, 49), green);
        assert_eq!(*img.get_pixel(30, 30), Rgb([0, 0, 0]));
    }

    #[test]
    fn out_of_frame_boxes_are_clipped() {
        let mut img = RgbImage::new(32, 32);
        let boxes = [
            Bbox::new(-10., -10., 100., 100., 0, 0.9),
            Bbox::new(40., 40., 10., 10., 0, 0.9),
            Bbox::new(5., 5., 0., 0., 0, 0.9),
        ];
        draw_detections(&mut img, &boxes, &[], None);
        assert_eq!(*img.get_pixel(0, 0), Rgb([255, 0, 0]));
    }

    #[test]
    fn bad_font_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("font.ttf");
        fs::write(&path, b"not a font").unwrap();
        assert!(matches!(load_font(&path), Err(Error::Font { .. })));
    }
}
