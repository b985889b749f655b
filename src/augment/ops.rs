// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 像素级增强算子与对应的标注框变换

use image::imageops;
use image::RgbImage;
use imageproc::noise::gaussian_noise;

use crate::label::LabelBox;

/// 90° 整数倍旋转 (顺时针)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }

    pub fn inverse(&self) -> Self {
        match self {
            Rotation::R0 => Rotation::R0,
            Rotation::R90 => Rotation::R270,
            Rotation::R180 => Rotation::R180,
            Rotation::R270 => Rotation::R90,
        }
    }

    /// 90 = 顺时针, 270 = 逆时针
    pub fn rotate_image(&self, image: &RgbImage) -> RgbImage {
        match self {
            Rotation::R0 => image.clone(),
            Rotation::R90 => imageops::rotate90(image),
            Rotation::R180 => imageops::rotate180(image),
            Rotation::R270 => imageops::rotate270(image),
        }
    }

    /// 归一化中心点坐标下的精确变换 (正方形图片)
    pub fn rotate_box(&self, b: &LabelBox) -> LabelBox {
        match self {
            Rotation::R0 => *b,
            Rotation::R90 => LabelBox::new(b.class_id, 1.0 - b.y, b.x, b.h, b.w),
            Rotation::R180 => LabelBox::new(b.class_id, 1.0 - b.x, 1.0 - b.y, b.w, b.h),
            Rotation::R270 => LabelBox::new(b.class_id, b.y, 1.0 - b.x, b.h, b.w),
        }
    }
}

/// 对比度: 每个通道乘以 factor, 四舍五入后截断到 [0,255]
pub fn adjust_contrast(image: &RgbImage, factor: f32) -> RgbImage {
    let mut out = image.clone();
    for v in out.iter_mut() {
        *v = (*v as f32 * factor).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// 亮度: 每个通道加上 offset, 截断到 [0,255]
pub fn adjust_brightness(image: &RgbImage, offset: i16) -> RgbImage {
    let mut out = image.clone();
    for v in out.iter_mut() {
        *v = (*v as i16 + offset).clamp(0, 255) as u8;
    }
    out
}

/// 零均值高斯噪声, σ = 25 × level
pub fn add_noise(image: &RgbImage, level: u32, seed: u64) -> RgbImage {
    let sigma = 25.0 * level as f64;
    gaussian_noise(image, 0.0, sigma, seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const EPS: f64 = 1e-9;

    fn close(a: &LabelBox, b: &LabelBox) -> bool {
        a.class_id == b.class_id
            && (a.x - b.x).abs() < EPS
            && (a.y - b.y).abs() < EPS
            && (a.w - b.w).abs() < EPS
            && (a.h - b.h).abs() < EPS
    }

    #[test]
    fn rotation_then_inverse_restores_box() {
        let boxes = [
            LabelBox::new(0, 0.1, 0.1, 0.1, 0.1),
            LabelBox::new(4, 0.73, 0.21, 0.3, 0.12),
            LabelBox::new(9, 0.5, 0.5, 1.0, 0.4),
        ];
        for rot in Rotation::ALL {
            for b in &boxes {
                let back = rot.inverse().rotate_box(&rot.rotate_box(b));
                assert!(close(&back, b), "{:?}: {:?} -> {:?}", rot, b, back);
            }
        }
    }

    #[test]
    fn centered_box_is_invariant_under_rot90() {
        let b = LabelBox::new(0, 0.5, 0.5, 0.2, 0.2);
        assert!(close(&Rotation::R90.rotate_box(&b), &b));
    }

    #[test]
    fn corner_box_under_rot90() {
        let b = LabelBox::new(0, 0.1, 0.1, 0.1, 0.1);
        let r = Rotation::R90.rotate_box(&b);
        assert!(close(&r, &LabelBox::new(0, 0.9, 0.1, 0.1, 0.1)));
        assert_eq!(r.to_string(), "0 0.9 0.1 0.1 0.1");
    }

    #[test]
    fn box_formulas_match_pixel_rotation() {
        // 4x4 图片, 左上角 1x1 像素作为目标
        let mut img = RgbImage::new(4, 4);
        img.put_pixel(0, 0, Rgb([255, 255, 255]));
        let b = LabelBox::new(0, 0.125, 0.125, 0.25, 0.25);

        for rot in Rotation::ALL {
            let out = rot.rotate_image(&img);
            let r = rot.rotate_box(&b);
            let px = (r.x * 4.0).floor() as u32;
            let py = (r.y * 4.0).floor() as u32;
            assert_eq!(out.get_pixel(px, py), &Rgb([255, 255, 255]), "{:?}", rot);
        }
    }

    #[test]
    fn rotation_swaps_dimensions() {
        let img = RgbImage::new(6, 3);
        assert_eq!(Rotation::R90.rotate_image(&img).dimensions(), (3, 6));
        assert_eq!(Rotation::R180.rotate_image(&img).dimensions(), (6, 3));
        assert_eq!(Rotation::R270.rotate_image(&img).dimensions(), (3, 6));
    }

    #[test]
    fn contrast_clamps_and_rounds() {
        let img = RgbImage::from_pixel(1, 1, Rgb([200, 101, 0]));
        assert_eq!(adjust_contrast(&img, 1.5).get_pixel(0, 0), &Rgb([255, 152, 0]));
        assert_eq!(adjust_contrast(&img, 0.5).get_pixel(0, 0), &Rgb([100, 51, 0]));
    }

    #[test]
    fn brightness_clamps_both_ends() {
        let img = RgbImage::from_pixel(1, 1, Rgb([250, 40, 128]));
        assert_eq!(adjust_brightness(&img, 75).get_pixel(0, 0), &Rgb([255, 115, 203]));
        assert_eq!(adjust_brightness(&img, -75).get_pixel(0, 0), &Rgb([175, 0, 53]));
    }

    #[test]
    fn noise_is_seeded_and_changes_pixels() {
        let img = RgbImage::from_pixel(16, 16, Rgb([128, 128, 128]));
        let a = add_noise(&img, 3, 42);
        let b = add_noise(&img, 3, 42);
        assert_eq!(a, b);
        assert_ne!(a, img);
        // 高 σ 时必然有截断到边界的像素
        let extremes = a.iter().filter(|&&v| v == 0 || v == 255).count();
        assert!(extremes > 0);
    }
}
