// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 图片预处理: 居中裁剪成正方形, 再缩放到网络输入尺寸

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::config::PrepareConfig;
use crate::error::{Error, Result};
use crate::layout::{self, Layout};
use crate::logging;

/// 居中裁剪, `size = (宽, 高)` 超出原图时按原图尺寸截断
pub fn crop_center(image: &RgbImage, size: (u32, u32)) -> RgbImage {
    let (width, height) = image.dimensions();
    let crop_w = size.0.min(width);
    let crop_h = size.1.min(height);
    let start_x = (width - crop_w) / 2;
    let start_y = (height - crop_h) / 2;
    imageops::crop_imm(image, start_x, start_y, crop_w, crop_h).to_image()
}

/// 缩放到精确尺寸 (不保持宽高比)
pub fn resize_exact(image: &RgbImage, size: (u32, u32)) -> RgbImage {
    imageops::resize(image, size.0, size.1, FilterType::Triangle)
}

pub fn read_rgb(path: &Path) -> Result<RgbImage> {
    let image = image::open(path).map_err(|e| Error::image(path, e))?;
    Ok(image.to_rgb8())
}

/// 保存图片, 失败时只打印警告 (返回 false)
fn save_or_warn(image: &RgbImage, input: &Path, output: &Path) -> bool {
    match image.save(output) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("❌ Failed to save {}: {}", input.display(), e);
            false
        }
    }
}

pub fn crop_image(input: &Path, output: &Path, size: (u32, u32)) -> Result<bool> {
    let image = read_rgb(input)?;
    let cropped = crop_center(&image, size);
    Ok(save_or_warn(&cropped, input, output))
}

pub fn resize_image(input: &Path, output: &Path, size: (u32, u32)) -> Result<bool> {
    let image = read_rgb(input)?;
    let resized = resize_exact(&image, size);
    Ok(save_or_warn(&resized, input, output))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrepareSummary {
    pub cropped: usize,
    pub resized: usize,
    pub failed: usize,
}

/// 对目录下每个文件执行同一个操作, 单个文件失败不影响其它文件
fn for_each_file(
    input_dir: &Path,
    output_dir: &Path,
    stage: &str,
    mut op: impl FnMut(&Path, &Path) -> Result<bool>,
) -> Result<(usize, usize)> {
    let files = layout::list_files(input_dir, |_| true)?;
    let pb = logging::progress_bar(files.len(), stage);
    let (mut done, mut failed) = (0, 0);

    for path in files {
        let output: PathBuf = match path.file_name() {
            Some(name) => output_dir.join(name),
            None => continue,
        };
        log::debug!("Starting processing {}", path.display());
        match op(&path, &output) {
            Ok(true) => done += 1,
            Ok(false) => failed += 1,
            Err(e) => {
                log::warn!("⚠️ 跳过 {}: {}", path.display(), e);
                failed += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    Ok((done, failed))
}

/// 数据准备主流程: (可选) 裁剪 `crop_from` → `new_images`, 然后缩放 `new_images` → `resized_images2`
pub fn prepare_dir(
    layout: &Layout,
    config: &PrepareConfig,
    crop_from: Option<&Path>,
) -> Result<PrepareSummary> {
    let cropped_dir = layout.cropped_dir();
    let resized_dir = layout.resized_flat_dir();
    layout::create_dir(&cropped_dir)?;
    layout::create_dir(&resized_dir)?;

    let mut summary = PrepareSummary::default();

    if let Some(input_dir) = crop_from {
        let (done, failed) = for_each_file(input_dir, &cropped_dir, "crop", |i, o| {
            crop_image(i, o, config.crop_size)
        })?;
        summary.cropped = done;
        summary.failed += failed;
        log::info!("✂️ Cropping of the images done ({} files)", done);
    }

    let (done, failed) = for_each_file(&cropped_dir, &resized_dir, "resize", |i, o| {
        resize_image(i, o, config.resize)
    })?;
    summary.resized = done;
    summary.failed += failed;
    log::info!(
        "📐 Resizing of the images done ({} files → {})",
        done,
        resized_dir.display()
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| Rgb([x as u8, y as u8, 0]))
    }

    #[test]
    fn crop_is_centered() {
        let img = gradient(10, 6);
        let out = crop_center(&img, (4, 4));
        assert_eq!(out.dimensions(), (4, 4));
        // start_x = (10-4)/2 = 3, start_y = (6-4)/2 = 1
        assert_eq!(out.get_pixel(0, 0), &Rgb([3, 1, 0]));
    }

    #[test]
    fn crop_clamps_to_image_size() {
        let img = gradient(8, 5);
        let out = crop_center(&img, (3000, 3000));
        assert_eq!(out.dimensions(), (8, 5));
        assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 0]));

        let out = crop_center(&img, (4, 3000));
        assert_eq!(out.dimensions(), (4, 5));
        assert_eq!(out.get_pixel(0, 0), &Rgb([2, 0, 0]));
    }

    #[test]
    fn resize_ignores_aspect_ratio() {
        let img = gradient(30, 10);
        assert_eq!(resize_exact(&img, (16, 16)).dimensions(), (16, 16));
    }

    #[test]
    fn prepare_dir_crops_and_resizes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input_images");
        std::fs::create_dir(&input).unwrap();
        gradient(40, 20).save(input.join("a.png")).unwrap();
        gradient(20, 40).save(input.join("b.png")).unwrap();
        std::fs::write(input.join("broken.png"), b"not an image").unwrap();

        let layout = Layout::with_root(dir.path());
        let config = PrepareConfig {
            crop_size: (16, 16),
            resize: (8, 8),
        };
        let summary = prepare_dir(&layout, &config, Some(&input)).unwrap();
        assert_eq!(summary.cropped, 2);
        assert_eq!(summary.resized, 2);
        assert_eq!(summary.failed, 1);

        let resized = read_rgb(&layout.resized_flat_dir().join("a.png")).unwrap();
        assert_eq!(resized.dimensions(), (8, 8));
        let cropped = read_rgb(&layout.cropped_dir().join("b.png")).unwrap();
        assert_eq!(cropped.dimensions(), (16, 16));
    }
}
