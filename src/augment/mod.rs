// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 数据增强流水线 (Augmentation pipeline)
//!
//! ```text
//! resized ──旋转×4──▶ rotated ──┬─对比度×2──▶ contrasted
//!                              ├─亮度×4────▶ brightened
//!                              └─噪声×3────▶ noised
//!            rotated + contrasted + brightened + noised ──复制──▶ augmented
//! ```
//!
//! 对比度/亮度/噪声都从 4 张旋转图派生, 所以每张原图最终得到 4 + 4×9 = 40 张。

pub mod ops;

use std::path::PathBuf;

use image::RgbImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{AugmentConfig, MissingLabelPolicy};
use crate::error::{Error, Result};
use crate::label::{label_path_for, LabelFile};
use crate::layout::{self, Layout, PairDirs};
use crate::logging;
use crate::prepare::read_rgb;

pub use ops::Rotation;

/// 单个变换: 图片变换与标注变换成对出现
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    Rotate(Rotation),
    Contrast(f32),
    Brightness(i16),
    Noise(u32),
}

impl Transform {
    /// 文件名后缀, 例如 `_rot90` / `_C15` / `_B-35` / `_N2`
    pub fn tag(&self) -> String {
        match self {
            Transform::Rotate(rot) => format!("_rot{}", rot.degrees()),
            Transform::Contrast(factor) => format!("_C{}", (factor * 10.0) as i32),
            Transform::Brightness(offset) => format!("_B{}", offset),
            Transform::Noise(level) => format!("_N{}", level),
        }
    }

    pub fn apply_image(&self, image: &RgbImage, rng: &mut impl Rng) -> RgbImage {
        match *self {
            Transform::Rotate(rot) => rot.rotate_image(image),
            Transform::Contrast(factor) => ops::adjust_contrast(image, factor),
            Transform::Brightness(offset) => ops::adjust_brightness(image, offset),
            Transform::Noise(level) => ops::add_noise(image, level, rng.gen()),
        }
    }

    /// 只有几何变换会改变标注
    pub fn apply_labels(&self, labels: &LabelFile) -> LabelFile {
        match self {
            Transform::Rotate(rot) => labels.map(|b| rot.rotate_box(b)),
            _ => labels.clone(),
        }
    }
}

/// 一张增强后的图片及其标注
#[derive(Debug, Clone)]
pub struct Variant {
    pub name: String,
    pub image: RgbImage,
    pub labels: LabelFile,
}

/// 增强类型 (封闭枚举)
#[derive(Debug, Clone, PartialEq)]
pub enum Augmentation {
    Rotation,
    Contrast(Vec<f32>),
    Brightness(Vec<i16>),
    Noise(Vec<u32>),
}

impl Augmentation {
    /// 按执行顺序返回全部增强阶段
    pub fn pipeline(config: &AugmentConfig) -> Vec<Augmentation> {
        vec![
            Augmentation::Rotation,
            Augmentation::Contrast(config.contrast_factors.clone()),
            Augmentation::Brightness(config.brightness_offsets.clone()),
            Augmentation::Noise(config.noise_levels.clone()),
        ]
    }

    pub fn transforms(&self) -> Vec<Transform> {
        match self {
            Augmentation::Rotation => Rotation::ALL.iter().copied().map(Transform::Rotate).collect(),
            Augmentation::Contrast(factors) => {
                factors.iter().copied().map(Transform::Contrast).collect()
            }
            Augmentation::Brightness(offsets) => {
                offsets.iter().copied().map(Transform::Brightness).collect()
            }
            Augmentation::Noise(levels) => levels.iter().copied().map(Transform::Noise).collect(),
        }
    }

    /// 输出目录名
    pub fn stage_name<'a>(&self, layout: &'a Layout) -> &'a str {
        match self {
            Augmentation::Rotation => &layout.rotated,
            Augmentation::Contrast(_) => &layout.contrasted,
            Augmentation::Brightness(_) => &layout.brightened,
            Augmentation::Noise(_) => &layout.noised,
        }
    }

    /// 旋转读取 resized, 其它增强都读取 rotated
    pub fn source_name<'a>(&self, layout: &'a Layout) -> &'a str {
        match self {
            Augmentation::Rotation => &layout.resized,
            _ => &layout.rotated,
        }
    }

    pub fn variants(
        &self,
        base: &str,
        image: &RgbImage,
        labels: &LabelFile,
        rng: &mut impl Rng,
    ) -> Vec<Variant> {
        self.transforms()
            .into_iter()
            .map(|t| Variant {
                name: format!("{}{}", base, t.tag()),
                image: t.apply_image(image, rng),
                labels: t.apply_labels(labels),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AugmentSummary {
    /// (阶段名, 写出的图片数)
    pub stages: Vec<(String, usize)>,
    pub consolidated: usize,
    pub skipped: usize,
}

pub struct AugmentPipeline<'a> {
    layout: &'a Layout,
    config: &'a AugmentConfig,
    rng: StdRng,
}

impl<'a> AugmentPipeline<'a> {
    pub fn new(layout: &'a Layout, config: &'a AugmentConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            layout,
            config,
            rng,
        }
    }

    pub fn run(&mut self) -> Result<AugmentSummary> {
        let stages = Augmentation::pipeline(self.config);

        let mut dirs = vec![self.layout.resized(), self.layout.augmented()];
        dirs.extend(stages.iter().map(|s| self.layout.pair(s.stage_name(self.layout))));
        for d in &dirs {
            d.create()?;
        }
        log::info!("📁 All directories created");

        let mut summary = AugmentSummary::default();
        for stage in &stages {
            let name = stage.stage_name(self.layout).to_string();
            let written = self.run_stage(stage, &mut summary.skipped)?;
            log::info!("✅ {} done ({} images)", name, written);
            summary.stages.push((name, written));
        }

        summary.consolidated = self.consolidate(&stages)?;
        log::info!(
            "🎉 Augmentation finished: {} images in {}",
            summary.consolidated,
            self.layout.augmented().images.display()
        );
        Ok(summary)
    }

    fn run_stage(&mut self, stage: &Augmentation, skipped: &mut usize) -> Result<usize> {
        let source = self.layout.pair(stage.source_name(self.layout));
        let dest = self.layout.pair(stage.stage_name(self.layout));
        let files = layout::list_images(&source.images)?;
        let pb = logging::progress_bar(files.len(), stage.stage_name(self.layout));
        let mut written = 0;

        for path in files {
            pb.inc(1);
            let Some(base) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };

            let label_path = label_path_for(&source.labels, &path);
            if !label_path.exists() {
                match self.config.missing_label {
                    MissingLabelPolicy::Error => {
                        return Err(Error::MissingLabel {
                            image: path,
                            label: label_path,
                        })
                    }
                    MissingLabelPolicy::Warn => {
                        log::warn!(
                            "⚠️ Label file not found {} for image {}, skipping.",
                            label_path.display(),
                            path.display()
                        );
                        *skipped += 1;
                        continue;
                    }
                }
            }
            let labels = LabelFile::read(&label_path)?;

            let image = match read_rgb(&path) {
                Ok(image) => image,
                Err(e) => {
                    log::warn!("⚠️ 无法读取 {}: {}", path.display(), e);
                    *skipped += 1;
                    continue;
                }
            };

            for variant in stage.variants(&base, &image, &labels, &mut self.rng) {
                if write_variant(&variant, &dest)? {
                    written += 1;
                }
            }
        }
        pb.finish_and_clear();
        Ok(written)
    }

    /// 把每个阶段的输出复制 (不是移动) 到 augmented/
    fn consolidate(&self, stages: &[Augmentation]) -> Result<usize> {
        let target = self.layout.augmented();
        let mut copied = 0;
        for stage in stages {
            let source = self.layout.pair(stage.stage_name(self.layout));
            log::info!("📦 Copying files from {}...", stage.stage_name(self.layout));
            let jpgs = layout::list_files(&source.images, |p| {
                p.extension().is_some_and(|ext| ext == "jpg")
            })?;
            for image in jpgs {
                layout::copy_into(&image, &target.images)?;
                let label = label_path_for(&source.labels, &image);
                if label.exists() {
                    layout::copy_into(&label, &target.labels)?;
                }
                copied += 1;
            }
        }
        Ok(copied)
    }
}

/// 写出图片 (.jpg) 和标注, 图片写入失败只打印警告
fn write_variant(variant: &Variant, dest: &PairDirs) -> Result<bool> {
    let image_path = dest.images.join(format!("{}.jpg", variant.name));
    if let Err(e) = variant.image.save(&image_path) {
        log::warn!("❌ Failed to save {}: {}", image_path.display(), e);
        return Ok(false);
    }
    let label_path = dest.labels.join(format!("{}.txt", variant.name));
    variant.labels.write(&label_path)?;
    Ok(true)
}

/// 便捷入口: 按布局和配置跑完整条增强流水线
pub fn augment_dataset(layout: &Layout, config: &AugmentConfig) -> Result<AugmentSummary> {
    AugmentPipeline::new(layout, config).run()
}

/// 检查输出是否满足图片/标注一一对应
pub fn unpaired_images(dirs: &PairDirs) -> Result<Vec<PathBuf>> {
    Ok(layout::list_images(&dirs.images)?
        .into_iter()
        .filter(|p| !label_path_for(&dirs.labels, p).exists())
        .collect())
}
