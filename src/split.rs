// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 训练/验证集划分 (Dataset splitter)
//!
//! `augmented/{images,labels}` → `HandSigns_v2/{train,valid}/{images,labels}`,
//! 只复制不移动, 划分点为 `ceil(total × ratio)`。

use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::config::{MissingLabelPolicy, SplitConfig};
use crate::error::{Error, Result};
use crate::label::label_path_for;
use crate::layout::{self, Layout, PairDirs};
use crate::logging;

/// 划分点: `ceil(total × ratio)`, 不超过 total
pub fn split_index(total: usize, ratio: f64) -> usize {
    ((total as f64 * ratio).ceil() as usize).min(total)
}

/// 打乱后按比例切分, 两部分互不相交且并集为全集
pub fn partition<T>(mut items: Vec<T>, ratio: f64, rng: &mut impl Rng) -> (Vec<T>, Vec<T>) {
    items.shuffle(rng);
    let valid = items.split_off(split_index(items.len(), ratio));
    (items, valid)
}

pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitSummary {
    pub total: usize,
    pub train: usize,
    pub valid: usize,
    pub missing_labels: usize,
}

/// 复制一对图片+标注, 标注缺失时按策略处理
fn copy_pair(
    image_name: &str,
    source: &PairDirs,
    dest: &PairDirs,
    policy: MissingLabelPolicy,
) -> Result<(bool, bool)> {
    let img_src = source.images.join(image_name);
    if !img_src.exists() {
        log::warn!("⚠️ Image file not found {}, skipping.", img_src.display());
        return Ok((false, false));
    }
    layout::copy_into(&img_src, &dest.images)?;

    let lbl_src = label_path_for(&source.labels, Path::new(image_name));
    if lbl_src.exists() {
        layout::copy_into(&lbl_src, &dest.labels)?;
        return Ok((true, true));
    }
    match policy {
        MissingLabelPolicy::Error => Err(Error::MissingLabel {
            image: img_src,
            label: lbl_src,
        }),
        MissingLabelPolicy::Warn => {
            log::warn!(
                "⚠️ Label file not found {} for image {}.",
                lbl_src.display(),
                image_name
            );
            Ok((true, false))
        }
    }
}

pub fn split_dataset(layout: &Layout, config: &SplitConfig) -> Result<SplitSummary> {
    let source = layout.augmented();
    log::info!("🔍 Finding all images in {}...", source.images.display());

    let image_files: Vec<String> = layout::list_images(&source.images)?
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();

    if image_files.is_empty() {
        log::error!("❌ No images found in {}", source.images.display());
        return Ok(SplitSummary::default());
    }

    let (train_dirs, valid_dirs) = (layout.train(), layout.valid());
    train_dirs.create()?;
    valid_dirs.create()?;

    let total = image_files.len();
    log::info!("🔀 Found {} images. Shuffling list...", total);
    let mut rng = make_rng(config.seed);
    let (train_files, valid_files) = partition(image_files, config.ratio, &mut rng);

    log::info!("Total files: {}", total);
    log::info!("Training files: {}", train_files.len());
    log::info!("Validation files: {}", valid_files.len());

    let mut summary = SplitSummary {
        total,
        ..Default::default()
    };

    for (files, dest, split) in [
        (&train_files, &train_dirs, "train"),
        (&valid_files, &valid_dirs, "valid"),
    ] {
        let pb = logging::progress_bar(files.len(), split);
        for name in files {
            let (copied, labelled) = copy_pair(name, &source, dest, config.missing_label)?;
            if copied {
                match split {
                    "train" => summary.train += 1,
                    _ => summary.valid += 1,
                }
                if !labelled {
                    summary.missing_labels += 1;
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();
    }

    log::info!(
        "✅ Dataset split complete! {} is ready for training.",
        layout.dataset_dir().display()
    );
    Ok(summary)
}
