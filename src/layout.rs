// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 数据集目录布局 (Directory layout)
//!
//! ```text
//! new_images/            裁剪后的原图
//! resized_images2/       缩放到 640x640 的图片 (人工标注后放入 resized/)
//! resized/{images,labels}
//! rotated/{images,labels}
//! contrasted/{images,labels}
//! brightened/{images,labels}
//! noised/{images,labels}
//! augmented/{images,labels}   所有增强结果的汇总
//! HandSigns_v2/{train,valid}/{images,labels}
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "png", "jpeg"];

/// 一对平行的 images/ + labels/ 目录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairDirs {
    pub images: PathBuf,
    pub labels: PathBuf,
}

impl PairDirs {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            images: root.join("images"),
            labels: root.join("labels"),
        }
    }

    pub fn create(&self) -> Result<()> {
        create_dir(&self.images)?;
        create_dir(&self.labels)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    /// 所有相对路径的根目录
    pub root: PathBuf,
    pub cropped: String,
    pub resized_flat: String,
    pub resized: String,
    pub rotated: String,
    pub contrasted: String,
    pub brightened: String,
    pub noised: String,
    pub augmented: String,
    pub dataset: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            cropped: "new_images".into(),
            resized_flat: "resized_images2".into(),
            resized: "resized".into(),
            rotated: "rotated".into(),
            contrasted: "contrasted".into(),
            brightened: "brightened".into(),
            noised: "noised".into(),
            augmented: "augmented".into(),
            dataset: "HandSigns_v2".into(),
        }
    }
}

impl Layout {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn cropped_dir(&self) -> PathBuf {
        self.root.join(&self.cropped)
    }

    pub fn resized_flat_dir(&self) -> PathBuf {
        self.root.join(&self.resized_flat)
    }

    pub fn pair(&self, name: &str) -> PairDirs {
        PairDirs::new(self.root.join(name))
    }

    pub fn resized(&self) -> PairDirs {
        self.pair(&self.resized)
    }

    pub fn augmented(&self) -> PairDirs {
        self.pair(&self.augmented)
    }

    pub fn dataset_dir(&self) -> PathBuf {
        self.root.join(&self.dataset)
    }

    pub fn train(&self) -> PairDirs {
        PairDirs::new(self.dataset_dir().join("train"))
    }

    pub fn valid(&self) -> PairDirs {
        PairDirs::new(self.dataset_dir().join("valid"))
    }
}

pub fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))
}

pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// 列出目录下的所有文件 (按文件名排序), 可选按扩展名过滤
pub fn list_files(dir: &Path, filter: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if path.is_file() && filter(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    list_files(dir, has_image_extension)
}

/// 复制文件到目标目录 (保留文件名)
pub fn copy_into(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let name = src
        .file_name()
        .ok_or_else(|| Error::io(src, std::io::ErrorKind::InvalidInput.into()))?;
    let dest = dest_dir.join(name);
    fs::copy(src, &dest).map_err(|e| Error::io(src, e))?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_extensions_are_case_insensitive() {
        assert!(has_image_extension(Path::new("a.JPG")));
        assert!(has_image_extension(Path::new("a.jpeg")));
        assert!(has_image_extension(Path::new("dir/a.Png")));
        assert!(!has_image_extension(Path::new("a.txt")));
        assert!(!has_image_extension(Path::new("jpg")));
    }

    #[test]
    fn default_layout_matches_pipeline_dirs() {
        let layout = Layout::with_root("/data");
        assert_eq!(layout.resized().images, PathBuf::from("/data/resized/images"));
        assert_eq!(
            layout.train().labels,
            PathBuf::from("/data/HandSigns_v2/train/labels")
        );
        assert_eq!(
            layout.valid().images,
            PathBuf::from("/data/HandSigns_v2/valid/images")
        );
        assert_eq!(layout.cropped_dir(), PathBuf::from("/data/new_images"));
    }

    #[test]
    fn list_images_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.jpg", "a.PNG", "notes.txt", "c.jpeg"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("sub.jpg")).unwrap();

        let names: Vec<String> = list_images(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PNG", "b.jpg", "c.jpeg"]);
    }
}
