// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 训练驱动: 依次调用 Ultralytics `yolo` 命令行完成 训练 → 验证 → 导出

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::TrainConfig;
use crate::error::{Error, Result};
use crate::layout::Layout;

/// 训练流程中的一个步骤
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainStep {
    pub name: &'static str,
    pub program: String,
    pub args: Vec<String>,
}

impl TrainStep {
    fn new(name: &'static str, program: &str, args: Vec<String>) -> Self {
        Self {
            name,
            program: program.to_string(),
            args,
        }
    }

    pub fn run(&self) -> Result<()> {
        log::info!("🚀 [{}] {}", self.name, self);
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .map_err(|source| Error::TrainerSpawn {
                step: self.name.to_string(),
                source,
            })?;
        if !status.success() {
            return Err(Error::TrainerFailed {
                step: self.name.to_string(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for TrainStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// 数据集描述文件路径: 相对路径以数据根目录为基准
pub fn data_path(layout: &Layout, config: &TrainConfig) -> PathBuf {
    layout.root.join(&config.data)
}

/// train → val → export 三个固定步骤
pub struct TrainPlan<'a> {
    config: &'a TrainConfig,
    data: PathBuf,
}

impl<'a> TrainPlan<'a> {
    pub fn new(layout: &Layout, config: &'a TrainConfig) -> Self {
        Self {
            config,
            data: data_path(layout, config),
        }
    }

    pub fn data(&self) -> &Path {
        &self.data
    }

    pub fn steps(&self) -> Vec<TrainStep> {
        let c = self.config;
        let yolo = c.yolo_bin.as_str();
        let data = format!("data={}", self.data.display());
        let imgsz = format!("imgsz={}", c.imgsz);
        let best = format!("model={}", c.best_weights().display());

        vec![
            TrainStep::new(
                "train",
                yolo,
                vec![
                    "detect".into(),
                    "train".into(),
                    format!("model={}", c.model),
                    data.clone(),
                    format!("epochs={}", c.epochs),
                    imgsz.clone(),
                    format!("batch={}", c.batch),
                    format!("patience={}", c.patience),
                    format!("project={}", c.project.display()),
                    format!("name={}", c.name),
                    "exist_ok=True".into(),
                ],
            ),
            TrainStep::new(
                "val",
                yolo,
                vec![
                    "detect".into(),
                    "val".into(),
                    best.clone(),
                    data,
                    imgsz.clone(),
                ],
            ),
            TrainStep::new(
                "export",
                yolo,
                vec![
                    "export".into(),
                    best,
                    format!("format={}", c.export_format),
                    imgsz,
                ],
            ),
        ]
    }

    /// 导出后的模型路径 (与 best.pt 同目录, 扩展名随格式变化)
    pub fn exported_model(&self) -> PathBuf {
        self.config
            .best_weights()
            .with_extension(self.config.export_format.as_str())
    }

    pub fn run(&self) -> Result<PathBuf> {
        for step in self.steps() {
            step.run()?;
        }
        let exported = self.exported_model();
        log::info!("✅ 训练完成, 导出模型: {}", exported.display());
        Ok(exported)
    }
}

fn yaml_single_quoted(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}

/// 生成 Ultralytics 数据集描述文件 (data.yaml)
pub fn data_yaml(layout: &Layout, names: &[String]) -> String {
    let mut yaml = format!(
        "path: {}\ntrain: train/images\nval: valid/images\n\nnc: {}\nnames:\n",
        yaml_single_quoted(&layout.dataset_dir().to_string_lossy()),
        names.len()
    );
    for (idx, name) in names.iter().enumerate() {
        yaml.push_str(&format!("  {}: {}\n", idx, yaml_single_quoted(name)));
    }
    yaml
}

pub fn write_data_yaml(path: &Path, layout: &Layout, names: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, data_yaml(layout, names)).map_err(|e| Error::io(path, e))?;
    log::info!("📝 数据集描述已写入 {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_uses_fixed_hyperparameters() {
        let config = TrainConfig::default();
        let steps = TrainPlan::new(&Layout::default(), &config).steps();
        let names: Vec<_> = steps.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["train", "val", "export"]);

        assert_eq!(
            steps[0].to_string(),
            "yolo detect train model=yolov8n.pt data=./HandSigns_v2/data.yaml epochs=100 \
             imgsz=640 batch=16 patience=20 project=runs/detect name=handsign exist_ok=True"
        );
        assert_eq!(
            steps[1].to_string(),
            "yolo detect val model=runs/detect/handsign/weights/best.pt \
             data=./HandSigns_v2/data.yaml imgsz=640"
        );
        assert_eq!(
            steps[2].to_string(),
            "yolo export model=runs/detect/handsign/weights/best.pt format=onnx imgsz=640"
        );
    }

    #[test]
    fn exported_model_follows_format() {
        let config = TrainConfig::default();
        assert_eq!(
            TrainPlan::new(&Layout::default(), &config).exported_model(),
            PathBuf::from("runs/detect/handsign/weights/best.onnx")
        );
    }

    #[test]
    fn missing_binary_is_spawn_error() {
        let config = TrainConfig {
            yolo_bin: "definitely-not-a-yolo-binary".into(),
            ..Default::default()
        };
        let err = TrainPlan::new(&Layout::default(), &config)
            .run()
            .unwrap_err();
        assert!(matches!(err, Error::TrainerSpawn { ref step, .. } if step == "train"));
    }

    #[test]
    fn data_yaml_lists_names() {
        let layout = Layout::with_root("data");
        let names = vec!["ok".to_string(), "pinch".to_string()];
        let yaml = data_yaml(&layout, &names);
        assert!(yaml.starts_with("path: 'data/HandSigns_v2'\n"));
        assert!(yaml.contains("val: valid/images\n"));
        assert!(yaml.contains("nc: 2\n"));
        assert!(yaml.ends_with("names:\n  0: 'ok'\n  1: 'pinch'\n"));
    }

    #[test]
    fn data_yaml_quotes_special_characters() {
        let layout = Layout::with_root("runs: #1");
        let names = vec!["peace: v".to_string(), "it's ok #2".to_string()];
        let yaml = data_yaml(&layout, &names);
        assert!(yaml.starts_with("path: 'runs: #1/HandSigns_v2'\n"));
        assert!(yaml.contains("  0: 'peace: v'\n"));
        assert!(yaml.contains("  1: 'it''s ok #2'\n"));
    }

    #[test]
    fn descriptor_and_plan_share_data_path() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::with_root(dir.path());
        let config = TrainConfig::default();
        let plan = TrainPlan::new(&layout, &config);
        let expected = dir.path().join("HandSigns_v2").join("data.yaml");
        assert_eq!(plan.data(), expected.as_path());

        write_data_yaml(plan.data(), &layout, &config.class_names).unwrap();
        assert!(expected.exists());

        let arg = format!("data={}", expected.display());
        for step in &plan.steps()[..2] {
            assert!(step.args.contains(&arg), "{}", step);
        }
    }
}
