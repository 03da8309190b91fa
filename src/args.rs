//! Command-line options shared by the console and desktop binaries.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use log::LevelFilter;

use crate::config::{DEFAULT_FALLBACK_MODEL, DEFAULT_MODEL, DetectorConfig};
use crate::models::TaskMode;
use crate::report::overlay::OverlayConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum TaskArg {
    /// Use the task stored in the model metadata
    #[default]
    Auto,
    Classify,
    Detect,
}

impl TaskArg {
    pub fn mode(self) -> Option<TaskMode> {
        match self {
            TaskArg::Auto => None,
            TaskArg::Classify => Some(TaskMode::Classify),
            TaskArg::Detect => Some(TaskMode::Detect),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ModelArgs {
    /// Path to the trained ONNX model
    #[arg(long, value_name = "FILE", env = "GEARSCAN_MODEL", default_value = DEFAULT_MODEL)]
    pub model: PathBuf,

    /// Model loaded when the primary one cannot be
    #[arg(long, value_name = "FILE", default_value = DEFAULT_FALLBACK_MODEL)]
    pub fallback_model: PathBuf,

    /// Fail instead of trying the fallback model
    #[arg(long)]
    pub no_fallback: bool,

    #[arg(long, value_enum, default_value_t = TaskArg::Auto)]
    pub task: TaskArg,

    /// Square model input size, overriding the model metadata
    #[arg(long, value_name = "PIXELS", value_parser = clap::value_parser!(u32).range(1..))]
    pub input_size: Option<u32>,

    /// Minimum box confidence in detection mode
    #[arg(long, default_value_t = 0.25)]
    pub conf: f32,

    /// Box overlap above which the weaker box is suppressed
    #[arg(long, default_value_t = 0.7)]
    pub iou: f32,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl ModelArgs {
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig::new(&self.model)
            .with_fallback((!self.no_fallback).then(|| self.fallback_model.clone()))
            .with_task(self.task.mode())
            .with_input_size(self.input_size)
            .with_thresholds(self.conf, self.iou)
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct OverlayArgs {
    /// TrueType font for result captions
    #[arg(long, value_name = "FILE")]
    pub font: Option<PathBuf>,

    /// Where annotated result images are saved
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,
}

impl OverlayArgs {
    pub fn overlay_config(&self) -> OverlayConfig {
        OverlayConfig {
            font_path: self.font.clone(),
            output_dir: self.output_dir.clone(),
            ..OverlayConfig::default()
        }
    }
}

/// `RUST_LOG` wins over the level picked from the flags
pub fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        model: ModelArgs,
        #[command(flatten)]
        overlay: OverlayArgs,
    }

    #[test]
    fn defaults_keep_fallback_and_auto_task() {
        let cli = TestCli::try_parse_from(["gearscan", "--model", "gear.onnx"]).unwrap();
        let config = cli.model.detector_config();
        assert_eq!(config.model_path, PathBuf::from("gear.onnx"));
        assert_eq!(config.fallback_model, Some(PathBuf::from(DEFAULT_FALLBACK_MODEL)));
        assert_eq!(config.task, None);
        assert_eq!(cli.model.log_level(), LevelFilter::Warn);
        assert_eq!(cli.overlay.overlay_config().output_dir, PathBuf::from("."));
    }

    #[test]
    fn flags_override_config() {
        let cli = TestCli::try_parse_from([
            "gearscan",
            "--model",
            "gear.onnx",
            "--no-fallback",
            "--task",
            "detect",
            "--input-size",
            "320",
            "--conf",
            "0.4",
            "-v",
        ])
        .unwrap();
        let config = cli.model.detector_config();
        assert_eq!(config.fallback_model, None);
        assert_eq!(config.task, Some(TaskMode::Detect));
        assert_eq!(config.input_size, Some(320));
        assert_eq!(config.confidence_threshold, 0.4);
        assert_eq!(cli.model.log_level(), LevelFilter::Debug);
    }

    #[test]
    fn zero_input_size_is_rejected() {
        let result =
            TestCli::try_parse_from(["gearscan", "--task", "detect", "--input-size", "0"]);
        assert!(result.is_err());
    }
}
