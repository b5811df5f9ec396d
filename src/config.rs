// 该文件是 Poolseg （泳池分割） 项目的一部分。
// src/config.rs - 检测配置
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::PathBuf;

pub const DEFAULT_MODEL_PATH: &str = "best.onnx";
pub const DEFAULT_FALLBACK_DIR: &str = "input_images";
pub const DEFAULT_OUTPUT_DIR: &str = "output_results";
pub const DEFAULT_CONFIDENCE: f32 = 0.25;
pub const DEFAULT_IOU: f32 = 0.7;
pub const DEFAULT_INPUT_SIZE: u32 = 640;
pub const DEFAULT_MAX_DETECTIONS: usize = 300;

/// 单次检测任务的全部配置
#[derive(Debug, Clone)]
pub struct DetectConfig {
  pub input: PathBuf,
  pub fallback_dir: PathBuf,
  pub output_dir: PathBuf,
  pub model: PathBuf,
  pub confidence: f32,
  pub iou: f32,
  pub input_size: u32,
  pub max_detections: usize,
}

impl DetectConfig {
  pub fn new(input: impl Into<PathBuf>) -> Self {
    Self {
      input: input.into(),
      fallback_dir: PathBuf::from(DEFAULT_FALLBACK_DIR),
      output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
      model: PathBuf::from(DEFAULT_MODEL_PATH),
      confidence: DEFAULT_CONFIDENCE,
      iou: DEFAULT_IOU,
      input_size: DEFAULT_INPUT_SIZE,
      max_detections: DEFAULT_MAX_DETECTIONS,
    }
  }

  pub fn fallback_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.fallback_dir = dir.into();
    self
  }

  pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.output_dir = dir.into();
    self
  }

  pub fn model(mut self, model: impl Into<PathBuf>) -> Self {
    self.model = model.into();
    self
  }

  pub fn confidence(mut self, confidence: f32) -> Self {
    self.confidence = confidence;
    self
  }

  pub fn iou(mut self, iou: f32) -> Self {
    self.iou = iou;
    self
  }
}
