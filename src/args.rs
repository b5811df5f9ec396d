// 该文件是 Poolseg （泳池分割） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use poolseg::config::{
  DEFAULT_CONFIDENCE, DEFAULT_FALLBACK_DIR, DEFAULT_IOU, DEFAULT_MODEL_PATH, DEFAULT_OUTPUT_DIR,
  DetectConfig,
};

/// 检测航拍图像中的泳池，输出轮廓图像与坐标文件
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入航拍图像路径；找不到时到备用目录下查找同名文件
  #[arg(value_name = "INPUT_IMAGE")]
  pub input_image: PathBuf,

  /// ONNX 分割模型文件路径
  #[arg(long, default_value = DEFAULT_MODEL_PATH, value_name = "FILE")]
  pub model: PathBuf,

  /// 备用输入目录
  #[arg(long, default_value = DEFAULT_FALLBACK_DIR, value_name = "DIR")]
  pub fallback_dir: PathBuf,

  /// 输出目录
  #[arg(long, default_value = DEFAULT_OUTPUT_DIR, value_name = "DIR")]
  pub output_dir: PathBuf,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_CONFIDENCE, value_name = "THRESHOLD")]
  pub confidence: f32,

  /// NMS IOU 阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_IOU, value_name = "THRESHOLD")]
  pub iou: f32,
}

impl From<Args> for DetectConfig {
  fn from(args: Args) -> Self {
    DetectConfig::new(args.input_image)
      .model(args.model)
      .fallback_dir(args.fallback_dir)
      .output_dir(args.output_dir)
      .confidence(args.confidence)
      .iou(args.iou)
  }
}
