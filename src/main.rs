// 该文件是 Poolseg （泳池分割） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use poolseg::{config::DetectConfig, task::run_detection};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let config = DetectConfig::from(args::Args::parse());

  info!("模型文件路径: {}", config.model.display());
  info!("输入图像: {}", config.input.display());
  info!("输出目录: {}", config.output_dir.display());
  info!("置信度阈值: {}", config.confidence);

  let paths = run_detection(&config)?;

  println!("处理完成: {}", config.input.display());
  println!(" - 图像已保存到: {}", paths.image.display());
  println!(" - 坐标已保存到: {}", paths.coordinates.display());

  Ok(())
}
