// 该文件是 Poolseg （泳池分割） 项目的一部分。
// src/output/save_result.rs - 保存标注图像与坐标文件
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

use std::{
  ffi::OsString,
  path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{info, warn};

use crate::{
  input::SourceImage,
  model::SegmentResult,
  output::{
    Render,
    draw::{Draw, DrawSegmentationOnFrame},
    record::Record,
  },
};

#[derive(Error, Debug)]
pub enum SaveResultError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("无法从路径推导输出文件名: {0}")]
  InvalidPath(PathBuf),
}

/// 一张输入图像对应的两个输出文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
  pub image: PathBuf,
  pub coordinates: PathBuf,
}

pub struct SaveResultOutput {
  directory: PathBuf,
  draw: Draw,
  record: Record,
}

impl SaveResultOutput {
  /// 输出目录不存在时创建
  pub fn create(directory: impl Into<PathBuf>) -> Result<Self, SaveResultError> {
    let directory = directory.into();
    if !directory.exists() {
      info!("创建输出目录: {}", directory.display());
      std::fs::create_dir_all(&directory)?;
    }

    Ok(SaveResultOutput {
      directory,
      draw: Draw::default(),
      record: Record::default(),
    })
  }

  /// `house1.jpg` -> `output_house1.jpg` 与 `coordinates_house1.txt`
  pub fn paths_for(&self, source: &Path) -> Result<OutputPaths, SaveResultError> {
    let invalid = || SaveResultError::InvalidPath(source.to_path_buf());
    let name = source.file_name().ok_or_else(invalid)?;
    let stem = source.file_stem().ok_or_else(invalid)?;

    // 文件名不要求是 UTF-8
    let mut image = OsString::from("output_");
    image.push(name);
    let mut coordinates = OsString::from("coordinates_");
    coordinates.push(stem);
    coordinates.push(".txt");

    Ok(OutputPaths {
      image: self.directory.join(image),
      coordinates: self.directory.join(coordinates),
    })
  }
}

impl Render<SourceImage, SegmentResult> for SaveResultOutput {
  type Error = SaveResultError;

  fn render_result(&self, frame: &SourceImage, result: &SegmentResult) -> Result<(), Self::Error> {
    let paths = self.paths_for(frame.path())?;

    if result.is_empty() {
      // 无检测时原样复制，保证与输入逐字节一致
      warn!("图像中未检测到泳池");
      std::fs::copy(frame.path(), &paths.image)?;
    } else {
      info!("检测到 {} 个泳池", result.len());
      let image = self.draw.draw_segmentation(frame, result);
      image.save(&paths.image)?;
    }
    info!("保存图像到文件: {}", paths.image.display());

    self.record.record(result, &paths.coordinates)?;
    info!("保存坐标到文件: {}", paths.coordinates.display());

    Ok(())
  }
}
