// 该文件是 Poolseg （泳池分割） 项目的一部分。
// src/input.rs - 图像输入
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

use std::path::{Path, PathBuf};

use image::RgbImage;

pub trait AsRgbImage {
  fn as_rgb_image(&self) -> &RgbImage;
}

/// 已解码的原图及其文件路径
#[derive(Debug, Clone)]
pub struct SourceImage {
  path: PathBuf,
  image: RgbImage,
}

impl SourceImage {
  pub fn new(path: impl Into<PathBuf>, image: RgbImage) -> Self {
    Self {
      path: path.into(),
      image,
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl AsRgbImage for SourceImage {
  fn as_rgb_image(&self) -> &RgbImage {
    &self.image
  }
}

mod fallback;
pub use self::fallback::{InputError, InputResolver};

mod read_image_file;
pub use self::read_image_file::{ImageFileInput, ImageFileInputError};
