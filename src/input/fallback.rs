// 该文件是 Poolseg （泳池分割） 项目的一部分。
// src/input/fallback.rs - 输入路径解析
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

use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum InputError {
  #[error("找不到图像: {given} 或 {fallback}")]
  NotFound { given: PathBuf, fallback: PathBuf },
  #[error("输入路径没有文件名: {0}")]
  NoFileName(PathBuf),
}

/// 先查找给定路径，再到备用目录下查找同名文件
#[derive(Debug, Clone)]
pub struct InputResolver {
  fallback_dir: PathBuf,
}

impl InputResolver {
  pub fn new(fallback_dir: impl Into<PathBuf>) -> Self {
    Self {
      fallback_dir: fallback_dir.into(),
    }
  }

  pub fn resolve(&self, path: &Path) -> Result<PathBuf, InputError> {
    if path.is_file() {
      debug!("输入文件存在: {}", path.display());
      return Ok(path.to_path_buf());
    }

    let name = path
      .file_name()
      .ok_or_else(|| InputError::NoFileName(path.to_path_buf()))?;
    let candidate = self.fallback_dir.join(name);

    if candidate.is_file() {
      info!("在备用目录中找到输入文件: {}", candidate.display());
      return Ok(candidate);
    }

    error!(
      "找不到图像: {} 或 {}",
      path.display(),
      candidate.display()
    );
    Err(InputError::NotFound {
      given: path.to_path_buf(),
      fallback: candidate,
    })
  }
}
