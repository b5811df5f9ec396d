// 该文件是 Poolseg （泳池分割） 项目的一部分。
// src/frame.rs - 模型输入张量与 letterbox 几何
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

use image::{RgbImage, imageops::FilterType};
use ndarray::Array4;

const RGB_CHANNELS: usize = 3;
const LETTERBOX_PAD_VALUE: f32 = 114.0;

/// 原图到正方形模型输入之间的缩放与填充关系
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
  pub gain: f32,
  pub pad_left: u32,
  pub pad_top: u32,
  pub scaled_width: u32,
  pub scaled_height: u32,
  pub source_width: u32,
  pub source_height: u32,
  pub size: u32,
}

impl Letterbox {
  pub fn new(source_width: u32, source_height: u32, size: u32) -> Self {
    let gain = (size as f32 / source_height as f32).min(size as f32 / source_width as f32);
    let scaled_width = ((source_width as f32 * gain).round() as u32).clamp(1, size);
    let scaled_height = ((source_height as f32 * gain).round() as u32).clamp(1, size);

    // 填充均分到两侧，-0.1 使奇数余量偏向右下
    let dw = (size - scaled_width) as f32 / 2.0;
    let dh = (size - scaled_height) as f32 / 2.0;
    let pad_left = (dw - 0.1).round().max(0.0) as u32;
    let pad_top = (dh - 0.1).round().max(0.0) as u32;

    Self {
      gain,
      pad_left,
      pad_top,
      scaled_width,
      scaled_height,
      source_width,
      source_height,
      size,
    }
  }

  /// 模型坐标映射回原图坐标，并限制在图像范围内
  pub fn to_source(&self, x: f32, y: f32) -> (f32, f32) {
    let sx = (x - self.pad_left as f32) / self.gain;
    let sy = (y - self.pad_top as f32) / self.gain;
    (
      sx.clamp(0.0, self.source_width as f32),
      sy.clamp(0.0, self.source_height as f32),
    )
  }
}

/// NCHW 布局、归一化到 [0, 1] 的 RGB 浮点张量
#[derive(Debug, Clone)]
pub struct RgbNchwTensor {
  data: Array4<f32>,
  letterbox: Letterbox,
}

impl RgbNchwTensor {
  pub fn from_image(image: &RgbImage, size: u32) -> Self {
    let (width, height) = image.dimensions();
    let letterbox = Letterbox::new(width, height, size);

    let resized = image::imageops::resize(
      image,
      letterbox.scaled_width,
      letterbox.scaled_height,
      FilterType::Triangle,
    );

    let side = size as usize;
    let mut data = Array4::from_elem((1, RGB_CHANNELS, side, side), LETTERBOX_PAD_VALUE / 255.0);

    for (x, y, pixel) in resized.enumerate_pixels() {
      let tx = (x + letterbox.pad_left) as usize;
      let ty = (y + letterbox.pad_top) as usize;
      for c in 0..RGB_CHANNELS {
        data[[0, c, ty, tx]] = pixel[c] as f32 / 255.0;
      }
    }

    Self { data, letterbox }
  }

  pub fn letterbox(&self) -> &Letterbox {
    &self.letterbox
  }

  pub fn as_array(&self) -> &Array4<f32> {
    &self.data
  }
}
