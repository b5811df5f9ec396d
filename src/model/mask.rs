// 该文件是 Poolseg （泳池分割） 项目的一部分。
// src/model/mask.rs - 掩膜合成与轮廓提取
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

use image::{GrayImage, ImageBuffer, Luma, imageops::FilterType};
use imageproc::{
  contours::{BorderType, find_contours},
  point::Point,
};
use ndarray::{Array2, ArrayView3, Axis};

const MASK_THRESHOLD: f32 = 0.5;
const MASK_FOREGROUND: u8 = 255;

type FloatMask = ImageBuffer<Luma<f32>, Vec<f32>>;

pub fn sigmoid(x: f32) -> f32 {
  1.0 / (1.0 + (-x).exp())
}

/// 由原型掩膜与系数合成单个实例的二值掩膜
///
/// `protos` 形状为 `[nm, mh, mw]`，`bbox` 为模型输入坐标系下的
/// `[x_min, y_min, x_max, y_max]`。框外置零后双线性上采样到
/// `input_size x input_size`，再以 0.5 二值化。
pub fn process_mask(
  protos: ArrayView3<f32>,
  coeffs: &[f32],
  bbox: &[f32; 4],
  input_size: u32,
) -> GrayImage {
  let (num_masks, mask_h, mask_w) = protos.dim();

  let mut logits = Array2::<f32>::zeros((mask_h, mask_w));
  for (k, &coeff) in coeffs.iter().enumerate().take(num_masks) {
    logits.scaled_add(coeff, &protos.index_axis(Axis(0), k));
  }

  // 检测框缩放到原型分辨率
  let sx = mask_w as f32 / input_size as f32;
  let sy = mask_h as f32 / input_size as f32;
  let (x1, y1, x2, y2) = (bbox[0] * sx, bbox[1] * sy, bbox[2] * sx, bbox[3] * sy);

  let cropped = FloatMask::from_fn(mask_w as u32, mask_h as u32, |x, y| {
    let (fx, fy) = (x as f32, y as f32);
    if fx >= x1 && fx < x2 && fy >= y1 && fy < y2 {
      Luma([sigmoid(logits[[y as usize, x as usize]])])
    } else {
      Luma([0.0])
    }
  });

  let upsampled = image::imageops::resize(&cropped, input_size, input_size, FilterType::Triangle);

  GrayImage::from_fn(input_size, input_size, |x, y| {
    if upsampled.get_pixel(x, y)[0] > MASK_THRESHOLD {
      Luma([MASK_FOREGROUND])
    } else {
      Luma([0])
    }
  })
}

/// 取点数最多的外轮廓；掩膜为空时返回空
pub fn largest_outer_contour(mask: &GrayImage) -> Vec<Point<i32>> {
  find_contours::<i32>(mask)
    .into_iter()
    .filter(|contour| matches!(contour.border_type, BorderType::Outer))
    .max_by_key(|contour| contour.points.len())
    .map(|contour| contour.points)
    .unwrap_or_default()
}

/// 压缩水平、竖直、对角方向上的连续点，只保留拐点
pub fn compress_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
  let n = points.len();
  if n < 3 {
    return points.to_vec();
  }

  let compressed: Vec<_> = (0..n)
    .filter(|&i| {
      let prev = points[(i + n - 1) % n];
      let cur = points[i];
      let next = points[(i + 1) % n];
      (cur.x - prev.x, cur.y - prev.y) != (next.x - cur.x, next.y - cur.y)
    })
    .map(|i| points[i])
    .collect();

  if compressed.is_empty() {
    points.to_vec()
  } else {
    compressed
  }
}
