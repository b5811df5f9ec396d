// 该文件是 Poolseg （泳池分割） 项目的一部分。
// src/model.rs - 模型
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

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 原图像素坐标下的有序轮廓点
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
  pub points: Vec<(f32, f32)>,
}

impl Polygon {
  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  pub fn len(&self) -> usize {
    self.points.len()
  }
}

impl From<Vec<(f32, f32)>> for Polygon {
  fn from(points: Vec<(f32, f32)>) -> Self {
    Self { points }
  }
}

#[derive(Debug, Clone)]
pub struct SegmentItem {
  pub class_id: u32,
  pub score: f32,
  pub bbox: [f32; 4], // [x_min, y_min, x_max, y_max]，原图像素
  pub polygon: Polygon,
}

#[derive(Debug, Clone, Default)]
pub struct SegmentResult {
  pub items: Box<[SegmentItem]>,
}

impl SegmentResult {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn polygons(&self) -> impl Iterator<Item = &Polygon> {
    self.items.iter().map(|item| &item.polygon)
  }
}

impl From<Vec<SegmentItem>> for SegmentResult {
  fn from(items: Vec<SegmentItem>) -> Self {
    Self {
      items: items.into_boxed_slice(),
    }
  }
}

pub mod mask;

mod yolov8_seg;
pub use self::yolov8_seg::{YoloSeg, YoloSegBuilder, YoloSegError};
