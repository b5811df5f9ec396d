// 该文件是 Poolseg （泳池分割） 项目的一部分。
// src/output/draw.rs - 分割结果可视化
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

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

use crate::{
  input::AsRgbImage,
  model::{Polygon, SegmentResult},
};

const OUTLINE_COLOR: [u8; 3] = [0, 0, 255]; // 蓝色
const OUTLINE_THICKNESS: u32 = 2;

pub struct Draw {
  color: [u8; 3],
  thickness: u32,
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      color: OUTLINE_COLOR,
      thickness: OUTLINE_THICKNESS,
    }
  }
}

impl Draw {
  #[cfg(test)]
  fn with_color(mut self, color: [u8; 3]) -> Self {
    self.color = color;
    self
  }

  #[cfg(test)]
  fn with_thickness(mut self, thickness: u32) -> Self {
    self.thickness = thickness.max(1);
    self
  }

  // 闭合折线，坐标先截断为整数像素
  fn draw_polygon_outline(&self, image: &mut RgbImage, polygon: &Polygon) {
    let points: Vec<(f32, f32)> = polygon
      .points
      .iter()
      .map(|&(x, y)| ((x as i32) as f32, (y as i32) as f32))
      .collect();

    if points.is_empty() {
      return;
    }

    let color = Rgb(self.color);
    let half = (self.thickness as i32 - 1) / 2;

    for (i, &start) in points.iter().enumerate() {
      let end = points[(i + 1) % points.len()];

      // 以平移若干像素的方式加粗
      for dy in 0..self.thickness as i32 {
        for dx in 0..self.thickness as i32 {
          let (ox, oy) = ((dx - half) as f32, (dy - half) as f32);
          draw_line_segment_mut(
            image,
            (start.0 + ox, start.1 + oy),
            (end.0 + ox, end.1 + oy),
            color,
          );
        }
      }
    }
  }
}

pub trait DrawSegmentationOnImage {
  fn draw_segmentation_on_image(&self, image: &mut RgbImage, result: &SegmentResult);
}

pub trait DrawSegmentationOnFrame<Frame> {
  fn draw_segmentation(&self, frame: &Frame, result: &SegmentResult) -> RgbImage;
}

impl<Frame: AsRgbImage, D: DrawSegmentationOnImage> DrawSegmentationOnFrame<Frame> for D {
  fn draw_segmentation(&self, frame: &Frame, result: &SegmentResult) -> RgbImage {
    let mut image = frame.as_rgb_image().clone();
    self.draw_segmentation_on_image(&mut image, result);
    image
  }
}

impl DrawSegmentationOnImage for Draw {
  fn draw_segmentation_on_image(&self, image: &mut RgbImage, result: &SegmentResult) {
    for polygon in result.polygons() {
      self.draw_polygon_outline(image, polygon);
    }
  }
}
