// 该文件是 Poolseg （泳池分割） 项目的一部分。
// src/output/record.rs - 轮廓坐标记录
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

use std::path::Path;

use crate::model::{Polygon, SegmentResult};

const RECORD_LABEL: &str = "Pool";

/// 每个轮廓一行: `Pool_<i>: x,y x,y ...`
pub struct Record {
  label: String,
}

impl Default for Record {
  fn default() -> Self {
    Self {
      label: RECORD_LABEL.to_string(),
    }
  }
}

impl Record {
  pub fn format_polygon(&self, index: usize, polygon: &Polygon) -> String {
    let coords: String = polygon
      .points
      .iter()
      .map(|&(x, y)| format!(" {},{}", x as i32, y as i32))
      .collect();
    format!("{}_{}:{}", self.label, index, coords)
  }

  pub fn lines(&self, result: &SegmentResult) -> Vec<String> {
    result
      .polygons()
      .enumerate()
      .map(|(i, polygon)| self.format_polygon(i, polygon))
      .collect()
  }

  pub fn record(&self, result: &SegmentResult, path: &Path) -> Result<(), std::io::Error> {
    std::fs::write(path, self.lines(result).join("\n"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::SegmentItem;

  fn item(points: Vec<(f32, f32)>) -> SegmentItem {
    SegmentItem {
      class_id: 0,
      score: 0.8,
      bbox: [0.0; 4],
      polygon: Polygon::from(points),
    }
  }

  #[test]
  fn coordinates_are_truncated() {
    let line = Record::default().format_polygon(0, &Polygon::from(vec![(12.9, 3.2), (0.5, 7.999)]));
    assert_eq!(line, "Pool_0: 12,3 0,7");
  }

  #[test]
  fn empty_polygon_keeps_its_label() {
    assert_eq!(Record::default().format_polygon(3, &Polygon::default()), "Pool_3:");
  }

  #[test]
  fn one_line_per_polygon_in_order() {
    let result = SegmentResult::from(vec![
      item(vec![(1.0, 2.0)]),
      item(vec![(3.0, 4.0), (5.0, 6.0)]),
      item(vec![(7.0, 8.0)]),
    ]);
    let lines = Record::default().lines(&result);
    assert_eq!(lines, vec!["Pool_0: 1,2", "Pool_1: 3,4 5,6", "Pool_2: 7,8"]);
  }

  #[test]
  fn file_has_no_trailing_newline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coordinates_a.txt");
    let result = SegmentResult::from(vec![item(vec![(1.0, 1.0)]), item(vec![(2.0, 2.0)])]);

    Record::default().record(&result, &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "Pool_0: 1,1\nPool_1: 2,2");
  }

  #[test]
  fn empty_result_writes_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coordinates_b.txt");
    Record::default().record(&SegmentResult::default(), &path).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), Vec::<u8>::new());
  }
}
