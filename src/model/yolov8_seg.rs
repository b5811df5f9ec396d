// 该文件是 Poolseg （泳池分割） 项目的一部分。
// src/model/yolov8_seg.rs - YOLOv8 实例分割模型
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

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, ArrayView4, Axis};
use ort::{
  session::{Session, builder::GraphOptimizationLevel},
  value::TensorRef,
};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
  config::{DEFAULT_CONFIDENCE, DEFAULT_INPUT_SIZE, DEFAULT_IOU, DEFAULT_MAX_DETECTIONS},
  frame::{Letterbox, RgbNchwTensor},
  input::AsRgbImage,
  model::{
    Model, Polygon, SegmentItem, SegmentResult,
    mask::{compress_chain, largest_outer_contour, process_mask},
  },
};

const YOLO_SEG_NUM_INPUTS: usize = 1;
const YOLO_SEG_NUM_OUTPUTS: usize = 2;
const YOLO_SEG_BOX_CHANNELS: usize = 4;
const YOLO_SEG_INTRA_THREADS: usize = 4;

#[derive(Error, Debug)]
pub enum YoloSegError {
  #[error("找不到模型文件: {0}")]
  ModelNotFound(PathBuf),
  #[error("模型无效: {0}")]
  ModelInvalid(String),
  #[error("ONNX Runtime 错误: {0}")]
  OrtError(#[from] ort::Error),
  #[error("张量形状错误: {0}")]
  ShapeError(#[from] ndarray::ShapeError),
}

#[derive(Debug, Clone, Copy)]
struct SegOptions {
  confidence: f32,
  iou: f32,
  max_detections: usize,
}

pub struct YoloSeg<Frame> {
  session: Session,
  input_name: String,
  input_size: u32,
  options: SegOptions,
  _phantom: std::marker::PhantomData<Frame>,
}

pub struct YoloSegBuilder {
  model_path: PathBuf,
  input_size: u32,
  options: SegOptions,
}

impl YoloSegBuilder {
  pub fn new(model_path: impl Into<PathBuf>) -> Self {
    Self {
      model_path: model_path.into(),
      input_size: DEFAULT_INPUT_SIZE,
      options: SegOptions {
        confidence: DEFAULT_CONFIDENCE,
        iou: DEFAULT_IOU,
        max_detections: DEFAULT_MAX_DETECTIONS,
      },
    }
  }

  pub fn confidence(mut self, confidence: f32) -> Self {
    self.options.confidence = confidence;
    self
  }

  pub fn iou(mut self, iou: f32) -> Self {
    self.options.iou = iou;
    self
  }

  pub fn max_detections(mut self, max_detections: usize) -> Self {
    self.options.max_detections = max_detections;
    self
  }

  pub fn input_size(mut self, input_size: u32) -> Self {
    self.input_size = input_size;
    self
  }

  pub fn build<Frame>(self) -> Result<YoloSeg<Frame>, YoloSegError> {
    if !self.model_path.is_file() {
      error!("找不到模型文件: {}", self.model_path.display());
      return Err(YoloSegError::ModelNotFound(self.model_path));
    }

    info!("加载模型文件: {}", self.model_path.display());
    let session = Session::builder()?
      .with_optimization_level(GraphOptimizationLevel::Level3)?
      .with_intra_threads(YOLO_SEG_INTRA_THREADS)?
      .commit_from_file(&self.model_path)?;

    let num_inputs = session.inputs.len();
    let num_outputs = session.outputs.len();
    debug!("模型输入数量: {}", num_inputs);
    debug!("模型输出数量: {}", num_outputs);

    if num_inputs != YOLO_SEG_NUM_INPUTS || num_outputs != YOLO_SEG_NUM_OUTPUTS {
      let msg = format!(
        "预期模型输入/输出数量为 {}/{}, 实际为 {}/{}",
        YOLO_SEG_NUM_INPUTS, YOLO_SEG_NUM_OUTPUTS, num_inputs, num_outputs
      );
      error!("{}", msg);
      return Err(YoloSegError::ModelInvalid(msg));
    }

    let input_name = session.inputs[0].name.clone();
    info!("模型加载完成，输入张量: {}", input_name);

    Ok(YoloSeg {
      session,
      input_name,
      input_size: self.input_size,
      options: self.options,
      _phantom: std::marker::PhantomData,
    })
  }
}

impl<Frame> YoloSeg<Frame> {
  /// 运行会话，返回 `[4 + nc + nm, anchors]` 的预测与 `[nm, mh, mw]` 的原型掩膜
  fn forward(&mut self, tensor: &RgbNchwTensor) -> Result<(Array2<f32>, Array3<f32>), YoloSegError> {
    let input = TensorRef::from_array_view(tensor.as_array())?;
    let outputs = self
      .session
      .run(ort::inputs![self.input_name.as_str() => input])?;

    let (pred_shape, pred_data) = outputs[0].try_extract_tensor::<f32>()?;
    let (proto_shape, proto_data) = outputs[1].try_extract_tensor::<f32>()?;
    debug!("预测输出形状: {:?}, 原型掩膜形状: {:?}", pred_shape, proto_shape);

    first_batch(pred_shape, pred_data, proto_shape, proto_data)
  }
}

/// 取批次中的第一张图，批次为空或维度不符时视为模型无效
fn first_batch(
  pred_shape: &[i64],
  pred_data: &[f32],
  proto_shape: &[i64],
  proto_data: &[f32],
) -> Result<(Array2<f32>, Array3<f32>), YoloSegError> {
  if pred_shape.len() != 3 || proto_shape.len() != 4 {
    return Err(YoloSegError::ModelInvalid(format!(
      "输出维度不符: {:?} / {:?}",
      pred_shape, proto_shape
    )));
  }
  if pred_shape[0] < 1 || proto_shape[0] < 1 {
    return Err(YoloSegError::ModelInvalid(format!(
      "输出批次为空: {:?} / {:?}",
      pred_shape, proto_shape
    )));
  }

  let pred = ArrayView3::from_shape(
    (
      pred_shape[0] as usize,
      pred_shape[1] as usize,
      pred_shape[2] as usize,
    ),
    pred_data,
  )?
  .index_axis(Axis(0), 0)
  .to_owned();

  let protos = ArrayView4::from_shape(
    (
      proto_shape[0] as usize,
      proto_shape[1] as usize,
      proto_shape[2] as usize,
      proto_shape[3] as usize,
    ),
    proto_data,
  )?
  .index_axis(Axis(0), 0)
  .to_owned();

  Ok((pred, protos))
}

impl<Frame: AsRgbImage> Model for YoloSeg<Frame> {
  type Input = Frame;
  type Output = SegmentResult;
  type Error = YoloSegError;

  fn infer(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("预处理输入图像");
    let tensor = RgbNchwTensor::from_image(input.as_rgb_image(), self.input_size);

    debug!("执行模型推理");
    let (pred, protos) = self.forward(&tensor)?;

    debug!("后处理模型输出");
    postprocess(pred.view(), protos.view(), tensor.letterbox(), &self.options)
  }
}

#[derive(Debug, Clone)]
struct Candidate {
  class_id: u32,
  score: f32,
  bbox: [f32; 4], // 模型输入坐标系
  coeffs: Vec<f32>,
}

fn postprocess(
  pred: ArrayView2<f32>,
  protos: ArrayView3<f32>,
  letterbox: &Letterbox,
  options: &SegOptions,
) -> Result<SegmentResult, YoloSegError> {
  let num_masks = protos.dim().0;
  let channels = pred.dim().0;
  if channels <= YOLO_SEG_BOX_CHANNELS + num_masks {
    return Err(YoloSegError::ModelInvalid(format!(
      "预测通道数 {} 不足以容纳 {} 个掩膜系数",
      channels, num_masks
    )));
  }
  let num_classes = channels - YOLO_SEG_BOX_CHANNELS - num_masks;

  let candidates = decode_candidates(pred, num_classes, options.confidence);
  debug!("置信度过滤后候选数: {}", candidates.len());

  let kept = non_max_suppression(candidates, options.iou, options.max_detections);
  debug!("NMS 后检测数: {}", kept.len());

  let items = kept
    .into_iter()
    .map(|candidate| {
      let mask = process_mask(protos, &candidate.coeffs, &candidate.bbox, letterbox.size);
      let contour = compress_chain(&largest_outer_contour(&mask));
      let points = contour
        .iter()
        .map(|p| letterbox.to_source(p.x as f32, p.y as f32))
        .collect::<Vec<_>>();

      let (x_min, y_min) = letterbox.to_source(candidate.bbox[0], candidate.bbox[1]);
      let (x_max, y_max) = letterbox.to_source(candidate.bbox[2], candidate.bbox[3]);

      SegmentItem {
        class_id: candidate.class_id,
        score: candidate.score,
        bbox: [x_min, y_min, x_max, y_max],
        polygon: Polygon::from(points),
      }
    })
    .collect::<Vec<_>>();

  Ok(SegmentResult::from(items))
}

/// 逐锚点取最高类别分数，保留严格高于阈值者
fn decode_candidates(pred: ArrayView2<f32>, num_classes: usize, confidence: f32) -> Vec<Candidate> {
  let coeff_start = YOLO_SEG_BOX_CHANNELS + num_classes;

  pred
    .axis_iter(Axis(1))
    .filter_map(|anchor| {
      let (class_id, score) = (0..num_classes)
        .map(|c| (c, anchor[YOLO_SEG_BOX_CHANNELS + c]))
        .fold((0usize, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

      if score <= confidence {
        return None;
      }

      let (cx, cy, w, h) = (anchor[0], anchor[1], anchor[2], anchor[3]);
      Some(Candidate {
        class_id: class_id as u32,
        score,
        bbox: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
        coeffs: anchor.iter().skip(coeff_start).copied().collect(),
      })
    })
    .collect()
}

/// 按类别的贪心 NMS，结果按分数降序
fn non_max_suppression(
  mut candidates: Vec<Candidate>,
  iou_threshold: f32,
  max_detections: usize,
) -> Vec<Candidate> {
  candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

  let mut kept: Vec<Candidate> = Vec::new();
  for candidate in candidates {
    if kept.len() >= max_detections {
      break;
    }
    let suppressed = kept.iter().any(|k| {
      k.class_id == candidate.class_id && box_iou(&k.bbox, &candidate.bbox) > iou_threshold
    });
    if !suppressed {
      kept.push(candidate);
    }
  }
  kept
}

fn box_iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
  let iw = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
  let ih = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
  let intersection = iw * ih;
  let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
  let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
  let union = area_a + area_b - intersection;
  if union <= 0.0 { 0.0 } else { intersection / union }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ndarray::array;

  fn options() -> SegOptions {
    SegOptions {
      confidence: 0.25,
      iou: 0.7,
      max_detections: 300,
    }
  }

  fn candidate(class_id: u32, score: f32, bbox: [f32; 4]) -> Candidate {
    Candidate {
      class_id,
      score,
      bbox,
      coeffs: Vec::new(),
    }
  }

  #[test]
  fn decode_keeps_scores_above_threshold() {
    // 通道: cx, cy, w, h, 类别 0, 类别 1, 系数 0；三个锚点
    let pred = array![
      [10.0, 20.0, 30.0],
      [10.0, 20.0, 30.0],
      [4.0, 4.0, 4.0],
      [2.0, 2.0, 2.0],
      [0.9, 0.25, 0.1],
      [0.1, 0.1, 0.6],
      [0.5, 0.6, 0.7],
    ];
    let found = decode_candidates(pred.view(), 2, 0.25);

    assert_eq!(found.len(), 2);
    assert_eq!(found[0].class_id, 0);
    assert_eq!(found[0].bbox, [8.0, 9.0, 12.0, 11.0]);
    assert_eq!(found[0].coeffs, vec![0.5]);
    assert_eq!(found[1].class_id, 1);
    assert_eq!(found[1].score, 0.6);
  }

  #[test]
  fn nms_suppresses_same_class_overlap_only() {
    let kept = non_max_suppression(
      vec![
        candidate(0, 0.5, [0.0, 0.0, 10.0, 10.0]),
        candidate(0, 0.9, [1.0, 0.0, 11.0, 10.0]),
        candidate(1, 0.8, [0.0, 0.0, 10.0, 10.0]),
        candidate(0, 0.7, [50.0, 50.0, 60.0, 60.0]),
      ],
      0.7,
      300,
    );

    let scores: Vec<f32> = kept.iter().map(|c| c.score).collect();
    assert_eq!(scores, vec![0.9, 0.8, 0.7]);
  }

  #[test]
  fn nms_respects_max_detections() {
    let kept = non_max_suppression(
      vec![
        candidate(0, 0.3, [0.0, 0.0, 1.0, 1.0]),
        candidate(0, 0.4, [5.0, 5.0, 6.0, 6.0]),
      ],
      0.7,
      1,
    );
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].score, 0.4);
  }

  #[test]
  fn iou_of_disjoint_and_identical_boxes() {
    assert_eq!(box_iou(&[0.0, 0.0, 1.0, 1.0], &[2.0, 2.0, 3.0, 3.0]), 0.0);
    assert_eq!(box_iou(&[0.0, 0.0, 2.0, 2.0], &[0.0, 0.0, 2.0, 2.0]), 1.0);
  }

  #[test]
  fn postprocess_traces_polygon_in_source_space() {
    // 单类别、单系数；锚点 0 覆盖输入左半部分
    let pred = array![
      [2.0, 6.0],
      [4.0, 4.0],
      [4.0, 2.0],
      [8.0, 2.0],
      [0.9, 0.1],
      [1.0, 1.0],
    ];
    let protos = Array3::<f32>::from_elem((1, 4, 4), 10.0);
    let letterbox = Letterbox::new(8, 8, 8);

    let result = postprocess(pred.view(), protos.view(), &letterbox, &options()).unwrap();
    assert_eq!(result.len(), 1);

    let item = &result.items[0];
    assert_eq!(item.bbox, [0.0, 0.0, 4.0, 8.0]);
    assert_eq!(item.polygon.len(), 4);
    for corner in [(0.0, 0.0), (3.0, 0.0), (3.0, 7.0), (0.0, 7.0)] {
      assert!(item.polygon.points.contains(&corner), "{:?}", item.polygon);
    }
  }

  #[test]
  fn postprocess_rejects_too_few_channels() {
    let pred = Array2::<f32>::zeros((5, 3));
    let protos = Array3::<f32>::zeros((1, 4, 4));
    let letterbox = Letterbox::new(8, 8, 8);
    assert!(matches!(
      postprocess(pred.view(), protos.view(), &letterbox, &options()),
      Err(YoloSegError::ModelInvalid(_))
    ));
  }

  #[test]
  fn empty_batch_is_rejected() {
    assert!(matches!(
      first_batch(&[0, 6, 2], &[], &[0, 1, 4, 4], &[]),
      Err(YoloSegError::ModelInvalid(_))
    ));
    assert!(matches!(
      first_batch(&[1, 6], &[0.0; 6], &[1, 1, 4, 4], &[0.0; 16]),
      Err(YoloSegError::ModelInvalid(_))
    ));
  }

  #[test]
  fn first_batch_drops_batch_axis() {
    let pred_data: Vec<f32> = (0..12).map(|v| v as f32).collect();
    let proto_data = vec![0.5; 2 * 2 * 3];
    let (pred, protos) = first_batch(&[1, 6, 2], &pred_data, &[1, 2, 2, 3], &proto_data).unwrap();
    assert_eq!(pred.dim(), (6, 2));
    assert_eq!(pred[[5, 1]], 11.0);
    assert_eq!(protos.dim(), (2, 2, 3));
  }

  #[test]
  fn missing_model_file_fails_before_loading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("best.onnx");
    let result = YoloSegBuilder::new(&path).build::<crate::input::SourceImage>();
    assert!(matches!(result, Err(YoloSegError::ModelNotFound(p)) if p == path));
  }
}
