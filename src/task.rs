// 该文件是 Poolseg （泳池分割） 项目的一部分。
// src/task.rs - 推理任务
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

use anyhow::Context;
use tracing::info;

use crate::{
  config::DetectConfig,
  input::{ImageFileInput, InputResolver, SourceImage},
  model::{Model, SegmentResult, YoloSegBuilder},
  output::{OutputPaths, Render, SaveResultOutput},
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

/// 取一帧、推理一次、渲染一次
pub struct OneShotTask;

impl<
  F,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, mut model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始推理...");
    let now = std::time::Instant::now();
    let result = model.infer(&frame)?;
    let inferred = now.elapsed();
    info!("推理完成，耗时: {:.2?}", inferred);
    output.render_result(&frame, &result)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed() - inferred);

    Ok(())
  }
}

/// 按顺序完成一次检测: 解析输入、准备输出目录、加载模型、读取图像、推理并保存
pub fn run_detection(config: &DetectConfig) -> anyhow::Result<OutputPaths> {
  run_detection_with(config, |config| {
    YoloSegBuilder::new(&config.model)
      .confidence(config.confidence)
      .iou(config.iou)
      .input_size(config.input_size)
      .max_detections(config.max_detections)
      .build::<SourceImage>()
  })
}

/// 与 [`run_detection`] 相同的流程，模型由 `load_model` 在输出目录就绪后构造
pub fn run_detection_with<M, E, L>(config: &DetectConfig, load_model: L) -> anyhow::Result<OutputPaths>
where
  M: Model<Input = SourceImage, Output = SegmentResult>,
  M::Error: std::error::Error + Sync + Send + 'static,
  E: std::error::Error + Sync + Send + 'static,
  L: FnOnce(&DetectConfig) -> Result<M, E>,
{
  let input_path = InputResolver::new(&config.fallback_dir)
    .resolve(&config.input)
    .context("无法定位输入图像")?;

  let output = SaveResultOutput::create(&config.output_dir).context("无法创建输出目录")?;
  let paths = output.paths_for(&input_path)?;

  let model = load_model(config).context("无法加载模型")?;

  let input = ImageFileInput::open(&input_path).context("无法读取输入图像")?;

  OneShotTask.run_task(input, model, output)?;

  Ok(paths)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{Polygon, SegmentItem};
  use image::{Rgb, RgbImage};
  use std::convert::Infallible;

  struct FixedModel(Vec<Polygon>);

  impl Model for FixedModel {
    type Input = SourceImage;
    type Output = SegmentResult;
    type Error = Infallible;

    fn infer(&mut self, _input: &SourceImage) -> Result<SegmentResult, Infallible> {
      Ok(
        self
          .0
          .iter()
          .cloned()
          .map(|polygon| SegmentItem {
            class_id: 0,
            score: 0.9,
            bbox: [0.0; 4],
            polygon,
          })
          .collect::<Vec<_>>()
          .into(),
      )
    }
  }

  fn fixture(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("house1.png");
    RgbImage::from_pixel(32, 32, Rgb([200, 200, 200])).save(&path).unwrap();
    path
  }

  #[test]
  fn one_shot_writes_both_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture(dir.path());
    let output = SaveResultOutput::create(dir.path().join("output_results")).unwrap();
    let paths = output.paths_for(&path).unwrap();

    let model = FixedModel(vec![
      Polygon::from(vec![(4.0, 4.0), (20.0, 4.0), (20.0, 20.0)]),
      Polygon::from(vec![(1.5, 2.5), (9.9, 9.9)]),
    ]);
    OneShotTask
      .run_task(ImageFileInput::open(&path).unwrap(), model, output)
      .unwrap();

    assert_eq!(
      std::fs::read_to_string(&paths.coordinates).unwrap(),
      "Pool_0: 4,4 20,4 20,20\nPool_1: 1,2 9,9"
    );
    assert!(paths.image.ends_with("output_house1.png"));
    assert!(paths.image.is_file());
  }

  #[test]
  fn one_shot_without_frames_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = SaveResultOutput::create(dir.path()).unwrap();
    let result = OneShotTask.run_task(std::iter::empty::<SourceImage>(), FixedModel(vec![]), output);
    assert!(result.is_err());
  }
}
