// 该文件是 Haijian （海检） 项目的一部分。
// src/model.rs - 检测模型接口
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

use std::collections::BTreeMap;

use image::RgbImage;
use serde::{Deserialize, Serialize};

/// 推理参数，对所有请求固定
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceConfig {
  /// 置信度阈值
  pub confidence: f32,
  /// NMS IOU 阈值
  pub iou: f32,
}

impl Default for InferenceConfig {
  fn default() -> Self {
    Self {
      confidence: 0.25,
      iou: 0.45,
    }
  }
}

/// 检测器的一条原始输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
  pub class_index: u32,
  pub confidence: f32,
  #[serde(rename = "box")]
  pub bbox: [f32; 4], // [x1, y1, x2, y2]，源图像像素坐标
}

/// 检测器对一张图像的完整输出
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDetections {
  /// 类别索引到名称的映射
  pub names: BTreeMap<u32, String>,
  #[serde(default)]
  pub detections: Vec<RawDetection>,
}

/// 预训练目标检测器
///
/// 模型在进程内只加载一次，之后被并发请求只读地共享，
/// 因此实现必须是 `Send + Sync`。
pub trait Detector: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// 模型的可读名称，用于健康检查
  fn name(&self) -> String;

  fn infer(&self, image: &RgbImage, config: &InferenceConfig)
  -> Result<RawDetections, Self::Error>;
}

mod replay;
pub use self::replay::{ReplayDetector, ReplayDetectorError};
