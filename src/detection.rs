// 该文件是 Haijian （海检） 项目的一部分。
// src/detection.rs - 检测结果规范化
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

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::RawDetections;

/// 保留四位小数
pub fn round4(value: f64) -> f64 {
  (value * 10_000.0).round() / 10_000.0
}

/// 单个检测目标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
  pub class_name: String,
  pub confidence: f64,
  pub x1: f64,
  pub y1: f64,
  pub x2: f64,
  pub y2: f64,
}

impl Detection {
  pub fn new(class_name: impl Into<String>, confidence: f64, bbox: [f64; 4]) -> Self {
    Self {
      class_name: class_name.into(),
      confidence: round4(confidence),
      x1: bbox[0],
      y1: bbox[1],
      x2: bbox[2],
      y2: bbox[3],
    }
  }

  /// 截断为整数的像素坐标 [x1, y1, x2, y2]
  pub fn pixel_box(&self) -> [i32; 4] {
    [
      self.x1 as i32,
      self.y1 as i32,
      self.x2 as i32,
      self.y2 as i32,
    ]
  }
}

/// 一张图像的检测结果，保持检测器输出顺序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectionSet {
  items: Vec<Detection>,
}

impl DetectionSet {
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
    self.items.iter()
  }

  /// 去重后的类别名称，按字典序
  pub fn distinct_classes(&self) -> Vec<String> {
    let mut names: Vec<String> = self.items.iter().map(|d| d.class_name.clone()).collect();
    names.sort();
    names.dedup();
    names
  }
}

impl From<Vec<Detection>> for DetectionSet {
  fn from(items: Vec<Detection>) -> Self {
    Self { items }
  }
}

impl<'a> IntoIterator for &'a DetectionSet {
  type Item = &'a Detection;
  type IntoIter = std::slice::Iter<'a, Detection>;

  fn into_iter(self) -> Self::IntoIter {
    self.items.iter()
  }
}

/// 将检测器原始输出转换为规范的检测集合
pub fn parse_detections(raw: &RawDetections) -> DetectionSet {
  let items: Vec<Detection> = raw
    .detections
    .iter()
    .map(|item| {
      let class_name = match raw.names.get(&item.class_index) {
        Some(name) => name.clone(),
        None => {
          warn!("类别索引 {} 不在类别表中", item.class_index);
          format!("class_{}", item.class_index)
        }
      };
      Detection::new(
        class_name,
        item.confidence as f64,
        item.bbox.map(|v| v as f64),
      )
    })
    .collect();

  debug!("解析得到 {} 个检测", items.len());
  DetectionSet::from(items)
}
