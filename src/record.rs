// 该文件是 Haijian （海检） 项目的一部分。
// src/record.rs - 检测记录与响应
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

use serde::Serialize;
use url::Url;

use crate::{
  detection::{Detection, DetectionSet},
  inspection_id::InspectionId,
  risk::{RiskLevel, RiskSummary},
};

/// 离线评估得到的模型指标，所有请求共用
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelMetrics {
  pub precision: f64,
  pub recall: f64,
  pub map50: f64,
  pub map5095: f64,
}

impl Default for ModelMetrics {
  fn default() -> Self {
    Self {
      precision: 0.886,
      recall: 0.844,
      map50: 0.882,
      map5095: 0.782,
    }
  }
}

/// 写入记录库的检测摘要
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectionRecord {
  pub inspection_id: InspectionId,
  pub file_name: Option<String>,
  pub detected_classes: Vec<String>,
  pub highest_confidence: f64,
  pub risk_level: RiskLevel,
  /// 推理耗时（秒）
  pub inference_time: f64,
  pub precision: f64,
  pub recall: f64,
  pub map50: f64,
  pub map5095: f64,
  pub image_url: Option<Url>,
  pub annotated_image_url: Option<Url>,
  pub status: &'static str,
}

/// 上传前即可确定的记录内容
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
  pub inspection_id: InspectionId,
  pub file_name: Option<String>,
  pub detected_classes: Vec<String>,
  pub highest_confidence: f64,
  pub risk_level: RiskLevel,
  pub inference_time_ms: f64,
  pub metrics: ModelMetrics,
}

impl RecordDraft {
  pub fn new(
    inspection_id: InspectionId,
    file_name: Option<String>,
    detections: &DetectionSet,
    summary: &RiskSummary,
    inference_time_ms: f64,
    metrics: ModelMetrics,
  ) -> Self {
    Self {
      inspection_id,
      file_name,
      detected_classes: detections.distinct_classes(),
      highest_confidence: summary.max_confidence,
      risk_level: summary.risk_level,
      inference_time_ms,
      metrics,
    }
  }

  /// 两张图片上传结束后生成最终记录
  pub fn complete(
    self,
    image_url: Option<Url>,
    annotated_image_url: Option<Url>,
  ) -> InspectionRecord {
    InspectionRecord {
      inspection_id: self.inspection_id,
      file_name: self.file_name,
      detected_classes: self.detected_classes,
      highest_confidence: self.highest_confidence,
      risk_level: self.risk_level,
      inference_time: self.inference_time_ms / 1000.0,
      precision: self.metrics.precision,
      recall: self.metrics.recall,
      map50: self.metrics.map50,
      map5095: self.metrics.map5095,
      image_url,
      annotated_image_url,
      status: "completed",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectionSummary {
  pub total: usize,
  pub risk_level: RiskLevel,
  pub avg_confidence: f64,
  pub max_confidence: f64,
  pub inference_time_ms: f64,
}

impl InspectionSummary {
  pub fn new(summary: &RiskSummary, inference_time_ms: f64) -> Self {
    Self {
      total: summary.total,
      risk_level: summary.risk_level,
      avg_confidence: summary.avg_confidence,
      max_confidence: summary.max_confidence,
      inference_time_ms,
    }
  }
}

/// 返回给客户端的检测结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectionResponse {
  pub inspection_id: InspectionId,
  pub detections: Vec<Detection>,
  pub annotated_image: String,
  pub summary: InspectionSummary,
  pub model_metrics: ModelMetrics,
  pub timestamp: String,
}
