// 该文件是 Haijian （海检） 项目的一部分。
// src/task.rs - 检测流水线
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

use std::time::Instant;

use chrono::{Local, SecondsFormat};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  detection::parse_detections,
  input::{InputError, Upload, decode_upload},
  inspection_id::InspectionId,
  model::{Detector, InferenceConfig},
  output::{Annotator, JPEG_QUALITY, Render, RenderError},
  persist::{DEFAULT_BUCKET, INSPECTIONS_TABLE, PendingPersistence, PersistJob, Persistence},
  record::{InspectionResponse, InspectionSummary, ModelMetrics, RecordDraft},
  risk::score,
};

pub const CONTACTS_TABLE: &str = "enterprise_contacts";

/// 流水线的静态配置
#[derive(Debug, Clone, PartialEq)]
pub struct InspectionSettings {
  pub inference: InferenceConfig,
  /// 健康检查中显示的模型名称，缺省时使用检测器自身的名称
  pub model_name: Option<String>,
  pub metrics: ModelMetrics,
  pub bucket: String,
  pub inspections_table: String,
  pub contacts_table: String,
  pub jpeg_quality: u8,
}

impl Default for InspectionSettings {
  fn default() -> Self {
    Self {
      inference: InferenceConfig::default(),
      model_name: None,
      metrics: ModelMetrics::default(),
      bucket: DEFAULT_BUCKET.to_string(),
      inspections_table: INSPECTIONS_TABLE.to_string(),
      contacts_table: CONTACTS_TABLE.to_string(),
      jpeg_quality: JPEG_QUALITY,
    }
  }
}

#[derive(Error, Debug)]
pub enum InspectError {
  #[error(transparent)]
  Input(#[from] InputError),
  #[error("推理失败: {0}")]
  Inference(String),
  #[error(transparent)]
  Render(#[from] RenderError),
}

impl InspectError {
  /// 是否由客户端输入导致
  pub fn is_client_error(&self) -> bool {
    matches!(self, InspectError::Input(_))
  }
}

/// 一次检测的结果；持久化仍在后台进行
pub struct Inspection {
  pub response: InspectionResponse,
  pub persistence: PendingPersistence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
  pub status: &'static str,
  pub model: String,
  pub record_store: bool,
}

/// 单张图像的检测流水线
///
/// 检测器与存储在构造时注入，之后所有请求共享。
pub struct InspectionTask<D: Detector> {
  detector: D,
  annotator: Annotator,
  persistence: Persistence,
  settings: InspectionSettings,
}

impl<D: Detector> InspectionTask<D> {
  pub fn new(
    detector: D,
    annotator: Annotator,
    persistence: Persistence,
    settings: InspectionSettings,
  ) -> Self {
    let annotator = annotator.with_quality(settings.jpeg_quality);
    let persistence = persistence
      .with_bucket(settings.bucket.clone())
      .with_table(settings.inspections_table.clone());
    Self {
      detector,
      annotator,
      persistence,
      settings,
    }
  }

  pub fn run(&self, upload: Upload) -> Result<Inspection, InspectError> {
    info!(
      "收到检测请求: {} ({})",
      upload.file_name.as_deref().unwrap_or("<未命名>"),
      upload.content_type.as_deref().unwrap_or("<未声明>")
    );

    let image = decode_upload(&upload)?;
    debug!("解码完成: {}x{}", image.width(), image.height());

    let now = Instant::now();
    let raw = self
      .detector
      .infer(&image, &self.settings.inference)
      .map_err(|e| InspectError::Inference(e.to_string()))?;
    let inference_time_ms = (now.elapsed().as_secs_f64() * 10_000.0).round() / 10.0;
    info!("推理完成，耗时: {:.1}ms", inference_time_ms);

    let detections = parse_detections(&raw);
    let annotated = self.annotator.render_result(&image, &detections)?;
    debug!("渲染完成");

    let summary = score(&detections);
    let inspection_id = InspectionId::generate();
    info!(
      "检测编号 {}: {} 个目标, 风险等级 {}",
      inspection_id, summary.total, summary.risk_level
    );

    // 渲染之后不再有任何步骤可以让请求失败
    let annotated_image = annotated.data_uri();
    let draft = RecordDraft::new(
      inspection_id,
      upload.file_name.clone(),
      &detections,
      &summary,
      inference_time_ms,
      self.settings.metrics,
    );
    let original_content_type = upload
      .content_type
      .clone()
      .unwrap_or_else(|| "image/jpeg".to_string());
    let persistence = self.persistence.spawn(PersistJob {
      draft,
      original: upload.bytes,
      original_content_type,
      annotated: annotated.jpeg,
    });

    let response = InspectionResponse {
      inspection_id,
      detections: detections.iter().cloned().collect(),
      annotated_image,
      summary: InspectionSummary::new(&summary, inference_time_ms),
      model_metrics: self.settings.metrics,
      timestamp: Local::now().to_rfc3339_opts(SecondsFormat::Micros, false),
    };

    Ok(Inspection {
      response,
      persistence,
    })
  }

  pub fn health(&self) -> Health {
    Health {
      status: "ok",
      model: self
        .settings
        .model_name
        .clone()
        .unwrap_or_else(|| self.detector.name()),
      record_store: self.persistence.has_record_store(),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use image::RgbImage;

  use super::*;
  use crate::model::{RawDetections, ReplayDetector};

  struct Broken;

  #[derive(Error, Debug)]
  #[error("加速器不可用")]
  struct BrokenError;

  impl Detector for Broken {
    type Error = BrokenError;

    fn name(&self) -> String {
      "broken".to_string()
    }

    fn infer(&self, _: &RgbImage, _: &InferenceConfig) -> Result<RawDetections, BrokenError> {
      Err(BrokenError)
    }
  }

  fn png() -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbImage::new(32, 24)
      .write_to(
        &mut std::io::Cursor::new(&mut bytes),
        image::ImageFormat::Png,
      )
      .unwrap();
    bytes
  }

  #[test]
  fn inference_failure_is_a_server_error() {
    let task = InspectionTask::new(
      Broken,
      Annotator::default(),
      Persistence::default(),
      InspectionSettings::default(),
    );
    let err = task.run(Upload::new(png())).err().unwrap();
    assert!(matches!(err, InspectError::Inference(_)));
    assert!(!err.is_client_error());
  }

  #[test]
  fn bad_input_is_a_client_error() {
    let task = InspectionTask::new(
      Broken,
      Annotator::default(),
      Persistence::default(),
      InspectionSettings::default(),
    );
    let err = task
      .run(Upload::new(png()).with_content_type("application/zip"))
      .err()
      .unwrap();
    assert!(err.is_client_error());
  }

  #[test]
  fn health_reports_model_and_store() {
    let detector = ReplayDetector::new(RawDetections {
      names: BTreeMap::new(),
      detections: vec![],
    });
    let task = InspectionTask::new(
      detector,
      Annotator::default(),
      Persistence::default(),
      InspectionSettings::default(),
    );
    let health = task.health();
    assert_eq!(health.status, "ok");
    assert_eq!(health.model, "replay:memory");
    assert!(!health.record_store);
  }
}
