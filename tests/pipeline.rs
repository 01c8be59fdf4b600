// 该文件是 Haijian （海检） 项目的一部分。
// tests/pipeline.rs - 检测流水线端到端测试
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

mod common;

use std::sync::Arc;

use haijian::{
  detection::{DetectionSet, parse_detections},
  input::{InputError, Upload},
  model::{Detector, InferenceConfig, ReplayDetector},
  output::{AnnotatedImage, Annotator, palette::{BANNER_BACKGROUND, class_color}},
  persist::Persistence,
  risk::RiskLevel,
  task::{InspectError, InspectionSettings, InspectionTask},
};

use common::*;

fn task_with_stores() -> (
  InspectionTask<ReplayDetector>,
  Arc<MemoryObjectStore>,
  Arc<MemoryRecordStore>,
) {
  let objects = Arc::new(MemoryObjectStore::default());
  let records = Arc::new(MemoryRecordStore::default());
  let persistence = Persistence::default()
    .with_object_store(objects.clone())
    .with_record_store(records.clone());
  let task = InspectionTask::new(
    fixed_detector(),
    Annotator::default(),
    persistence,
    InspectionSettings::default(),
  );
  (task, objects, records)
}

#[test]
fn corrosion_and_debris_end_to_end() {
  let (task, objects, records) = task_with_stores();
  let upload = Upload::new(png_bytes())
    .with_file_name("hull.png")
    .with_content_type("image/png");

  let inspection = task.run(upload).unwrap();
  let response = &inspection.response;

  assert_eq!(response.summary.total, 2);
  assert_eq!(response.summary.risk_level, RiskLevel::High);
  assert_eq!(response.summary.max_confidence, 0.91);
  assert!((response.summary.avg_confidence - 0.655).abs() < 1e-9);
  assert!(response.summary.inference_time_ms >= 0.0);

  let names: Vec<_> = response
    .detections
    .iter()
    .map(|d| d.class_name.as_str())
    .collect();
  assert_eq!(names, ["corrosion", "debris"]);

  let id = response.inspection_id.to_string();
  assert!(id.starts_with("NCR-"));
  assert_eq!(id.len(), "NCR-20260101-1234".len());

  assert!(response.annotated_image.starts_with("data:image/jpeg;base64,"));
  let jpeg = AnnotatedImage::from_data_uri(&response.annotated_image).unwrap();
  let decoded = image::load_from_memory(&jpeg.jpeg).unwrap();
  assert_eq!((decoded.width(), decoded.height()), (WIDTH, HEIGHT));

  let outcome = inspection.persistence.wait().unwrap();
  assert!(outcome.image_url().is_some());
  assert!(outcome.annotated_image_url().is_some());
  assert!(outcome.record_saved);

  let stored = objects.objects.lock().unwrap();
  assert_eq!(stored.len(), 2);
  assert!(stored.iter().all(|(bucket, _, _)| bucket == "image_bucket"));
  assert!(stored.iter().any(|(_, key, _)| key.ends_with(&format!("_original_{}.jpg", id))));
  assert!(stored.iter().any(|(_, key, bytes)| {
    key.ends_with(&format!("_annotated_{}.jpg", id)) && *bytes == jpeg.jpeg
  }));

  let rows = records.rows_in("inspections");
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0]["inspection_id"], id.as_str());
  assert_eq!(rows[0]["file_name"], "hull.png");
  assert_eq!(rows[0]["risk_level"], "HIGH");
  assert_eq!(rows[0]["status"], "completed");
  assert_eq!(rows[0]["detected_classes"], serde_json::json!(["corrosion", "debris"]));
}

#[test]
fn overlay_uses_one_color_per_class() {
  let raw = fixed_detector()
    .infer(&hull_image(), &InferenceConfig::default())
    .unwrap();
  let detections = parse_detections(&raw);
  let drawn = Annotator::default().draw(&hull_image(), &detections);

  // 左边框中段
  assert_eq!(drawn.get_pixel(10, 35), &class_color("corrosion"));
  assert_eq!(drawn.get_pixel(60, 75), &class_color("debris"));
  assert_ne!(class_color("corrosion"), class_color("debris"));
  // 框内部不变
  assert_eq!(drawn.get_pixel(30, 35), &BACKGROUND);
  // 右下角横幅
  assert_eq!(drawn.get_pixel(WIDTH - 4, HEIGHT - 4), &BANNER_BACKGROUND);
}

#[test]
fn empty_result_still_renders_banner() {
  let task = InspectionTask::new(
    empty_detector(),
    Annotator::default(),
    Persistence::default(),
    InspectionSettings::default(),
  );
  let inspection = task.run(Upload::new(png_bytes())).unwrap();
  let response = &inspection.response;

  assert!(response.detections.is_empty());
  assert_eq!(response.summary.total, 0);
  assert_eq!(response.summary.risk_level, RiskLevel::Safe);
  assert_eq!(response.summary.avg_confidence, 0.0);
  assert!(AnnotatedImage::from_data_uri(&response.annotated_image).is_some());

  let drawn = Annotator::default().draw(&hull_image(), &DetectionSet::default());
  assert_eq!(drawn.get_pixel(WIDTH - 4, HEIGHT - 4), &BANNER_BACKGROUND);
}

#[test]
fn unsupported_media_is_rejected_before_inference() {
  let (task, objects, records) = task_with_stores();
  let err = task
    .run(Upload::new(b"%PDF-1.7".to_vec()).with_content_type("application/pdf"))
    .err()
    .unwrap();

  assert!(err.is_client_error());
  assert!(matches!(
    err,
    InspectError::Input(InputError::UnsupportedMedia(_))
  ));
  assert!(objects.objects.lock().unwrap().is_empty());
  assert!(records.rows.lock().unwrap().is_empty());
}

#[test]
fn undecodable_image_is_a_client_error() {
  let (task, _, records) = task_with_stores();
  let err = task
    .run(Upload::new(b"not really a jpeg".to_vec()).with_content_type("image/jpeg"))
    .err()
    .unwrap();

  assert!(err.is_client_error());
  assert!(records.rows.lock().unwrap().is_empty());
}

#[cfg(not(feature = "gstreamer_input"))]
#[test]
fn video_without_decoder_is_rejected() {
  let (task, _, _) = task_with_stores();
  let err = task
    .run(
      Upload::new(vec![0; 64])
        .with_file_name("dive.mp4")
        .with_content_type("video/mp4"),
    )
    .err()
    .unwrap();
  assert!(matches!(err, InspectError::Input(InputError::VideoDecode(_))));
}
