// 该文件是 Haijian （海检） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{info, warn};
use url::Url;

use haijian::{
  FromUrl, FromUrlWithScheme,
  contact::ContactHandler,
  detection::DetectionSet,
  input::Upload,
  model::ReplayDetector,
  output::{AnnotatedImage, Annotator, draw::Draw},
  persist::Persistence,
  risk::ClassBreakdown,
  store::{open_object_store, open_record_store},
  task::{InspectionSettings, InspectionTask},
};

use args::{Args, Command, ContactArgs, InspectArgs};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  match args.command {
    Command::Inspect(args) => inspect(args),
    Command::Contact(args) => contact(args),
    Command::Inspections {
      record_store,
      limit,
    } => inspections(&record_store, limit),
    Command::Health {
      detector,
      record_store,
    } => health(&detector, record_store.as_ref()),
  }
}

fn open_detector(url: &Url) -> Result<ReplayDetector> {
  if url.scheme() != ReplayDetector::SCHEME {
    bail!("不支持的检测器: {}", url);
  }
  ReplayDetector::from_url(url).with_context(|| format!("无法加载检测器 {}", url))
}

fn persistence(object_store: Option<&Url>, record_store: Option<&Url>) -> Result<Persistence> {
  let mut persistence = Persistence::default();
  if let Some(url) = object_store {
    persistence = persistence.with_object_store(open_object_store(url)?);
  }
  if let Some(url) = record_store {
    persistence = persistence.with_record_store(open_record_store(url)?);
  }
  Ok(persistence)
}

/// 按扩展名推断内容类型
fn guess_content_type(path: &Path) -> Option<&'static str> {
  let ext = path.extension()?.to_str()?.to_lowercase();
  match ext.as_str() {
    "jpg" | "jpeg" => Some("image/jpeg"),
    "png" => Some("image/png"),
    "webp" => Some("image/webp"),
    "mp4" => Some("video/mp4"),
    "mov" => Some("video/quicktime"),
    "avi" => Some("video/avi"),
    _ => None,
  }
}

fn inspect(args: InspectArgs) -> Result<()> {
  info!("输入文件: {}", args.input.display());
  info!("检测器: {}", args.detector);

  let detector = open_detector(&args.detector)?;
  let draw = match &args.font {
    Some(path) => Draw::from_font_file(path)?,
    None => Draw::default(),
  };
  let persistence = persistence(args.object_store.as_ref(), args.record_store.as_ref())?;
  let task = InspectionTask::new(detector, Annotator::new(draw), persistence, args.settings());

  let bytes = std::fs::read(&args.input)
    .with_context(|| format!("无法读取输入文件 {}", args.input.display()))?;
  let mut upload = Upload::new(bytes);
  if let Some(name) = args.input.file_name().and_then(|n| n.to_str()) {
    upload = upload.with_file_name(name);
  }
  let content_type = args
    .content_type
    .clone()
    .or_else(|| guess_content_type(&args.input).map(str::to_string));
  if let Some(content_type) = content_type {
    upload = upload.with_content_type(content_type);
  }

  let inspection = task.run(upload)?;
  let response = inspection.response;

  let breakdown = ClassBreakdown::count(&DetectionSet::from(response.detections.clone()));
  info!(
    "{}: 腐蚀 {}, 海生物 {}, 杂物 {}, 健康 {}, 其他 {}",
    response.inspection_id,
    breakdown.corrosion,
    breakdown.marine_growth,
    breakdown.debris,
    breakdown.healthy,
    breakdown.other
  );

  if let Some(outcome) = inspection.persistence.wait() {
    info!(
      "持久化完成: 原图 {}, 标注图 {}, 记录 {}",
      outcome.image_url().map(Url::as_str).unwrap_or("-"),
      outcome.annotated_image_url().map(Url::as_str).unwrap_or("-"),
      if outcome.record_saved { "已保存" } else { "未保存" }
    );
  }

  if let Some(path) = &args.report {
    std::fs::write(path, serde_json::to_vec_pretty(&response)?)
      .with_context(|| format!("无法写入报告 {}", path.display()))?;
    info!("报告已保存: {}", path.display());
  }

  let mut printed = serde_json::to_value(&response)?;
  if let Some(path) = &args.annotated {
    let annotated = AnnotatedImage::from_data_uri(&response.annotated_image)
      .context("标注图像格式错误")?;
    std::fs::write(path, &annotated.jpeg)
      .with_context(|| format!("无法写入标注图像 {}", path.display()))?;
    info!("标注图像已保存: {}", path.display());
    if let Some(fields) = printed.as_object_mut() {
      fields.remove("annotated_image");
    }
  }
  println!("{}", serde_json::to_string_pretty(&printed)?);

  Ok(())
}

fn contact(args: ContactArgs) -> Result<()> {
  let settings = InspectionSettings::default();
  let mut handler = ContactHandler::default().with_table(settings.contacts_table);
  if let Some(url) = &args.store_a {
    handler = handler.with_store_a(open_record_store(url)?);
  }
  if let Some(url) = &args.store_b {
    handler = handler.with_store_b(open_record_store(url)?);
  }

  let receipt = handler.submit(&args.submission())?;
  println!("{}", serde_json::to_string_pretty(&receipt)?);
  Ok(())
}

fn inspections(record_store: &Url, limit: usize) -> Result<()> {
  let listing = persistence(None, Some(record_store))?.recent_inspections(limit);
  if let Some(error) = &listing.error {
    warn!("查询失败: {}", error);
  }
  println!("{}", serde_json::to_string_pretty(&listing)?);
  Ok(())
}

fn health(detector: &Url, record_store: Option<&Url>) -> Result<()> {
  let task = InspectionTask::new(
    open_detector(detector)?,
    Annotator::default(),
    persistence(None, record_store)?,
    InspectionSettings::default(),
  );
  println!("{}", serde_json::to_string_pretty(&task.health())?);
  Ok(())
}
