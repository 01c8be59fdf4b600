// 该文件是 Haijian （海检） 项目的一部分。
// src/model/replay.rs - 回放检测器
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

//! 回放一次已记录的检测器输出。
//!
//! 记录文件是 JSON，格式与检测器契约一致：
//!
//! ```json
//! {
//!   "names": { "0": "corrosion", "1": "debris" },
//!   "detections": [
//!     { "class_index": 0, "confidence": 0.91, "box": [10, 10, 50, 50] }
//!   ]
//! }
//! ```

use std::path::PathBuf;

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{Detector, InferenceConfig, RawDetections},
};

#[derive(Error, Debug)]
pub enum ReplayDetectorError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("记录文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("记录文件格式错误: {0}")]
  FormatError(#[from] serde_json::Error),
}

/// 返回固定检测结果的检测器
#[derive(Debug, Clone)]
pub struct ReplayDetector {
  source: Option<PathBuf>,
  output: RawDetections,
}

impl FromUrlWithScheme for ReplayDetector {
  const SCHEME: &'static str = "replay";
}

impl FromUrl for ReplayDetector {
  type Error = ReplayDetectorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ReplayDetectorError::SchemeMismatch(format!(
        "期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let path = PathBuf::from(url.path());
    info!("加载检测记录: {}", path.display());
    let data = std::fs::read(&path)?;
    let output: RawDetections = serde_json::from_slice(&data)?;
    debug!(
      "记录包含 {} 个类别, {} 个检测",
      output.names.len(),
      output.detections.len()
    );

    Ok(Self {
      source: Some(path),
      output,
    })
  }
}

impl ReplayDetector {
  pub fn new(output: RawDetections) -> Self {
    Self {
      source: None,
      output,
    }
  }
}

impl Detector for ReplayDetector {
  type Error = ReplayDetectorError;

  fn name(&self) -> String {
    match &self.source {
      Some(path) => format!("replay:{}", path.display()),
      None => "replay:memory".to_string(),
    }
  }

  fn infer(
    &self,
    image: &RgbImage,
    config: &InferenceConfig,
  ) -> Result<RawDetections, Self::Error> {
    debug!(
      "回放检测: {}x{}, conf={}, iou={}",
      image.width(),
      image.height(),
      config.confidence,
      config.iou
    );
    Ok(self.output.clone())
  }
}
