// 该文件是 Haijian （海检） 项目的一部分。
// src/input/gstreamer_input.rs - GStreamer 视频首帧提取
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

//! # GStreamer 视频首帧提取
//!
//! 上传的视频只用第一帧作为代表帧参与检测。
//!
//! ## 系统依赖
//!
//! **Ubuntu/Debian:**
//! ```bash
//! sudo apt-get install libgstreamer1.0-dev libgstreamer-plugins-base1.0-dev
//! ```
//!
//! 在 `Cargo.toml` 中启用 `gstreamer_input` 特性。

use std::path::Path;

use gstreamer::{self as gst, prelude::*};
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info, warn};

const FIRST_FRAME_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug)]
pub enum GStreamerFrameError {
  #[error("GStreamer error: {0}")]
  GStreamerError(#[from] gst::glib::Error),
  #[error("GStreamer boolean error: {0}")]
  GStreamerBoolError(#[from] gst::glib::BoolError),
  #[error("State change error: {0}")]
  StateChangeError(#[from] gst::StateChangeError),
  #[error("Failed to get appsink element")]
  AppSinkNotFound,
  #[error("Pipeline error: {0}")]
  PipelineError(String),
  #[error("Video contains no frame")]
  NoFrame,
  #[error("Unsupported video format")]
  UnsupportedFormat,
  #[error("Buffer size mismatch: expected {expected} bytes, got {actual} bytes")]
  BufferSizeMismatch { expected: usize, actual: usize },
}

/// 管道在离开作用域时停止
struct PipelineGuard(gst::Pipeline);

impl Drop for PipelineGuard {
  fn drop(&mut self) {
    if let Err(e) = self.0.set_state(gst::State::Null) {
      warn!("Failed to stop GStreamer pipeline: {}", e);
    }
  }
}

/// 读取视频文件的第一帧
pub fn first_video_frame(path: &Path) -> Result<RgbImage, GStreamerFrameError> {
  gst::init()?;

  let description = "filesrc name=src ! decodebin ! videoconvert ! video/x-raw,format=RGB \
                     ! appsink name=sink max-buffers=1 sync=false";
  info!("GStreamer pipeline description: {}", description);

  let pipeline = gst::parse::launch(description)?
    .downcast::<gst::Pipeline>()
    .map_err(|_| GStreamerFrameError::PipelineError("Failed to create pipeline".to_string()))?;
  let pipeline = PipelineGuard(pipeline);

  let location = path
    .to_str()
    .ok_or_else(|| GStreamerFrameError::PipelineError("Non UTF-8 path".to_string()))?;
  pipeline
    .0
    .by_name("src")
    .ok_or_else(|| GStreamerFrameError::PipelineError("Failed to get filesrc".to_string()))?
    .set_property("location", location);

  let appsink = pipeline
    .0
    .by_name("sink")
    .ok_or(GStreamerFrameError::AppSinkNotFound)?
    .downcast::<gst_app::AppSink>()
    .map_err(|_| GStreamerFrameError::AppSinkNotFound)?;

  pipeline.0.set_state(gst::State::Playing)?;

  let sample = appsink
    .try_pull_sample(gst::ClockTime::from_seconds(FIRST_FRAME_TIMEOUT_SECS))
    .ok_or(GStreamerFrameError::NoFrame)?;

  sample_to_rgb_image(&sample)
}

fn sample_to_rgb_image(sample: &gst::Sample) -> Result<RgbImage, GStreamerFrameError> {
  let buffer = sample
    .buffer()
    .ok_or_else(|| GStreamerFrameError::PipelineError("No buffer in sample".to_string()))?;
  let caps = sample
    .caps()
    .ok_or_else(|| GStreamerFrameError::PipelineError("No caps in sample".to_string()))?;
  let video_info = gst_video::VideoInfo::from_caps(caps)?;

  if video_info.format() != gst_video::VideoFormat::Rgb {
    return Err(GStreamerFrameError::UnsupportedFormat);
  }

  let width = video_info.width() as usize;
  let height = video_info.height() as usize;
  let stride = video_info.stride()[0] as usize;

  let map = buffer.map_readable()?;
  let data = map.as_slice();

  // 行之间可能有填充
  let expected = stride * height.saturating_sub(1) + width * 3;
  if data.len() < expected {
    return Err(GStreamerFrameError::BufferSizeMismatch {
      expected,
      actual: data.len(),
    });
  }

  let mut pixels = Vec::with_capacity(width * height * 3);
  for row in 0..height {
    let start = row * stride;
    pixels.extend_from_slice(&data[start..start + width * 3]);
  }
  debug!("视频首帧: {}x{}", width, height);

  RgbImage::from_raw(width as u32, height as u32, pixels)
    .ok_or_else(|| GStreamerFrameError::PipelineError("Invalid frame buffer".to_string()))
}
