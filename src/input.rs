// 该文件是 Haijian （海检） 项目的一部分。
// src/input.rs - 上传媒体解码
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

use std::path::Path;

use image::RgbImage;
use thiserror::Error;
use tracing::debug;

mod read_image_file;
pub use self::read_image_file::decode_image;

#[cfg(feature = "gstreamer_input")]
mod gstreamer_input;
#[cfg(feature = "gstreamer_input")]
pub use self::gstreamer_input::{GStreamerFrameError, first_video_frame};

/// 接受的上传类型
pub const ACCEPTED_CONTENT_TYPES: [&str; 7] = [
  "image/jpeg",
  "image/png",
  "image/jpg",
  "image/webp",
  "video/mp4",
  "video/quicktime",
  "video/avi",
];

#[derive(Error, Debug)]
pub enum InputError {
  #[error("不支持的文件类型: {0}")]
  UnsupportedMedia(String),
  #[error("图像解码错误: {0}")]
  ImageDecode(#[from] image::ImageError),
  #[error("图像为空")]
  EmptyImage,
  #[error("无法解码视频帧: {0}")]
  VideoDecode(String),
  #[error("临时文件错误: {0}")]
  TempFile(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
  Image,
  Video,
}

impl MediaKind {
  /// 根据声明的内容类型判断媒体种类，未声明时按图像处理
  pub fn from_content_type(content_type: Option<&str>) -> Result<Self, InputError> {
    match content_type {
      None => Ok(MediaKind::Image),
      Some(ct) if !ACCEPTED_CONTENT_TYPES.contains(&ct) => {
        Err(InputError::UnsupportedMedia(ct.to_string()))
      }
      Some(ct) if ct.starts_with("video/") => Ok(MediaKind::Video),
      Some(_) => Ok(MediaKind::Image),
    }
  }
}

/// 一次请求上传的文件
#[derive(Debug, Clone)]
pub struct Upload {
  pub file_name: Option<String>,
  pub content_type: Option<String>,
  pub bytes: Vec<u8>,
}

impl Upload {
  pub fn new(bytes: Vec<u8>) -> Self {
    Self {
      file_name: None,
      content_type: None,
      bytes,
    }
  }

  pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
    self.file_name = Some(file_name.into());
    self
  }

  pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
    self.content_type = Some(content_type.into());
    self
  }

  pub fn kind(&self) -> Result<MediaKind, InputError> {
    MediaKind::from_content_type(self.content_type.as_deref())
  }

  /// 文件名后缀（含点），用于临时文件
  fn suffix(&self, default: &str) -> String {
    self
      .file_name
      .as_deref()
      .and_then(|name| Path::new(name).extension())
      .and_then(|ext| ext.to_str())
      .map(|ext| format!(".{}", ext))
      .unwrap_or_else(|| default.to_string())
  }
}

/// 将上传内容解码为一帧 RGB 图像
///
/// 视频只取第一帧。
pub fn decode_upload(upload: &Upload) -> Result<RgbImage, InputError> {
  let kind = upload.kind()?;
  debug!("解码上传: {:?}, {} 字节", kind, upload.bytes.len());
  match kind {
    MediaKind::Image => decode_image(&upload.bytes),
    MediaKind::Video => decode_video(upload),
  }
}

#[cfg(feature = "gstreamer_input")]
fn decode_video(upload: &Upload) -> Result<RgbImage, InputError> {
  use std::io::Write;

  // 临时文件在离开作用域时删除，任何返回路径都一样
  let mut file = tempfile::Builder::new()
    .prefix("haijian-")
    .suffix(&upload.suffix(".mp4"))
    .tempfile()?;
  file.write_all(&upload.bytes)?;
  file.flush()?;

  first_video_frame(file.path()).map_err(|e| InputError::VideoDecode(e.to_string()))
}

#[cfg(not(feature = "gstreamer_input"))]
fn decode_video(upload: &Upload) -> Result<RgbImage, InputError> {
  Err(InputError::VideoDecode(format!(
    "未启用视频解码 (gstreamer_input), 文件类型: {}",
    upload.suffix(".mp4")
  )))
}
