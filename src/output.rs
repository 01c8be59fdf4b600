// 该文件是 Haijian （海检） 项目的一部分。
// src/output.rs - 标注图像输出
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

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{RgbImage, codecs::jpeg::JpegEncoder};
use thiserror::Error;
use tracing::debug;

use crate::detection::DetectionSet;

pub mod draw;
pub mod palette;

use self::draw::{Draw, DrawDetectionOnImage};

pub const JPEG_QUALITY: u8 = 88;
const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Error, Debug)]
pub enum RenderError {
  #[error("图像编码错误: {0}")]
  Encode(#[from] image::ImageError),
  #[error("字体文件读取错误: {0}")]
  FontIo(#[from] std::io::Error),
  #[error("字体文件无效")]
  InvalidFont,
}

pub trait Render<Frame, Output>: Sized {
  type Rendered;
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<Self::Rendered, Self::Error>;
}

/// 编码后的标注图像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedImage {
  pub jpeg: Vec<u8>,
}

impl AnnotatedImage {
  /// `data:image/jpeg;base64,...` 形式
  pub fn data_uri(&self) -> String {
    format!("{}{}", DATA_URI_PREFIX, STANDARD.encode(&self.jpeg))
  }

  pub fn from_data_uri(uri: &str) -> Option<Self> {
    let payload = uri.strip_prefix(DATA_URI_PREFIX)?;
    let jpeg = STANDARD.decode(payload).ok()?;
    Some(Self { jpeg })
  }
}

pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, RenderError> {
  let mut bytes = Vec::new();
  JpegEncoder::new_with_quality(&mut bytes, quality).encode_image(image)?;
  Ok(bytes)
}

/// 在源图像副本上绘制检测结果并编码为 JPEG
pub struct Annotator {
  draw: Draw,
  quality: u8,
}

impl Default for Annotator {
  fn default() -> Self {
    Self::new(Draw::default())
  }
}

impl Annotator {
  pub fn new(draw: Draw) -> Self {
    Self {
      draw,
      quality: JPEG_QUALITY,
    }
  }

  pub fn with_quality(mut self, quality: u8) -> Self {
    self.quality = quality;
    self
  }

  /// 只绘制，不编码
  pub fn draw(&self, frame: &RgbImage, result: &DetectionSet) -> RgbImage {
    let mut image = frame.clone();
    self.draw.draw_detections_on_image(&mut image, result);
    image
  }
}

impl Render<RgbImage, DetectionSet> for Annotator {
  type Rendered = AnnotatedImage;
  type Error = RenderError;

  fn render_result(
    &self,
    frame: &RgbImage,
    result: &DetectionSet,
  ) -> Result<AnnotatedImage, RenderError> {
    let image = self.draw(frame, result);
    let jpeg = encode_jpeg(&image, self.quality)?;
    debug!("标注图像编码完成: {} 字节", jpeg.len());
    Ok(AnnotatedImage { jpeg })
  }
}

#[cfg(test)]
mod tests {
  use image::Rgb;

  use super::*;
  use crate::detection::Detection;

  fn source() -> RgbImage {
    RgbImage::from_fn(200, 150, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]))
  }

  fn detections() -> DetectionSet {
    vec![
      Detection::new("corrosion", 0.91, [10.0, 10.0, 50.0, 50.0]),
      Detection::new("debris", 0.40, [60.0, 60.0, 90.0, 90.0]),
    ]
    .into()
  }

  #[test]
  fn rendering_is_deterministic() {
    let annotator = Annotator::default();
    let a = annotator.render_result(&source(), &detections()).unwrap();
    let b = annotator.render_result(&source(), &detections()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.data_uri(), b.data_uri());
  }

  #[test]
  fn source_is_left_untouched() {
    let frame = source();
    let before = frame.clone();
    Annotator::default()
      .render_result(&frame, &detections())
      .unwrap();
    assert_eq!(frame, before);
  }

  #[test]
  fn data_uri_round_trips_to_a_jpeg() {
    let rendered = Annotator::default()
      .render_result(&source(), &DetectionSet::default())
      .unwrap();
    let uri = rendered.data_uri();
    assert!(uri.starts_with("data:image/jpeg;base64,"));
    let back = AnnotatedImage::from_data_uri(&uri).unwrap();
    assert_eq!(back, rendered);
    let decoded = image::load_from_memory(&back.jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (200, 150));
  }
}
