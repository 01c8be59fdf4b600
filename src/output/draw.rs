// 该文件是 Haijian （海检） 项目的一部分。
// src/output/draw.rs - 检测结果可视化
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

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use tracing::{debug, info, warn};

use crate::{
  detection::{Detection, DetectionSet},
  output::{
    RenderError,
    palette::{BANNER_BACKGROUND, BANNER_TEXT_COLOR, LABEL_TEXT_COLOR, class_color},
  },
};

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 15.0;
const BANNER_FONT_SIZE: f32 = 14.0;
const CHAR_WIDTH_RATIO: f32 = 0.55; // 无字体时每字符宽度（相对字号，粗略估计）
const TEXT_HEIGHT_RATIO: f32 = 0.7;

// 边框与角标
const BOX_THICKNESS: i32 = 2;
const CORNER_LENGTH: i32 = 12;
const CORNER_THICKNESS: i32 = 3;

pub struct Draw {
  font: Option<FontArc>,
  label_scale: PxScale,
  banner_scale: PxScale,
}

/// 内嵌的默认字体 (DejaVu Sans Bold)
static EMBEDDED_FONT: &[u8] = include_bytes!("../../assets/font.ttf");

fn embedded_font() -> Option<FontArc> {
  match FontArc::try_from_slice(EMBEDDED_FONT) {
    Ok(font) => Some(font),
    Err(e) => {
      warn!("内嵌字体无效, 标注中不绘制文字: {}", e);
      None
    }
  }
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      font: embedded_font(),
      label_scale: PxScale::from(LABEL_FONT_SIZE),
      banner_scale: PxScale::from(BANNER_FONT_SIZE),
    }
  }
}

impl Draw {
  pub fn with_font(mut self, font: FontArc) -> Self {
    self.font = Some(font);
    self
  }

  /// 从 TrueType 字体文件加载，替换内嵌字体
  pub fn from_font_file(path: &Path) -> Result<Self, RenderError> {
    info!("加载字体文件: {}", path.display());
    let data = std::fs::read(path)?;
    let font = FontArc::try_from_vec(data).map_err(|_| RenderError::InvalidFont)?;
    Ok(Self::default().with_font(font))
  }

  /// 文本尺寸 (宽, 高)
  ///
  /// 无字体时按字号估算，保证布局仍然确定。
  fn measure(&self, scale: PxScale, text: &str) -> (i32, i32) {
    match &self.font {
      Some(font) => {
        let (w, h) = text_size(scale, font, text);
        (w as i32, h as i32)
      }
      None => {
        let w = (text.chars().count() as f32 * scale.x * CHAR_WIDTH_RATIO).ceil();
        let h = (scale.y * TEXT_HEIGHT_RATIO).ceil();
        (w as i32, h as i32)
      }
    }
  }

  /// 以基线坐标绘制文本
  fn put_text(
    &self,
    image: &mut RgbImage,
    color: Rgb<u8>,
    x: i32,
    baseline: i32,
    scale: PxScale,
    text: &str,
  ) {
    if let Some(font) = &self.font {
      let (_, h) = self.measure(scale, text);
      draw_text_mut(image, color, x, baseline - h, scale, font, text);
    }
  }

  // 绘制边框、四角标记与标签
  fn draw_detection(&self, image: &mut RgbImage, det: &Detection) {
    let color = class_color(&det.class_name);
    // 超出画布过多的坐标收拢到画布周围一圈，避免后续运算溢出
    let (w, h) = (image.width() as i32, image.height() as i32);
    let [x1, y1, x2, y2] = det.pixel_box();
    let (x1, x2) = (x1.clamp(-w, 2 * w), x2.clamp(-w, 2 * w));
    let (y1, y2) = (y1.clamp(-h, 2 * h), y2.clamp(-h, 2 * h));

    // 边框（2 像素）
    for inset in 0..BOX_THICKNESS {
      outline(image, x1 + inset, y1 + inset, x2 - inset, y2 - inset, color);
    }

    // 四角标记
    let cs = CORNER_LENGTH;
    for (cx, cy, dx, dy) in [
      (x1, y1, cs, cs),
      (x2, y1, -cs, cs),
      (x1, y2, cs, -cs),
      (x2, y2, -cs, -cs),
    ] {
      thick_line(image, (cx, cy), (cx + dx, cy), color);
      thick_line(image, (cx, cy), (cx, cy + dy), color);
    }

    // 标签背景与文字
    let tag = label_text(det);
    let (tw, th) = self.measure(self.label_scale, &tag);
    let (lx, ly) = (x1, (y1 - 6).max(th + 4));
    fill(image, lx, ly - th - 4, lx + tw + 10, ly + 2, color);
    self.put_text(image, LABEL_TEXT_COLOR, lx + 5, ly - 2, self.label_scale, &tag);
  }

  // 右下角检测数量横幅
  fn draw_banner(&self, image: &mut RgbImage, count: usize) {
    let label = banner_text(count);
    let (w, h) = (image.width() as i32, image.height() as i32);
    let (cw, ch) = self.measure(self.banner_scale, &label);
    fill(image, w - cw - 20, h - ch - 16, w - 4, h - 4, BANNER_BACKGROUND);
    self.put_text(image, BANNER_TEXT_COLOR, w - cw - 14, h - 8, self.banner_scale, &label);
  }
}

/// 标签文字，百分比取整时恰为一半的向偶数舍入
pub fn label_text(det: &Detection) -> String {
  format!("{}  {:.0}%", det.class_name, det.confidence * 100.0)
}

pub fn banner_text(count: usize) -> String {
  format!(
    "{} detection{} found",
    count,
    if count == 1 { "" } else { "s" }
  )
}

/// 两角坐标（含端点）转换为矩形，坐标顺序任意
fn span(a: i32, b: i32, c: i32, d: i32) -> Rect {
  let (left, right) = (a.min(c), a.max(c));
  let (top, bottom) = (b.min(d), b.max(d));
  Rect::at(left, top).of_size((right - left + 1) as u32, (bottom - top + 1) as u32)
}

fn outline(image: &mut RgbImage, x1: i32, y1: i32, x2: i32, y2: i32, color: Rgb<u8>) {
  // 内缩后两边交错说明框已经被填满
  if x1 > x2 + 1 || y1 > y2 + 1 {
    return;
  }
  draw_hollow_rect_mut(image, span(x1, y1, x2, y2), color);
}

fn fill(image: &mut RgbImage, x1: i32, y1: i32, x2: i32, y2: i32, color: Rgb<u8>) {
  draw_filled_rect_mut(image, span(x1, y1, x2, y2), color);
}

/// 水平或竖直的粗线段
fn thick_line(image: &mut RgbImage, from: (i32, i32), to: (i32, i32), color: Rgb<u8>) {
  let half = CORNER_THICKNESS / 2;
  if from.1 == to.1 {
    fill(image, from.0, from.1 - half, to.0, to.1 + half, color);
  } else {
    fill(image, from.0 - half, from.1, to.0 + half, to.1, color);
  }
}

pub trait DrawDetectionOnImage {
  fn draw_detections_on_image(&self, image: &mut RgbImage, result: &DetectionSet);
}

impl DrawDetectionOnImage for Draw {
  fn draw_detections_on_image(&self, image: &mut RgbImage, result: &DetectionSet) {
    for det in result {
      self.draw_detection(image, det);
    }
    self.draw_banner(image, result.len());
    debug!("绘制 {} 个检测框", result.len());
  }
}
