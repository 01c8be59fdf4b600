// 该文件是 Haijian （海检） 项目的一部分。
// src/input/read_image_file.rs - 图像解码
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

use image::RgbImage;
use tracing::{debug, error};

use crate::input::InputError;

/// 从内存解码图像，格式由内容自动识别
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, InputError> {
  if bytes.is_empty() {
    error!("上传内容为空");
    return Err(InputError::EmptyImage);
  }

  let image = image::load_from_memory(bytes)
    .map_err(|e| {
      error!("图像解码失败: {}", e);
      e
    })?
    .to_rgb8();

  if image.width() == 0 || image.height() == 0 {
    return Err(InputError::EmptyImage);
  }

  debug!("图像解码完成: {}x{}", image.width(), image.height());
  Ok(image)
}
