// 该文件是 Haijian （海检） 项目的一部分。
// src/output/palette.rs - 类别配色
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

use image::Rgb;

/// 类别到边框颜色的固定映射（RGB）
pub const CLASS_COLORS: [(&str, Rgb<u8>); 5] = [
  ("corrosion", Rgb([231, 76, 60])),       // 红色
  ("marine growth", Rgb([240, 165, 0])),   // 琥珀色
  ("debris", Rgb([230, 126, 34])),         // 橙色
  ("healthy surface", Rgb([0, 200, 176])), // 青色
  ("healthy", Rgb([0, 200, 176])),
];

/// 未知类别的颜色
pub const DEFAULT_COLOR: Rgb<u8> = Rgb([176, 200, 0]);

/// 标签文字颜色
pub const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([10, 10, 10]);
/// 计数横幅背景
pub const BANNER_BACKGROUND: Rgb<u8> = Rgb([32, 19, 6]);
/// 计数横幅文字
pub const BANNER_TEXT_COLOR: Rgb<u8> = Rgb([176, 200, 0]);

/// 查找类别颜色，忽略大小写和首尾空白；找不到时返回默认颜色
pub fn class_color(class_name: &str) -> Rgb<u8> {
  let key = class_name.trim().to_lowercase();
  CLASS_COLORS
    .iter()
    .find(|(name, _)| *name == key)
    .map(|(_, color)| *color)
    .unwrap_or(DEFAULT_COLOR)
}
