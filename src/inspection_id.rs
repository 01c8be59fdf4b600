// 该文件是 Haijian （海检） 项目的一部分。
// src/inspection_id.rs - 检测编号
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

use std::{fmt, str::FromStr};

use chrono::{Local, NaiveDate};
use rand::Rng;
use serde::{Serialize, Serializer};
use thiserror::Error;

const PREFIX: &str = "NCR";
const SUFFIX_MIN: u16 = 1000;
const SUFFIX_MAX: u16 = 9999;

/// 形如 `NCR-20260314-4821` 的检测编号
///
/// 同一天内的编号只靠四位随机后缀区分，不保证唯一。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InspectionId {
  date: NaiveDate,
  suffix: u16,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum InspectionIdError {
  #[error("检测编号格式错误: {0}")]
  Malformed(String),
}

impl InspectionId {
  /// 以当前本地日期生成编号
  pub fn generate() -> Self {
    Self::generate_on(Local::now().date_naive(), &mut rand::thread_rng())
  }

  pub fn generate_on<R: Rng>(date: NaiveDate, rng: &mut R) -> Self {
    Self {
      date,
      suffix: rng.gen_range(SUFFIX_MIN..=SUFFIX_MAX),
    }
  }

  pub fn suffix(&self) -> u16 {
    self.suffix
  }
}

impl fmt::Display for InspectionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}-{}-{}",
      PREFIX,
      self.date.format("%Y%m%d"),
      self.suffix
    )
  }
}

impl FromStr for InspectionId {
  type Err = InspectionIdError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let malformed = || InspectionIdError::Malformed(s.to_string());
    let mut parts = s.split('-');
    let (Some(prefix), Some(date), Some(suffix), None) =
      (parts.next(), parts.next(), parts.next(), parts.next())
    else {
      return Err(malformed());
    };

    if prefix != PREFIX || date.len() != 8 || suffix.len() != 4 {
      return Err(malformed());
    }
    let date = NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|_| malformed())?;
    let suffix: u16 = suffix.parse().map_err(|_| malformed())?;
    if !(SUFFIX_MIN..=SUFFIX_MAX).contains(&suffix) {
      return Err(malformed());
    }

    Ok(Self { date, suffix })
  }
}

impl Serialize for InspectionId {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}
