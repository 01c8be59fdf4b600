// 该文件是 Haijian （海检） 项目的一部分。
// src/risk.rs - 风险评估
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

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::detection::{DetectionSet, round4};

const HIGH_THRESHOLD: f64 = 0.85;
const MEDIUM_THRESHOLD: f64 = 0.60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
  Safe,
  Low,
  Medium,
  High,
}

impl RiskLevel {
  /// 由最高置信度决定的风险等级，阈值均为严格大于
  pub fn from_max_confidence(max_confidence: f64) -> Self {
    if max_confidence > HIGH_THRESHOLD {
      RiskLevel::High
    } else if max_confidence > MEDIUM_THRESHOLD {
      RiskLevel::Medium
    } else {
      RiskLevel::Low
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      RiskLevel::Safe => "SAFE",
      RiskLevel::Low => "LOW",
      RiskLevel::Medium => "MEDIUM",
      RiskLevel::High => "HIGH",
    }
  }
}

impl fmt::Display for RiskLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskSummary {
  pub total: usize,
  pub max_confidence: f64,
  pub avg_confidence: f64,
  pub risk_level: RiskLevel,
}

/// 汇总一次检测的风险
pub fn score(detections: &DetectionSet) -> RiskSummary {
  if detections.is_empty() {
    return RiskSummary {
      total: 0,
      max_confidence: 0.0,
      avg_confidence: 0.0,
      risk_level: RiskLevel::Safe,
    };
  }

  let total = detections.len();
  let max_confidence = detections
    .iter()
    .map(|d| d.confidence)
    .fold(f64::MIN, f64::max);
  let sum: f64 = detections.iter().map(|d| d.confidence).sum();

  RiskSummary {
    total,
    max_confidence,
    avg_confidence: round4(sum / total as f64),
    risk_level: RiskLevel::from_max_confidence(max_confidence),
  }
}

/// 按报告分组统计的类别数量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassBreakdown {
  pub corrosion: usize,
  pub marine_growth: usize,
  pub debris: usize,
  pub healthy: usize,
  pub other: usize,
}

impl ClassBreakdown {
  pub fn count(detections: &DetectionSet) -> Self {
    let mut breakdown = Self::default();
    for det in detections {
      let key = det.class_name.trim().to_lowercase();
      match key.as_str() {
        "corrosion" => breakdown.corrosion += 1,
        "marine growth" => breakdown.marine_growth += 1,
        "debris" => breakdown.debris += 1,
        k if k.contains("healthy") => breakdown.healthy += 1,
        _ => breakdown.other += 1,
      }
    }
    breakdown
  }
}
