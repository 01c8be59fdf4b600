// 该文件是 Haijian （海检） 项目的一部分。
// src/args.rs - 命令行参数
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

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use url::Url;

use haijian::{
  contact::ContactSubmission,
  persist::{DEFAULT_BUCKET, DEFAULT_LISTING_LIMIT},
  task::InspectionSettings,
};

/// 海检：船体水下检测结果处理
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// 检测一张图片或一段视频的首帧
  Inspect(InspectArgs),
  /// 提交企业联系表单
  Contact(ContactArgs),
  /// 列出最近的检测记录
  Inspections {
    /// 记录存储，例如 jsonl:///var/lib/haijian
    #[arg(long, value_name = "STORE")]
    record_store: Url,
    #[arg(long, default_value_t = DEFAULT_LISTING_LIMIT)]
    limit: usize,
  },
  /// 健康检查
  Health {
    /// 检测器，例如 replay:///path/to/output.json
    #[arg(long, value_name = "DETECTOR")]
    detector: Url,
    #[arg(long, value_name = "STORE")]
    record_store: Option<Url>,
  },
}

#[derive(ClapArgs, Debug)]
pub struct InspectArgs {
  /// 上传的文件
  #[arg(long, value_name = "FILE")]
  pub input: PathBuf,

  /// 声明的内容类型，缺省时按扩展名推断
  #[arg(long, value_name = "MIME")]
  pub content_type: Option<String>,

  /// 检测器，例如 replay:///path/to/output.json
  #[arg(long, value_name = "DETECTOR")]
  pub detector: Url,

  /// 标注使用的 TrueType 字体
  #[arg(long, value_name = "TTF")]
  pub font: Option<PathBuf>,

  /// 对象存储，例如 folder:///var/lib/haijian/objects
  #[arg(long, value_name = "STORE")]
  pub object_store: Option<Url>,

  /// 记录存储，例如 jsonl:///var/lib/haijian
  #[arg(long, value_name = "STORE")]
  pub record_store: Option<Url>,

  /// 标注图像保存路径
  #[arg(long, value_name = "JPG")]
  pub annotated: Option<PathBuf>,

  /// 完整响应保存路径
  #[arg(long, value_name = "JSON")]
  pub report: Option<PathBuf>,

  #[arg(long, default_value = DEFAULT_BUCKET)]
  pub bucket: String,

  /// 标注图像 JPEG 质量
  #[arg(long, default_value_t = 88, value_parser = clap::value_parser!(u8).range(1..=100))]
  pub jpeg_quality: u8,

  /// 健康检查中显示的模型名称
  #[arg(long)]
  pub model_name: Option<String>,
}

impl InspectArgs {
  pub fn settings(&self) -> InspectionSettings {
    // 推理阈值固定，不从命令行覆盖
    InspectionSettings {
      model_name: self.model_name.clone(),
      bucket: self.bucket.clone(),
      jpeg_quality: self.jpeg_quality,
      ..InspectionSettings::default()
    }
  }
}

#[derive(ClapArgs, Debug)]
pub struct ContactArgs {
  /// 主记录存储
  #[arg(long, value_name = "STORE")]
  pub store_a: Option<Url>,
  /// 备份记录存储
  #[arg(long, value_name = "STORE")]
  pub store_b: Option<Url>,
  #[arg(long)]
  pub first_name: String,
  #[arg(long)]
  pub last_name: String,
  #[arg(long)]
  pub email: String,
  #[arg(long)]
  pub company: String,
  #[arg(long)]
  pub use_case: String,
  #[arg(long, default_value = "")]
  pub message: String,
}

impl ContactArgs {
  pub fn submission(&self) -> ContactSubmission {
    ContactSubmission {
      first_name: self.first_name.clone(),
      last_name: self.last_name.clone(),
      email: self.email.clone(),
      company: self.company.clone(),
      use_case: self.use_case.clone(),
      message: self.message.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use haijian::model::InferenceConfig;

  use super::*;

  fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
    let mut argv = vec![
      "haijian",
      "inspect",
      "--input",
      "hull.png",
      "--detector",
      "replay:///tmp/hull.json",
    ];
    argv.extend_from_slice(extra);
    Args::try_parse_from(argv)
  }

  #[test]
  fn inference_thresholds_are_fixed() {
    assert!(parse(&["--confidence", "0.5"]).is_err());
    assert!(parse(&["--iou", "0.3"]).is_err());

    let Command::Inspect(args) = parse(&["--jpeg-quality", "70"]).unwrap().command else {
      panic!("expected inspect");
    };
    let settings = args.settings();
    assert_eq!(settings.inference, InferenceConfig::default());
    assert_eq!(settings.jpeg_quality, 70);
    assert_eq!(settings.contacts_table, "enterprise_contacts");
  }
}
