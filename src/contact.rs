// 该文件是 Haijian （海检） 项目的一部分。
// src/contact.rs - 企业联系表单
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

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
  store::{RecordStore, StoreError},
  task::CONTACTS_TABLE,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
  pub first_name: String,
  pub last_name: String,
  pub email: String,
  pub company: String,
  pub use_case: String,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub message: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
  Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Error, Debug)]
pub enum ContactError {
  #[error("联系表单无效: {0}")]
  Invalid(String),
  #[error("联系信息未能保存到任何存储")]
  NotSaved,
}

impl ContactError {
  pub fn is_client_error(&self) -> bool {
    matches!(self, ContactError::Invalid(_))
  }
}

impl ContactSubmission {
  pub fn validate(&self) -> Result<(), ContactError> {
    let required = [
      ("first_name", &self.first_name),
      ("last_name", &self.last_name),
      ("email", &self.email),
      ("company", &self.company),
      ("use_case", &self.use_case),
    ];
    for (field, value) in required {
      if value.trim().is_empty() {
        return Err(ContactError::Invalid(format!("缺少字段 {}", field)));
      }
    }

    if !is_plausible_email(self.email.trim()) {
      return Err(ContactError::Invalid(format!(
        "邮箱格式错误: {}",
        self.email
      )));
    }
    Ok(())
  }
}

fn is_plausible_email(email: &str) -> bool {
  let mut parts = email.split('@');
  match (parts.next(), parts.next(), parts.next()) {
    (Some(local), Some(domain), None) => !local.is_empty() && domain.contains('.'),
    _ => false,
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContactReceipt {
  pub status: &'static str,
  pub saved_to_store_a: bool,
  pub saved_to_store_b: bool,
}

/// 将联系表单写入两个互为备份的记录存储
#[derive(Clone)]
pub struct ContactHandler {
  store_a: Option<Arc<dyn RecordStore>>,
  store_b: Option<Arc<dyn RecordStore>>,
  table: String,
}

impl Default for ContactHandler {
  fn default() -> Self {
    Self {
      store_a: None,
      store_b: None,
      table: CONTACTS_TABLE.to_string(),
    }
  }
}

impl ContactHandler {
  pub fn with_store_a(mut self, store: Arc<dyn RecordStore>) -> Self {
    self.store_a = Some(store);
    self
  }

  pub fn with_store_b(mut self, store: Arc<dyn RecordStore>) -> Self {
    self.store_b = Some(store);
    self
  }

  pub fn with_table(mut self, table: impl Into<String>) -> Self {
    self.table = table.into();
    self
  }

  pub fn submit(&self, submission: &ContactSubmission) -> Result<ContactReceipt, ContactError> {
    submission.validate()?;

    let record = match serde_json::to_value(submission) {
      Ok(record) => record,
      Err(e) => {
        error!("联系表单序列化失败: {}", e);
        return Err(ContactError::NotSaved);
      }
    };

    let saved_to_store_a = self.save("A", self.store_a.as_deref(), &record);
    let saved_to_store_b = self.save("B", self.store_b.as_deref(), &record);

    if !saved_to_store_a && !saved_to_store_b {
      error!("联系表单未能保存: {}", submission.email);
      return Err(ContactError::NotSaved);
    }

    info!(
      "联系表单已保存: {} (A: {}, B: {})",
      submission.email, saved_to_store_a, saved_to_store_b
    );
    Ok(ContactReceipt {
      status: "ok",
      saved_to_store_a,
      saved_to_store_b,
    })
  }

  fn save(&self, label: &str, store: Option<&dyn RecordStore>, record: &serde_json::Value) -> bool {
    let result = match store {
      Some(store) => store.insert(&self.table, record),
      None => Err(StoreError::NotConfigured),
    };
    match result {
      Ok(()) => true,
      Err(StoreError::NotConfigured) => {
        warn!("存储 {} 未配置", label);
        false
      }
      Err(e) => {
        error!("写入存储 {} 失败: {}", label, e);
        false
      }
    }
  }
}
