// 该文件是 Haijian （海检） 项目的一部分。
// src/store.rs - 外部存储接口
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

use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme};

mod folder_object_store;
mod jsonl_record_store;

pub use self::folder_object_store::FolderObjectStore;
pub use self::jsonl_record_store::JsonlRecordStore;

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("存储未配置")]
  NotConfigured,
  #[error("非法的对象键: {0}")]
  InvalidKey(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("序列化错误: {0}")]
  SerdeError(#[from] serde_json::Error),
  #[error("记录格式错误: {0}")]
  InvalidRecord(String),
  #[error("存储后端错误: {0}")]
  Backend(String),
}

/// 对象存储：按 bucket/key 保存字节并返回可访问的地址
pub trait ObjectStore: Send + Sync {
  fn put(&self, bucket: &str, key: &str, bytes: &[u8], content_type: &str)
  -> Result<Url, StoreError>;
}

/// 结构化记录存储
pub trait RecordStore: Send + Sync {
  fn insert(&self, table: &str, record: &Value) -> Result<(), StoreError>;

  /// 按 `order_by` 字段降序返回最多 `limit` 条记录
  fn query(&self, table: &str, order_by: &str, limit: usize) -> Result<Vec<Value>, StoreError>;
}

/// 根据 URL 方案打开对象存储
pub fn open_object_store(url: &Url) -> Result<Arc<dyn ObjectStore>, StoreError> {
  match url.scheme() {
    FolderObjectStore::SCHEME => Ok(Arc::new(FolderObjectStore::from_url(url)?)),
    other => Err(StoreError::SchemeMismatch(other.to_string())),
  }
}

/// 根据 URL 方案打开记录存储
pub fn open_record_store(url: &Url) -> Result<Arc<dyn RecordStore>, StoreError> {
  match url.scheme() {
    JsonlRecordStore::SCHEME => Ok(Arc::new(JsonlRecordStore::from_url(url)?)),
    other => Err(StoreError::SchemeMismatch(other.to_string())),
  }
}

/// 检查名称只包含单个路径段
fn check_segment(name: &str) -> Result<(), StoreError> {
  if name.is_empty()
    || name == "."
    || name == ".."
    || name.contains('/')
    || name.contains('\\')
  {
    return Err(StoreError::InvalidKey(name.to_string()));
  }
  Ok(())
}
