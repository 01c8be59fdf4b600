// 该文件是 Haijian （海检） 项目的一部分。
// src/persist.rs - 尽力而为的结果持久化
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

//! 原图、标注图与检测记录的持久化。
//!
//! 每一次写入都各自返回 `Result`，失败只记录日志并在结果里表现为
//! `None` / `false`，不会影响已经生成的检测响应。

use std::{
  sync::Arc,
  thread::{self, JoinHandle},
};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use crate::{
  record::{InspectionRecord, RecordDraft},
  store::{ObjectStore, RecordStore, StoreError},
};

pub const DEFAULT_BUCKET: &str = "image_bucket";
pub const INSPECTIONS_TABLE: &str = "inspections";
pub const DEFAULT_LISTING_LIMIT: usize = 20;

/// 一次请求需要持久化的内容
#[derive(Debug, Clone)]
pub struct PersistJob {
  pub draft: RecordDraft,
  pub original: Vec<u8>,
  pub original_content_type: String,
  pub annotated: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersistOutcome {
  pub record: InspectionRecord,
  pub record_saved: bool,
}

impl PersistOutcome {
  pub fn image_url(&self) -> Option<&Url> {
    self.record.image_url.as_ref()
  }

  pub fn annotated_image_url(&self) -> Option<&Url> {
    self.record.annotated_image_url.as_ref()
  }
}

/// 后台持久化任务的句柄，丢弃即分离
pub struct PendingPersistence {
  handle: Option<JoinHandle<PersistOutcome>>,
}

impl PendingPersistence {
  /// 等待持久化结束；线程异常或未能启动时返回 `None`
  pub fn wait(mut self) -> Option<PersistOutcome> {
    let handle = self.handle.take()?;
    match handle.join() {
      Ok(outcome) => Some(outcome),
      Err(_) => {
        error!("持久化线程异常退出");
        None
      }
    }
  }
}

/// 最近检测记录的查询结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct InspectionListing {
  pub inspections: Vec<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

#[derive(Clone)]
pub struct Persistence {
  objects: Option<Arc<dyn ObjectStore>>,
  records: Option<Arc<dyn RecordStore>>,
  bucket: String,
  table: String,
}

impl Default for Persistence {
  fn default() -> Self {
    Self {
      objects: None,
      records: None,
      bucket: DEFAULT_BUCKET.to_string(),
      table: INSPECTIONS_TABLE.to_string(),
    }
  }
}

impl Persistence {
  pub fn with_object_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
    self.objects = Some(store);
    self
  }

  pub fn with_record_store(mut self, store: Arc<dyn RecordStore>) -> Self {
    self.records = Some(store);
    self
  }

  pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
    self.bucket = bucket.into();
    self
  }

  pub fn with_table(mut self, table: impl Into<String>) -> Self {
    self.table = table.into();
    self
  }

  pub fn has_record_store(&self) -> bool {
    self.records.is_some()
  }

  /// 上传一个对象，键名加随机前缀避免冲突
  pub fn upload(&self, name: &str, bytes: &[u8], content_type: &str) -> Result<Url, StoreError> {
    let store = self.objects.as_ref().ok_or(StoreError::NotConfigured)?;
    let key = format!("{}_{}", Uuid::new_v4(), name);
    store.put(&self.bucket, &key, bytes, content_type)
  }

  pub fn save_record(&self, record: &InspectionRecord) -> Result<(), StoreError> {
    let store = self.records.as_ref().ok_or(StoreError::NotConfigured)?;
    let value = serde_json::to_value(record)?;
    store.insert(&self.table, &value)
  }

  /// 执行一次完整的持久化；两次上传并行，记录在两者结束后写入
  pub fn persist(&self, job: PersistJob) -> PersistOutcome {
    let PersistJob {
      draft,
      original,
      original_content_type,
      annotated,
    } = job;
    let id = draft.inspection_id;
    let original_name = format!("original_{}.jpg", id);
    let annotated_name = format!("annotated_{}.jpg", id);

    let (image_url, annotated_image_url) = thread::scope(|s| {
      let original_upload =
        s.spawn(|| self.upload(&original_name, &original, &original_content_type));
      let annotated_url = settle(
        &annotated_name,
        self.upload(&annotated_name, &annotated, "image/jpeg"),
      );
      let original_url = match original_upload.join() {
        Ok(result) => settle(&original_name, result),
        Err(_) => {
          error!("上传线程异常退出: {}", original_name);
          None
        }
      };
      (original_url, annotated_url)
    });

    let record = draft.complete(image_url, annotated_image_url);
    let record_saved = match self.save_record(&record) {
      Ok(()) => {
        info!("检测记录已保存: {}", record.inspection_id);
        true
      }
      Err(StoreError::NotConfigured) => {
        debug!("未配置记录存储, 跳过保存 {}", record.inspection_id);
        false
      }
      Err(e) => {
        error!("检测记录保存失败 {}: {}", record.inspection_id, e);
        false
      }
    };

    PersistOutcome {
      record,
      record_saved,
    }
  }

  /// 在后台线程中持久化，不阻塞调用方
  pub fn spawn(&self, job: PersistJob) -> PendingPersistence {
    let this = self.clone();
    let handle = thread::Builder::new()
      .name(format!("persist-{}", job.draft.inspection_id))
      .spawn(move || this.persist(job));

    match handle {
      Ok(handle) => PendingPersistence {
        handle: Some(handle),
      },
      Err(e) => {
        error!("无法启动持久化线程: {}", e);
        PendingPersistence { handle: None }
      }
    }
  }

  /// 按创建时间倒序列出最近的检测记录
  pub fn recent_inspections(&self, limit: usize) -> InspectionListing {
    let Some(store) = self.records.as_ref() else {
      return InspectionListing {
        inspections: Vec::new(),
        error: Some("记录存储未配置".to_string()),
      };
    };

    match store.query(&self.table, "created_at", limit) {
      Ok(inspections) => InspectionListing {
        inspections,
        error: None,
      },
      Err(e) => {
        warn!("查询检测记录失败: {}", e);
        InspectionListing {
          inspections: Vec::new(),
          error: Some(e.to_string()),
        }
      }
    }
  }
}

fn settle(name: &str, result: Result<Url, StoreError>) -> Option<Url> {
  match result {
    Ok(url) => {
      debug!("上传完成 {}: {}", name, url);
      Some(url)
    }
    Err(StoreError::NotConfigured) => None,
    Err(e) => {
      error!("上传失败 {}: {}", name, e);
      None
    }
  }
}
