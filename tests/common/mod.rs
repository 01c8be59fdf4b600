// 该文件是 Haijian （海检） 项目的一部分。
// tests/common/mod.rs - 集成测试公共设施
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

#![allow(dead_code)]

use std::{collections::BTreeMap, io::Cursor, sync::Mutex};

use haijian::{
  model::{RawDetection, RawDetections, ReplayDetector},
  store::{ObjectStore, RecordStore, StoreError},
};
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use url::Url;

pub const WIDTH: u32 = 320;
pub const HEIGHT: u32 = 240;
pub const BACKGROUND: Rgb<u8> = Rgb([128, 128, 128]);

pub fn hull_image() -> RgbImage {
  RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND)
}

pub fn png_bytes() -> Vec<u8> {
  let mut bytes = Vec::new();
  hull_image()
    .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
    .unwrap();
  bytes
}

/// 腐蚀 0.91 与杂物 0.40 两个目标
pub fn fixed_detector() -> ReplayDetector {
  ReplayDetector::new(RawDetections {
    names: BTreeMap::from([
      (0, "corrosion".to_string()),
      (1, "marine growth".to_string()),
      (2, "debris".to_string()),
    ]),
    detections: vec![
      RawDetection {
        class_index: 0,
        confidence: 0.91,
        bbox: [10.0, 10.0, 50.0, 50.0],
      },
      RawDetection {
        class_index: 2,
        confidence: 0.40,
        bbox: [60.0, 60.0, 90.0, 90.0],
      },
    ],
  })
}

pub fn empty_detector() -> ReplayDetector {
  ReplayDetector::new(RawDetections::default())
}

#[derive(Default)]
pub struct MemoryObjectStore {
  pub objects: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl ObjectStore for MemoryObjectStore {
  fn put(&self, bucket: &str, key: &str, bytes: &[u8], _: &str) -> Result<Url, StoreError> {
    self
      .objects
      .lock()
      .unwrap()
      .push((bucket.to_string(), key.to_string(), bytes.to_vec()));
    Url::parse(&format!("mem://{}/{}", bucket, key))
      .map_err(|e| StoreError::Backend(e.to_string()))
  }
}

/// 键名包含指定片段时上传失败
pub struct FailOnKey {
  pub needle: &'static str,
  pub inner: MemoryObjectStore,
}

impl FailOnKey {
  pub fn new(needle: &'static str) -> Self {
    Self {
      needle,
      inner: MemoryObjectStore::default(),
    }
  }
}

impl ObjectStore for FailOnKey {
  fn put(
    &self,
    bucket: &str,
    key: &str,
    bytes: &[u8],
    content_type: &str,
  ) -> Result<Url, StoreError> {
    if key.contains(self.needle) {
      return Err(StoreError::Backend("上传被拒绝".to_string()));
    }
    self.inner.put(bucket, key, bytes, content_type)
  }
}

pub struct FailingObjectStore;

impl ObjectStore for FailingObjectStore {
  fn put(&self, _: &str, _: &str, _: &[u8], _: &str) -> Result<Url, StoreError> {
    Err(StoreError::Backend("对象存储不可用".to_string()))
  }
}

#[derive(Default)]
pub struct MemoryRecordStore {
  pub rows: Mutex<Vec<(String, Value)>>,
}

impl MemoryRecordStore {
  pub fn rows_in(&self, table: &str) -> Vec<Value> {
    self
      .rows
      .lock()
      .unwrap()
      .iter()
      .filter(|(t, _)| t == table)
      .map(|(_, v)| v.clone())
      .collect()
  }
}

impl RecordStore for MemoryRecordStore {
  fn insert(&self, table: &str, record: &Value) -> Result<(), StoreError> {
    self
      .rows
      .lock()
      .unwrap()
      .push((table.to_string(), record.clone()));
    Ok(())
  }

  fn query(&self, table: &str, _: &str, limit: usize) -> Result<Vec<Value>, StoreError> {
    let mut rows = self.rows_in(table);
    rows.reverse();
    rows.truncate(limit);
    Ok(rows)
  }
}

pub struct FailingRecordStore;

impl RecordStore for FailingRecordStore {
  fn insert(&self, _: &str, _: &Value) -> Result<(), StoreError> {
    Err(StoreError::Backend("记录存储不可用".to_string()))
  }

  fn query(&self, _: &str, _: &str, _: usize) -> Result<Vec<Value>, StoreError> {
    Err(StoreError::Backend("记录存储不可用".to_string()))
  }
}
