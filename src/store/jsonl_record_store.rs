// 该文件是 Haijian （海检） 项目的一部分。
// src/store/jsonl_record_store.rs - JSON Lines 记录存储
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

use std::{
  cmp::Ordering,
  fs::OpenOptions,
  io::{BufRead, BufReader, Write},
  path::PathBuf,
  sync::{Arc, Mutex},
};

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  store::{RecordStore, StoreError, check_segment},
};

const CREATED_AT: &str = "created_at";

/// 每张表一个 `<dir>/<table>.jsonl` 文件，一行一条记录
#[derive(Debug, Clone)]
pub struct JsonlRecordStore {
  directory: PathBuf,
  write_lock: Arc<Mutex<()>>,
}

impl FromUrlWithScheme for JsonlRecordStore {
  const SCHEME: &'static str = "jsonl";
}

impl FromUrl for JsonlRecordStore {
  type Error = StoreError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(StoreError::SchemeMismatch(url.scheme().to_string()));
    }
    Ok(Self::new(url.path()))
  }
}

impl JsonlRecordStore {
  pub fn new(directory: impl Into<PathBuf>) -> Self {
    Self {
      directory: directory.into(),
      write_lock: Arc::new(Mutex::new(())),
    }
  }

  fn table_path(&self, table: &str) -> Result<PathBuf, StoreError> {
    check_segment(table)?;
    Ok(self.directory.join(format!("{}.jsonl", table)))
  }
}

impl RecordStore for JsonlRecordStore {
  fn insert(&self, table: &str, record: &Value) -> Result<(), StoreError> {
    let Value::Object(fields) = record else {
      return Err(StoreError::InvalidRecord("记录必须是 JSON 对象".to_string()));
    };
    let mut fields = fields.clone();
    fields
      .entry(CREATED_AT)
      .or_insert_with(|| Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)));
    let line = serde_json::to_string(&Value::Object(fields))?;

    let path = self.table_path(table)?;
    let _guard = self
      .write_lock
      .lock()
      .map_err(|_| StoreError::Backend("写锁已损坏".to_string()))?;
    if !self.directory.exists() {
      std::fs::create_dir_all(&self.directory)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    writeln!(file, "{}", line)?;
    debug!("写入记录到 {}", path.display());
    Ok(())
  }

  fn query(&self, table: &str, order_by: &str, limit: usize) -> Result<Vec<Value>, StoreError> {
    let path = self.table_path(table)?;
    if !path.exists() {
      return Ok(Vec::new());
    }

    let reader = BufReader::new(std::fs::File::open(&path)?);
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
      let line = line?;
      if line.trim().is_empty() {
        continue;
      }
      match serde_json::from_str::<Value>(&line) {
        Ok(value) => records.push(value),
        Err(e) => warn!("跳过第 {} 行损坏的记录: {}", index + 1, e),
      }
    }

    // 相同排序键时后写入的在前
    records.reverse();
    records.sort_by(|a, b| compare_desc(a.get(order_by), b.get(order_by)));
    records.truncate(limit);
    Ok(records)
  }
}

/// 降序比较，缺少字段的记录排在最后
fn compare_desc(a: Option<&Value>, b: Option<&Value>) -> Ordering {
  match (a, b) {
    (Some(Value::Number(x)), Some(Value::Number(y))) => {
      let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
      y.partial_cmp(&x).unwrap_or(Ordering::Equal)
    }
    (Some(Value::String(x)), Some(Value::String(y))) => y.cmp(x),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    _ => Ordering::Equal,
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn insert_stamps_created_at_and_appends() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonlRecordStore::new(dir.path());
    store.insert("inspections", &json!({"inspection_id": "a"})).unwrap();
    store.insert("inspections", &json!({"inspection_id": "b"})).unwrap();

    let text = std::fs::read_to_string(dir.path().join("inspections.jsonl")).unwrap();
    assert_eq!(text.lines().count(), 2);
    let first: Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
    assert!(first[CREATED_AT].is_string());
  }

  #[test]
  fn query_orders_descending_and_limits() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonlRecordStore::new(dir.path());
    for (id, at) in [("a", "2026-01-01"), ("c", "2026-03-01"), ("b", "2026-02-01")] {
      store
        .insert("inspections", &json!({"inspection_id": id, "created_at": at}))
        .unwrap();
    }

    let records = store.query("inspections", "created_at", 2).unwrap();
    let ids: Vec<_> = records
      .iter()
      .map(|r| r["inspection_id"].as_str().unwrap())
      .collect();
    assert_eq!(ids, ["c", "b"]);
  }

  #[test]
  fn missing_table_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonlRecordStore::new(dir.path());
    assert!(store.query("inspections", "created_at", 20).unwrap().is_empty());
  }

  #[test]
  fn rejects_non_object_records() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonlRecordStore::new(dir.path());
    assert!(matches!(
      store.insert("inspections", &json!([1, 2])),
      Err(StoreError::InvalidRecord(_))
    ));
  }
}
