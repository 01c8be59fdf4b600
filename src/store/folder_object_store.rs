// 该文件是 Haijian （海检） 项目的一部分。
// src/store/folder_object_store.rs - 目录对象存储
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

use tracing::debug;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  store::{ObjectStore, StoreError, check_segment},
};

/// 以本地目录模拟对象存储，文件保存为 `<root>/<bucket>/<key>`
#[derive(Debug, Clone)]
pub struct FolderObjectStore {
  root: PathBuf,
}

impl FromUrlWithScheme for FolderObjectStore {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for FolderObjectStore {
  type Error = StoreError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(StoreError::SchemeMismatch(url.scheme().to_string()));
    }
    Ok(Self::new(url.path()))
  }
}

impl FolderObjectStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }
}

impl ObjectStore for FolderObjectStore {
  fn put(
    &self,
    bucket: &str,
    key: &str,
    bytes: &[u8],
    content_type: &str,
  ) -> Result<Url, StoreError> {
    check_segment(bucket)?;
    check_segment(key)?;

    let directory = self.root.join(bucket);
    if !directory.exists() {
      std::fs::create_dir_all(&directory)?;
    }
    let path = directory.join(key);
    std::fs::write(&path, bytes)?;
    debug!(
      "写入对象 {} ({}, {} 字节)",
      path.display(),
      content_type,
      bytes.len()
    );

    let absolute = std::path::absolute(&path)?;
    Url::from_file_path(&absolute)
      .map_err(|_| StoreError::InvalidKey(absolute.display().to_string()))
  }
}
