//! 转换上下文
//!
//! 组装器需要的资源、归档器与校准存储都从这里传入，不使用全局状态

use crate::archive::{Archiver, ZipArchiver};
use crate::assets::Assets;
use crate::calibration::{CalibrationStore, FileCalibrationStore};
use crate::config::Config;
use crate::convert::DuplicatePolicy;
use crate::error::{IoContext, Result};
use crate::version::Version;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// 写入清单与说明的生成工具信息
#[derive(Debug, Clone, PartialEq)]
pub struct Generator {
    pub name: String,
    pub version: Version,
}

impl Generator {
    pub fn current() -> Result<Self> {
        Ok(Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: Version::parse(env!("CARGO_PKG_VERSION"))?,
        })
    }
}

pub struct Context {
    pub assets: Assets,
    pub archiver: Box<dyn Archiver>,
    pub calibration: Arc<dyn CalibrationStore>,
    pub scratch_root: Option<PathBuf>,
    pub generator: Generator,
    pub duplicates: DuplicatePolicy,
}

impl Context {
    /// 内置资源、zip 归档、系统临时目录
    pub fn new(calibration: Arc<dyn CalibrationStore>) -> Result<Self> {
        Ok(Self {
            assets: Assets::bundled(),
            archiver: Box::new(ZipArchiver),
            calibration,
            scratch_root: None,
            generator: Generator::current()?,
            duplicates: DuplicatePolicy::default(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let calibration = Arc::new(FileCalibrationStore::new(&config.calibration.dir));
        let mut context = Self::new(calibration)?;
        context.assets = Assets::from_config(&config.assets)?;
        context.scratch_root = config.convert.scratch_dir.clone();
        context.duplicates = config.convert.duplicate_identifiers;
        Ok(context)
    }

    pub fn with_duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// 新建一个唯一命名的临时目录，离开作用域时递归删除
    pub fn scratch_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("mcsp-");
        match &self.scratch_root {
            Some(root) => {
                std::fs::create_dir_all(root)
                    .io_context(format!("无法创建临时目录根 {:?}", root))?;
                builder
                    .tempdir_in(root)
                    .io_context(format!("无法在 {:?} 中创建临时目录", root))
            }
            None => builder.tempdir().io_context("无法创建临时目录"),
        }
    }
}
