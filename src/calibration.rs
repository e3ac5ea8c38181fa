//! 校准数据
//!
//! level.dat 中随游戏版本变化的常量，从一份参考导出的平坦世界中提取后保存，
//! 生成世界存档时读取。

use crate::error::{ConvertError, IoContext, Result, ValidationError};
use crate::level::{FlatWorldLayers, FLAT_WORLD_LAYERS_KEY};
use crate::tag::Fields;
use crate::version::Version;
use fastnbt::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, error, info};

/// 存储中的键
pub const LEVEL_VERSIONS_KEY: &str = "LevelVersions";

pub const GENERATOR_KEY: &str = "Generator";
pub const MINIMUM_COMPATIBLE_CLIENT_VERSION_KEY: &str = "MinimumCompatibleClientVersion";
pub const WORLD_VERSION_KEY: &str = "WorldVersion";
pub const INVENTORY_VERSION_KEY: &str = "InventoryVersion";
pub const STORAGE_VERSION_KEY: &str = "StorageVersion";
pub const NETWORK_VERSION_KEY: &str = "NetworkVersion";

/// 客户端版本号的段数
const CLIENT_VERSION_LEN: usize = 5;

/// 简单的键值存储
pub trait CalibrationStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;
    fn put(&self, key: &str, value: serde_json::Value) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatWorldLayersVersions {
    pub encoding_version: i32,
    pub world_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelVersions {
    pub generator: i32,
    /// 可能超过三段，不用 `Version` 表示
    pub minimum_compatible_client_version: Vec<i32>,
    pub world_version: i32,
    pub inventory_version: Version,
    pub storage_version: i32,
    pub network_version: i32,
    pub flat_world_layers: FlatWorldLayersVersions,
}

fn positive(field: &'static str, value: i32) -> Result<(), ValidationError> {
    if value > 0 {
        Ok(())
    } else {
        Err(ValidationError::Calibration {
            field,
            reason: format!("必须为正数，实际为 {}", value),
        })
    }
}

impl LevelVersions {
    pub fn validate(&self) -> Result<(), ValidationError> {
        positive("generator", self.generator)?;
        let client = &self.minimum_compatible_client_version;
        if client.len() != CLIENT_VERSION_LEN || client.iter().any(|&v| v < 0) {
            return Err(ValidationError::Calibration {
                field: "minimum_compatible_client_version",
                reason: format!("需要 {} 个非负整数，实际为 {:?}", CLIENT_VERSION_LEN, client),
            });
        }
        positive("world_version", self.world_version)?;
        positive("storage_version", self.storage_version)?;
        positive("network_version", self.network_version)?;
        positive(
            "flat_world_layers.encoding_version",
            self.flat_world_layers.encoding_version,
        )?;
        if self.flat_world_layers.world_version.is_empty() {
            return Err(ValidationError::Calibration {
                field: "flat_world_layers.world_version",
                reason: "不能为空".to_string(),
            });
        }
        Ok(())
    }

    /// 从参考 level.dat 的根标签提取
    pub fn from_level(level: &Value) -> Result<Self, ValidationError> {
        let root = Fields::of(level, "")?;
        let layers = FlatWorldLayers::from_json(root.string(FLAT_WORLD_LAYERS_KEY)?)?;
        let versions = Self {
            generator: root.int(GENERATOR_KEY)?,
            minimum_compatible_client_version: root.int_list(MINIMUM_COMPATIBLE_CLIENT_VERSION_KEY)?,
            world_version: root.int(WORLD_VERSION_KEY)?,
            inventory_version: Version::parse(root.string(INVENTORY_VERSION_KEY)?)?,
            storage_version: root.int(STORAGE_VERSION_KEY)?,
            network_version: root.int(NETWORK_VERSION_KEY)?,
            flat_world_layers: FlatWorldLayersVersions {
                encoding_version: layers.encoding_version,
                world_version: layers.world_version,
            },
        };
        versions.validate()?;
        Ok(versions)
    }

    /// 读取并校验，缺失时记录需要人工提供参考导出
    pub fn load(store: &dyn CalibrationStore) -> Result<Self> {
        let Some(value) = store.get(LEVEL_VERSIONS_KEY)? else {
            error!(
                key = LEVEL_VERSIONS_KEY,
                "缺少校准数据，请运行 `mcsp calibrate <level.dat>` 导入一份参考平坦世界"
            );
            return Err(ConvertError::MissingCalibration {
                key: LEVEL_VERSIONS_KEY.to_string(),
            });
        };
        let versions: LevelVersions = serde_json::from_value(value)?;
        versions.validate()?;
        debug!(?versions, "已读取校准数据");
        Ok(versions)
    }

    pub fn store(&self, store: &dyn CalibrationStore) -> Result<()> {
        self.validate()?;
        store.put(LEVEL_VERSIONS_KEY, serde_json::to_value(self)?)?;
        info!(
            world_version = self.world_version,
            storage_version = self.storage_version,
            "校准数据已更新"
        );
        Ok(())
    }
}

/// 每个键一个 JSON 文件
#[derive(Debug, Clone)]
pub struct FileCalibrationStore {
    dir: PathBuf,
}

impl FileCalibrationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<数据目录>/mcsp`
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("mcsp")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl CalibrationStore for FileCalibrationStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let path = self.path_of(key);
        if !path.exists() {
            return Ok(None);
        }
        let content =
            fs::read_to_string(&path).io_context(format!("无法读取校准数据 {:?}", path))?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn put(&self, key: &str, value: serde_json::Value) -> Result<()> {
        fs::create_dir_all(&self.dir).io_context(format!("无法创建目录 {:?}", self.dir))?;
        let path = self.path_of(key);
        let content = serde_json::to_string_pretty(&value)?;
        fs::write(&path, content).io_context(format!("无法写入校准数据 {:?}", path))
    }
}

/// 仅存在于内存中的存储
#[derive(Debug, Default)]
pub struct MemoryCalibrationStore {
    entries: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryCalibrationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CalibrationStore for MemoryCalibrationStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value);
        Ok(())
    }
}
