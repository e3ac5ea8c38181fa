//! 配置文件加载与管理

use crate::calibration::FileCalibrationStore;
use crate::convert::DuplicatePolicy;
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 当前目录下的配置文件名
pub const LOCAL_CONFIG_FILE: &str = "mcsp.toml";

/// 主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 转换配置
    pub convert: ConvertConfig,
    /// 资源覆盖
    pub assets: AssetsConfig,
    /// 校准数据
    pub calibration: CalibrationConfig,
}

/// 转换配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// 临时目录的根目录，未设置时使用系统临时目录
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
    /// 文件名推导出相同标识符时的处理方式
    pub duplicate_identifiers: DuplicatePolicy,
    /// 生成文件的输出目录
    pub output_dir: PathBuf,
}

/// 资源覆盖，未设置的项使用内置资源
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pack_icon: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub world_icon: Option<PathBuf>,
    /// 世界首次加载时执行的函数
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_load_function: Option<PathBuf>,
    /// 参考 level.dat
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_template: Option<PathBuf>,
}

/// 校准数据配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// 校准数据目录
    pub dir: PathBuf,
}

// ============== 默认值 ==============

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            scratch_dir: None,
            duplicate_identifiers: DuplicatePolicy::Reject,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            dir: FileCalibrationStore::default_dir(),
        }
    }
}

// ============== 配置加载 ==============

impl Config {
    /// 从文件加载配置
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("无法读取配置 {:?}", path))?;
        let config: Config =
            toml::from_str(&content).with_context(|| format!("配置格式错误 {:?}", path))?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// 获取默认配置文件路径
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mcsp").join("config.toml"))
    }

    /// 按优先级加载配置：
    /// 1. 命令行指定的文件
    /// 2. 当前目录的 mcsp.toml
    /// 3. 用户配置目录的 config.toml
    /// 4. 默认配置
    pub fn load(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            match Self::load_from_file(path) {
                Ok(config) => {
                    info!("已加载配置: {}", path.display());
                    return config;
                }
                Err(e) => warn!("无法加载配置 {}: {:#}", path.display(), e),
            }
        }

        // 当前目录
        let local_config = Path::new(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            match Self::load_from_file(local_config) {
                Ok(config) => {
                    info!("已加载配置: {}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => warn!("{:#}", e),
            }
        }

        // 用户配置目录
        if let Some(user_config) = Self::default_config_path() {
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => {
                        info!("已加载配置: {}", user_config.display());
                        return config;
                    }
                    Err(e) => warn!("{:#}", e),
                }
            }
        }

        // 默认配置
        Self::default()
    }

    /// 生成默认配置文件内容
    pub fn default_toml() -> Result<String> {
        Ok(toml::to_string_pretty(&Self::default())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mcsp.toml");
        fs::write(
            &path,
            "[convert]\nduplicate_identifiers = \"last_wins\"\n\n[assets]\nworld_icon = \"icon.jpeg\"\n",
        )
        .unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.convert.duplicate_identifiers, DuplicatePolicy::LastWins);
        assert_eq!(config.convert.output_dir, PathBuf::from("."));
        assert_eq!(config.assets.world_icon, Some(PathBuf::from("icon.jpeg")));
        assert!(config.assets.pack_icon.is_none());
    }

    #[test]
    fn saved_default_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/config.toml");
        Config::default().save_to_file(&path).unwrap();
        let config = Config::load(Some(path.as_path()));
        assert_eq!(config.convert.duplicate_identifiers, DuplicatePolicy::Reject);
        assert_eq!(config.calibration.dir, FileCalibrationStore::default_dir());
        assert!(Config::default_toml().unwrap().contains("duplicate_identifiers = \"reject\""));
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[convert]\nduplicate_identifiers = \"sometimes\"\n").unwrap();
        assert!(Config::load_from_file(&path).is_err());
    }
}
