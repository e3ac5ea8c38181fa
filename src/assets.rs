//! 内置资源：图标、启动函数与 level.dat 模板

use crate::config::AssetsConfig;
use crate::error::{IoContext, Result};
use crate::level;
use crate::nbt_le;
use fastnbt::Value;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_PACK_ICON: &[u8] = include_bytes!("../assets/default_pack_icon.png");
const DEFAULT_WORLD_ICON: &[u8] = include_bytes!("../assets/default_world_icon.jpeg");
const FIRST_LOAD_FUNCTION: &str = include_str!("../assets/first_load_function.mcfunction");

/// 图标来源
#[derive(Debug, Clone, PartialEq)]
pub enum Icon {
    Bundled(&'static [u8]),
    File(PathBuf),
}

impl Icon {
    pub fn write_to(&self, target: &Path) -> Result<()> {
        match self {
            Icon::Bundled(bytes) => {
                fs::write(target, bytes).io_context(format!("无法写入图标 {:?}", target))
            }
            Icon::File(source) => fs::copy(source, target)
                .map(|_| ())
                .io_context(format!("无法复制图标 {:?} -> {:?}", source, target)),
        }
    }
}

/// 生成包与世界时使用的只读资源
#[derive(Debug, Clone)]
pub struct Assets {
    pub pack_icon: Icon,
    pub world_icon: Icon,
    pub first_load_function: String,
    pub level_template: Value,
}

impl Assets {
    pub fn bundled() -> Self {
        Self {
            pack_icon: Icon::Bundled(DEFAULT_PACK_ICON),
            world_icon: Icon::Bundled(DEFAULT_WORLD_ICON),
            first_load_function: FIRST_LOAD_FUNCTION.to_string(),
            level_template: level::default_template(),
        }
    }

    /// 配置中指定的文件覆盖内置资源
    pub fn from_config(config: &AssetsConfig) -> Result<Self> {
        let mut assets = Self::bundled();
        if let Some(path) = &config.pack_icon {
            assets.pack_icon = Icon::File(path.clone());
        }
        if let Some(path) = &config.world_icon {
            assets.world_icon = Icon::File(path.clone());
        }
        if let Some(path) = &config.first_load_function {
            assets.first_load_function =
                fs::read_to_string(path).io_context(format!("无法读取启动函数 {:?}", path))?;
        }
        if let Some(path) = &config.level_template {
            let data = fs::read(path).io_context(format!("无法读取 level.dat 模板 {:?}", path))?;
            let (_, template) = nbt_le::read_level_dat(&data)?;
            assets.level_template = template;
        }
        Ok(assets)
    }
}

impl Default for Assets {
    fn default() -> Self {
        Self::bundled()
    }
}
