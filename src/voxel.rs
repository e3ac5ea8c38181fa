//! 方块与方块层

use crate::error::ValidationError;
use crate::tag::Compound;
use crate::version::Version;
use once_cell::sync::Lazy;
use regex::Regex;

static BLOCK_VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d+\.){3}\d+$").expect("方块版本正则表达式无效"));

/// 方块状态
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    name: String,
    states: Compound,
    version: String,
    block_entity_data: Option<Compound>,
    tick_delay: Option<i32>,
}

impl Block {
    pub fn new(
        name: impl Into<String>,
        states: Compound,
        version: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let version = version.into();
        if name.trim().is_empty() {
            return Err(ValidationError::Block {
                field: "name",
                value: name,
            });
        }
        if !BLOCK_VERSION_PATTERN.is_match(&version) {
            return Err(ValidationError::Block {
                field: "version",
                value: version,
            });
        }
        Ok(Self {
            name,
            states,
            version,
            block_entity_data: None,
            tick_delay: None,
        })
    }

    /// 调色板中的版本号是 32 位整数，按大端序拆成 4 个无符号字节
    pub fn from_packed_version(
        name: impl Into<String>,
        states: Compound,
        packed: i32,
    ) -> Result<Self, ValidationError> {
        Self::new(name, states, unpack_version(packed))
    }

    /// 带位置附加数据的副本
    pub fn with_position_data(
        &self,
        block_entity_data: Option<Compound>,
        tick_delay: Option<i32>,
    ) -> Result<Self, ValidationError> {
        if matches!(&block_entity_data, Some(data) if data.is_empty()) {
            return Err(ValidationError::Block {
                field: "block_entity_data",
                value: "{}".to_string(),
            });
        }
        if let Some(delay) = tick_delay.filter(|&d| d <= 0) {
            return Err(ValidationError::Block {
                field: "tick_delay",
                value: delay.to_string(),
            });
        }
        Ok(Self {
            block_entity_data,
            tick_delay,
            ..self.clone()
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn states(&self) -> &Compound {
        &self.states
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn block_entity_data(&self) -> Option<&Compound> {
        self.block_entity_data.as_ref()
    }

    pub fn tick_delay(&self) -> Option<i32> {
        self.tick_delay
    }

    /// 所需的最低引擎版本（方块版本的前三段）
    pub fn engine_version(&self) -> Result<Version, ValidationError> {
        Version::truncate(&self.version)
    }
}

pub fn unpack_version(packed: i32) -> String {
    packed
        .to_be_bytes()
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// 结构内方块表的下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockRef(pub(crate) u32);

impl BlockRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// 单个格子的主层与次层（如含水方块的水），`None` 表示空
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Layers {
    pub primary: Option<BlockRef>,
    pub secondary: Option<BlockRef>,
}

impl Layers {
    pub const VOID: Layers = Layers {
        primary: None,
        secondary: None,
    };

    pub fn is_void(&self) -> bool {
        self.primary.is_none() && self.secondary.is_none()
    }

    pub fn iter(&self) -> impl Iterator<Item = BlockRef> {
        self.primary.into_iter().chain(self.secondary)
    }
}
