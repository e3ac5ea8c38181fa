use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// 子包，按内存档位切换的资源变体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSubpack", into = "RawSubpack")]
pub struct ManifestSubpack {
    folder_name: String,
    name: String,
    memory_tier: Option<i32>,
}

#[derive(Serialize, Deserialize)]
struct RawSubpack {
    folder_name: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    memory_tier: Option<i32>,
}

impl ManifestSubpack {
    pub fn new(
        folder_name: impl Into<String>,
        name: impl Into<String>,
        memory_tier: Option<i32>,
    ) -> Result<Self, ValidationError> {
        let folder_name = folder_name.into();
        let name = name.into();
        // 只允许单级目录名
        let single = !folder_name.is_empty()
            && !folder_name.contains(['/', '\\'])
            && folder_name != "."
            && folder_name != "..";
        if !single {
            return Err(ValidationError::manifest(
                "subpacks.folder_name",
                format!("{:?} 不是单级目录名", folder_name),
            ));
        }
        if name.trim().is_empty() {
            return Err(ValidationError::manifest("subpacks.name", "名称不能为空"));
        }
        if let Some(tier) = memory_tier.filter(|&t| t < 0) {
            return Err(ValidationError::manifest(
                "subpacks.memory_tier",
                format!("不能为负数: {}", tier),
            ));
        }
        Ok(Self {
            folder_name,
            name,
            memory_tier,
        })
    }

    pub fn folder_name(&self) -> &str {
        &self.folder_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn memory_tier(&self) -> Option<i32> {
        self.memory_tier
    }
}

impl TryFrom<RawSubpack> for ManifestSubpack {
    type Error = ValidationError;

    fn try_from(raw: RawSubpack) -> Result<Self, Self::Error> {
        Self::new(raw.folder_name, raw.name, raw.memory_tier)
    }
}

impl From<ManifestSubpack> for RawSubpack {
    fn from(subpack: ManifestSubpack) -> Self {
        Self {
            folder_name: subpack.folder_name,
            name: subpack.name,
            memory_tier: subpack.memory_tier,
        }
    }
}
