//! 清单模块

use crate::error::ValidationError;
use crate::version::{self, Version};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 脚本入口所在目录
pub const SCRIPTS_DIR: &str = "scripts";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    /// 行为包
    Data,
    Interface,
    /// 资源包
    Resources,
    /// 脚本
    Script,
    SkinPack,
    WorldTemplate,
}

/// 互斥的模块兼容组，同一清单中的模块必须属于同一组
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatibilityGroup {
    Behavior,
    Resources,
    SkinPack,
    WorldTemplate,
}

impl ModuleType {
    pub fn group(self) -> CompatibilityGroup {
        match self {
            ModuleType::Data | ModuleType::Interface | ModuleType::Script => {
                CompatibilityGroup::Behavior
            }
            ModuleType::Resources => CompatibilityGroup::Resources,
            ModuleType::SkinPack => CompatibilityGroup::SkinPack,
            ModuleType::WorldTemplate => CompatibilityGroup::WorldTemplate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptLanguage {
    #[serde(rename = "javascript")]
    JavaScript,
}

impl ScriptLanguage {
    pub fn extension(self) -> &'static str {
        match self {
            ScriptLanguage::JavaScript => "js",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawModule", into = "RawModule")]
pub struct ManifestModule {
    module_type: ModuleType,
    description: Option<String>,
    uuid: Uuid,
    version: Version,
    script: Option<ScriptEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptEntry {
    pub entry: String,
    pub language: ScriptLanguage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawModule {
    #[serde(rename = "type")]
    module_type: ModuleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    uuid: Uuid,
    #[serde(with = "version::array")]
    version: Version,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    entry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<ScriptLanguage>,
}

impl ManifestModule {
    /// 非脚本模块，随机 UUID，版本 1.0.0
    pub fn new(module_type: ModuleType) -> Result<Self, ValidationError> {
        Self::from_parts(module_type, None, Uuid::new_v4(), Version::new(1, 0, 0), None, None)
    }

    /// 脚本模块，入口必须位于 `scripts/` 下且扩展名与语言一致
    pub fn new_script(entry: &str, language: ScriptLanguage) -> Result<Self, ValidationError> {
        Self::from_parts(
            ModuleType::Script,
            None,
            Uuid::new_v4(),
            Version::new(1, 0, 0),
            Some(entry.to_string()),
            Some(language),
        )
    }

    pub fn from_parts(
        module_type: ModuleType,
        description: Option<String>,
        uuid: Uuid,
        version: Version,
        entry: Option<String>,
        language: Option<ScriptLanguage>,
    ) -> Result<Self, ValidationError> {
        let script = match (module_type, entry, language) {
            (ModuleType::Script, Some(entry), Some(language)) => {
                check_entry(&entry, language)?;
                Some(ScriptEntry { entry, language })
            }
            (ModuleType::Script, None, _) => {
                return Err(ValidationError::manifest("modules.entry", "脚本模块必须指定入口"))
            }
            (ModuleType::Script, _, None) => {
                return Err(ValidationError::manifest("modules.language", "脚本模块必须指定语言"))
            }
            (_, None, None) => None,
            (other, _, _) => {
                return Err(ValidationError::manifest(
                    "modules.entry",
                    format!("{:?} 模块不能指定 entry 或 language", other),
                ))
            }
        };
        Ok(Self {
            module_type,
            description,
            uuid,
            version,
            script,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn module_type(&self) -> ModuleType {
        self.module_type
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn script(&self) -> Option<&ScriptEntry> {
        self.script.as_ref()
    }
}

fn check_entry(entry: &str, language: ScriptLanguage) -> Result<(), ValidationError> {
    let invalid = |reason: String| ValidationError::manifest("modules.entry", reason);
    let file = match entry.split_once('/') {
        Some((SCRIPTS_DIR, file)) if !file.is_empty() && !file.contains('/') => file,
        _ => return Err(invalid(format!("{} 必须直接位于 {}/ 目录下", entry, SCRIPTS_DIR))),
    };
    let extension = file.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    if extension.as_deref() != Some(language.extension()) {
        return Err(invalid(format!(
            "{} 的扩展名应为 .{}",
            entry,
            language.extension()
        )));
    }
    Ok(())
}

impl TryFrom<RawModule> for ManifestModule {
    type Error = ValidationError;

    fn try_from(raw: RawModule) -> Result<Self, Self::Error> {
        Self::from_parts(
            raw.module_type,
            raw.description,
            raw.uuid,
            raw.version,
            raw.entry,
            raw.language,
        )
    }
}

impl From<ManifestModule> for RawModule {
    fn from(module: ManifestModule) -> Self {
        let (entry, language) = match module.script {
            Some(script) => (Some(script.entry), Some(script.language)),
            None => (None, None),
        };
        Self {
            module_type: module.module_type,
            description: module.description,
            uuid: module.uuid,
            version: module.version,
            entry,
            language,
        }
    }
}
