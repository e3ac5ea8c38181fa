//! 包清单 `manifest.json`
//!
//! `Manifest` 只能通过 `ManifestBuilder::build` 或 `Manifest::from_json` 得到，
//! 两者走同一套校验。头部类型不写入 JSON，由模块类型推断。

mod dependency;
mod header;
mod metadata;
mod module;
mod subpack;

pub use dependency::{DependencyTarget, ManifestDependency};
pub use header::{HeaderFields, HeaderKind, ManifestHeader, PackScope, LOWEST_GAME_VERSION};
pub use metadata::ManifestMetadata;
pub use module::{CompatibilityGroup, ManifestModule, ModuleType, ScriptEntry, ScriptLanguage};
pub use subpack::ManifestSubpack;

use crate::error::{Result, ValidationError};
use serde::{Deserialize, Serialize};

/// 唯一支持的清单格式版本
pub const FORMAT_VERSION: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestCapability {
    Chemistry,
    Raytraced,
    ScriptEval,
    #[serde(rename = "editorExtension")]
    EditorExtension,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawManifest", into = "RawManifest")]
pub struct Manifest {
    header: ManifestHeader,
    modules: Vec<ManifestModule>,
    dependencies: Vec<ManifestDependency>,
    capabilities: Vec<ManifestCapability>,
    metadata: ManifestMetadata,
    subpacks: Vec<ManifestSubpack>,
}

#[derive(Serialize, Deserialize)]
struct RawManifest {
    format_version: i64,
    header: HeaderFields,
    modules: Vec<ManifestModule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    dependencies: Vec<ManifestDependency>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    capabilities: Vec<ManifestCapability>,
    #[serde(default)]
    metadata: ManifestMetadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    subpacks: Vec<ManifestSubpack>,
}

pub struct ManifestBuilder {
    format_version: i64,
    header: HeaderFields,
    modules: Vec<ManifestModule>,
    dependencies: Vec<ManifestDependency>,
    capabilities: Vec<ManifestCapability>,
    metadata: ManifestMetadata,
    subpacks: Vec<ManifestSubpack>,
}

impl ManifestBuilder {
    pub fn format_version(mut self, version: i64) -> Self {
        self.format_version = version;
        self
    }

    pub fn module(mut self, module: ManifestModule) -> Self {
        self.modules.push(module);
        self
    }

    pub fn dependency(mut self, dependency: ManifestDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// 能力是集合，重复添加只保留一次
    pub fn capability(mut self, capability: ManifestCapability) -> Self {
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    pub fn metadata(mut self, metadata: ManifestMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn subpack(mut self, subpack: ManifestSubpack) -> Self {
        self.subpacks.push(subpack);
        self
    }

    pub fn build(self) -> Result<Manifest, ValidationError> {
        if self.format_version != FORMAT_VERSION {
            return Err(ValidationError::UnsupportedFormatVersion(self.format_version));
        }
        let first = self
            .modules
            .first()
            .ok_or_else(|| ValidationError::manifest("modules", "至少需要一个模块"))?
            .module_type();
        if let Some(other) = self
            .modules
            .iter()
            .map(ManifestModule::module_type)
            .find(|t| t.group() != first.group())
        {
            return Err(ValidationError::manifest(
                "modules",
                format!("模块类型 {:?} 与 {:?} 不兼容", first, other),
            ));
        }

        let header = ManifestHeader::new(first, self.header)?;
        match first.group() {
            CompatibilityGroup::Resources => {}
            CompatibilityGroup::Behavior => forbid_subpacks(&self.subpacks)?,
            CompatibilityGroup::SkinPack | CompatibilityGroup::WorldTemplate => {
                if !self.dependencies.is_empty() {
                    return Err(ValidationError::manifest(
                        "dependencies",
                        format!("{:?} 包不允许依赖", first),
                    ));
                }
                if !self.capabilities.is_empty() {
                    return Err(ValidationError::manifest(
                        "capabilities",
                        format!("{:?} 包不允许声明能力", first),
                    ));
                }
                forbid_subpacks(&self.subpacks)?;
            }
        }
        if self.subpacks.len() == 1 {
            return Err(ValidationError::manifest(
                "subpacks",
                "子包数量不能恰好为 1",
            ));
        }

        Ok(Manifest {
            header,
            modules: self.modules,
            dependencies: self.dependencies,
            capabilities: self.capabilities,
            metadata: self.metadata,
            subpacks: self.subpacks,
        })
    }
}

fn forbid_subpacks(subpacks: &[ManifestSubpack]) -> Result<(), ValidationError> {
    if subpacks.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::manifest(
            "subpacks",
            "该包类型不允许子包",
        ))
    }
}

impl Manifest {
    pub fn builder(header: HeaderFields) -> ManifestBuilder {
        ManifestBuilder {
            format_version: FORMAT_VERSION,
            header,
            modules: Vec::new(),
            dependencies: Vec::new(),
            capabilities: Vec::new(),
            metadata: ManifestMetadata::default(),
            subpacks: Vec::new(),
        }
    }

    pub fn header(&self) -> &ManifestHeader {
        &self.header
    }

    pub fn modules(&self) -> &[ManifestModule] {
        &self.modules
    }

    pub fn dependencies(&self) -> &[ManifestDependency] {
        &self.dependencies
    }

    pub fn capabilities(&self) -> &[ManifestCapability] {
        &self.capabilities
    }

    pub fn metadata(&self) -> &ManifestMetadata {
        &self.metadata
    }

    pub fn subpacks(&self) -> &[ManifestSubpack] {
        &self.subpacks
    }

    /// 替换头部，头部类型保持不变并重新校验
    pub fn with_header(self, fields: HeaderFields) -> Result<Self, ValidationError> {
        let header = ManifestHeader::new(self.header.module_type(), fields)?;
        Ok(Self { header, ..self })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl TryFrom<RawManifest> for Manifest {
    type Error = ValidationError;

    fn try_from(raw: RawManifest) -> Result<Self, Self::Error> {
        let mut builder = Manifest::builder(raw.header)
            .format_version(raw.format_version)
            .metadata(raw.metadata);
        builder.modules = raw.modules;
        builder.dependencies = raw.dependencies;
        for capability in raw.capabilities {
            builder = builder.capability(capability);
        }
        builder.subpacks = raw.subpacks;
        builder.build()
    }
}

impl From<Manifest> for RawManifest {
    fn from(manifest: Manifest) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            header: manifest.header.into(),
            modules: manifest.modules,
            dependencies: manifest.dependencies,
            capabilities: manifest.capabilities,
            metadata: manifest.metadata,
            subpacks: manifest.subpacks,
        }
    }
}
