use super::module::ManifestModule;
use super::Manifest;
use crate::error::ValidationError;
use crate::version::{self, Version};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 依赖目标：按 UUID 引用另一个包，或按名称引用内置模块
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DependencyTarget {
    Uuid(Uuid),
    Module(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDependency", into = "RawDependency")]
pub struct ManifestDependency {
    target: DependencyTarget,
    version: Version,
}

#[derive(Serialize, Deserialize)]
struct RawDependency {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uuid: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    module_name: Option<String>,
    #[serde(with = "version::array")]
    version: Version,
}

impl ManifestDependency {
    pub fn new(target: DependencyTarget, version: Version) -> Result<Self, ValidationError> {
        if let DependencyTarget::Module(name) = &target {
            if name.trim().is_empty() {
                return Err(ValidationError::manifest(
                    "dependencies.module_name",
                    "模块名不能为空",
                ));
            }
        }
        Ok(Self { target, version })
    }

    pub fn from_module(module: &ManifestModule) -> Self {
        Self {
            target: DependencyTarget::Uuid(module.uuid()),
            version: module.version().clone(),
        }
    }

    /// 依赖清单中的每个模块
    pub fn from_manifest(manifest: &Manifest) -> Vec<Self> {
        manifest.modules().iter().map(Self::from_module).collect()
    }

    pub fn target(&self) -> &DependencyTarget {
        &self.target
    }

    pub fn version(&self) -> &Version {
        &self.version
    }
}

impl TryFrom<RawDependency> for ManifestDependency {
    type Error = ValidationError;

    fn try_from(raw: RawDependency) -> Result<Self, Self::Error> {
        let target = match (raw.uuid, raw.module_name) {
            (Some(uuid), None) => DependencyTarget::Uuid(uuid),
            (None, Some(name)) => DependencyTarget::Module(name),
            (Some(_), Some(_)) => {
                return Err(ValidationError::manifest(
                    "dependencies",
                    "uuid 与 module_name 只能指定其一",
                ))
            }
            (None, None) => {
                return Err(ValidationError::manifest(
                    "dependencies",
                    "必须指定 uuid 或 module_name",
                ))
            }
        };
        Self::new(target, raw.version)
    }
}

impl From<ManifestDependency> for RawDependency {
    fn from(dependency: ManifestDependency) -> Self {
        let (uuid, module_name) = match dependency.target {
            DependencyTarget::Uuid(uuid) => (Some(uuid), None),
            DependencyTarget::Module(name) => (None, Some(name)),
        };
        Self {
            uuid,
            module_name,
            version: dependency.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ModuleType;
    use serde_json::json;

    #[test]
    fn exactly_one_target() {
        let both = json!({
            "uuid": "6f0e0d2b-0c52-4b53-9d3b-3c1f1bbd1c2a",
            "module_name": "@minecraft/server",
            "version": [1, 0, 0]
        });
        assert!(serde_json::from_value::<ManifestDependency>(both).is_err());

        let neither = json!({ "version": [1, 0, 0] });
        assert!(serde_json::from_value::<ManifestDependency>(neither).is_err());

        let blank = json!({ "module_name": " ", "version": "1.0.0-beta" });
        assert!(serde_json::from_value::<ManifestDependency>(blank).is_err());

        let named = json!({ "module_name": "@minecraft/server", "version": "1.8.0-beta" });
        let dependency: ManifestDependency = serde_json::from_value(named.clone()).unwrap();
        assert_eq!(
            dependency.target(),
            &DependencyTarget::Module("@minecraft/server".into())
        );
        assert_eq!(serde_json::to_value(&dependency).unwrap(), named);
    }

    #[test]
    fn from_module_uses_uuid() {
        let module = ManifestModule::new(ModuleType::Data).unwrap();
        let dependency = ManifestDependency::from_module(&module);
        assert_eq!(dependency.target(), &DependencyTarget::Uuid(module.uuid()));
        assert_eq!(dependency.version(), module.version());
    }
}
