//! 清单头
//!
//! 头部字段是否允许出现取决于包类型，`ManifestHeader::new` 是唯一的校验入口

use super::module::ModuleType;
use crate::error::ValidationError;
use crate::version::{self, Version};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 行为包与世界模板允许的最低游戏版本
pub const LOWEST_GAME_VERSION: Version = Version::new(1, 13, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackScope {
    Global,
    World,
}

/// 未校验的头部字段，也是 `header` 段的 JSON 形式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderFields {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub uuid: Uuid,
    #[serde(with = "version::array")]
    pub version: Version,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "version::array::option"
    )]
    pub min_engine_version: Option<Version>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack_scope: Option<PackScope>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "version::array::option"
    )]
    pub base_game_version: Option<Version>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_template_options: Option<bool>,
}

impl HeaderFields {
    /// 随机 UUID，版本 1.0.0，其余字段为空
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            uuid: Uuid::new_v4(),
            version: Version::new(1, 0, 0),
            min_engine_version: None,
            platform_locked: None,
            pack_scope: None,
            base_game_version: None,
            lock_template_options: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_min_engine_version(mut self, version: Version) -> Self {
        self.min_engine_version = Some(version);
        self
    }

    pub fn with_base_game_version(mut self, version: Version) -> Self {
        self.base_game_version = Some(version);
        self
    }

    pub fn with_lock_template_options(mut self, lock: bool) -> Self {
        self.lock_template_options = Some(lock);
        self
    }

    pub fn with_pack_scope(mut self, scope: PackScope) -> Self {
        self.pack_scope = Some(scope);
        self
    }

    pub fn with_platform_locked(mut self, locked: bool) -> Self {
        self.platform_locked = Some(locked);
        self
    }
}

/// 按包类型区分的头部字段
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderKind {
    /// DATA / INTERFACE / SCRIPT
    Behavior {
        module_type: ModuleType,
        min_engine_version: Version,
        platform_locked: Option<bool>,
    },
    Resources {
        min_engine_version: Version,
        platform_locked: Option<bool>,
        pack_scope: Option<PackScope>,
    },
    SkinPack,
    WorldTemplate {
        base_game_version: Version,
        lock_template_options: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "HeaderFields")]
pub struct ManifestHeader {
    name: String,
    description: Option<String>,
    uuid: Uuid,
    version: Version,
    kind: HeaderKind,
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::manifest(field, "必须指定"))
}

fn absent<T>(value: &Option<T>, field: &'static str) -> Result<(), ValidationError> {
    match value {
        Some(_) => Err(ValidationError::manifest(field, "该包类型不允许此字段")),
        None => Ok(()),
    }
}

fn at_least_floor(version: Version, field: &'static str) -> Result<Version, ValidationError> {
    if version < LOWEST_GAME_VERSION {
        return Err(ValidationError::manifest(
            field,
            format!("{} 低于最低版本 {}", version, LOWEST_GAME_VERSION),
        ));
    }
    Ok(version)
}

impl ManifestHeader {
    pub fn new(module_type: ModuleType, fields: HeaderFields) -> Result<Self, ValidationError> {
        if fields.name.trim().is_empty() {
            return Err(ValidationError::manifest("header.name", "名称不能为空"));
        }
        let kind = match module_type {
            ModuleType::Resources => {
                absent(&fields.base_game_version, "header.base_game_version")?;
                absent(&fields.lock_template_options, "header.lock_template_options")?;
                HeaderKind::Resources {
                    min_engine_version: required(
                        fields.min_engine_version,
                        "header.min_engine_version",
                    )?,
                    platform_locked: fields.platform_locked,
                    pack_scope: fields.pack_scope,
                }
            }
            ModuleType::Data | ModuleType::Interface | ModuleType::Script => {
                absent(&fields.pack_scope, "header.pack_scope")?;
                absent(&fields.base_game_version, "header.base_game_version")?;
                absent(&fields.lock_template_options, "header.lock_template_options")?;
                let min_engine_version =
                    required(fields.min_engine_version, "header.min_engine_version")?;
                HeaderKind::Behavior {
                    module_type,
                    min_engine_version: at_least_floor(
                        min_engine_version,
                        "header.min_engine_version",
                    )?,
                    platform_locked: fields.platform_locked,
                }
            }
            ModuleType::SkinPack => {
                absent(&fields.min_engine_version, "header.min_engine_version")?;
                absent(&fields.platform_locked, "header.platform_locked")?;
                absent(&fields.pack_scope, "header.pack_scope")?;
                absent(&fields.base_game_version, "header.base_game_version")?;
                absent(&fields.lock_template_options, "header.lock_template_options")?;
                HeaderKind::SkinPack
            }
            ModuleType::WorldTemplate => {
                absent(&fields.min_engine_version, "header.min_engine_version")?;
                absent(&fields.platform_locked, "header.platform_locked")?;
                absent(&fields.pack_scope, "header.pack_scope")?;
                let base_game_version =
                    required(fields.base_game_version, "header.base_game_version")?;
                HeaderKind::WorldTemplate {
                    base_game_version: at_least_floor(
                        base_game_version,
                        "header.base_game_version",
                    )?,
                    lock_template_options: required(
                        fields.lock_template_options,
                        "header.lock_template_options",
                    )?,
                }
            }
        };
        Ok(Self {
            name: fields.name,
            description: fields.description,
            uuid: fields.uuid,
            version: fields.version,
            kind,
        })
    }

    pub fn module_type(&self) -> ModuleType {
        match &self.kind {
            HeaderKind::Behavior { module_type, .. } => *module_type,
            HeaderKind::Resources { .. } => ModuleType::Resources,
            HeaderKind::SkinPack => ModuleType::SkinPack,
            HeaderKind::WorldTemplate { .. } => ModuleType::WorldTemplate,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
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

    pub fn kind(&self) -> &HeaderKind {
        &self.kind
    }

    /// 未校验形式的副本，用于修改后重新校验
    pub fn to_fields(&self) -> HeaderFields {
        self.clone().into()
    }

    pub fn min_engine_version(&self) -> Option<&Version> {
        match &self.kind {
            HeaderKind::Behavior {
                min_engine_version, ..
            }
            | HeaderKind::Resources {
                min_engine_version, ..
            } => Some(min_engine_version),
            _ => None,
        }
    }
}

impl From<ManifestHeader> for HeaderFields {
    fn from(header: ManifestHeader) -> Self {
        let mut fields = HeaderFields {
            name: header.name,
            description: header.description,
            uuid: header.uuid,
            version: header.version,
            min_engine_version: None,
            platform_locked: None,
            pack_scope: None,
            base_game_version: None,
            lock_template_options: None,
        };
        match header.kind {
            HeaderKind::Behavior {
                min_engine_version,
                platform_locked,
                ..
            } => {
                fields.min_engine_version = Some(min_engine_version);
                fields.platform_locked = platform_locked;
            }
            HeaderKind::Resources {
                min_engine_version,
                platform_locked,
                pack_scope,
            } => {
                fields.min_engine_version = Some(min_engine_version);
                fields.platform_locked = platform_locked;
                fields.pack_scope = pack_scope;
            }
            HeaderKind::SkinPack => {}
            HeaderKind::WorldTemplate {
                base_game_version,
                lock_template_options,
            } => {
                fields.base_game_version = Some(base_game_version);
                fields.lock_template_options = Some(lock_template_options);
            }
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: ValidationError) -> &'static str {
        match err {
            ValidationError::Manifest { field, .. } => field,
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn behavior_requires_min_engine_above_floor() {
        let fields = HeaderFields::new("pack");
        let err = ManifestHeader::new(ModuleType::Data, fields.clone()).unwrap_err();
        assert_eq!(field_of(err), "header.min_engine_version");

        let old = fields.clone().with_min_engine_version(Version::new(1, 12, 0));
        assert!(ManifestHeader::new(ModuleType::Script, old).is_err());

        let scoped = fields
            .clone()
            .with_min_engine_version(Version::new(1, 19, 0))
            .with_pack_scope(PackScope::World);
        let err = ManifestHeader::new(ModuleType::Interface, scoped).unwrap_err();
        assert_eq!(field_of(err), "header.pack_scope");

        let ok = fields.with_min_engine_version(Version::new(1, 19, 0));
        let header = ManifestHeader::new(ModuleType::Data, ok).unwrap();
        assert_eq!(header.module_type(), ModuleType::Data);
        assert_eq!(header.min_engine_version(), Some(&Version::new(1, 19, 0)));
    }

    #[test]
    fn resources_allow_old_engine_and_scope() {
        let fields = HeaderFields::new("rp")
            .with_min_engine_version(Version::new(1, 2, 0))
            .with_pack_scope(PackScope::Global);
        let header = ManifestHeader::new(ModuleType::Resources, fields.clone()).unwrap();
        assert_eq!(header.module_type(), ModuleType::Resources);

        let locked = fields.with_lock_template_options(true);
        assert!(ManifestHeader::new(ModuleType::Resources, locked).is_err());
    }

    #[test]
    fn skin_pack_forbids_everything() {
        assert!(ManifestHeader::new(ModuleType::SkinPack, HeaderFields::new("skins")).is_ok());
        let locked = HeaderFields::new("skins").with_platform_locked(false);
        let err = ManifestHeader::new(ModuleType::SkinPack, locked).unwrap_err();
        assert_eq!(field_of(err), "header.platform_locked");
    }

    #[test]
    fn world_template_requires_base_game() {
        let fields = HeaderFields::new("world");
        let err = ManifestHeader::new(ModuleType::WorldTemplate, fields.clone()).unwrap_err();
        assert_eq!(field_of(err), "header.base_game_version");

        let no_lock = fields.clone().with_base_game_version(Version::new(1, 20, 0));
        let err = ManifestHeader::new(ModuleType::WorldTemplate, no_lock).unwrap_err();
        assert_eq!(field_of(err), "header.lock_template_options");

        let ok = fields
            .with_base_game_version(Version::new(1, 20, 0))
            .with_lock_template_options(true);
        let header = ManifestHeader::new(ModuleType::WorldTemplate, ok).unwrap();
        assert_eq!(header.min_engine_version(), None);
    }

    #[test]
    fn blank_name_fails() {
        let fields = HeaderFields::new(" ").with_min_engine_version(Version::new(1, 19, 0));
        let err = ManifestHeader::new(ModuleType::Data, fields).unwrap_err();
        assert_eq!(field_of(err), "header.name");
    }

    #[test]
    fn serializes_flat_fields() {
        let fields = HeaderFields::new("pack").with_min_engine_version(Version::new(1, 19, 50));
        let header = ManifestHeader::new(ModuleType::Data, fields.clone()).unwrap();
        let json = serde_json::to_value(&header).unwrap();
        assert_eq!(json["min_engine_version"], serde_json::json!([1, 19, 50]));
        assert!(json.get("type").is_none());
        assert!(json.get("pack_scope").is_none());
        let back: HeaderFields = serde_json::from_value(json).unwrap();
        assert_eq!(back, fields);
    }
}
