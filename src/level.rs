//! 世界存档的 level.dat

use crate::calibration::{
    FlatWorldLayersVersions, LevelVersions, GENERATOR_KEY, INVENTORY_VERSION_KEY,
    MINIMUM_COMPATIBLE_CLIENT_VERSION_KEY, NETWORK_VERSION_KEY, STORAGE_VERSION_KEY,
    WORLD_VERSION_KEY,
};
use crate::error::{Result, ValidationError};
use crate::tag::{self, Compound};
use fastnbt::Value;
use serde::{Deserialize, Serialize};

pub const LEVEL_FILE_NAME: &str = "level.dat";
pub const LEVEL_NAME_KEY: &str = "LevelName";
pub const LAST_PLAYED_KEY: &str = "LastPlayed";
pub const FLAT_WORLD_LAYERS_KEY: &str = "FlatWorldLayers";

const DEFAULT_BIOME_ID: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLayer {
    pub block_name: String,
    pub count: i32,
}

/// 平坦世界的层定义，以 JSON 字符串存放在 level.dat 中
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatWorldLayers {
    pub block_layers: Vec<BlockLayer>,
    pub biome_id: i32,
    pub structure_options: Option<serde_json::Value>,
    pub encoding_version: i32,
    pub world_version: String,
}

impl FlatWorldLayers {
    /// 没有任何方块层的虚空世界
    pub fn void(versions: &FlatWorldLayersVersions) -> Self {
        Self {
            block_layers: Vec::new(),
            biome_id: DEFAULT_BIOME_ID,
            structure_options: None,
            encoding_version: versions.encoding_version,
            world_version: versions.world_version.clone(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let layers: Self = serde_json::from_str(json).map_err(|e| ValidationError::Calibration {
            field: "flat_world_layers",
            reason: e.to_string(),
        })?;
        if let Some(layer) = layers.block_layers.iter().find(|l| l.count <= 0) {
            return Err(ValidationError::Calibration {
                field: "flat_world_layers.block_layers",
                reason: format!("{} 的层数必须为正数", layer.block_name),
            });
        }
        Ok(layers)
    }

    /// 紧凑格式，`structure_options` 写为 null
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// 以模板为基础生成 level.dat 根标签，覆盖名称、层定义、时间与版本字段
pub fn generate_level(
    template: &Value,
    level_name: &str,
    layers: &FlatWorldLayers,
    versions: &LevelVersions,
    last_played: i64,
) -> Result<Value> {
    let mut level: Compound = match template {
        Value::Compound(map) => map.clone(),
        _ => {
            return Err(ValidationError::FieldType {
                field: LEVEL_FILE_NAME.to_string(),
                expected: "compound",
            }
            .into())
        }
    };
    let overrides = [
        (LEVEL_NAME_KEY, tag::string(level_name)),
        (FLAT_WORLD_LAYERS_KEY, tag::string(layers.to_json()?)),
        (LAST_PLAYED_KEY, Value::Long(last_played)),
        (GENERATOR_KEY, Value::Int(versions.generator)),
        (
            MINIMUM_COMPATIBLE_CLIENT_VERSION_KEY,
            tag::int_list(&versions.minimum_compatible_client_version),
        ),
        (WORLD_VERSION_KEY, Value::Int(versions.world_version)),
        (
            INVENTORY_VERSION_KEY,
            tag::string(versions.inventory_version.to_string()),
        ),
        (STORAGE_VERSION_KEY, Value::Int(versions.storage_version)),
        (NETWORK_VERSION_KEY, Value::Int(versions.network_version)),
    ];
    for (key, value) in overrides {
        level.insert(key.to_string(), value);
    }
    Ok(Value::Compound(level))
}

/// 内置模板：创造模式、开启作弊的平坦世界
pub fn default_template() -> Value {
    let byte = |v: bool| Value::Byte(v as i8);
    tag::compound([
        (LEVEL_NAME_KEY, tag::string("Structures")),
        ("GameType", Value::Int(1)),
        ("Difficulty", Value::Int(0)),
        (GENERATOR_KEY, Value::Int(2)),
        ("RandomSeed", Value::Long(0)),
        ("SpawnX", Value::Int(0)),
        ("SpawnY", Value::Int(32767)),
        ("SpawnZ", Value::Int(0)),
        ("Time", Value::Long(6000)),
        (LAST_PLAYED_KEY, Value::Long(0)),
        ("commandsEnabled", byte(true)),
        ("hasBeenLoadedInCreative", byte(true)),
        ("commandblockoutput", byte(false)),
        ("commandblocksenabled", byte(true)),
        ("dodaylightcycle", byte(false)),
        ("doweathercycle", byte(false)),
        ("domobspawning", byte(false)),
        ("showcoordinates", byte(true)),
        ("spawnMobs", byte(false)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::tests::sample_versions;
    use crate::tag::{Fields, TagExt};

    #[test]
    fn void_layers_json() {
        let layers = FlatWorldLayers::void(&sample_versions().flat_world_layers);
        assert_eq!(
            layers.to_json().unwrap(),
            r#"{"block_layers":[],"biome_id":1,"structure_options":null,"encoding_version":6,"world_version":"version.post_1_18"}"#
        );
        assert_eq!(FlatWorldLayers::from_json(&layers.to_json().unwrap()).unwrap(), layers);
    }

    #[test]
    fn rejects_empty_layer() {
        let json = r#"{"block_layers":[{"block_name":"minecraft:air","count":0}],"biome_id":1,"structure_options":null,"encoding_version":6,"world_version":"v"}"#;
        assert!(FlatWorldLayers::from_json(json).is_err());
    }

    #[test]
    fn overrides_template_fields() {
        let versions = sample_versions();
        let layers = FlatWorldLayers::void(&versions.flat_world_layers);
        let level = generate_level(
            &default_template(),
            "Structures: demo",
            &layers,
            &versions,
            1_700_000_000,
        )
        .unwrap();
        let root = Fields::of(&level, "").unwrap();
        assert_eq!(root.string(LEVEL_NAME_KEY).unwrap(), "Structures: demo");
        assert_eq!(root.long(LAST_PLAYED_KEY).unwrap(), 1_700_000_000);
        assert_eq!(root.int(NETWORK_VERSION_KEY).unwrap(), 594);
        assert_eq!(root.string(INVENTORY_VERSION_KEY).unwrap(), "1.20.1");
        assert_eq!(
            root.int_list(MINIMUM_COMPATIBLE_CLIENT_VERSION_KEY).unwrap(),
            vec![1, 20, 0, 1, 0]
        );
        assert_eq!(root.int("GameType").unwrap(), 1);
        assert!(root
            .get_by_name(FLAT_WORLD_LAYERS_KEY)
            .and_then(TagExt::as_string)
            .is_some());
        assert!(LevelVersions::from_level(&level).is_ok());
    }

    #[test]
    fn template_must_be_compound() {
        let versions = sample_versions();
        let layers = FlatWorldLayers::void(&versions.flat_world_layers);
        assert!(generate_level(&Value::Int(1), "x", &layers, &versions, 0).is_err());
    }
}
