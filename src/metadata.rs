//! 包内 `metadata.json`：每个结构的标识符、最低引擎版本与尺寸

use crate::error::{Result, ValidationError};
use crate::geometry::{Coordinate, Size};
use crate::identifier::Identifier;
use crate::structure::Structure;
use crate::version::Version;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureMetadata {
    pub identifier: Identifier,
    pub min_engine_version: Version,
    pub size: Size,
    /// 世界中的放置位置，仅世界存档使用
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
}

impl StructureMetadata {
    pub fn new(identifier: Identifier, structure: &Structure) -> Result<Self, ValidationError> {
        Ok(Self {
            identifier,
            min_engine_version: structure.min_engine_version()?,
            size: structure.size(),
            coordinate: None,
        })
    }

    pub fn with_coordinate(self, coordinate: Coordinate) -> Self {
        Self {
            coordinate: Some(coordinate),
            ..self
        }
    }

    pub fn to_json(list: &[StructureMetadata]) -> Result<String> {
        Ok(serde_json::to_string_pretty(list)?)
    }
}
