//! Minecraft 基岩版结构文件打包工具
//!
//! 将 `.mcstructure` 结构文件打包为行为包（`.mcpack`）或世界存档（`.mcworld`）

pub mod archive;
pub mod assets;
pub mod behavior;
pub mod calibration;
pub mod config;
pub mod context;
pub mod convert;
pub mod error;
pub mod geometry;
pub mod identifier;
pub mod level;
pub mod manifest;
pub mod metadata;
pub mod nbt_le;
pub mod structure;
pub mod tag;
pub mod version;
pub mod voxel;
pub mod world;

pub use archive::{Archiver, ScopedPath, ZipArchiver};
pub use assets::{Assets, Icon};
pub use behavior::Behavior;
pub use calibration::{
    CalibrationStore, FileCalibrationStore, LevelVersions, MemoryCalibrationStore,
};
pub use config::Config;
pub use context::{Context, Generator};
pub use convert::{convert, DuplicatePolicy, TargetKind, Upload};
pub use error::{ConvertError, Result, TagError, ValidationError};
pub use geometry::{Coordinate, Size};
pub use identifier::Identifier;
pub use manifest::Manifest;
pub use metadata::StructureMetadata;
pub use structure::Structure;
pub use version::Version;
pub use voxel::{Block, Layers};
pub use world::{layout, World};
