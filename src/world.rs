//! 世界存档（`.mcworld`）
//!
//! 内嵌一个结构行为包，结构按网格排布，首次加载时由函数放置到世界中

use crate::archive::ScopedPath;
use crate::assets::Icon;
use crate::behavior::{Behavior, TITLE_PREFIX};
use crate::calibration::LevelVersions;
use crate::context::Context;
use crate::error::{IoContext, Result};
use crate::geometry::Coordinate;
use crate::identifier::{sanitize_file_name, Identifier};
use crate::level::{self, FlatWorldLayers, LEVEL_FILE_NAME};
use crate::metadata::StructureMetadata;
use crate::nbt_le;
use crate::version::Version;
use fastnbt::Value;
use indexmap::IndexMap;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

pub const WORLD_ICON_FILE_NAME: &str = "world_icon.jpeg";
pub const WORLD_BEHAVIOR_PACKS_FILE_NAME: &str = "world_behavior_packs.json";
pub const BEHAVIOR_PACKS_DIR_NAME: &str = "behavior_packs";
pub const FUNCTIONS_DIR_NAME: &str = "functions";
pub const TICK_FILE_NAME: &str = "tick.json";
pub const FIRST_LOAD_FUNCTION: &str = "internal/first_load";
pub const RELOAD_ALL_FUNCTION: &str = "reload_all_structures";
pub const RELOAD_DIR_NAME: &str = "reload";
pub const FUNCTION_EXTENSION: &str = "mcfunction";
pub const WORLD_EXTENSION: &str = "mcworld";

/// 生成的函数使用新版 execute 语法所需的最低版本
pub const NEW_EXECUTE_MIN_ENGINE_VERSION: Version = Version::new(1, 19, 50);
/// 相邻结构之间的间隔
pub const STRUCTURES_GAP: i32 = 3;
pub const STRUCTURES_Y: i32 = 0;

/// `world_behavior_packs.json` 中的一项
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackReference {
    pub pack_id: Uuid,
    #[serde(with = "crate::version::array")]
    pub version: Version,
}

/// `functions/tick.json`，函数路径不带扩展名
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickFunctions {
    pub values: Vec<String>,
}

/// 按标识符排序后在正方形网格上依次放置，返回带坐标的元数据
///
/// 间距为所有结构水平边长的最大值加上 `STRUCTURES_GAP`，网格以原点为中心
pub fn layout(structure_metadata: &[StructureMetadata]) -> Vec<StructureMetadata> {
    let Some(footprint) = structure_metadata.iter().map(|m| m.size.footprint()).max() else {
        return Vec::new();
    };
    let spacing = footprint + STRUCTURES_GAP;
    let row_count = (structure_metadata.len() as f64).sqrt().ceil() as i32;
    let edge = (row_count / 2) * -spacing;

    let mut sorted: Vec<&StructureMetadata> = structure_metadata.iter().collect();
    sorted.sort_by_cached_key(|m| m.identifier.to_string());

    let cells = (0..row_count).flat_map(|xi| {
        (0..row_count).map(move |zi| {
            Coordinate::new(edge + xi * spacing, STRUCTURES_Y, edge + zi * spacing)
        })
    });
    sorted
        .into_iter()
        .zip(cells)
        .map(|(metadata, coordinate)| metadata.clone().with_coordinate(coordinate))
        .collect()
}

/// 世界存档
#[derive(Debug, Clone)]
pub struct World {
    world_name: String,
    world_icon: Icon,
    level: Value,
    storage_version: i32,
    world_behavior_packs: Vec<PackReference>,
    behavior: Behavior,
    tick_functions: TickFunctions,
    first_load_function: String,
    reload_all_function: String,
    structure_functions: Vec<(Identifier, String)>,
}

impl World {
    pub fn new(
        ctx: &Context,
        world_name: Option<String>,
        world_icon: Option<Icon>,
        structures: IndexMap<Identifier, PathBuf>,
    ) -> Result<Self> {
        let mut behavior = Behavior::new(ctx, None, None, structures)?;
        let world_name = world_name.unwrap_or_else(|| behavior.pack_name().to_string());
        let world_icon = world_icon.unwrap_or_else(|| ctx.assets.world_icon.clone());

        behavior.raise_min_engine_version(&NEW_EXECUTE_MIN_ENGINE_VERSION)?;
        let placed = layout(behavior.structure_metadata());
        for metadata in &placed {
            debug!(identifier = %metadata.identifier, coordinate = ?metadata.coordinate, "结构位置");
        }
        behavior.set_structure_metadata(placed);

        let versions = LevelVersions::load(ctx.calibration.as_ref())?;
        let level = level::generate_level(
            &ctx.assets.level_template,
            &format!("{}{}", TITLE_PREFIX, world_name),
            &FlatWorldLayers::void(&versions.flat_world_layers),
            &versions,
            chrono::Utc::now().timestamp(),
        )?;

        let header = behavior.manifest().header();
        let world_behavior_packs = vec![PackReference {
            pack_id: header.uuid(),
            version: header.version().clone(),
        }];
        let tick_functions = TickFunctions {
            values: vec![FIRST_LOAD_FUNCTION.to_string()],
        };

        // 与写入文件的顺序一致，按标识符排序
        let structure_functions: Vec<(Identifier, String)> = behavior
            .structure_metadata()
            .iter()
            .filter_map(|m| {
                let c = m.coordinate?;
                let command = format!("structure load {} {} {} {}", m.identifier, c.x, c.y, c.z);
                Some((m.identifier.clone(), command))
            })
            .collect();
        let reload_all_function = structure_functions
            .iter()
            .map(|(identifier, _)| {
                format!("function {}/{}", RELOAD_DIR_NAME, identifier.function_path())
            })
            .collect::<Vec<_>>()
            .join("\n");

        info!(
            world = %world_name,
            structures = structure_functions.len(),
            "世界存档已生成"
        );
        Ok(Self {
            world_name,
            world_icon,
            level,
            storage_version: versions.storage_version,
            world_behavior_packs,
            behavior,
            tick_functions,
            first_load_function: ctx.assets.first_load_function.clone(),
            reload_all_function,
            structure_functions,
        })
    }

    pub fn world_name(&self) -> &str {
        &self.world_name
    }

    pub fn level(&self) -> &Value {
        &self.level
    }

    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    pub fn world_behavior_packs(&self) -> &[PackReference] {
        &self.world_behavior_packs
    }

    pub fn reload_all_function(&self) -> &str {
        &self.reload_all_function
    }

    pub fn structure_functions(&self) -> &[(Identifier, String)] {
        &self.structure_functions
    }

    /// 在 `parent` 下创建世界目录并写入全部文件，返回世界目录
    pub fn write_dir(&self, parent: &Path) -> Result<PathBuf> {
        let world_dir = parent.join(sanitize_file_name(&self.world_name));
        fs::create_dir(&world_dir).io_context(format!("无法创建目录 {:?}", world_dir))?;

        let level_path = world_dir.join(LEVEL_FILE_NAME);
        fs::write(
            &level_path,
            nbt_le::write_level_dat(self.storage_version, &self.level)?,
        )
        .io_context(format!("无法写入 {:?}", level_path))?;
        self.world_icon.write_to(&world_dir.join(WORLD_ICON_FILE_NAME))?;
        write_text(
            &world_dir.join(WORLD_BEHAVIOR_PACKS_FILE_NAME),
            &serde_json::to_string_pretty(&self.world_behavior_packs)?,
        )?;

        let packs_dir = world_dir.join(BEHAVIOR_PACKS_DIR_NAME);
        fs::create_dir(&packs_dir).io_context(format!("无法创建目录 {:?}", packs_dir))?;
        let behavior_dir = self.behavior.write_dir(&packs_dir)?;

        let functions_dir = behavior_dir.join(FUNCTIONS_DIR_NAME);
        write_text(
            &functions_dir.join(TICK_FILE_NAME),
            &serde_json::to_string_pretty(&self.tick_functions)?,
        )?;
        write_text(
            &functions_dir.join(format!("{}.{}", FIRST_LOAD_FUNCTION, FUNCTION_EXTENSION)),
            &self.first_load_function,
        )?;
        write_text(
            &functions_dir.join(format!("{}.{}", RELOAD_ALL_FUNCTION, FUNCTION_EXTENSION)),
            &self.reload_all_function,
        )?;
        let reload_dir = functions_dir.join(RELOAD_DIR_NAME);
        for (identifier, command) in &self.structure_functions {
            write_text(&reload_dir.join(identifier.to_path(FUNCTION_EXTENSION)), command)?;
        }
        Ok(world_dir)
    }

    /// 生成 `.mcworld`，返回的路径在释放时连同临时目录一起删除
    pub fn generate(
        ctx: &Context,
        world_name: Option<String>,
        world_icon: Option<Icon>,
        structures: IndexMap<Identifier, PathBuf>,
    ) -> Result<ScopedPath> {
        let world = Self::new(ctx, world_name, world_icon, structures)?;
        let output = ctx.scratch_dir()?;
        let staging = ctx.scratch_dir()?;
        let world_dir = world.write_dir(staging.path())?;
        let target = output.path().join(format!(
            "{}.{}",
            sanitize_file_name(&world.world_name),
            WORLD_EXTENSION
        ));
        ctx.archiver.zip(&target, &world_dir, false)?;
        info!(archive = %target.display(), "世界存档已打包");
        Ok(ScopedPath::new(target, output))
    }
}

/// 写入文本文件，必要时创建父目录
fn write_text(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).io_context(format!("无法创建目录 {:?}", parent))?;
    }
    fs::write(path, content).io_context(format!("无法写入 {:?}", path))
}
