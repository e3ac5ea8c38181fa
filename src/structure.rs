//! `.mcstructure` 解码
//!
//! 格式参考 tryashtar 的 "Bedrock mcstructure file format"

use crate::error::{IoContext, Result, ValidationError};
use crate::geometry::{triple, Coordinate, Size};
use crate::nbt_le;
use crate::tag::{Compound, Fields, TagExt};
use crate::version::Version;
use crate::voxel::{Block, BlockRef, Layers};
use fastnbt::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// 空格子在方块索引中的取值
const VOID_INDEX: i32 = -1;

/// 解码后的结构，创建后不可修改
#[derive(Debug, Clone)]
pub struct Structure {
    format_version: i32,
    size: Size,
    /// 调色板方块，以及带位置附加数据的派生方块
    blocks: Vec<Block>,
    /// 长度为 `size.volume()` 的扁平网格
    grid: Vec<Layers>,
    entities: Vec<Compound>,
    origin: Coordinate,
}

impl Structure {
    /// 读取并解码结构文件
    pub fn read(path: &Path) -> Result<Self> {
        let data = fs::read(path).io_context(format!("无法读取结构文件 {}", path.display()))?;
        let root = nbt_le::from_bytes(&data)?;
        let structure = Self::from_tag(&root)?;
        debug!(
            path = %path.display(),
            size = ?structure.size,
            blocks = structure.blocks.len(),
            "结构解码完成"
        );
        Ok(structure)
    }

    /// 从标签树解码
    pub fn from_tag(root: &Value) -> Result<Self, ValidationError> {
        let root = Fields::of(root, "")?;

        let format_version = root.int("format_version")?;
        if format_version <= 0 {
            return Err(ValidationError::UnsupportedFormatVersion(format_version as i64));
        }
        let [x, y, z] = triple("size", &root.int_list("size")?)?;
        let size = Size::new(x, y, z)?;
        let origin = Coordinate::from(triple(
            "structure_world_origin",
            &root.int_list("structure_world_origin")?,
        )?);

        let structure = root.compound("structure")?;
        let default_palette = structure.compound("palette")?.compound("default")?;

        let mut blocks = default_palette
            .list("block_palette")?
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let entry = Fields::of(entry, &format!("block_palette[{}]", i))?;
                Block::from_packed_version(
                    entry.string("name")?,
                    entry.compound("states")?.as_map().clone(),
                    entry.int("version")?,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        let palette_len = blocks.len();
        let position_data = default_palette.opt_compound("block_position_data")?;

        // 两层索引依次拼接：前一半为主层，后一半为次层
        let mut flat = Vec::new();
        for (layer, indices) in structure.list("block_indices")?.iter().enumerate() {
            let indices = indices.as_int_list().ok_or_else(|| ValidationError::FieldType {
                field: format!("structure.block_indices[{}]", layer),
                expected: "list<int>",
            })?;
            flat.extend(indices);
        }

        let expected = size.volume() * 2;
        if flat.len() != expected {
            return Err(ValidationError::SizeMismatch {
                expected,
                actual: flat.len(),
            });
        }

        let mut cells = Vec::with_capacity(flat.len());
        for (i, &index) in flat.iter().enumerate() {
            if index == VOID_INDEX {
                cells.push(None);
                continue;
            }
            let base = usize::try_from(index)
                .ok()
                .filter(|&idx| idx < palette_len)
                .ok_or(ValidationError::PaletteIndex {
                    index,
                    len: palette_len,
                })?;

            let overridden = match &position_data {
                Some(data) => apply_position_data(&blocks[base], data, i)?,
                None => None,
            };
            let block_ref = match overridden {
                Some(block) => {
                    blocks.push(block);
                    BlockRef((blocks.len() - 1) as u32)
                }
                None => BlockRef(base as u32),
            };
            cells.push(Some(block_ref));
        }

        let volume = size.volume();
        let grid = (0..volume)
            .map(|i| Layers {
                primary: cells[i],
                secondary: cells[i + volume],
            })
            .collect();

        let entities: Vec<Compound> = structure
            .opt_list("entities")?
            .iter()
            .enumerate()
            .map(|(i, e)| {
                e.as_compound()
                    .cloned()
                    .ok_or_else(|| ValidationError::FieldType {
                        field: format!("structure.entities[{}]", i),
                        expected: "compound",
                    })
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            format_version,
            size,
            blocks,
            grid,
            entities,
            origin,
        })
    }

    pub fn format_version(&self) -> i32 {
        self.format_version
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn entities(&self) -> &[Compound] {
        &self.entities
    }

    pub fn origin(&self) -> Coordinate {
        self.origin
    }

    pub fn block(&self, block_ref: BlockRef) -> &Block {
        &self.blocks[block_ref.index()]
    }

    /// 指定坐标的方块层，越界返回 `None`
    pub fn layers(&self, x: i32, y: i32, z: i32) -> Option<Layers> {
        self.size.index_of(x, y, z).map(|i| self.grid[i])
    }

    /// 按扁平下标顺序遍历所有格子
    pub fn cells(&self) -> impl Iterator<Item = (Coordinate, Layers)> + '_ {
        self.size.coordinates().zip(self.grid.iter().copied())
    }

    /// 实际被格子引用的方块数量（不含空格子）
    pub fn block_count(&self) -> usize {
        self.grid.iter().map(|l| l.iter().count()).sum()
    }

    /// 所有方块版本中的最大值
    pub fn min_engine_version(&self) -> Result<Version, ValidationError> {
        let used: BTreeSet<BlockRef> = self.grid.iter().flat_map(Layers::iter).collect();
        let versions: BTreeSet<&str> = used.iter().map(|&r| self.block(r).version()).collect();
        let mut max: Option<Version> = None;
        for version in versions {
            let version = Version::truncate(version)?;
            if max.as_ref().map_or(true, |m| version > *m) {
                max = Some(version);
            }
        }
        max.ok_or(ValidationError::NoBlocks)
    }
}

/// 按扁平下标查找位置附加数据，存在时返回替换后的方块
fn apply_position_data(
    block: &Block,
    position_data: &Fields<'_>,
    index: usize,
) -> Result<Option<Block>, ValidationError> {
    let key = index.to_string();
    let Some(entry) = position_data.get_by_name(&key) else {
        return Ok(None);
    };
    let entry = Fields::of(entry, &format!("block_position_data.{}", key))?;

    let block_entity_data = entry
        .opt_compound("block_entity_data")?
        .map(|data| data.as_map().clone())
        .filter(|data| !data.is_empty());

    // 只取第一条计划刻
    let tick_delay = match entry.opt_list("tick_queue_data")?.first() {
        Some(tick) => Some(Fields::of(tick, "tick_queue_data[0]")?.int("tick_delay")?),
        None => None,
    };

    if block_entity_data.is_none() && tick_delay.is_none() {
        return Ok(None);
    }
    block.with_position_data(block_entity_data, tick_delay).map(Some)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tag;

    pub(crate) fn palette_entry(name: &str, version: [u8; 4]) -> Value {
        tag::compound([
            ("name", tag::string(name)),
            ("states", tag::compound::<&str>([])),
            ("version", Value::Int(i32::from_be_bytes(version))),
        ])
    }

    /// 构造结构文件的标签树
    pub(crate) fn structure_tag(
        size: [i32; 3],
        palette: Vec<Value>,
        primary: &[i32],
        secondary: &[i32],
        position_data: Option<Value>,
    ) -> Value {
        let mut default_palette = vec![("block_palette", Value::List(palette))];
        if let Some(data) = position_data {
            default_palette.push(("block_position_data", data));
        }
        tag::compound([
            ("format_version", Value::Int(1)),
            ("size", tag::int_list(&size)),
            ("structure_world_origin", tag::int_list(&[10, 64, -3])),
            (
                "structure",
                tag::compound([
                    (
                        "block_indices",
                        Value::List(vec![tag::int_list(primary), tag::int_list(secondary)]),
                    ),
                    ("entities", Value::List(vec![])),
                    (
                        "palette",
                        tag::compound([("default", tag::compound(default_palette))]),
                    ),
                ]),
            ),
        ])
    }

    #[test]
    fn decodes_grid_in_row_major_order() {
        let value = structure_tag(
            [1, 2, 2],
            vec![
                palette_entry("minecraft:stone", [1, 18, 0, 0]),
                palette_entry("minecraft:water", [1, 19, 60, 3]),
            ],
            &[0, -1, -1, 0],
            &[-1, 1, -1, -1],
            None,
        );
        let structure = Structure::from_tag(&value).unwrap();
        assert_eq!(structure.size().volume(), 4);
        assert_eq!(structure.origin(), Coordinate::new(10, 64, -3));

        let first = structure.layers(0, 0, 0).unwrap();
        assert_eq!(structure.block(first.primary.unwrap()).name(), "minecraft:stone");
        assert!(first.secondary.is_none());

        let second = structure.layers(0, 0, 1).unwrap();
        assert!(second.primary.is_none());
        assert_eq!(structure.block(second.secondary.unwrap()).name(), "minecraft:water");

        assert!(structure.layers(0, 1, 0).unwrap().is_void());
        assert!(structure.layers(0, 1, 1).unwrap().primary.is_some());
        assert!(structure.layers(1, 0, 0).is_none());
        assert_eq!(structure.block_count(), 3);
        assert_eq!(structure.cells().count(), 4);
    }

    #[test]
    fn index_count_must_match_volume() {
        let value = structure_tag(
            [2, 1, 1],
            vec![palette_entry("minecraft:stone", [1, 18, 0, 0])],
            &[0, 0],
            &[-1],
            None,
        );
        assert_eq!(
            Structure::from_tag(&value).unwrap_err(),
            ValidationError::SizeMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn oversized_declared_size_fails() {
        let stone = || vec![palette_entry("minecraft:stone", [1, 18, 0, 0])];

        let value = structure_tag([i32::MAX; 3], stone(), &[0], &[-1], None);
        assert_eq!(
            Structure::from_tag(&value).unwrap_err(),
            ValidationError::SizeOverflow {
                x: i32::MAX,
                y: i32::MAX,
                z: i32::MAX
            }
        );

        // 声明的体积可以表示，但索引数量对不上
        let value = structure_tag([100_000; 3], stone(), &[0], &[-1], None);
        assert!(matches!(
            Structure::from_tag(&value),
            Err(ValidationError::SizeMismatch { actual: 2, .. })
        ));
    }

    #[test]
    fn min_engine_version_is_max_of_blocks() {
        let value = structure_tag(
            [2, 1, 1],
            vec![
                palette_entry("minecraft:stone", [1, 18, 0, 0]),
                palette_entry("minecraft:water", [1, 19, 60, 3]),
                palette_entry("minecraft:unused", [1, 20, 80, 0]),
            ],
            &[0, 0],
            &[1, -1],
            None,
        );
        let structure = Structure::from_tag(&value).unwrap();
        assert_eq!(structure.min_engine_version().unwrap(), Version::new(1, 19, 60));
    }

    #[test]
    fn empty_structure_has_no_blocks() {
        let value = structure_tag(
            [1, 1, 1],
            vec![palette_entry("minecraft:stone", [1, 18, 0, 0])],
            &[-1],
            &[-1],
            None,
        );
        let structure = Structure::from_tag(&value).unwrap();
        assert_eq!(
            structure.min_engine_version().unwrap_err(),
            ValidationError::NoBlocks
        );
    }

    #[test]
    fn applies_position_data() {
        let position_data = tag::compound([
            (
                "1",
                tag::compound([
                    (
                        "block_entity_data",
                        tag::compound([("id", tag::string("Chest"))]),
                    ),
                    (
                        "tick_queue_data",
                        Value::List(vec![
                            tag::compound([("tick_delay", Value::Int(5))]),
                            tag::compound([("tick_delay", Value::Int(9))]),
                        ]),
                    ),
                ]),
            ),
            // 空格子上的数据被忽略
            ("2", tag::compound([("tick_queue_data", Value::List(vec![]))])),
        ]);
        let value = structure_tag(
            [3, 1, 1],
            vec![palette_entry("minecraft:chest", [1, 19, 0, 0])],
            &[0, 0, -1],
            &[-1, -1, -1],
            Some(position_data),
        );
        let structure = Structure::from_tag(&value).unwrap();
        let plain = structure.block(structure.layers(0, 0, 0).unwrap().primary.unwrap());
        let chest = structure.block(structure.layers(1, 0, 0).unwrap().primary.unwrap());
        assert!(plain.block_entity_data().is_none());
        assert_eq!(chest.tick_delay(), Some(5));
        assert_eq!(
            chest.block_entity_data().unwrap().get("id"),
            Some(&tag::string("Chest"))
        );
    }

    #[test]
    fn palette_index_out_of_range() {
        let value = structure_tag(
            [1, 1, 1],
            vec![palette_entry("minecraft:stone", [1, 18, 0, 0])],
            &[3],
            &[-1],
            None,
        );
        assert!(matches!(
            Structure::from_tag(&value),
            Err(ValidationError::PaletteIndex { index: 3, len: 1 })
        ));
    }

    #[test]
    fn missing_fields_are_reported() {
        let value = tag::compound([("format_version", Value::Int(1))]);
        assert_eq!(
            Structure::from_tag(&value).unwrap_err(),
            ValidationError::MissingField("size".into())
        );
    }
}
