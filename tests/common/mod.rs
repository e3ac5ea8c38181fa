//! 集成测试共用的结构文件与上下文构造

#![allow(dead_code)]

use fastnbt::Value;
use mcsp::calibration::FlatWorldLayersVersions;
use mcsp::{nbt_le, tag, Context, LevelVersions, MemoryCalibrationStore, Version};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub fn sample_versions() -> LevelVersions {
    LevelVersions {
        generator: 2,
        minimum_compatible_client_version: vec![1, 20, 0, 1, 0],
        world_version: 1,
        inventory_version: Version::new(1, 20, 1),
        storage_version: 10,
        network_version: 594,
        flat_world_layers: FlatWorldLayersVersions {
            encoding_version: 6,
            world_version: "version.post_1_18".to_string(),
        },
    }
}

/// 使用内存校准存储的上下文，临时目录建在 `scratch_root` 下
pub fn context(scratch_root: &Path, calibrated: bool) -> Context {
    let store = MemoryCalibrationStore::new();
    if calibrated {
        sample_versions().store(&store).unwrap();
    }
    Context::new(Arc::new(store))
        .unwrap()
        .with_scratch_root(scratch_root)
}

/// 整个体积都由同一种方块填满的结构
pub fn filled_structure(size: [i32; 3], block: &str, version: [u8; 4]) -> Value {
    let volume = (size[0] * size[1] * size[2]) as usize;
    let palette = tag::compound([
        ("name", tag::string(block)),
        ("states", tag::compound::<&str>([])),
        ("version", Value::Int(i32::from_be_bytes(version))),
    ]);
    tag::compound([
        ("format_version", Value::Int(1)),
        ("size", tag::int_list(&size)),
        ("structure_world_origin", tag::int_list(&[0, 0, 0])),
        (
            "structure",
            tag::compound([
                (
                    "block_indices",
                    Value::List(vec![
                        tag::int_list(&vec![0; volume]),
                        tag::int_list(&vec![-1; volume]),
                    ]),
                ),
                ("entities", Value::List(vec![])),
                (
                    "palette",
                    tag::compound([(
                        "default",
                        tag::compound([("block_palette", Value::List(vec![palette]))]),
                    )]),
                ),
            ]),
        ),
    ])
}

/// 写入 `dir/file_name`，返回文件路径
pub fn write_structure(dir: &Path, file_name: &str, structure: &Value) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(file_name);
    fs::write(&path, nbt_le::to_bytes(structure).unwrap()).unwrap();
    path
}

/// 归档中的全部文件（不含目录项）
pub fn read_archive(path: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut files = BTreeMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        if entry.is_dir() {
            continue;
        }
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).unwrap();
        files.insert(entry.name().to_string(), bytes);
    }
    files
}

pub fn json(files: &BTreeMap<String, Vec<u8>>, name: &str) -> serde_json::Value {
    let bytes = files
        .get(name)
        .unwrap_or_else(|| panic!("归档中缺少 {name}"));
    serde_json::from_slice(bytes).unwrap()
}

pub fn text(files: &BTreeMap<String, Vec<u8>>, name: &str) -> String {
    let bytes = files
        .get(name)
        .unwrap_or_else(|| panic!("归档中缺少 {name}"));
    String::from_utf8(bytes.clone()).unwrap()
}

pub fn entry_count(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}
