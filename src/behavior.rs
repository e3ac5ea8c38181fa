//! 结构行为包（`.mcpack`）

use crate::archive::ScopedPath;
use crate::assets::Icon;
use crate::context::Context;
use crate::error::{IoContext, Result, ValidationError};
use crate::identifier::{sanitize_file_name, Identifier};
use crate::manifest::{
    HeaderFields, Manifest, ManifestMetadata, ManifestModule, ModuleType, LOWEST_GAME_VERSION,
};
use crate::metadata::StructureMetadata;
use crate::structure::Structure;
use crate::version::Version;
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const MANIFEST_FILE_NAME: &str = "manifest.json";
pub const PACK_ICON_FILE_NAME: &str = "pack_icon.png";
pub const STRUCTURES_DIR_NAME: &str = "structures";
pub const METADATA_FILE_NAME: &str = "metadata.json";
pub const STRUCTURE_EXTENSION: &str = "mcstructure";
pub const PACK_EXTENSION: &str = "mcpack";

/// 包名与标题的前缀
pub(crate) const TITLE_PREFIX: &str = "Structures: ";

/// 包含若干结构的行为包
#[derive(Debug, Clone)]
pub struct Behavior {
    pack_name: String,
    pack_icon: Icon,
    manifest: Manifest,
    structure_metadata: Vec<StructureMetadata>,
    structures: IndexMap<Identifier, PathBuf>,
}

impl Behavior {
    /// 解码全部结构并生成清单，名称默认取第一个结构的显示名
    pub fn new(
        ctx: &Context,
        pack_name: Option<String>,
        pack_icon: Option<Icon>,
        structures: IndexMap<Identifier, PathBuf>,
    ) -> Result<Self> {
        let first = structures
            .keys()
            .next()
            .ok_or(ValidationError::EmptyStructures)?;
        let pack_name = pack_name.unwrap_or_else(|| first.display_string());
        let pack_icon = pack_icon.unwrap_or_else(|| ctx.assets.pack_icon.clone());

        let mut structure_metadata = Vec::with_capacity(structures.len());
        for (identifier, path) in &structures {
            let structure = Structure::read(path)?;
            let metadata = StructureMetadata::new(identifier.clone(), &structure)?;
            debug!(
                %identifier,
                min_engine_version = %metadata.min_engine_version,
                "结构已解码"
            );
            structure_metadata.push(metadata);
        }

        let manifest = build_manifest(ctx, &pack_name, &structure_metadata)?;
        info!(
            pack = %pack_name,
            structures = structure_metadata.len(),
            "行为包清单已生成"
        );
        Ok(Self {
            pack_name,
            pack_icon,
            manifest,
            structure_metadata,
            structures,
        })
    }

    pub fn pack_name(&self) -> &str {
        &self.pack_name
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn structure_metadata(&self) -> &[StructureMetadata] {
        &self.structure_metadata
    }

    pub fn structures(&self) -> &IndexMap<Identifier, PathBuf> {
        &self.structures
    }

    /// 最低引擎版本低于 `version` 时提高到 `version`
    pub(crate) fn raise_min_engine_version(&mut self, version: &Version) -> Result<(), ValidationError> {
        let current = self.manifest.header().min_engine_version();
        if current.map_or(true, |current| current < version) {
            let fields = self.manifest.header().to_fields().with_min_engine_version(version.clone());
            self.manifest = self.manifest.clone().with_header(fields)?;
        }
        Ok(())
    }

    pub(crate) fn set_structure_metadata(&mut self, metadata: Vec<StructureMetadata>) {
        self.structure_metadata = metadata;
    }

    /// 在 `parent` 下创建包目录并写入全部文件，返回包目录
    pub fn write_dir(&self, parent: &Path) -> Result<PathBuf> {
        let pack_dir = parent.join(sanitize_file_name(&self.pack_name));
        fs::create_dir(&pack_dir).io_context(format!("无法创建目录 {:?}", pack_dir))?;

        let manifest_path = pack_dir.join(MANIFEST_FILE_NAME);
        fs::write(&manifest_path, self.manifest.to_json()?)
            .io_context(format!("无法写入 {:?}", manifest_path))?;
        self.pack_icon.write_to(&pack_dir.join(PACK_ICON_FILE_NAME))?;
        let metadata_path = pack_dir.join(METADATA_FILE_NAME);
        fs::write(&metadata_path, StructureMetadata::to_json(&self.structure_metadata)?)
            .io_context(format!("无法写入 {:?}", metadata_path))?;

        let structures_dir = pack_dir.join(STRUCTURES_DIR_NAME);
        fs::create_dir(&structures_dir)
            .io_context(format!("无法创建目录 {:?}", structures_dir))?;
        for (identifier, source) in &self.structures {
            let target = structures_dir.join(identifier.to_path(STRUCTURE_EXTENSION));
            copy_file(source, &target)?;
        }
        Ok(pack_dir)
    }

    /// 生成 `.mcpack`，返回的路径在释放时连同临时目录一起删除
    pub fn generate(
        ctx: &Context,
        pack_name: Option<String>,
        pack_icon: Option<Icon>,
        structures: IndexMap<Identifier, PathBuf>,
    ) -> Result<ScopedPath> {
        let behavior = Self::new(ctx, pack_name, pack_icon, structures)?;
        let output = ctx.scratch_dir()?;
        let staging = ctx.scratch_dir()?;
        let pack_dir = behavior.write_dir(staging.path())?;
        let target = output.path().join(format!(
            "{}.{}",
            sanitize_file_name(&behavior.pack_name),
            PACK_EXTENSION
        ));
        ctx.archiver.zip(&target, &pack_dir, false)?;
        info!(archive = %target.display(), "行为包已生成");
        Ok(ScopedPath::new(target, output))
    }
}

fn build_manifest(
    ctx: &Context,
    pack_name: &str,
    structure_metadata: &[StructureMetadata],
) -> Result<Manifest> {
    let identifiers: Vec<String> = structure_metadata
        .iter()
        .map(|m| m.identifier.to_string())
        .collect();
    let description = format!(
        "{}{}\n*Generated with {}",
        TITLE_PREFIX,
        identifiers.join(", "),
        ctx.generator.name
    );
    // 方块版本很旧时仍需满足行为包的最低版本
    let min_engine_version = structure_metadata
        .iter()
        .map(|m| &m.min_engine_version)
        .max()
        .filter(|v| **v > LOWEST_GAME_VERSION)
        .cloned()
        .unwrap_or(LOWEST_GAME_VERSION);

    let header = HeaderFields::new(format!("{}{}", TITLE_PREFIX, pack_name))
        .with_description(description)
        .with_min_engine_version(min_engine_version);
    let metadata = ManifestMetadata::new()
        .with_generator(ctx.generator.name.clone(), [ctx.generator.version.clone()])?;
    let manifest = Manifest::builder(header)
        .module(ManifestModule::new(ModuleType::Data)?)
        .metadata(metadata)
        .build()?;
    Ok(manifest)
}

pub(crate) fn copy_file(source: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).io_context(format!("无法创建目录 {:?}", parent))?;
    }
    fs::copy(source, target).io_context(format!("无法复制 {:?} -> {:?}", source, target))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::MemoryCalibrationStore;
    use crate::nbt_le;
    use crate::structure::tests::{palette_entry, structure_tag};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write_sample(dir: &Path, name: &str, version: [u8; 4]) -> PathBuf {
        let value = structure_tag(
            [1, 1, 1],
            vec![palette_entry("minecraft:stone", version)],
            &[0],
            &[-1],
            None,
        );
        let path = dir.join(format!("{}.{}", name, STRUCTURE_EXTENSION));
        fs::write(&path, nbt_le::to_bytes(&value).unwrap()).unwrap();
        path
    }

    fn sample_behavior(dir: &Path) -> Behavior {
        let ctx = Context::new(Arc::new(MemoryCalibrationStore::new())).unwrap();
        let structures = IndexMap::from([
            (
                Identifier::parse("ruins:gate").unwrap(),
                write_sample(dir, "gate", [1, 16, 0, 0]),
            ),
            (
                Identifier::parse("well").unwrap(),
                write_sample(dir, "well", [1, 18, 10, 0]),
            ),
        ]);
        Behavior::new(&ctx, None, None, structures).unwrap()
    }

    #[test]
    fn name_and_engine_version_come_from_structures() {
        let dir = TempDir::new().unwrap();
        let behavior = sample_behavior(dir.path());
        assert_eq!(behavior.pack_name(), "ruins:gate");
        let header = behavior.manifest().header();
        assert_eq!(header.name(), "Structures: ruins:gate");
        assert_eq!(header.min_engine_version(), Some(&Version::new(1, 18, 10)));
        assert_eq!(
            header.description(),
            Some("Structures: ruins:gate, mystructure:well\n*Generated with mcsp")
        );
    }

    #[test]
    fn raising_only_moves_upwards() {
        let dir = TempDir::new().unwrap();
        let mut behavior = sample_behavior(dir.path());
        let uuid = behavior.manifest().header().uuid();

        behavior.raise_min_engine_version(&Version::new(1, 17, 0)).unwrap();
        assert_eq!(
            behavior.manifest().header().min_engine_version(),
            Some(&Version::new(1, 18, 10))
        );
        behavior.raise_min_engine_version(&Version::new(1, 19, 50)).unwrap();
        assert_eq!(
            behavior.manifest().header().min_engine_version(),
            Some(&Version::new(1, 19, 50))
        );
        assert_eq!(behavior.manifest().header().uuid(), uuid);
    }

    #[test]
    fn writes_pack_directory() {
        let dir = TempDir::new().unwrap();
        let behavior = sample_behavior(dir.path());
        let out = TempDir::new().unwrap();
        let pack_dir = behavior.write_dir(out.path()).unwrap();

        assert_eq!(pack_dir, out.path().join("ruins_gate"));
        for file in [
            MANIFEST_FILE_NAME,
            PACK_ICON_FILE_NAME,
            METADATA_FILE_NAME,
            "structures/ruins/gate.mcstructure",
            "structures/well.mcstructure",
        ] {
            assert!(pack_dir.join(file).is_file(), "缺少 {file}");
        }
        let manifest =
            Manifest::from_json(&fs::read_to_string(pack_dir.join(MANIFEST_FILE_NAME)).unwrap())
                .unwrap();
        assert_eq!(&manifest, behavior.manifest());
    }

    #[test]
    fn empty_structures_fail() {
        let ctx = Context::new(Arc::new(MemoryCalibrationStore::new())).unwrap();
        assert!(matches!(
            Behavior::new(&ctx, None, None, IndexMap::new()),
            Err(crate::error::ConvertError::Validation(ValidationError::EmptyStructures))
        ));
    }
}
