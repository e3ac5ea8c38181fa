//! 转换入口：把一批上传的结构文件交给对应的组装器

use crate::archive::ScopedPath;
use crate::behavior::{copy_file, Behavior, STRUCTURE_EXTENSION};
use crate::context::Context;
use crate::error::{Result, ValidationError};
use crate::identifier::{sanitize_file_name, Identifier};
use crate::world::World;
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{info, warn};

/// 转换目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TargetKind {
    /// 所有结构打包为一个行为包
    Library,
    /// 每个结构单独打包
    SingleLibrary,
    /// 内嵌行为包的世界存档
    World,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TargetKind::Library => "library",
            TargetKind::SingleLibrary => "single-library",
            TargetKind::World => "world",
        })
    }
}

/// 多个文件推导出相同标识符时的处理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// 报错
    #[default]
    Reject,
    /// 保留后出现的文件
    LastWins,
}

/// 一个上传的文件，`file_name` 是原始文件名
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub path: PathBuf,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            file_name: file_name.into(),
            path: path.into(),
        }
    }

    /// 以本地文件自身的文件名上传
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { file_name, path }
    }

    /// 去掉扩展名后的文件名解析为标识符
    pub fn identifier(&self) -> Result<Identifier, ValidationError> {
        let stem = Path::new(&self.file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Identifier::parse(&stem)
    }
}

/// 复制到临时目录并建立标识符到文件的映射
fn stage(
    ctx: &Context,
    scratch: &TempDir,
    uploads: &[Upload],
) -> Result<IndexMap<Identifier, PathBuf>> {
    let mut structures = IndexMap::with_capacity(uploads.len());
    for (index, upload) in uploads.iter().enumerate() {
        let identifier = upload.identifier()?;
        // 同名文件各自占用一个子目录
        let staged = scratch.path().join(index.to_string()).join(format!(
            "{}.{}",
            sanitize_file_name(&identifier.to_string()),
            STRUCTURE_EXTENSION
        ));
        copy_file(&upload.path, &staged)?;

        match structures.entry(identifier) {
            Entry::Vacant(entry) => {
                entry.insert(staged);
            }
            Entry::Occupied(mut entry) => match ctx.duplicates {
                DuplicatePolicy::Reject => {
                    return Err(ValidationError::DuplicateIdentifier(entry.key().to_string()).into())
                }
                DuplicatePolicy::LastWins => {
                    warn!(
                        identifier = %entry.key(),
                        file = %upload.file_name,
                        "标识符重复，使用后出现的文件"
                    );
                    entry.insert(staged);
                }
            },
        }
    }
    Ok(structures)
}

/// 执行一次转换，任一单元失败则整体失败
pub fn convert(ctx: &Context, target: TargetKind, uploads: &[Upload]) -> Result<Vec<ScopedPath>> {
    if uploads.is_empty() {
        return Err(ValidationError::EmptyStructures.into());
    }
    let scratch = ctx.scratch_dir()?;
    let structures = stage(ctx, &scratch, uploads)?;
    info!(kind = %target, structures = structures.len(), "开始转换");

    let outputs = match target {
        TargetKind::Library => vec![Behavior::generate(ctx, None, None, structures)?],
        TargetKind::World => vec![World::generate(ctx, None, None, structures)?],
        TargetKind::SingleLibrary => structures
            .into_iter()
            .map(|(identifier, path)| {
                Behavior::generate(ctx, None, None, IndexMap::from([(identifier, path)]))
            })
            .collect::<Result<Vec<_>>>()?,
    };
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_from_file_name() {
        let upload = Upload::new("house.mcstructure", "/tmp/x");
        assert_eq!(upload.identifier().unwrap().to_string(), "mystructure:house");

        let upload = Upload::new("castle", "/tmp/x");
        assert_eq!(upload.identifier().unwrap().display_string(), "castle");

        let upload = Upload::from_path("/data/uploads/tower.mcstructure");
        assert_eq!(upload.file_name, "tower.mcstructure");
        assert_eq!(upload.identifier().unwrap().display_string(), "tower");

        assert!(Upload::new("a:b:c.mcstructure", "/tmp/x").identifier().is_err());
        assert!(matches!(
            Upload::new("...mcstructure", "/tmp/x").identifier(),
            Err(ValidationError::Identifier { .. })
        ));
    }

    #[test]
    fn target_names() {
        use clap::ValueEnum;
        let names: Vec<String> = TargetKind::value_variants()
            .iter()
            .map(|t| t.to_string())
            .collect();
        assert_eq!(names, ["library", "single-library", "world"]);
        assert_eq!(
            TargetKind::from_str("single-library", false).unwrap(),
            TargetKind::SingleLibrary
        );
    }
}
