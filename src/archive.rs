//! 打包与临时目录

use crate::error::{ConvertError, IoContext, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// 把目录打包为单个归档文件
pub trait Archiver: Send + Sync {
    /// `include_enclosing_dir` 为 false 时只打包目录中的内容。
    /// `target` 已存在或 `source_dir` 不是目录时失败。
    fn zip(&self, target: &Path, source_dir: &Path, include_enclosing_dir: bool)
        -> Result<PathBuf>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiver;

fn archive_error(path: &Path, reason: impl ToString) -> ConvertError {
    ConvertError::Archive {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

impl Archiver for ZipArchiver {
    fn zip(
        &self,
        target: &Path,
        source_dir: &Path,
        include_enclosing_dir: bool,
    ) -> Result<PathBuf> {
        if target.exists() {
            return Err(archive_error(target, "目标文件已存在"));
        }
        if !source_dir.is_dir() {
            return Err(archive_error(source_dir, "不是目录"));
        }
        let base = match source_dir.parent() {
            Some(parent) if include_enclosing_dir => parent,
            _ => source_dir,
        };

        let file = File::create(target).io_context(format!("无法创建 {:?}", target))?;
        let mut writer = ZipWriter::new(file);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in WalkDir::new(source_dir).sort_by_file_name() {
            let entry = entry.map_err(|e| archive_error(source_dir, e))?;
            let relative = entry
                .path()
                .strip_prefix(base)
                .map_err(|e| archive_error(entry.path(), e))?;
            // 归档内统一使用 `/`
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if name.is_empty() {
                continue;
            }
            if entry.file_type().is_dir() {
                writer
                    .add_directory(name, options)
                    .map_err(|e| archive_error(target, e))?;
            } else {
                writer
                    .start_file(name, options)
                    .map_err(|e| archive_error(target, e))?;
                let mut source = File::open(entry.path())
                    .io_context(format!("无法读取 {:?}", entry.path()))?;
                io::copy(&mut source, &mut writer)
                    .io_context(format!("无法写入 {:?}", target))?;
            }
        }
        writer.finish().map_err(|e| archive_error(target, e))?;
        debug!(?target, ?source_dir, "已打包");
        Ok(target.to_path_buf())
    }
}

/// 生成的文件及其所在的临时目录，释放时整个目录被删除
#[derive(Debug)]
pub struct ScopedPath {
    path: PathBuf,
    scratch: TempDir,
}

impl ScopedPath {
    pub fn new(path: PathBuf, scratch: TempDir) -> Self {
        Self { path, scratch }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// 复制到 `dir` 下并释放临时目录
    pub fn persist_to(self, dir: &Path) -> Result<PathBuf> {
        let name = self
            .path
            .file_name()
            .ok_or_else(|| archive_error(&self.path, "没有文件名"))?;
        fs::create_dir_all(dir).io_context(format!("无法创建目录 {:?}", dir))?;
        let target = dir.join(name);
        fs::copy(&self.path, &target)
            .io_context(format!("无法复制 {:?} -> {:?}", self.path, target))?;
        debug!(scratch = ?self.scratch.path(), "临时目录已释放");
        Ok(target)
    }
}
