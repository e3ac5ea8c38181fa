//! 错误类型

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 输入数据不合法，单次转换直接失败，不重试
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("无效的标识符 {text:?}: {reason}")]
    Identifier { text: String, reason: &'static str },

    #[error("无效的版本号: {0:?}")]
    Version(String),

    #[error("尺寸字段 {field} 必须为正数，实际为 {value}")]
    Size { field: &'static str, value: i32 },

    #[error("{field} 需要 {expected} 个整数，实际为 {actual} 个")]
    VectorLength {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("结构尺寸 {x}x{y}x{z} 过大")]
    SizeOverflow { x: i32, y: i32, z: i32 },

    #[error("尺寸不匹配: 需要 {expected} 个方块索引，实际为 {actual} 个")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("结构中没有任何方块")]
    NoBlocks,

    #[error("方块字段 {field} 不合法: {value}")]
    Block { field: &'static str, value: String },

    #[error("调色板索引越界: {index}（调色板大小 {len}）")]
    PaletteIndex { index: i32, len: usize },

    #[error("缺少字段 {0}")]
    MissingField(String),

    #[error("字段 {field} 类型错误，应为 {expected}")]
    FieldType { field: String, expected: &'static str },

    #[error("不支持的格式版本 {0}，仅支持 2")]
    UnsupportedFormatVersion(i64),

    #[error("清单字段 {field} 不合法: {reason}")]
    Manifest { field: &'static str, reason: String },

    #[error("校准数据字段 {field} 不合法: {reason}")]
    Calibration { field: &'static str, reason: String },

    #[error("重复的标识符 {0}")]
    DuplicateIdentifier(String),

    #[error("结构列表不能为空")]
    EmptyStructures,
}

impl ValidationError {
    pub(crate) fn manifest(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Manifest {
            field,
            reason: reason.into(),
        }
    }
}

/// 标签树编解码失败
#[derive(Debug, Error)]
pub enum TagError {
    #[error("数据在偏移 {0} 处意外结束")]
    UnexpectedEof(usize),

    #[error("未知的标签类型 {0}")]
    UnknownTag(u8),

    #[error("根标签必须是复合标签，实际为 {0}")]
    RootNotCompound(u8),

    #[error("标签嵌套过深")]
    TooDeep,

    #[error("字符串不是有效的 UTF-8")]
    Utf8,

    #[error("长度无效: {0}")]
    Length(i64),

    #[error("列表元素类型不一致")]
    MixedList,

    #[error("level.dat 头部声明长度 {declared}，实际为 {actual}")]
    LevelHeader { declared: usize, actual: usize },
}

/// 转换失败
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("归档失败 {path:?}: {reason}")]
    Archive { path: PathBuf, reason: String },

    #[error("标签树处理失败: {0}")]
    Tag(#[from] TagError),

    #[error("缺少校准数据 {key}，请提供一份参考导出的平坦世界 level.dat")]
    MissingCalibration { key: String },

    #[error("JSON 处理失败: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;

/// 为 IO 错误附加上下文
pub trait IoContext<T> {
    fn io_context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn io_context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|source| ConvertError::Io {
            context: context.into(),
            source,
        })
    }
}
