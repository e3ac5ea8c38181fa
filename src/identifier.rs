//! 带命名空间的结构标识符

use crate::error::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// 省略命名空间时使用的默认值
///
/// 游戏会对显式的 `mystructure` 多级目录给出警告，因此默认命名空间下只允许一级路径
pub const DEFAULT_NAMESPACE: &str = "mystructure";

const NAMESPACE_DELIMITER: char = ':';
const PATH_DELIMITER: char = '/';

static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[^:/]+:)?(?:[^:/]+/)*[^:/]+$").expect("标识符正则表达式无效")
});

/// `namespace:seg/seg2/...`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    namespace: String,
    path: Vec<String>,
}

impl Identifier {
    pub fn new(namespace: Option<&str>, path: Vec<String>) -> Result<Self, ValidationError> {
        let namespace = namespace.unwrap_or(DEFAULT_NAMESPACE);
        let text = format!("{}:{}", namespace, path.join("/"));
        let invalid = |reason| ValidationError::Identifier {
            text: text.clone(),
            reason,
        };

        if namespace.trim().is_empty() {
            return Err(invalid("命名空间不能为空"));
        }
        if path.is_empty() {
            return Err(invalid("路径不能为空"));
        }
        let bad_segment = |s: &str| {
            s.is_empty() || s.contains(NAMESPACE_DELIMITER) || s.contains(PATH_DELIMITER)
        };
        if bad_segment(namespace) || path.iter().any(|s| bad_segment(s)) {
            return Err(invalid("包含非法的分隔符"));
        }
        // 各段都会直接用作文件路径
        let relative = |s: &str| s == "." || s == "..";
        if relative(namespace) || path.iter().any(|s| relative(s)) {
            return Err(invalid("不能包含 `.` 或 `..`"));
        }
        if namespace == DEFAULT_NAMESPACE && path.len() != 1 {
            return Err(invalid("默认命名空间下不允许多级路径"));
        }

        Ok(Self {
            namespace: namespace.to_string(),
            path,
        })
    }

    /// 解析 `namespace:a/b` 或省略命名空间的 `name`
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        if !IDENTIFIER_PATTERN.is_match(text) {
            return Err(ValidationError::Identifier {
                text: text.to_string(),
                reason: "格式应为 (namespace:)?(segment/)*segment",
            });
        }
        let (namespace, path) = match text.split_once(NAMESPACE_DELIMITER) {
            Some((namespace, path)) => (Some(namespace), path),
            None => (None, text),
        };
        Self::new(
            namespace,
            path.split(PATH_DELIMITER).map(str::to_string).collect(),
        )
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn is_default_namespace(&self) -> bool {
        self.namespace == DEFAULT_NAMESPACE
    }

    /// 相对文件路径，默认命名空间直接用名称，否则为 `namespace/a/b.ext`
    pub fn to_path(&self, extension: &str) -> PathBuf {
        let segments: Vec<&str> = self.function_segments().collect();
        let mut path = PathBuf::new();
        if let Some((last, dirs)) = segments.split_last() {
            path.extend(dirs);
            path.push(format!("{}.{}", last, extension));
        }
        path
    }

    /// 不带扩展名、以 `/` 连接的相对路径，用于函数引用
    pub fn function_path(&self) -> String {
        self.function_segments().collect::<Vec<_>>().join("/")
    }

    fn function_segments(&self) -> impl Iterator<Item = &str> {
        let namespace = (!self.is_default_namespace()).then_some(self.namespace.as_str());
        namespace
            .into_iter()
            .chain(self.path.iter().map(String::as_str))
    }

    /// 省略默认命名空间的显示名称
    pub fn display_string(&self) -> String {
        if self.is_default_namespace() {
            self.path.join("/")
        } else {
            self.to_string()
        }
    }

    /// 可以直接用作文件名的显示名称
    pub fn file_name(&self) -> String {
        sanitize_file_name(&self.display_string())
    }
}

/// 替换路径分隔符等文件名中的非法字符
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.namespace,
            NAMESPACE_DELIMITER,
            self.path.join("/")
        )
    }
}

impl FromStr for Identifier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn bare_name_uses_default_namespace() {
        let id = Identifier::parse("house").unwrap();
        assert_eq!(id.namespace(), DEFAULT_NAMESPACE);
        assert_eq!(id.to_string(), "mystructure:house");
        assert_eq!(id.display_string(), "house");
        assert_eq!(id.to_path("mcstructure"), Path::new("house.mcstructure"));
        assert_eq!(id.function_path(), "house");
    }

    #[test]
    fn namespaced_round_trip() {
        for text in ["town:a/b", "town:house", "x:y/z/w"] {
            let id = Identifier::parse(text).unwrap();
            assert_eq!(id.to_string(), text);
            assert_eq!(Identifier::parse(&id.to_string()).unwrap(), id);
            assert_eq!(id.display_string(), text);
        }
        let id = Identifier::parse("town:a/b").unwrap();
        assert_eq!(
            id.to_path("mcfunction"),
            Path::new("town").join("a").join("b.mcfunction")
        );
        assert_eq!(id.function_path(), "town/a/b");
        assert_eq!(id.file_name(), "town_a_b");
    }

    #[test]
    fn explicit_default_namespace_with_one_segment_is_allowed() {
        let explicit = Identifier::parse("mystructure:house").unwrap();
        assert_eq!(explicit, Identifier::parse("house").unwrap());
    }

    #[test]
    fn explicit_default_namespace_with_directories_fails() {
        assert!(Identifier::parse("mystructure:a/b").is_err());
        assert!(Identifier::parse("a/b").is_err());
    }

    #[test]
    fn malformed_text_fails() {
        for text in ["", ":a", "a:", "a::b", "a:b//c", "/a", "a/", " :a", "a:b:c"] {
            assert!(Identifier::parse(text).is_err(), "{text:?} 应当失败");
        }
        for text in ["..", ".", "town:a/../../../x", "town:./a", "..:a", ".:a"] {
            assert!(
                matches!(
                    Identifier::parse(text),
                    Err(ValidationError::Identifier { .. })
                ),
                "{text:?} 应当失败"
            );
        }
        assert!(Identifier::new(Some("town"), vec!["..".into()]).is_err());
        assert_eq!(Identifier::parse("town:.hidden/a..b").unwrap().path(), [".hidden", "a..b"]);
    }

    #[test]
    fn sanitizes_file_names() {
        assert_eq!(sanitize_file_name("a:b/c?"), "a_b_c_");
        assert_eq!(sanitize_file_name("普通 名称"), "普通 名称");
    }
}
