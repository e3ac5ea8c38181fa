//! 标签树的类型化视图
//!
//! 解码器只通过这里访问 `fastnbt::Value`，缺失或类型不符的字段统一报告字段路径

use crate::error::ValidationError;
use fastnbt::{IntArray, Value};
use std::collections::HashMap;

/// 复合标签
pub type Compound = HashMap<String, Value>;

/// 单个标签的类型化视图
pub trait TagExt {
    fn as_compound(&self) -> Option<&Compound>;
    fn as_list(&self) -> Option<&[Value]>;
    fn as_int(&self) -> Option<i32>;
    fn as_long(&self) -> Option<i64>;
    fn as_string(&self) -> Option<&str>;
    /// 整数列表，同时接受 List<Int> 与 IntArray
    fn as_int_list(&self) -> Option<Vec<i32>>;
}

impl TagExt for Value {
    fn as_compound(&self) -> Option<&Compound> {
        match self {
            Value::Compound(map) => Some(map),
            _ => None,
        }
    }

    fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn as_int_list(&self) -> Option<Vec<i32>> {
        match self {
            Value::IntArray(arr) => Some(arr.iter().copied().collect()),
            Value::List(list) => list.iter().map(TagExt::as_int).collect(),
            _ => None,
        }
    }
}

/// 复合标签的按名查找，`path` 仅用于错误信息
pub struct Fields<'a> {
    map: &'a Compound,
    path: String,
}

impl<'a> Fields<'a> {
    pub fn root(map: &'a Compound) -> Self {
        Self {
            map,
            path: String::new(),
        }
    }

    pub fn of(value: &'a Value, path: &str) -> Result<Self, ValidationError> {
        value
            .as_compound()
            .map(|map| Self {
                map,
                path: path.to_string(),
            })
            .ok_or_else(|| type_error(path, "compound"))
    }

    fn field_path(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.path, name)
        }
    }

    pub fn get_by_name(&self, name: &str) -> Option<&'a Value> {
        self.map.get(name)
    }

    pub fn required(&self, name: &str) -> Result<&'a Value, ValidationError> {
        self.get_by_name(name)
            .ok_or_else(|| ValidationError::MissingField(self.field_path(name)))
    }

    pub fn compound(&self, name: &str) -> Result<Fields<'a>, ValidationError> {
        Fields::of(self.required(name)?, &self.field_path(name))
    }

    pub fn opt_compound(&self, name: &str) -> Result<Option<Fields<'a>>, ValidationError> {
        self.get_by_name(name)
            .map(|v| Fields::of(v, &self.field_path(name)))
            .transpose()
    }

    pub fn list(&self, name: &str) -> Result<&'a [Value], ValidationError> {
        self.required(name)?
            .as_list()
            .ok_or_else(|| type_error(&self.field_path(name), "list"))
    }

    pub fn opt_list(&self, name: &str) -> Result<&'a [Value], ValidationError> {
        match self.get_by_name(name) {
            Some(v) => v
                .as_list()
                .ok_or_else(|| type_error(&self.field_path(name), "list")),
            None => Ok(&[]),
        }
    }

    pub fn int(&self, name: &str) -> Result<i32, ValidationError> {
        self.required(name)?
            .as_int()
            .ok_or_else(|| type_error(&self.field_path(name), "int"))
    }

    pub fn long(&self, name: &str) -> Result<i64, ValidationError> {
        self.required(name)?
            .as_long()
            .ok_or_else(|| type_error(&self.field_path(name), "long"))
    }

    pub fn string(&self, name: &str) -> Result<&'a str, ValidationError> {
        self.required(name)?
            .as_string()
            .ok_or_else(|| type_error(&self.field_path(name), "string"))
    }

    pub fn int_list(&self, name: &str) -> Result<Vec<i32>, ValidationError> {
        self.required(name)?
            .as_int_list()
            .ok_or_else(|| type_error(&self.field_path(name), "list<int>"))
    }

    pub fn as_map(&self) -> &'a Compound {
        self.map
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

fn type_error(path: &str, expected: &'static str) -> ValidationError {
    ValidationError::FieldType {
        field: path.to_string(),
        expected,
    }
}

// ============== 构造 ==============

pub fn int_list(values: &[i32]) -> Value {
    Value::List(values.iter().copied().map(Value::Int).collect())
}

pub fn int_array(values: &[i32]) -> Value {
    Value::IntArray(IntArray::new(values.to_vec()))
}

pub fn string(value: impl Into<String>) -> Value {
    Value::String(value.into())
}

pub fn compound<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Value {
    Value::Compound(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        compound([
            ("size", int_list(&[1, 2, 3])),
            ("packed", int_array(&[4, 5])),
            ("name", string("stone")),
            ("tick", Value::Long(7)),
            ("inner", compound([("v", Value::Int(1))])),
        ])
    }

    #[test]
    fn typed_lookups() {
        let value = sample();
        let root = Fields::of(&value, "").unwrap();
        assert_eq!(root.int_list("size").unwrap(), vec![1, 2, 3]);
        assert_eq!(root.int_list("packed").unwrap(), vec![4, 5]);
        assert_eq!(root.string("name").unwrap(), "stone");
        assert_eq!(root.long("tick").unwrap(), 7);
        assert_eq!(root.compound("inner").unwrap().int("v").unwrap(), 1);
        assert!(root.opt_compound("nothing").unwrap().is_none());
        assert!(root.opt_list("nothing").unwrap().is_empty());
    }

    #[test]
    fn errors_carry_field_path() {
        let value = sample();
        let root = Fields::of(&value, "").unwrap();
        let inner = root.compound("inner").unwrap();
        assert_eq!(
            inner.int("missing").unwrap_err(),
            ValidationError::MissingField("inner.missing".into())
        );
        assert_eq!(
            root.int("name").unwrap_err(),
            ValidationError::FieldType {
                field: "name".into(),
                expected: "int"
            }
        );
    }
}
