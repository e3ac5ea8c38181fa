//! 基岩版小端序 NBT 的读取与写入
//!
//! 结构文件与存档都使用小端序，直接映射到 `fastnbt::Value`

use crate::error::TagError;
use crate::tag::Compound;
use fastnbt::{ByteArray, IntArray, LongArray, Value};

const TAG_END: u8 = 0;
const TAG_BYTE: u8 = 1;
const TAG_SHORT: u8 = 2;
const TAG_INT: u8 = 3;
const TAG_LONG: u8 = 4;
const TAG_FLOAT: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_BYTE_ARRAY: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_LIST: u8 = 9;
const TAG_COMPOUND: u8 = 10;
const TAG_INT_ARRAY: u8 = 11;
const TAG_LONG_ARRAY: u8 = 12;

/// 最大嵌套深度
const MAX_DEPTH: usize = 512;

/// level.dat 头部长度（存储版本 + 数据长度）
pub const LEVEL_HEADER_SIZE: usize = 8;

/// 读取根复合标签（根名称被丢弃）
pub fn from_bytes(data: &[u8]) -> Result<Value, TagError> {
    let mut reader = Reader { data, pos: 0 };
    let tag = reader.u8()?;
    if tag != TAG_COMPOUND {
        return Err(TagError::RootNotCompound(tag));
    }
    reader.string()?;
    reader.payload(TAG_COMPOUND, 0)
}

/// 写入根复合标签，根名称为空
pub fn to_bytes(value: &Value) -> Result<Vec<u8>, TagError> {
    let tag = tag_id(value);
    if tag != TAG_COMPOUND {
        return Err(TagError::RootNotCompound(tag));
    }
    let mut out = Vec::new();
    out.push(TAG_COMPOUND);
    write_string(&mut out, "")?;
    write_payload(&mut out, value, 0)?;
    Ok(out)
}

/// 读取带 8 字节头部的 level.dat，返回 (存储版本, 标签树)
pub fn read_level_dat(data: &[u8]) -> Result<(i32, Value), TagError> {
    if data.len() < LEVEL_HEADER_SIZE {
        return Err(TagError::UnexpectedEof(data.len()));
    }
    let storage_version = i32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let declared = i32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    let body = &data[LEVEL_HEADER_SIZE..];
    if declared < 0 || declared as usize != body.len() {
        return Err(TagError::LevelHeader {
            declared: declared.max(0) as usize,
            actual: body.len(),
        });
    }
    Ok((storage_version, from_bytes(body)?))
}

/// 写入带 8 字节头部的 level.dat
pub fn write_level_dat(storage_version: i32, value: &Value) -> Result<Vec<u8>, TagError> {
    let body = to_bytes(value)?;
    let len = i32::try_from(body.len()).map_err(|_| TagError::Length(body.len() as i64))?;
    let mut out = Vec::with_capacity(LEVEL_HEADER_SIZE + body.len());
    out.extend_from_slice(&storage_version.to_le_bytes());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], TagError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or(TagError::UnexpectedEof(self.pos))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], TagError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    fn u8(&mut self) -> Result<u8, TagError> {
        Ok(self.take(1)?[0])
    }

    fn len(&mut self) -> Result<usize, TagError> {
        let len = i32::from_le_bytes(self.array()?);
        usize::try_from(len).map_err(|_| TagError::Length(len as i64))
    }

    fn string(&mut self) -> Result<String, TagError> {
        let len = u16::from_le_bytes(self.array()?) as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| TagError::Utf8)
    }

    fn payload(&mut self, tag: u8, depth: usize) -> Result<Value, TagError> {
        if depth > MAX_DEPTH {
            return Err(TagError::TooDeep);
        }
        let value = match tag {
            TAG_BYTE => Value::Byte(self.u8()? as i8),
            TAG_SHORT => Value::Short(i16::from_le_bytes(self.array()?)),
            TAG_INT => Value::Int(i32::from_le_bytes(self.array()?)),
            TAG_LONG => Value::Long(i64::from_le_bytes(self.array()?)),
            TAG_FLOAT => Value::Float(f32::from_le_bytes(self.array()?)),
            TAG_DOUBLE => Value::Double(f64::from_le_bytes(self.array()?)),
            TAG_BYTE_ARRAY => {
                let len = self.len()?;
                let bytes = self.take(len)?;
                Value::ByteArray(ByteArray::new(bytes.iter().map(|&b| b as i8).collect()))
            }
            TAG_STRING => Value::String(self.string()?),
            TAG_LIST => {
                let elem = self.u8()?;
                let len = self.len()?;
                if elem == TAG_END && len > 0 {
                    return Err(TagError::UnknownTag(elem));
                }
                // 长度来自输入，不能直接用于预分配
                let mut list = Vec::with_capacity(len.min(4096));
                for _ in 0..len {
                    list.push(self.payload(elem, depth + 1)?);
                }
                Value::List(list)
            }
            TAG_COMPOUND => {
                let mut map = Compound::new();
                loop {
                    let child = self.u8()?;
                    if child == TAG_END {
                        break;
                    }
                    let name = self.string()?;
                    let value = self.payload(child, depth + 1)?;
                    map.insert(name, value);
                }
                Value::Compound(map)
            }
            TAG_INT_ARRAY => {
                let len = self.len()?;
                let bytes = self.take(len.checked_mul(4).ok_or(TagError::Length(len as i64))?)?;
                let arr = bytes
                    .chunks_exact(4)
                    .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect();
                Value::IntArray(IntArray::new(arr))
            }
            TAG_LONG_ARRAY => {
                let len = self.len()?;
                let bytes = self.take(len.checked_mul(8).ok_or(TagError::Length(len as i64))?)?;
                let arr = bytes
                    .chunks_exact(8)
                    .map(|c| i64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                    .collect();
                Value::LongArray(LongArray::new(arr))
            }
            other => return Err(TagError::UnknownTag(other)),
        };
        Ok(value)
    }
}

fn tag_id(value: &Value) -> u8 {
    match value {
        Value::Byte(_) => TAG_BYTE,
        Value::Short(_) => TAG_SHORT,
        Value::Int(_) => TAG_INT,
        Value::Long(_) => TAG_LONG,
        Value::Float(_) => TAG_FLOAT,
        Value::Double(_) => TAG_DOUBLE,
        Value::ByteArray(_) => TAG_BYTE_ARRAY,
        Value::String(_) => TAG_STRING,
        Value::List(_) => TAG_LIST,
        Value::Compound(_) => TAG_COMPOUND,
        Value::IntArray(_) => TAG_INT_ARRAY,
        Value::LongArray(_) => TAG_LONG_ARRAY,
    }
}

fn write_string(out: &mut Vec<u8>, s: &str) -> Result<(), TagError> {
    let len = u16::try_from(s.len()).map_err(|_| TagError::Length(s.len() as i64))?;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(s.as_bytes());
    Ok(())
}

fn write_len(out: &mut Vec<u8>, len: usize) -> Result<(), TagError> {
    let len = i32::try_from(len).map_err(|_| TagError::Length(len as i64))?;
    out.extend_from_slice(&len.to_le_bytes());
    Ok(())
}

fn write_payload(out: &mut Vec<u8>, value: &Value, depth: usize) -> Result<(), TagError> {
    if depth > MAX_DEPTH {
        return Err(TagError::TooDeep);
    }
    match value {
        Value::Byte(v) => out.push(*v as u8),
        Value::Short(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::Int(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::Long(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::Float(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::Double(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::ByteArray(arr) => {
            write_len(out, arr.len())?;
            out.extend(arr.iter().map(|&b| b as u8));
        }
        Value::String(s) => write_string(out, s)?,
        Value::List(list) => {
            let elem = list.first().map_or(TAG_END, tag_id);
            if list.iter().any(|v| tag_id(v) != elem) {
                return Err(TagError::MixedList);
            }
            out.push(elem);
            write_len(out, list.len())?;
            for v in list {
                write_payload(out, v, depth + 1)?;
            }
        }
        Value::Compound(map) => {
            // 按键排序，保证输出稳定
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            for (name, v) in entries {
                out.push(tag_id(v));
                write_string(out, name)?;
                write_payload(out, v, depth + 1)?;
            }
            out.push(TAG_END);
        }
        Value::IntArray(arr) => {
            write_len(out, arr.len())?;
            for v in arr.iter() {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        Value::LongArray(arr) => {
            write_len(out, arr.len())?;
            for v in arr.iter() {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
    }
    Ok(())
}
