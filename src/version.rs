//! 语义化版本号

use crate::error::ValidationError;
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// `major.minor.patch[-pre]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub pre: Option<String>,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
        }
    }

    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::Version(text.to_string());
        let (core, pre) = match text.split_once('-') {
            Some((core, pre)) if !pre.is_empty() => (core, Some(pre.to_string())),
            Some(_) => return Err(invalid()),
            None => (text, None),
        };
        let parts: Vec<u32> = core
            .split('.')
            .map(|p| p.parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<_, _>>()?;
        match parts[..] {
            [major, minor, patch] => Ok(Self {
                major,
                minor,
                patch,
                pre,
            }),
            _ => Err(invalid()),
        }
    }

    /// 取点分版本号的前三段，如 `1.19.60.24` -> `1.19.60`
    pub fn truncate(text: &str) -> Result<Self, ValidationError> {
        let core: Vec<&str> = text.split('.').take(3).collect();
        Self::parse(&core.join("."))
    }

    pub fn is_release(&self) -> bool {
        self.pre.is_none()
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(VersionVisitor)
    }
}

/// 同时接受 `"1.2.3"` 与 `[1, 2, 3]`
struct VersionVisitor;

impl<'de> Visitor<'de> for VersionVisitor {
    type Value = Version;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("版本字符串或三个整数组成的数组")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Version, E> {
        Version::parse(v).map_err(E::custom)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Version, A::Error> {
        let mut parts = Vec::with_capacity(3);
        while let Some(part) = seq.next_element::<u32>()? {
            parts.push(part);
        }
        match parts[..] {
            [major, minor, patch] => Ok(Version::new(major, minor, patch)),
            _ => Err(de::Error::invalid_length(parts.len(), &self)),
        }
    }
}

/// 正式版本写成 `[major, minor, patch]`，预发布版本写成字符串
pub mod array {
    use super::*;

    pub fn serialize<S: Serializer>(version: &Version, serializer: S) -> Result<S::Ok, S::Error> {
        if !version.is_release() {
            return serializer.collect_str(version);
        }
        let mut seq = serializer.serialize_seq(Some(3))?;
        seq.serialize_element(&version.major)?;
        seq.serialize_element(&version.minor)?;
        seq.serialize_element(&version.patch)?;
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Version, D::Error> {
        Version::deserialize(deserializer)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            version: &Option<Version>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match version {
                Some(v) => super::serialize(v, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Version>, D::Error> {
            Option::<Version>::deserialize(deserializer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_orders() {
        let a = Version::parse("1.19.50").unwrap();
        let b = Version::parse("1.20.0").unwrap();
        let beta = Version::parse("1.20.0-beta").unwrap();
        assert!(a < b);
        assert!(beta < b);
        assert!(a < beta);
        assert_eq!(b.to_string(), "1.20.0");
        assert_eq!(beta.to_string(), "1.20.0-beta");
    }

    #[test]
    fn truncates_block_versions() {
        assert_eq!(
            Version::truncate("1.19.60.24").unwrap(),
            Version::new(1, 19, 60)
        );
        assert!(Version::truncate("1.19").is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("1.2").is_err());
        assert!(Version::parse("1.2.x").is_err());
        assert!(Version::parse("1.2.3-").is_err());
    }

    #[test]
    fn array_form() {
        #[derive(Serialize, Deserialize)]
        struct Holder {
            #[serde(with = "array")]
            v: Version,
        }
        let json = serde_json::to_string(&Holder {
            v: Version::new(1, 13, 0),
        })
        .unwrap();
        assert_eq!(json, r#"{"v":[1,13,0]}"#);
        let back: Holder = serde_json::from_str(r#"{"v":"1.2.3-rc"}"#).unwrap();
        assert_eq!(back.v.pre.as_deref(), Some("rc"));
    }
}
