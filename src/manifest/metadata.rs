use crate::error::ValidationError;
use crate::version::Version;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 清单的 `metadata` 段
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMetadata", into = "RawMetadata")]
pub struct ManifestMetadata {
    authors: Vec<String>,
    url: Option<String>,
    license: Option<String>,
    generated_with: IndexMap<String, Vec<Version>>,
}

#[derive(Default, Serialize, Deserialize)]
struct RawMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    license: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    generated_with: IndexMap<String, Vec<Version>>,
}

impl ManifestMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Result<Self, ValidationError> {
        let author = author.into();
        if author.trim().is_empty() {
            return Err(ValidationError::manifest("metadata.authors", "作者不能为空"));
        }
        self.authors.push(author);
        Ok(self)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_license(mut self, license: impl Into<String>) -> Result<Self, ValidationError> {
        let license = license.into();
        if license.trim().is_empty() {
            return Err(ValidationError::manifest("metadata.license", "许可证不能为空"));
        }
        self.license = Some(license);
        Ok(self)
    }

    /// 记录生成工具，同名工具的版本追加到已有列表
    pub fn with_generator(
        mut self,
        name: impl Into<String>,
        versions: impl IntoIterator<Item = Version>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let versions: Vec<Version> = versions.into_iter().collect();
        check_generator(&name, &versions)?;
        self.generated_with.entry(name).or_default().extend(versions);
        Ok(self)
    }

    pub fn authors(&self) -> &[String] {
        &self.authors
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn license(&self) -> Option<&str> {
        self.license.as_deref()
    }

    pub fn generated_with(&self) -> &IndexMap<String, Vec<Version>> {
        &self.generated_with
    }
}

fn check_generator(name: &str, versions: &[Version]) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::manifest(
            "metadata.generated_with",
            "工具名不能为空",
        ));
    }
    if versions.is_empty() {
        return Err(ValidationError::manifest(
            "metadata.generated_with",
            format!("{} 没有版本", name),
        ));
    }
    Ok(())
}

impl TryFrom<RawMetadata> for ManifestMetadata {
    type Error = ValidationError;

    fn try_from(raw: RawMetadata) -> Result<Self, Self::Error> {
        let mut metadata = ManifestMetadata {
            url: raw.url,
            ..Default::default()
        };
        for author in raw.authors {
            metadata = metadata.with_author(author)?;
        }
        if let Some(license) = raw.license {
            metadata = metadata.with_license(license)?;
        }
        for (name, versions) in raw.generated_with {
            metadata = metadata.with_generator(name, versions)?;
        }
        Ok(metadata)
    }
}

impl From<ManifestMetadata> for RawMetadata {
    fn from(metadata: ManifestMetadata) -> Self {
        Self {
            authors: metadata.authors,
            url: metadata.url,
            license: metadata.license,
            generated_with: metadata.generated_with,
        }
    }
}
