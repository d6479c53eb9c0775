use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{TypesError, TypesResult};

/// Pixel format of the raw reference/distorted files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YuvType {
    #[default]
    Yuv420p,
    Yuv422p,
    Yuv444p,
    Yuv420p10le,
    Yuv422p10le,
    Yuv444p10le,
}

impl YuvType {
    pub fn as_str(&self) -> &'static str {
        match self {
            YuvType::Yuv420p => "yuv420p",
            YuvType::Yuv422p => "yuv422p",
            YuvType::Yuv444p => "yuv444p",
            YuvType::Yuv420p10le => "yuv420p10le",
            YuvType::Yuv422p10le => "yuv422p10le",
            YuvType::Yuv444p10le => "yuv444p10le",
        }
    }
}

impl FromStr for YuvType {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yuv420p" => Ok(YuvType::Yuv420p),
            "yuv422p" => Ok(YuvType::Yuv422p),
            "yuv444p" => Ok(YuvType::Yuv444p),
            "yuv420p10le" => Ok(YuvType::Yuv420p10le),
            "yuv422p10le" => Ok(YuvType::Yuv422p10le),
            "yuv444p10le" => Ok(YuvType::Yuv444p10le),
            other => Err(TypesError::UnknownYuvType {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for YuvType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference/distorted pair under evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    dataset: String,
    content_id: u32,
    asset_id: u32,
    ref_path: PathBuf,
    dis_path: PathBuf,
    width: u32,
    height: u32,
    yuv_type: YuvType,
}

impl Asset {
    /// Starts an asset of `dataset`; every other field is set by name.
    pub fn builder(dataset: impl Into<String>) -> AssetBuilder {
        AssetBuilder {
            dataset: dataset.into(),
            content_id: 0,
            asset_id: 0,
            ref_path: PathBuf::new(),
            dis_path: PathBuf::new(),
            width: 0,
            height: 0,
            yuv_type: YuvType::default(),
        }
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn content_id(&self) -> u32 {
        self.content_id
    }

    pub fn asset_id(&self) -> u32 {
        self.asset_id
    }

    pub fn ref_path(&self) -> &Path {
        &self.ref_path
    }

    pub fn dis_path(&self) -> &Path {
        &self.dis_path
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn yuv_type(&self) -> YuvType {
        self.yuv_type
    }

    /// Human readable name, stable for identical assets.
    pub fn identifier(&self) -> String {
        format!(
            "{}_{}_{}_{}_vs_{}_{}x{}_{}",
            self.dataset,
            self.content_id,
            self.asset_id,
            file_label(&self.ref_path),
            file_label(&self.dis_path),
            self.width,
            self.height,
            self.yuv_type
        )
    }

    /// Filesystem-safe name for per-asset artifacts such as log files.
    ///
    /// Two assets whose file names collide but whose full paths differ still
    /// map to distinct stems through the digest suffix.
    pub fn artifact_stem(&self) -> String {
        let identifier = self.identifier();
        let mut hasher = Sha256::new();
        hasher.update(identifier.as_bytes());
        hasher.update(self.ref_path.to_string_lossy().as_bytes());
        hasher.update(self.dis_path.to_string_lossy().as_bytes());
        let hash = hex::encode(hasher.finalize());
        format!("{}-{}", sanitize_component(&identifier), &hash[..12])
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier())
    }
}

/// Named-field construction for [`Asset`], validated by [`AssetBuilder::build`].
#[derive(Debug, Clone)]
pub struct AssetBuilder {
    dataset: String,
    content_id: u32,
    asset_id: u32,
    ref_path: PathBuf,
    dis_path: PathBuf,
    width: u32,
    height: u32,
    yuv_type: YuvType,
}

impl AssetBuilder {
    pub fn content_id(mut self, content_id: u32) -> Self {
        self.content_id = content_id;
        self
    }

    pub fn asset_id(mut self, asset_id: u32) -> Self {
        self.asset_id = asset_id;
        self
    }

    pub fn ref_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ref_path = path.into();
        self
    }

    pub fn dis_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dis_path = path.into();
        self
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    pub fn yuv_type(mut self, yuv_type: YuvType) -> Self {
        self.yuv_type = yuv_type;
        self
    }

    pub fn build(self) -> TypesResult<Asset> {
        if self.dataset.trim().is_empty() {
            return Err(TypesError::invalid_asset("dataset name is empty"));
        }
        if self.ref_path.as_os_str().is_empty() || self.dis_path.as_os_str().is_empty() {
            return Err(TypesError::invalid_asset(
                "reference and distorted paths are required",
            ));
        }
        if self.width == 0 || self.height == 0 {
            return Err(TypesError::invalid_asset(format!(
                "geometry must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(Asset {
            dataset: self.dataset,
            content_id: self.content_id,
            asset_id: self.asset_id,
            ref_path: self.ref_path,
            dis_path: self.dis_path,
            width: self.width,
            height: self.height,
            yuv_type: self.yuv_type,
        })
    }
}

fn file_label(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_string())
}

fn sanitize_component(value: &str) -> String {
    let sanitized: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = sanitized.trim_matches('-');
    if trimmed.is_empty() {
        "asset".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ref_path: &str) -> Asset {
        Asset::builder("test")
            .asset_id(1)
            .ref_path(ref_path)
            .dis_path("/data/dis/foreman_q20.yuv")
            .width(352)
            .height(288)
            .build()
            .unwrap()
    }

    #[test]
    fn rejects_zero_geometry() {
        let err = Asset::builder("test")
            .ref_path("a.yuv")
            .dis_path("b.yuv")
            .height(288)
            .build()
            .unwrap_err();
        assert!(matches!(err, TypesError::InvalidAsset { .. }));
    }

    #[test]
    fn builder_sets_fields_by_name() {
        let asset = Asset::builder("test")
            .content_id(7)
            .asset_id(3)
            .ref_path("/r.yuv")
            .dis_path("/d.yuv")
            .width(64)
            .height(32)
            .yuv_type(YuvType::Yuv444p)
            .build()
            .unwrap();
        assert_eq!((asset.content_id(), asset.asset_id()), (7, 3));
        assert_eq!((asset.width(), asset.height()), (64, 32));
        assert_eq!(asset.yuv_type(), YuvType::Yuv444p);

        let missing_dis = Asset::builder("test")
            .ref_path("/r.yuv")
            .width(64)
            .height(32)
            .build();
        assert!(matches!(missing_dis, Err(TypesError::InvalidAsset { .. })));
    }

    #[test]
    fn identifier_uses_file_stems_and_geometry() {
        let asset = sample("/data/ref/foreman.yuv");
        assert_eq!(
            asset.identifier(),
            "test_0_1_foreman_vs_foreman_q20_352x288_yuv420p"
        );
    }

    #[test]
    fn artifact_stem_distinguishes_directories() {
        let a = sample("/data/ref/foreman.yuv");
        let b = sample("/other/ref/foreman.yuv");
        assert_eq!(a.identifier(), b.identifier());
        assert_ne!(a.artifact_stem(), b.artifact_stem());
        assert_eq!(a.artifact_stem(), sample("/data/ref/foreman.yuv").artifact_stem());
        assert!(!a.artifact_stem().contains('/'));
    }

    #[test]
    fn yuv_type_parses_case_insensitively() {
        assert_eq!("YUV420P10LE".parse::<YuvType>().unwrap(), YuvType::Yuv420p10le);
        assert!("rgb24".parse::<YuvType>().is_err());
    }
}
