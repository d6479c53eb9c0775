use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use vq_types::{Asset, YuvType};

use crate::cli::CliArgs;
use crate::error::AppError;

const CLI_DATASET: &str = "cli";

/// One entry of an asset list file.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetEntry {
    #[serde(default = "default_dataset")]
    pub dataset: String,
    #[serde(default)]
    pub content_id: u32,
    #[serde(default)]
    pub asset_id: u32,
    pub ref_path: PathBuf,
    pub dis_path: PathBuf,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub yuv_type: YuvType,
}

fn default_dataset() -> String {
    CLI_DATASET.to_string()
}

impl AssetEntry {
    fn into_asset(self, base: Option<&Path>) -> Result<Asset, AppError> {
        let resolve = |path: PathBuf| match base {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        };
        Ok(Asset::builder(self.dataset)
            .content_id(self.content_id)
            .asset_id(self.asset_id)
            .ref_path(resolve(self.ref_path))
            .dis_path(resolve(self.dis_path))
            .width(self.width)
            .height(self.height)
            .yuv_type(self.yuv_type)
            .build()?)
    }
}

/// Reads a JSON array of assets; relative video paths resolve against the
/// file's directory.
pub fn load_assets(path: &Path) -> Result<Vec<Asset>, AppError> {
    let text = std::fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_assets(&text, path.parent()).map_err(|err| match err {
        AppError::Json { source, .. } => AppError::Json {
            path: Some(path.to_path_buf()),
            source,
        },
        other => other,
    })
}

pub fn parse_assets(text: &str, base: Option<&Path>) -> Result<Vec<Asset>, AppError> {
    let entries: Vec<AssetEntry> =
        serde_json::from_str(text).map_err(|source| AppError::Json { path: None, source })?;
    entries
        .into_iter()
        .map(|entry| entry.into_asset(base))
        .collect()
}

/// Assets named on the command line, either a list file or one pair.
pub fn assets_from_cli(cli: &CliArgs) -> Result<Vec<Asset>, AppError> {
    if let Some(path) = &cli.assets {
        return load_assets(path);
    }
    let (Some(ref_path), Some(dis_path), Some(width), Some(height)) =
        (&cli.ref_path, &cli.dis_path, cli.width, cli.height)
    else {
        return Err(AppError::usage(
            "either --assets or --ref/--dis/--width/--height is required",
        ));
    };
    let yuv_type = YuvType::from_str(&cli.yuv_type)?;
    let asset = Asset::builder(CLI_DATASET)
        .ref_path(ref_path.clone())
        .dis_path(dis_path.clone())
        .width(width)
        .height(height)
        .yuv_type(yuv_type)
        .build()?;
    Ok(vec![asset])
}
