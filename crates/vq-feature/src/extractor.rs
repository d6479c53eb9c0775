use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vq_process::ProgramInvocation;
use vq_types::{Asset, ExecutorId, feature_scores_key};

use crate::error::FeatureError;
use crate::spec::AtomSelection;

/// One external per-frame feature extractor program.
///
/// Invoked as `<program> <leading_args..> <yuv_type> <ref> <dis> <w> <h>`;
/// it prints one `"<atom>: <index> <value>"` series per atom on stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorDefinition {
    pub type_tag: String,
    pub version: String,
    pub program: PathBuf,
    #[serde(default)]
    pub leading_args: Vec<String>,
    pub atoms: Vec<String>,
}

impl ExtractorDefinition {
    pub fn executor_id(&self) -> ExecutorId {
        ExecutorId::new(&self.type_tag, &self.version)
    }

    pub fn scores_key(&self, atom: &str) -> String {
        feature_scores_key(&self.type_tag, atom)
    }

    pub fn log_path(&self, workdir: &Path, asset: &Asset) -> PathBuf {
        workdir.join(format!(
            "{}_{}.log",
            self.executor_id(),
            asset.artifact_stem()
        ))
    }

    pub fn invocation(&self, asset: &Asset) -> ProgramInvocation {
        ProgramInvocation::new(&self.program)
            .args(&self.leading_args)
            .asset_args(asset)
    }

    pub fn resolve_atoms<'a>(
        &'a self,
        selection: &'a AtomSelection,
    ) -> Result<Vec<&'a str>, FeatureError> {
        match selection {
            AtomSelection::All => Ok(self.atoms.iter().map(String::as_str).collect()),
            AtomSelection::Atoms(requested) => requested
                .iter()
                .map(|atom| {
                    if self.atoms.iter().any(|known| known == atom) {
                        Ok(atom.as_str())
                    } else {
                        Err(FeatureError::UnknownAtom {
                            type_tag: self.type_tag.clone(),
                            atom: atom.clone(),
                        })
                    }
                })
                .collect(),
        }
    }
}

/// Extractors available to an assembler, keyed by type tag.
#[derive(Debug, Clone, Default)]
pub struct ExtractorCatalog {
    definitions: BTreeMap<String, ExtractorDefinition>,
}

impl ExtractorCatalog {
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = ExtractorDefinition>,
    ) -> Result<Self, FeatureError> {
        let mut catalog = Self::default();
        for definition in definitions {
            catalog.insert(definition)?;
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, definition: ExtractorDefinition) -> Result<(), FeatureError> {
        if definition.atoms.is_empty() {
            return Err(FeatureError::invalid_spec(format!(
                "extractor '{}' declares no atoms",
                definition.type_tag
            )));
        }
        if self.definitions.contains_key(&definition.type_tag) {
            return Err(FeatureError::DuplicateExtractor {
                type_tag: definition.type_tag,
            });
        }
        self.definitions
            .insert(definition.type_tag.clone(), definition);
        Ok(())
    }

    pub fn get(&self, type_tag: &str) -> Result<&ExtractorDefinition, FeatureError> {
        self.definitions
            .get(type_tag)
            .ok_or_else(|| FeatureError::UnknownExtractor {
                type_tag: type_tag.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtractorDefinition> {
        self.definitions.values()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vq_types::YuvType;

    fn vmaf_feature() -> ExtractorDefinition {
        ExtractorDefinition {
            type_tag: "VMAF_feature".into(),
            version: "0.2.2".into(),
            program: "/opt/vmaf/vmaf".into(),
            leading_args: vec!["all".into()],
            atoms: vec!["vif".into(), "adm".into(), "ansnr".into(), "motion".into()],
        }
    }

    #[test]
    fn resolves_all_and_explicit_atoms() {
        let def = vmaf_feature();
        assert_eq!(
            def.resolve_atoms(&AtomSelection::All).unwrap(),
            vec!["vif", "adm", "ansnr", "motion"]
        );
        let picked = AtomSelection::Atoms(vec!["motion".into()]);
        assert_eq!(def.resolve_atoms(&picked).unwrap(), vec!["motion"]);
        let unknown = AtomSelection::Atoms(vec!["vif2".into()]);
        assert!(matches!(
            def.resolve_atoms(&unknown),
            Err(FeatureError::UnknownAtom { .. })
        ));
    }

    #[test]
    fn invocation_places_leading_args_first() {
        let asset = Asset::builder("d")
            .content_id(1)
            .asset_id(2)
            .ref_path("/r.yuv")
            .dis_path("/d.yuv")
            .width(64)
            .height(32)
            .yuv_type(YuvType::Yuv444p)
            .build()
            .unwrap();
        assert_eq!(
            vmaf_feature().invocation(&asset).to_string(),
            "/opt/vmaf/vmaf all yuv444p /r.yuv /d.yuv 64 32"
        );
        assert_eq!(vmaf_feature().scores_key("vif"), "VMAF_feature_vif_scores");
    }

    #[test]
    fn catalog_rejects_duplicates() {
        let err = ExtractorCatalog::from_definitions([vmaf_feature(), vmaf_feature()]).unwrap_err();
        assert!(matches!(err, FeatureError::DuplicateExtractor { .. }));
        let catalog = ExtractorCatalog::from_definitions([vmaf_feature()]).unwrap();
        assert!(catalog.get("Moment_feature").is_err());
        assert_eq!(catalog.get("VMAF_feature").unwrap().version, "0.2.2");
    }
}
