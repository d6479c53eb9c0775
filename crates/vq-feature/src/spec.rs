use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::FeatureError;

const ALL_KEYWORD: &str = "all";

/// Which atoms of one extractor are requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSelection", into = "RawSelection")]
pub enum AtomSelection {
    All,
    Atoms(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawSelection {
    Keyword(String),
    Atoms(Vec<String>),
}

impl TryFrom<RawSelection> for AtomSelection {
    type Error = String;

    fn try_from(raw: RawSelection) -> Result<Self, Self::Error> {
        match raw {
            RawSelection::Keyword(word) if word.eq_ignore_ascii_case(ALL_KEYWORD) => {
                Ok(AtomSelection::All)
            }
            RawSelection::Keyword(word) => Err(format!(
                "expected \"{ALL_KEYWORD}\" or a list of atoms, got \"{word}\""
            )),
            RawSelection::Atoms(atoms) => Ok(AtomSelection::Atoms(atoms)),
        }
    }
}

impl From<AtomSelection> for RawSelection {
    fn from(selection: AtomSelection) -> Self {
        match selection {
            AtomSelection::All => RawSelection::Keyword(ALL_KEYWORD.to_string()),
            AtomSelection::Atoms(atoms) => RawSelection::Atoms(atoms),
        }
    }
}

/// Feature extractor type tag -> requested atoms, e.g.
/// `{"VMAF_feature": ["vif", "adm", "motion", "ansnr"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSpec {
    entries: BTreeMap<String, AtomSelection>,
}

impl FeatureSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_all(mut self, type_tag: impl Into<String>) -> Self {
        self.entries.insert(type_tag.into(), AtomSelection::All);
        self
    }

    pub fn with_atoms<I, S>(mut self, type_tag: impl Into<String>, atoms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.insert(
            type_tag.into(),
            AtomSelection::Atoms(atoms.into_iter().map(Into::into).collect()),
        );
        self
    }

    /// Makes sure `atom` of `type_tag` is requested, keeping what is
    /// already selected. An `"all"` selection already covers it.
    pub fn ensure_atom(mut self, type_tag: &str, atom: &str) -> Self {
        match self.entries.get_mut(type_tag) {
            Some(AtomSelection::All) => {}
            Some(AtomSelection::Atoms(atoms)) => {
                if !atoms.iter().any(|known| known == atom) {
                    atoms.push(atom.to_string());
                }
            }
            None => {
                self.entries.insert(
                    type_tag.to_string(),
                    AtomSelection::Atoms(vec![atom.to_string()]),
                );
            }
        }
        self
    }

    /// Parses the `feature_dict` value stored in model metadata.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, FeatureError> {
        let spec: FeatureSpec = serde_json::from_value(value.clone())
            .map_err(|err| FeatureError::invalid_spec(err.to_string()))?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn validate(&self) -> Result<(), FeatureError> {
        if self.entries.is_empty() {
            return Err(FeatureError::invalid_spec("no feature types requested"));
        }
        for (type_tag, selection) in &self.entries {
            if let AtomSelection::Atoms(atoms) = selection {
                if atoms.is_empty() {
                    return Err(FeatureError::invalid_spec(format!(
                        "feature type '{type_tag}' requests an empty atom list"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &AtomSelection)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn type_tags(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_atom_lists_and_all_keyword() {
        let spec = FeatureSpec::from_value(&json!({
            "VMAF_feature": ["vif", "adm", "motion", "ansnr"],
            "Moment_feature": "all",
        }))
        .unwrap();
        let entries: Vec<_> = spec.entries().collect();
        assert_eq!(entries[0], ("Moment_feature", &AtomSelection::All));
        assert_eq!(
            entries[1].1,
            &AtomSelection::Atoms(vec![
                "vif".into(),
                "adm".into(),
                "motion".into(),
                "ansnr".into()
            ])
        );
    }

    #[test]
    fn rejects_unknown_keyword_and_empty_lists() {
        assert!(FeatureSpec::from_value(&json!({"VMAF_feature": "some"})).is_err());
        assert!(FeatureSpec::from_value(&json!({"VMAF_feature": []})).is_err());
        assert!(FeatureSpec::from_value(&json!({})).is_err());
    }

    #[test]
    fn ensure_atom_extends_without_duplicating() {
        let spec = FeatureSpec::new()
            .with_atoms("Moment_feature", ["ref1st"])
            .with_all("VMAF_feature")
            .ensure_atom("Moment_feature", "dis1st")
            .ensure_atom("Moment_feature", "dis1st")
            .ensure_atom("VMAF_feature", "vif")
            .ensure_atom("SSIM_feature", "ssim");
        assert_eq!(
            spec.to_value(),
            json!({
                "Moment_feature": ["ref1st", "dis1st"],
                "SSIM_feature": ["ssim"],
                "VMAF_feature": "all"
            })
        );
    }

    #[test]
    fn value_round_trips() {
        let spec = FeatureSpec::new()
            .with_all("VMAF_feature")
            .with_atoms("Moment_feature", ["dis1st"]);
        assert_eq!(
            spec.to_value(),
            json!({"Moment_feature": ["dis1st"], "VMAF_feature": "all"})
        );
        assert_eq!(FeatureSpec::from_value(&spec.to_value()).unwrap(), spec);
    }
}
