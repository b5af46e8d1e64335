//! Extraction configuration.

use crate::aggregate::{AggregationOptions, DEFAULT_MIN_CONFIDENCE};
use crate::error::GranskaError;
use crate::model::FieldKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// The set of fields a run extracts.
///
/// Serialized as a list of names; `["all"]` when every field is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FieldSelection(BTreeSet<FieldKind>);

impl FieldSelection {
    pub fn all() -> Self {
        FieldSelection(FieldKind::ALL.into_iter().collect())
    }

    pub fn only(fields: impl IntoIterator<Item = FieldKind>) -> Self {
        FieldSelection(fields.into_iter().collect())
    }

    /// Parse one name: a field alias or `all`.
    pub fn parse(name: &str) -> Result<Self, GranskaError> {
        if name.trim().eq_ignore_ascii_case("all") {
            return Ok(FieldSelection::all());
        }
        FieldKind::from_str_loose(name)
            .map(|field| FieldSelection::only([field]))
            .ok_or_else(|| GranskaError::UnknownField(name.to_string()))
    }

    /// Union of several names. An empty list selects every field.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Self, GranskaError> {
        if names.is_empty() {
            return Ok(FieldSelection::all());
        }
        let mut fields = BTreeSet::new();
        for name in names {
            fields.extend(FieldSelection::parse(name.as_ref())?.0);
        }
        Ok(FieldSelection(fields))
    }

    pub fn contains(&self, field: FieldKind) -> bool {
        self.0.contains(&field)
    }

    pub fn is_all(&self) -> bool {
        self.0.len() == FieldKind::ALL.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Selected fields in report order.
    pub fn fields(&self) -> impl Iterator<Item = FieldKind> + '_ {
        self.0.iter().copied()
    }
}

impl Default for FieldSelection {
    fn default() -> Self {
        FieldSelection::all()
    }
}

impl TryFrom<Vec<String>> for FieldSelection {
    type Error = GranskaError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        FieldSelection::parse_list(&names)
    }
}

impl From<FieldSelection> for Vec<String> {
    fn from(selection: FieldSelection) -> Self {
        if selection.is_all() {
            vec!["all".to_string()]
        } else {
            selection.fields().map(|f| f.key().to_string()).collect()
        }
    }
}

impl fmt::Display for FieldSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.clone().into();
        write!(f, "{}", names.join(", "))
    }
}

/// Settings for one extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Fields to extract.
    pub extract: FieldSelection,
    /// Confidence floor for report inclusion. Candidates below it are still
    /// logged.
    pub min_confidence: f64,
    /// Run the field strategies on scoped threads.
    pub parallel_strategies: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            extract: FieldSelection::all(),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            parallel_strategies: false,
        }
    }
}

impl ExtractConfig {
    pub fn validate(&self) -> Result<(), GranskaError> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(GranskaError::InvalidConfig(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        if self.extract.is_empty() {
            return Err(GranskaError::InvalidConfig(
                "extract must name at least one field".to_string(),
            ));
        }
        Ok(())
    }

    pub fn aggregation(&self) -> AggregationOptions {
        AggregationOptions {
            min_confidence: self.min_confidence,
        }
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, GranskaError> {
        let config: ExtractConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, GranskaError> {
        toml::to_string_pretty(self)
            .map_err(|e| GranskaError::InvalidConfig(format!("failed to serialize to TOML: {e}")))
    }

    /// Read and validate a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, GranskaError> {
        let text = std::fs::read_to_string(path).map_err(|e| GranskaError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        ExtractConfig::from_toml(&text).map_err(|e| GranskaError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.extract.is_all());
        assert_eq!(config.min_confidence, 0.60);
    }

    #[test]
    fn test_invalid_min_confidence() {
        let config = ExtractConfig {
            min_confidence: 1.5,
            ..ExtractConfig::default()
        };
        assert!(matches!(config.validate(), Err(GranskaError::InvalidConfig(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractConfig {
            extract: FieldSelection::only([FieldKind::Auditor, FieldKind::Finding]),
            min_confidence: 0.75,
            parallel_strategies: true,
        };
        let toml_str = config.to_toml().unwrap();
        assert_eq!(ExtractConfig::from_toml(&toml_str).unwrap(), config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ExtractConfig::from_toml("extract = [\"supplier\", \"date\"]\n").unwrap();
        assert!(config.extract.contains(FieldKind::Factory));
        assert!(config.extract.contains(FieldKind::AuditDate));
        assert!(!config.extract.contains(FieldKind::Auditor));
        assert_eq!(config.min_confidence, 0.60);
    }

    #[test]
    fn test_unknown_field_in_toml() {
        assert!(ExtractConfig::from_toml("extract = [\"signature\"]\n").is_err());
    }

    #[test]
    fn test_field_selection_parsing() {
        assert!(FieldSelection::parse("all").unwrap().is_all());
        assert!(FieldSelection::parse_list::<&str>(&[]).unwrap().is_all());
        let sel = FieldSelection::parse_list(&["findings", "auditor"]).unwrap();
        assert_eq!(sel.to_string(), "auditor, finding");
        assert!(matches!(
            FieldSelection::parse("colour"),
            Err(GranskaError::UnknownField(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ExtractConfig::load(Path::new("/nonexistent/granska.toml")).unwrap_err();
        assert!(matches!(err, GranskaError::ConfigLoad { .. }));
    }
}
