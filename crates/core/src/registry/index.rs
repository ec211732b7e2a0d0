//! Spectral index definitions

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::expr::Formula;

/// Catalogue entry as stored on disk
#[derive(Debug, Deserialize)]
pub(super) struct RawIndex {
    short_name: String,
    formula: String,
    bands: Vec<String>,
    #[serde(default)]
    long_name: String,
    #[serde(default)]
    application_domain: String,
    #[serde(default)]
    reference: String,
    #[serde(default)]
    contributor: String,
    #[serde(default)]
    date_of_addition: String,
    #[serde(default)]
    platforms: Vec<String>,
}

/// A named spectral index: its required symbols and compiled formula.
///
/// Immutable once built. The formula only references symbols listed in
/// [`required_symbols`](Self::required_symbols).
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    short_name: String,
    long_name: String,
    formula: Formula,
    bands: Vec<String>,
    application_domain: String,
    reference: String,
    contributor: String,
    date_of_addition: String,
    platforms: Vec<String>,
}

impl IndexDefinition {
    /// Build a definition from a name, formula text and required symbols.
    ///
    /// # Errors
    /// [`Error::InvalidRegistry`] if the formula does not parse or references
    /// a symbol outside `bands`.
    pub fn new<S: Into<String>>(
        short_name: &str,
        formula: &str,
        bands: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let formula = Formula::parse(formula)
            .map_err(|e| Error::InvalidRegistry(format!("{}: {}", short_name, e)))?;
        let bands: Vec<String> = bands.into_iter().map(Into::into).collect();

        if let Some(extra) = formula.symbols().iter().find(|s| !bands.contains(*s)) {
            return Err(Error::InvalidRegistry(format!(
                "{}: formula uses '{}' which is not among its symbols {:?}",
                short_name, extra, bands
            )));
        }

        Ok(Self {
            short_name: short_name.to_string(),
            long_name: String::new(),
            formula,
            bands,
            application_domain: String::new(),
            reference: String::new(),
            contributor: String::new(),
            date_of_addition: String::new(),
            platforms: Vec::new(),
        })
    }

    pub(super) fn from_raw(raw: RawIndex) -> Result<Self> {
        let mut def = Self::new(&raw.short_name, &raw.formula, raw.bands)?;
        def.long_name = raw.long_name;
        def.application_domain = raw.application_domain;
        def.reference = raw.reference;
        def.contributor = raw.contributor;
        def.date_of_addition = raw.date_of_addition;
        def.platforms = raw.platforms;
        Ok(def)
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn long_name(&self) -> &str {
        &self.long_name
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    /// Symbols that must be bound to compute this index
    pub fn required_symbols(&self) -> &[String] {
        &self.bands
    }

    pub fn application_domain(&self) -> &str {
        &self.application_domain
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn contributor(&self) -> &str {
        &self.contributor
    }

    pub fn date_of_addition(&self) -> &str {
        &self.date_of_addition
    }

    /// Sensors the index can be computed for
    pub fn platforms(&self) -> &[String] {
        &self.platforms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_is_normalized() {
        let def = IndexDefinition::new("NDVI", "(N - R)/(N + R)", ["N", "R"]).unwrap();
        assert_eq!(def.formula().text(), "(N-R)/(N+R)");
        assert_eq!(def.required_symbols(), &["N".to_string(), "R".to_string()]);
    }

    #[test]
    fn test_formula_symbol_outside_bands() {
        let err = IndexDefinition::new("BAD", "(N - R)/(N + G)", ["N", "R"]).unwrap_err();
        assert!(matches!(err, Error::InvalidRegistry(_)));
        assert!(err.to_string().contains("'G'"));
    }

    #[test]
    fn test_unparsable_formula() {
        assert!(matches!(
            IndexDefinition::new("BAD", "(N - R", ["N", "R"]),
            Err(Error::InvalidRegistry(_))
        ));
    }

    #[test]
    fn test_raw_metadata_carried() {
        let raw: RawIndex = serde_json::from_str(
            r#"{
                "short_name": "NBR",
                "long_name": "Normalized Burn Ratio",
                "formula": "(N - S2) / (N + S2)",
                "bands": ["N", "S2"],
                "application_domain": "burn",
                "platforms": ["Sentinel-2"]
            }"#,
        )
        .unwrap();
        let def = IndexDefinition::from_raw(raw).unwrap();
        assert_eq!(def.long_name(), "Normalized Burn Ratio");
        assert_eq!(def.application_domain(), "burn");
        assert_eq!(def.platforms(), &["Sentinel-2".to_string()]);
        assert_eq!(def.reference(), "");
    }
}
