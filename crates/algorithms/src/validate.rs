//! Parameter validation
//!
//! Checks that every symbol a formula needs has been bound before any
//! evaluation starts.

use specidx_core::registry::IndexDefinition;
use specidx_core::{Bindings, Error, Result};

/// Check `bindings` against the symbols required by `index`.
///
/// Symbols are checked in the order given; the first missing one is
/// reported. Extra bindings are ignored.
///
/// # Errors
/// [`Error::MissingSymbol`] naming the missing symbol and `index`.
pub fn validate<T, S: AsRef<str>>(index: &str, required: &[S], bindings: &Bindings<T>) -> Result<()> {
    match required.iter().find(|s| !bindings.contains(s.as_ref())) {
        Some(missing) => Err(Error::MissingSymbol {
            symbol: missing.as_ref().to_string(),
            index: index.to_string(),
        }),
        None => Ok(()),
    }
}

/// [`validate`] for a registry definition
pub fn validate_index<T>(def: &IndexDefinition, bindings: &Bindings<T>) -> Result<()> {
    validate(def.short_name(), def.required_symbols(), bindings)
}

/// All required symbols absent from `bindings`, in order
pub fn missing_symbols<'a, T, S: AsRef<str>>(required: &'a [S], bindings: &Bindings<T>) -> Vec<&'a str> {
    required
        .iter()
        .map(|s| s.as_ref())
        .filter(|s| !bindings.contains(s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use specidx_core::Registry;

    #[test]
    fn test_all_present() {
        let b: Bindings<f64> = Bindings::new().with("N", 0.6).with("R", 0.1).with("G", 0.2);
        assert!(validate("NDVI", &["N", "R"], &b).is_ok());
    }

    #[test]
    fn test_reports_missing_symbol_and_index() {
        let b: Bindings<f64> = Bindings::new().with("N", 0.6);
        match validate("NDVI", &["N", "R"], &b) {
            Err(Error::MissingSymbol { symbol, index }) => {
                assert_eq!(symbol, "R");
                assert_eq!(index, "NDVI");
            }
            other => panic!("expected MissingSymbol, got {:?}", other),
        }
    }

    #[test]
    fn test_message() {
        let b: Bindings<f64> = Bindings::new();
        let err = validate("SAVI", &["L"], &b).unwrap_err();
        assert_eq!(err.to_string(), "'L' is missing in the parameters for SAVI computation");
    }

    #[test]
    fn test_each_symbol_of_every_index() {
        let registry = Registry::builtin().unwrap();
        for def in registry.indices() {
            for omitted in def.required_symbols() {
                let b: Bindings<f64> = def
                    .required_symbols()
                    .iter()
                    .filter(|s| *s != omitted)
                    .map(|s| (s.clone(), 0.5))
                    .collect();
                match validate_index(def, &b) {
                    Err(Error::MissingSymbol { symbol, index }) => {
                        assert_eq!(&symbol, omitted);
                        assert_eq!(index, def.short_name());
                    }
                    other => panic!("{}: expected MissingSymbol for {}, got {:?}", def.short_name(), omitted, other),
                }
            }
        }
    }

    #[test]
    fn test_missing_symbols_list() {
        let b: Bindings<f64> = Bindings::new().with("N", 0.6);
        assert_eq!(missing_symbols(&["g", "N", "R"], &b), vec!["g", "R"]);
    }
}
