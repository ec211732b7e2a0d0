//! Band and constant catalogues

use serde::{Deserialize, Serialize};

/// A spectral band symbol (e.g. `N` for near infrared)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    #[serde(rename = "short_name")]
    pub symbol: String,
    pub long_name: String,
    #[serde(default)]
    pub common_name: Option<String>,
    /// Lower wavelength bound in nm
    pub min_wavelength: f64,
    /// Upper wavelength bound in nm
    pub max_wavelength: f64,
}

impl Band {
    /// Center of the wavelength range in nm
    pub fn center_wavelength(&self) -> f64 {
        (self.min_wavelength + self.max_wavelength) / 2.0
    }
}

/// A non-band parameter symbol (e.g. `L`, `g`, `sigma`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    #[serde(rename = "short_name")]
    pub symbol: String,
    pub description: String,
    /// Value used when the caller does not supply one
    #[serde(default)]
    pub default: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_without_default() {
        let c: Constant = serde_json::from_str(
            r#"{"short_name": "sigma", "description": "RBF length-scale", "default": null}"#,
        )
        .unwrap();
        assert_eq!(c.symbol, "sigma");
        assert!(c.default.is_none());
    }

    #[test]
    fn test_band_center() {
        let b: Band = serde_json::from_str(
            r#"{"short_name": "R", "long_name": "Red", "min_wavelength": 620, "max_wavelength": 690}"#,
        )
        .unwrap();
        assert_eq!(b.center_wavelength(), 655.0);
        assert!(b.common_name.is_none());
    }
}
