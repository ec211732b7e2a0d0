//! Registry of spectral indices, bands, constants and kernels
//!
//! A [`Registry`] is built once (usually from the embedded catalogue with
//! [`Registry::builtin`]) and then only read. It is `Send + Sync` and can
//! be shared across threads by reference.
//!
//! On-disk format, one JSON document per catalogue:
//! - indices: `{"SpectralIndices": {"NDVI": {"short_name", "formula", "bands", ...}}}`
//! - bands: `{"N": {"short_name", "long_name", "min_wavelength", "max_wavelength"}}`
//! - constants: `{"L": {"short_name", "description", "default"}}`

mod catalog;
mod index;
mod kernel;

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::expr::Formula;

pub use catalog::{Band, Constant};
pub use index::IndexDefinition;
pub use kernel::Kernel;

use index::RawIndex;

const BUILTIN_INDICES: &str = include_str!("../../data/spectral-indices-dict.json");
const BUILTIN_BANDS: &str = include_str!("../../data/bands.json");
const BUILTIN_CONSTANTS: &str = include_str!("../../data/constants.json");

#[derive(Deserialize)]
struct IndexFile {
    #[serde(rename = "SpectralIndices")]
    spectral_indices: BTreeMap<String, RawIndex>,
}

/// Read-only lookup of index definitions, symbol catalogues and kernels
#[derive(Debug, Clone)]
pub struct Registry {
    indices: BTreeMap<String, IndexDefinition>,
    bands: BTreeMap<String, Band>,
    constants: BTreeMap<String, Constant>,
    kernels: Vec<Formula>,
}

impl Registry {
    /// The catalogue shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_INDICES, BUILTIN_BANDS, BUILTIN_CONSTANTS)
    }

    /// Build a registry from the three JSON catalogues.
    ///
    /// # Errors
    /// - [`Error::Json`] if a document is malformed
    /// - [`Error::InvalidRegistry`] if a formula does not parse, uses a
    ///   symbol outside its index's list, or an index lists a symbol
    ///   unknown to the band and constant catalogues
    pub fn from_json_str(indices: &str, bands: &str, constants: &str) -> Result<Self> {
        let bands: BTreeMap<String, Band> = serde_json::from_str(bands)?;
        let constants: BTreeMap<String, Constant> = serde_json::from_str(constants)?;

        let mut registry = Self {
            indices: BTreeMap::new(),
            bands,
            constants,
            kernels: Kernel::ALL
                .iter()
                .map(|k| Formula::parse(k.formula()))
                .collect::<Result<_>>()?,
        };

        let file: IndexFile = serde_json::from_str(indices)?;
        for (name, raw) in file.spectral_indices {
            let def = IndexDefinition::from_raw(raw)?;
            if def.short_name() != name {
                return Err(Error::InvalidRegistry(format!(
                    "entry '{}' is named '{}'",
                    name,
                    def.short_name()
                )));
            }
            registry.insert(def)?;
        }

        tracing::debug!(
            indices = registry.indices.len(),
            bands = registry.bands.len(),
            constants = registry.constants.len(),
            "loaded spectral index registry"
        );
        Ok(registry)
    }

    /// Load an index catalogue file, using the built-in band and constant
    /// catalogues.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("reading index catalogue from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text, BUILTIN_BANDS, BUILTIN_CONSTANTS)
    }

    /// Add (or replace) an index definition.
    ///
    /// # Errors
    /// [`Error::InvalidRegistry`] if the definition lists a symbol that is
    /// neither a known band nor a known constant.
    pub fn insert(&mut self, def: IndexDefinition) -> Result<()> {
        if let Some(unknown) = def
            .required_symbols()
            .iter()
            .find(|s| !self.is_known_symbol(s))
        {
            return Err(Error::InvalidRegistry(format!(
                "{}: unknown symbol '{}'",
                def.short_name(),
                unknown
            )));
        }
        self.indices.insert(def.short_name().to_string(), def);
        Ok(())
    }

    /// Look up an index by its short name
    pub fn index(&self, name: &str) -> Result<&IndexDefinition> {
        self.indices.get(name).ok_or_else(|| Error::UnknownIndex {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    /// All indices, sorted by short name
    pub fn indices(&self) -> impl Iterator<Item = &IndexDefinition> {
        self.indices.values()
    }

    /// Indices of one application domain (`vegetation`, `water`, `burn`, ...)
    pub fn indices_in_domain<'a>(&'a self, domain: &'a str) -> impl Iterator<Item = &'a IndexDefinition> {
        self.indices
            .values()
            .filter(move |d| d.application_domain().eq_ignore_ascii_case(domain))
    }

    pub fn bands(&self) -> impl Iterator<Item = &Band> {
        self.bands.values()
    }

    pub fn band(&self, symbol: &str) -> Option<&Band> {
        self.bands.get(symbol)
    }

    pub fn constants(&self) -> impl Iterator<Item = &Constant> {
        self.constants.values()
    }

    pub fn constant(&self, symbol: &str) -> Option<&Constant> {
        self.constants.get(symbol)
    }

    /// Whether a symbol is a catalogued band or constant
    pub fn is_known_symbol(&self, symbol: &str) -> bool {
        self.bands.contains_key(symbol) || self.constants.contains_key(symbol)
    }

    /// Compiled local formula of a kernel
    pub fn kernel(&self, kernel: Kernel) -> &Formula {
        &self.kernels[kernel.position()]
    }

    /// Number of indices
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
