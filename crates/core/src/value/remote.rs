//! Remote-execution handles
//!
//! A remote handle computes nothing locally. Every operation appends a node
//! to a serializable expression graph that an external executor evaluates
//! later; [`RemoteImage::to_json`] produces the payload to ship. Function
//! names follow the `Image.*` / `Number.*` convention of hosted raster
//! engines.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{BinaryOp, UnaryOp};
use crate::error::{Error, Result};

/// A node of a remote expression graph
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RemoteExpr {
    Constant { value: f64 },
    Text { value: String },
    List { items: Vec<RemoteExpr> },
    Dictionary { entries: BTreeMap<String, RemoteExpr> },
    Invocation {
        function: String,
        arguments: BTreeMap<String, RemoteExpr>,
    },
}

impl RemoteExpr {
    pub fn constant(value: f64) -> Self {
        RemoteExpr::Constant { value }
    }

    pub fn text(value: impl Into<String>) -> Self {
        RemoteExpr::Text {
            value: value.into(),
        }
    }

    /// Invocation of a named remote function
    pub fn invoke<I, K>(function: impl Into<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = (K, RemoteExpr)>,
        K: Into<String>,
    {
        RemoteExpr::Invocation {
            function: function.into(),
            arguments: arguments.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Name of the invoked function, if this node is an invocation
    pub fn function(&self) -> Option<&str> {
        match self {
            RemoteExpr::Invocation { function, .. } => Some(function),
            _ => None,
        }
    }

    /// Argument of an invocation node
    pub fn argument(&self, name: &str) -> Option<&RemoteExpr> {
        match self {
            RemoteExpr::Invocation { arguments, .. } => arguments.get(name),
            _ => None,
        }
    }

    fn is_image(&self) -> bool {
        self.function().is_some_and(|f| f.starts_with("Image."))
    }
}

/// Handle to a multi-band image living on a remote executor
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteImage {
    expr: RemoteExpr,
    bands: Vec<String>,
}

impl RemoteImage {
    /// Reference a stored image asset with known band names
    pub fn load<S: Into<String>>(asset_id: &str, bands: impl IntoIterator<Item = S>) -> Self {
        Self {
            expr: RemoteExpr::invoke("Image.load", [("id", RemoteExpr::text(asset_id))]),
            bands: bands.into_iter().map(Into::into).collect(),
        }
    }

    /// A constant single-band image
    pub fn constant(value: f64) -> Self {
        Self {
            expr: RemoteExpr::invoke("Image.constant", [("value", RemoteExpr::constant(value))]),
            bands: vec!["constant".to_string()],
        }
    }

    pub fn expr(&self) -> &RemoteExpr {
        &self.expr
    }

    pub fn bands(&self) -> &[String] {
        &self.bands
    }

    /// Single-band image holding one band of `self`
    pub fn select(&self, band: &str) -> Result<Self> {
        if !self.bands.iter().any(|b| b == band) {
            return Err(Error::UnknownLabel {
                dim: "band".to_string(),
                label: band.to_string(),
            });
        }
        Ok(Self {
            expr: RemoteExpr::invoke(
                "Image.select",
                [("input", self.expr.clone()), ("bandSelectors", RemoteExpr::text(band))],
            ),
            bands: vec![band.to_string()],
        })
    }

    fn promote(expr: &RemoteExpr) -> RemoteExpr {
        if expr.is_image() {
            expr.clone()
        } else {
            RemoteExpr::invoke("Image.constant", [("value", expr.clone())])
        }
    }

    /// `self <op> rhs`; band names follow `self`
    pub fn op(&self, op: BinaryOp, rhs: &RemoteExpr) -> Self {
        Self {
            expr: RemoteExpr::invoke(
                format!("Image.{}", op.method_name()),
                [("image1", self.expr.clone()), ("image2", Self::promote(rhs))],
            ),
            bands: self.bands.clone(),
        }
    }

    /// `lhs <op> self`; band names follow `self`
    pub fn rop(&self, op: BinaryOp, lhs: &RemoteExpr) -> Self {
        Self {
            expr: RemoteExpr::invoke(
                format!("Image.{}", op.method_name()),
                [("image1", Self::promote(lhs)), ("image2", self.expr.clone())],
            ),
            bands: self.bands.clone(),
        }
    }

    pub fn unary(&self, op: UnaryOp) -> Self {
        let expr = match op {
            UnaryOp::Negate => RemoteExpr::invoke(
                "Image.multiply",
                [
                    ("image1", self.expr.clone()),
                    ("image2", Self::promote(&RemoteExpr::constant(-1.0))),
                ],
            ),
            UnaryOp::Exp => RemoteExpr::invoke("Image.exp", [("value", self.expr.clone())]),
        };
        Self {
            expr,
            bands: self.bands.clone(),
        }
    }

    /// Evaluate `formula` remotely with the executor's own expression
    /// language, `self` acting as the receiver.
    pub fn expression(&self, formula: &str, vars: BTreeMap<String, RemoteExpr>) -> Self {
        Self {
            expr: RemoteExpr::invoke(
                "Image.expression",
                [
                    ("expression", RemoteExpr::text(formula)),
                    ("map", RemoteExpr::Dictionary { entries: vars }),
                ],
            ),
            bands: vec!["constant".to_string()],
        }
    }

    /// Stack images into one multi-band image
    pub fn cat(images: &[RemoteImage]) -> Self {
        Self {
            expr: RemoteExpr::invoke(
                "Image.cat",
                [(
                    "images",
                    RemoteExpr::List {
                        items: images.iter().map(|i| i.expr.clone()).collect(),
                    },
                )],
            ),
            bands: images.iter().flat_map(|i| i.bands.iter().cloned()).collect(),
        }
    }

    /// Rename all bands; `names` must have one entry per band
    pub fn rename<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        if names.len() != self.bands.len() {
            return Err(Error::LabelCount {
                expected: self.bands.len(),
                found: names.len(),
            });
        }
        let names: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
        Ok(Self {
            expr: RemoteExpr::invoke(
                "Image.rename",
                [
                    ("input", self.expr.clone()),
                    (
                        "names",
                        RemoteExpr::List {
                            items: names.iter().map(RemoteExpr::text).collect(),
                        },
                    ),
                ],
            ),
            bands: names,
        })
    }

    /// Serialized expression graph
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.expr)?)
    }
}

/// Handle to a number living on a remote executor
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteNumber {
    expr: RemoteExpr,
}

impl RemoteNumber {
    pub fn new(value: f64) -> Self {
        Self {
            expr: RemoteExpr::constant(value),
        }
    }

    pub fn expr(&self) -> &RemoteExpr {
        &self.expr
    }

    pub fn op(&self, op: BinaryOp, rhs: &RemoteExpr) -> Self {
        Self {
            expr: RemoteExpr::invoke(
                format!("Number.{}", op.method_name()),
                [("left", self.expr.clone()), ("right", rhs.clone())],
            ),
        }
    }

    pub fn rop(&self, op: BinaryOp, lhs: &RemoteExpr) -> Self {
        Self {
            expr: RemoteExpr::invoke(
                format!("Number.{}", op.method_name()),
                [("left", lhs.clone()), ("right", self.expr.clone())],
            ),
        }
    }

    pub fn unary(&self, op: UnaryOp) -> Self {
        let expr = match op {
            UnaryOp::Negate => RemoteExpr::invoke(
                "Number.multiply",
                [("left", self.expr.clone()), ("right", RemoteExpr::constant(-1.0))],
            ),
            UnaryOp::Exp => RemoteExpr::invoke("Number.exp", [("input", self.expr.clone())]),
        };
        Self { expr }
    }

    pub fn expression(&self, formula: &str, vars: BTreeMap<String, RemoteExpr>) -> Self {
        Self {
            expr: RemoteExpr::invoke(
                "Number.expression",
                [
                    ("expression", RemoteExpr::text(formula)),
                    ("vars", RemoteExpr::Dictionary { entries: vars }),
                ],
            ),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.expr)?)
    }
}

/// Ordered remote collection of numbers
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteList {
    expr: RemoteExpr,
    len: usize,
}

impl RemoteList {
    pub fn from_numbers(numbers: &[RemoteNumber]) -> Self {
        Self {
            expr: RemoteExpr::List {
                items: numbers.iter().map(|n| n.expr.clone()).collect(),
            },
            len: numbers.len(),
        }
    }

    pub fn expr(&self) -> &RemoteExpr {
        &self.expr
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.expr)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operations_build_graph() {
        let img = RemoteImage::load("COPERNICUS/S2_SR/T30TVK", ["B4", "B8"]);
        let out = img.op(BinaryOp::Subtract, &RemoteExpr::constant(0.5));

        assert_eq!(out.expr().function(), Some("Image.subtract"));
        assert_eq!(out.bands(), img.bands());
        // Scalars are promoted to constant images
        assert_eq!(
            out.expr().argument("image2").and_then(|e| e.function()),
            Some("Image.constant")
        );
    }

    #[test]
    fn test_select_single_band() {
        let img = RemoteImage::load("COPERNICUS/S2_SR/T30TVK", ["B4", "B8"]);
        let nir = img.select("B8").unwrap();
        assert_eq!(nir.bands(), &["B8".to_string()]);
        assert_eq!(nir.expr().function(), Some("Image.select"));
        assert!(img.select("B11").is_err());
    }

    #[test]
    fn test_reverse_operand_order() {
        let img = RemoteImage::constant(2.0);
        let out = img.rop(BinaryOp::Divide, &RemoteExpr::constant(1.0));
        assert_eq!(out.expr().argument("image2"), Some(img.expr()));
    }

    #[test]
    fn test_cat_and_rename() {
        let a = RemoteImage::constant(1.0);
        let b = RemoteImage::constant(2.0);
        let stacked = RemoteImage::cat(&[a, b]);
        assert_eq!(stacked.bands().len(), 2);

        let named = stacked.rename(&["NDVI", "SAVI"]).unwrap();
        assert_eq!(named.bands(), &["NDVI".to_string(), "SAVI".to_string()]);
        assert!(stacked.rename(&["only"]).is_err());
    }

    #[test]
    fn test_serialized_graph() {
        let n = RemoteNumber::new(0.5).unary(UnaryOp::Exp);
        let json = n.to_json().unwrap();
        assert!(json.contains("\"function\":\"Number.exp\""), "{}", json);
        assert!(json.contains("\"type\":\"constant\""), "{}", json);
    }

    #[test]
    fn test_list_preserves_order() {
        let list = RemoteList::from_numbers(&[RemoteNumber::new(1.0), RemoteNumber::new(2.0)]);
        assert_eq!(list.len(), 2);
        match list.expr() {
            RemoteExpr::List { items } => assert_eq!(items[1], RemoteExpr::constant(2.0)),
            other => panic!("expected list, got {:?}", other),
        }
    }
}
