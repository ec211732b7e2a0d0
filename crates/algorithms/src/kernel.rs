//! Kernel evaluation
//!
//! Kernel indices (kNDVI, kEVI, ...) consume `k(a, b)` values computed here
//! and bound back as ordinary symbols (`kNN`, `kNR`, ...).

use specidx_core::{Bindings, Function, Kernel, Operand, Registry, Result, Scope};

use crate::validate::validate;

const KERNEL_FUNCTIONS: &[Function] = &[Function::Exp];

/// Compute `k(a, b)` for one of the three kernels.
///
/// Bindings must hold `a` and `b`, plus `sigma` for RBF or `p` and `c` for
/// the polynomial kernel. When `a` (or else `b`) carries its own
/// expression language (remote handles), the kernel text is handed to it
/// and the operand picks the receiver (an image wins over a number);
/// otherwise the local formula is evaluated with `exp` in scope.
///
/// # Errors
/// - [`Error::MissingSymbol`](specidx_core::Error::MissingSymbol) if a required symbol is unbound
/// - Whatever the operand type reports for incompatible operands
pub fn compute_kernel<T: Operand>(registry: &Registry, kernel: Kernel, bindings: &Bindings<T>) -> Result<T> {
    validate(kernel.name(), kernel.required_symbols(), bindings)?;

    for symbol in ["a", "b"] {
        if let Some(result) = bindings
            .get(symbol)
            .and_then(|v| v.expression(kernel.expression_text(), bindings))
        {
            tracing::trace!("kernel {} delegated to operand '{}'", kernel, symbol);
            return result;
        }
    }

    registry
        .kernel(kernel)
        .evaluate_in(&Scope::new(bindings).with_functions(KERNEL_FUNCTIONS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use specidx_core::Error;

    fn registry() -> Registry {
        Registry::builtin().unwrap()
    }

    #[test]
    fn test_linear() {
        let b: Bindings<f64> = Bindings::new().with("a", 0.68).with("b", 0.13);
        let k = compute_kernel(&registry(), Kernel::Linear, &b).unwrap();
        assert_relative_eq!(k, 0.68 * 0.13, epsilon = 1e-15);
    }

    #[test]
    fn test_poly() {
        let b: Bindings<f64> = Bindings::new()
            .with("a", 0.68)
            .with("b", 0.13)
            .with("p", 2.0)
            .with("c", 1.0);
        let k = compute_kernel(&registry(), Kernel::Poly, &b).unwrap();
        assert_relative_eq!(k, (0.68f64 * 0.13 + 1.0).powf(2.0), epsilon = 1e-12);
    }

    #[test]
    fn test_rbf() {
        let b: Bindings<f64> = Bindings::new().with("a", 0.68).with("b", 0.13).with("sigma", 0.405);
        let k = compute_kernel(&registry(), Kernel::Rbf, &b).unwrap();
        let expected = (-(0.55f64.powi(2)) / (2.0 * 0.405f64.powi(2))).exp();
        assert_relative_eq!(k, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_rbf_of_equal_values_is_one() {
        let b: Bindings<f64> = Bindings::new().with("a", 0.4).with("b", 0.4).with("sigma", 0.2);
        assert_eq!(compute_kernel(&registry(), Kernel::Rbf, &b).unwrap(), 1.0);
    }

    #[test]
    fn test_missing_sigma() {
        let b: Bindings<f64> = Bindings::new().with("a", 0.68).with("b", 0.13);
        match compute_kernel(&registry(), Kernel::Rbf, &b) {
            Err(Error::MissingSymbol { symbol, index }) => {
                assert_eq!(symbol, "sigma");
                assert_eq!(index, "RBF");
            }
            other => panic!("expected MissingSymbol, got {:?}", other),
        }
    }

    #[test]
    fn test_remote_number_with_remote_image() {
        use specidx_core::value::{RemoteImage, RemoteNumber};
        use specidx_core::Value;

        for (a, b) in [
            (Value::from(RemoteNumber::new(0.68)), Value::from(RemoteImage::constant(0.13))),
            (Value::from(RemoteImage::constant(0.68)), Value::from(RemoteNumber::new(0.13))),
        ] {
            let bindings: Bindings = Bindings::new().with("a", a).with("b", b).with("sigma", 0.405);
            let k = compute_kernel(&registry(), Kernel::Rbf, &bindings).unwrap();
            let img = k.as_remote_image().expect("kernel over an image must be an image");
            assert_eq!(img.expr().function(), Some("Image.expression"));
        }
    }

    #[test]
    fn test_exp_not_leaked_into_bindings() {
        let b: Bindings<f64> = Bindings::new().with("a", 0.5).with("b", 0.1).with("sigma", 1.0);
        compute_kernel(&registry(), Kernel::Rbf, &b).unwrap();
        assert!(!b.contains("exp"));
        assert_eq!(b.len(), 3);
    }
}
