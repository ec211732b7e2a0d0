//! Kernel functions used by kernel indices (kNDVI, kEVI, ...)

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Kernel applied to a pair of band values `a`, `b`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    /// `a * b`
    Linear,
    /// `((a * b) + c) ^ p`
    Poly,
    /// `exp(-(a - b)^2 / (2 * sigma^2))`
    Rbf,
}

impl Kernel {
    pub const ALL: [Kernel; 3] = [Kernel::Linear, Kernel::Poly, Kernel::Rbf];

    pub fn name(&self) -> &'static str {
        match self {
            Kernel::Linear => "linear",
            Kernel::Poly => "poly",
            Kernel::Rbf => "RBF",
        }
    }

    /// Symbols that must be bound to evaluate the kernel
    pub fn required_symbols(&self) -> &'static [&'static str] {
        match self {
            Kernel::Linear => &["a", "b"],
            Kernel::Poly => &["a", "b", "p", "c"],
            Kernel::Rbf => &["a", "b", "sigma"],
        }
    }

    /// Formula for the local evaluator; `exp` must be injected
    pub fn formula(&self) -> &'static str {
        match self {
            Kernel::Linear => "a * b",
            Kernel::Poly => "((a * b) + c) ^ p",
            Kernel::Rbf => "exp((-1.0 * (a - b) ^ 2.0) / (2.0 * sigma ^ 2.0))",
        }
    }

    /// Formula in the expression language of remote executors
    pub fn expression_text(&self) -> &'static str {
        match self {
            Kernel::Linear => "a * b",
            Kernel::Poly => "((a * b) + c) ** p",
            Kernel::Rbf => "exp((-1.0 * (a - b) ** 2.0)/(2.0 * sigma ** 2.0))",
        }
    }

    pub(crate) fn position(&self) -> usize {
        match self {
            Kernel::Linear => 0,
            Kernel::Poly => 1,
            Kernel::Rbf => 2,
        }
    }
}

impl FromStr for Kernel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(Kernel::Linear),
            "poly" => Ok(Kernel::Poly),
            "RBF" | "rbf" => Ok(Kernel::Rbf),
            other => Err(Error::UnknownKernel(other.to_string())),
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Formula;

    #[test]
    fn test_parse_names() {
        assert_eq!("RBF".parse::<Kernel>().unwrap(), Kernel::Rbf);
        assert_eq!("rbf".parse::<Kernel>().unwrap(), Kernel::Rbf);
        assert_eq!("poly".parse::<Kernel>().unwrap(), Kernel::Poly);
        assert!(matches!(
            "sigmoid".parse::<Kernel>(),
            Err(Error::UnknownKernel(_))
        ));
    }

    #[test]
    fn test_formulas_only_use_required_symbols() {
        for kernel in Kernel::ALL {
            let f = Formula::parse(kernel.formula()).unwrap();
            for s in f.symbols() {
                assert!(
                    kernel.required_symbols().contains(&s.as_str()),
                    "{} uses unexpected '{}'",
                    kernel,
                    s
                );
            }
            assert_eq!(Kernel::ALL[kernel.position()], kernel);
        }
    }
}
