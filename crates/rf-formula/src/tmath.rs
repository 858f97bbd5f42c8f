//! Builtin numeric functions and the short-name alias table.
//!
//! The resolver rewrites alias call sites (`sin` → `TMath::Sin`) and accepts
//! any `::`-qualified name it can find here with a matching argument count;
//! the bytecode back-end dispatches calls through the same table.

use std::collections::BTreeMap;

/// A builtin function of fixed arity.
#[derive(Clone, Copy)]
pub enum Builtin {
    /// One-argument function.
    Unary(fn(f64) -> f64),
    /// Two-argument function.
    Binary(fn(f64, f64) -> f64),
    /// Four-argument function.
    Quad(fn(f64, f64, f64, f64) -> f64),
}

impl Builtin {
    /// Number of arguments the function expects.
    pub fn nargs(&self) -> usize {
        match self {
            Builtin::Unary(_) => 1,
            Builtin::Binary(_) => 2,
            Builtin::Quad(_) => 4,
        }
    }

    /// Apply to an argument slice of exactly `nargs()` values.
    pub fn call(&self, args: &[f64]) -> f64 {
        match self {
            Builtin::Unary(f) => f(args[0]),
            Builtin::Binary(f) => f(args[0], args[1]),
            Builtin::Quad(f) => f(args[0], args[1], args[2], args[3]),
        }
    }
}

impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Builtin/{}", self.nargs())
    }
}

fn landau(x: f64, mpv: f64, sigma: f64, norm: f64) -> f64 {
    rf_prob::landau(x, mpv, sigma, norm != 0.0)
}

/// Look up a qualified call name. `pow` is accepted unqualified because the
/// exponentiation rewrite introduces it before alias resolution runs.
pub fn builtin(qualified: &str) -> Option<Builtin> {
    let b = match qualified {
        "TMath::Sin" => Builtin::Unary(f64::sin),
        "TMath::Cos" => Builtin::Unary(f64::cos),
        "TMath::Tan" => Builtin::Unary(f64::tan),
        "TMath::Exp" => Builtin::Unary(f64::exp),
        "TMath::Log" => Builtin::Unary(f64::ln),
        "TMath::Sqrt" => Builtin::Unary(f64::sqrt),
        "TMath::SinH" => Builtin::Unary(f64::sinh),
        "TMath::CosH" => Builtin::Unary(f64::cosh),
        "TMath::TanH" => Builtin::Unary(f64::tanh),
        "TMath::ASin" => Builtin::Unary(f64::asin),
        "TMath::ACos" => Builtin::Unary(f64::acos),
        "TMath::ATan" => Builtin::Unary(f64::atan),
        "TMath::Ceil" => Builtin::Unary(f64::ceil),
        "TMath::Floor" => Builtin::Unary(f64::floor),
        "TMath::Abs" => Builtin::Unary(f64::abs),
        "TMath::ATan2" => Builtin::Binary(f64::atan2),
        "TMath::Power" | "pow" => Builtin::Binary(f64::powf),
        "TMath::Binomial" => Builtin::Binary(rf_prob::binomial),
        "TMath::Landau" => Builtin::Quad(landau),
        _ => return None,
    };
    Some(b)
}

/// Default short-name → qualified-name aliases.
pub fn default_aliases() -> BTreeMap<String, String> {
    const ALIASES: [(&str, &str); 18] = [
        ("sin", "TMath::Sin"),
        ("cos", "TMath::Cos"),
        ("exp", "TMath::Exp"),
        ("log", "TMath::Log"),
        ("tan", "TMath::Tan"),
        ("sinh", "TMath::SinH"),
        ("cosh", "TMath::CosH"),
        ("tanh", "TMath::TanH"),
        ("asin", "TMath::ASin"),
        ("acos", "TMath::ACos"),
        ("atan", "TMath::ATan"),
        ("atan2", "TMath::ATan2"),
        ("sqrt", "TMath::Sqrt"),
        ("ceil", "TMath::Ceil"),
        ("floor", "TMath::Floor"),
        ("pow", "TMath::Power"),
        ("binomial", "TMath::Binomial"),
        ("abs", "TMath::Abs"),
    ];
    ALIASES.iter().map(|(s, q)| (s.to_string(), q.to_string())).collect()
}
