//! Sandboxed arithmetic formulas of a single variable `t`.
//!
//! A formula is parsed into a small AST whose leaves can only be numbers,
//! the time variable, or one of a fixed set of constants and functions
//! (see [`function_names`] and [`constant_names`]). There is no way to name
//! anything else, so user input can never reach I/O or other side effects.
//!
//! [`evaluate`] is the fail-safe entry point used by the render loop: any
//! parse or runtime failure collapses to `0.0`. [`CachedFormula`] keeps the
//! parsed form around between frames and only re-parses when the text
//! changes.

mod ast;
mod error;
mod lexer;
mod parser;

use std::fmt;
use std::str::FromStr;

pub use error::{EvalError, ParseError};

use ast::{Expr, CONSTANTS, FUNCTIONS};
use parser::Parser;

/// Longest source text accepted by [`Formula::parse`], in bytes.
pub const MAX_SOURCE_LEN: usize = 4096;

/// Value substituted for any formula that cannot be evaluated.
pub const FALLBACK: f64 = 0.0;

/// Parsed, reusable formula.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    root: Expr,
}

impl Formula {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        if source.len() > MAX_SOURCE_LEN {
            return Err(ParseError::TooLong {
                len: source.len(),
                max: MAX_SOURCE_LEN,
            });
        }
        let tokens = lexer::tokenize(source)?;
        let root = Parser::new(tokens).parse()?;
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluates the formula with `t` bound to the supplied value.
    pub fn eval(&self, t: f64) -> Result<f64, EvalError> {
        self.root.eval(t)
    }

    pub fn eval_or_fallback(&self, t: f64) -> f64 {
        self.eval(t).unwrap_or(FALLBACK)
    }
}

impl FromStr for Formula {
    type Err = ParseError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::parse(source)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parses and evaluates `expression` at `t`, returning [`FALLBACK`] on any failure.
pub fn evaluate(expression: &str, t: f64) -> f64 {
    Formula::parse(expression)
        .map(|formula| formula.eval_or_fallback(t))
        .unwrap_or(FALLBACK)
}

/// Names of every callable function, in declaration order.
pub fn function_names() -> impl Iterator<Item = &'static str> {
    FUNCTIONS.iter().map(|function| function.name())
}

/// Names of every named constant.
pub fn constant_names() -> impl Iterator<Item = &'static str> {
    CONSTANTS.iter().map(|(name, _)| *name)
}

/// Memoises the parse of a formula whose text may change between calls.
///
/// Diagnostics are emitted once per distinct source text, so a broken
/// expression left in place does not log every frame.
#[derive(Debug)]
pub struct CachedFormula {
    source: String,
    parsed: Result<Formula, ParseError>,
    runtime_failure_reported: bool,
    label: &'static str,
}

impl CachedFormula {
    pub fn new(label: &'static str) -> Self {
        Self {
            source: String::new(),
            parsed: Err(ParseError::Empty),
            runtime_failure_reported: false,
            label,
        }
    }

    /// Re-parses only when `source` differs from the cached text.
    pub fn update(&mut self, source: &str) {
        if source == self.source {
            return;
        }
        self.source.clear();
        self.source.push_str(source);
        self.runtime_failure_reported = false;
        self.parsed = Formula::parse(source);
        if let Err(err) = &self.parsed {
            tracing::warn!(
                entry = self.label,
                expression = source,
                error = %err,
                "expression rejected; using {FALLBACK} until it is corrected"
            );
        }
    }

    pub fn evaluate(&mut self, source: &str, t: f64) -> f64 {
        self.update(source);
        let formula = match &self.parsed {
            Ok(formula) => formula,
            Err(_) => return FALLBACK,
        };
        match formula.eval(t) {
            Ok(value) => value,
            Err(err) => {
                if !self.runtime_failure_reported {
                    self.runtime_failure_reported = true;
                    tracing::debug!(
                        entry = self.label,
                        expression = formula.source(),
                        t,
                        error = %err,
                        "expression failed to evaluate; using {FALLBACK}"
                    );
                }
                FALLBACK
            }
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn error(&self) -> Option<&ParseError> {
        self.parsed.as_ref().err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn evaluates_time_and_trig() {
        assert_eq!(evaluate("t", 2.5), 2.5);
        assert!((evaluate("cos(t)", 0.0) - 1.0).abs() < 1e-12);
        assert!((evaluate("-sin(t)", FRAC_PI_2) + 1.0).abs() < 1e-12);
        assert!((evaluate("math.sin(t)", FRAC_PI_2) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn failures_fall_back_to_zero() {
        assert_eq!(evaluate("1/0", 1.0), 0.0);
        assert_eq!(evaluate("1 % (t - 1)", 1.0), 0.0);
        assert_eq!(evaluate("__import__('os')", 1.0), 0.0);
        assert_eq!(evaluate("", 1.0), 0.0);
        assert_eq!(evaluate("   ", 1.0), 0.0);
        assert_eq!(evaluate("sqrt(-1)", 1.0), 0.0);
        assert_eq!(evaluate("exp(1000)", 1.0), 0.0);
        assert_eq!(evaluate("sin(", 1.0), 0.0);
    }

    #[test]
    fn constants_are_available() {
        assert!((evaluate("pi", 0.0) - PI).abs() < 1e-12);
        assert!((evaluate("2*e", 0.0) - 2.0 * std::f64::consts::E).abs() < 1e-12);
        assert!((evaluate("tau/2", 0.0) - PI).abs() < 1e-12);
    }

    #[test]
    fn oversized_input_is_rejected() {
        let source = "1+".repeat(MAX_SOURCE_LEN) + "1";
        assert!(matches!(
            Formula::parse(&source),
            Err(ParseError::TooLong { .. })
        ));
        assert_eq!(evaluate(&source, 0.0), 0.0);
    }

    #[test]
    fn formula_round_trips_source_text() {
        let formula: Formula = "0.5 * cos(2*t)".parse().unwrap();
        assert_eq!(formula.to_string(), "0.5 * cos(2*t)");
        assert!((formula.eval(0.0).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn cached_formula_reparses_only_on_change() {
        let mut cached = CachedFormula::new("a");
        assert_eq!(cached.evaluate("2*t", 3.0), 6.0);
        assert_eq!(cached.source(), "2*t");
        assert!(cached.error().is_none());

        assert_eq!(cached.evaluate("2*", 3.0), 0.0);
        assert_eq!(cached.error(), Some(&ParseError::UnexpectedEnd));

        assert_eq!(cached.evaluate("t/(t-1)", 1.0), 0.0);
        assert!(cached.error().is_none());
        assert_eq!(cached.evaluate("t/(t-1)", 2.0), 2.0);
    }

    #[test]
    fn fresh_cache_reports_empty_expression() {
        let mut cached = CachedFormula::new("b");
        assert_eq!(cached.evaluate("", 1.0), 0.0);
        assert_eq!(cached.error(), Some(&ParseError::Empty));
    }

    #[test]
    fn namespace_lists_are_populated() {
        let functions: Vec<_> = function_names().collect();
        assert!(functions.contains(&"sin"));
        assert!(functions.contains(&"sqrt"));
        assert!(functions.contains(&"abs"));
        let constants: Vec<_> = constant_names().collect();
        assert_eq!(constants, vec!["pi", "e", "tau"]);
    }
}
