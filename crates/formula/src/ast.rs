use crate::error::EvalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl BinaryOp {
    fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "addition",
            BinaryOp::Sub => "subtraction",
            BinaryOp::Mul => "multiplication",
            BinaryOp::Div => "division",
            BinaryOp::Rem => "modulo",
            BinaryOp::Pow => "exponentiation",
        }
    }

    fn apply(self, lhs: f64, rhs: f64) -> Result<f64, EvalError> {
        let value = match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => {
                if rhs == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                lhs / rhs
            }
            BinaryOp::Rem => {
                if rhs == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                // Floored modulo: the result takes the sign of the divisor.
                lhs - rhs * (lhs / rhs).floor()
            }
            BinaryOp::Pow => lhs.powf(rhs),
        };
        finite(value, self.name())
    }
}

/// Every callable reachable from a formula. Nothing outside this list resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Sinh,
    Cosh,
    Tanh,
    Sqrt,
    Exp,
    Ln,
    Log,
    Log2,
    Log10,
    Abs,
    Floor,
    Ceil,
    Round,
    Sign,
    Min,
    Max,
    Pow,
    Hypot,
}

pub(crate) const FUNCTIONS: &[Function] = &[
    Function::Sin,
    Function::Cos,
    Function::Tan,
    Function::Asin,
    Function::Acos,
    Function::Atan,
    Function::Atan2,
    Function::Sinh,
    Function::Cosh,
    Function::Tanh,
    Function::Sqrt,
    Function::Exp,
    Function::Ln,
    Function::Log,
    Function::Log2,
    Function::Log10,
    Function::Abs,
    Function::Floor,
    Function::Ceil,
    Function::Round,
    Function::Sign,
    Function::Min,
    Function::Max,
    Function::Pow,
    Function::Hypot,
];

pub(crate) const CONSTANTS: &[(&str, f64)] = &[
    ("pi", std::f64::consts::PI),
    ("e", std::f64::consts::E),
    ("tau", std::f64::consts::TAU),
];

impl Function {
    pub(crate) fn lookup(name: &str) -> Option<Self> {
        FUNCTIONS.iter().copied().find(|function| function.name() == name)
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Atan2 => "atan2",
            Function::Sinh => "sinh",
            Function::Cosh => "cosh",
            Function::Tanh => "tanh",
            Function::Sqrt => "sqrt",
            Function::Exp => "exp",
            Function::Ln => "ln",
            Function::Log => "log",
            Function::Log2 => "log2",
            Function::Log10 => "log10",
            Function::Abs => "abs",
            Function::Floor => "floor",
            Function::Ceil => "ceil",
            Function::Round => "round",
            Function::Sign => "sign",
            Function::Min => "min",
            Function::Max => "max",
            Function::Pow => "pow",
            Function::Hypot => "hypot",
        }
    }

    /// Inclusive argument bounds; `None` as the upper bound means variadic.
    pub(crate) fn arity(self) -> (usize, Option<usize>) {
        match self {
            Function::Atan2 | Function::Pow | Function::Hypot => (2, Some(2)),
            Function::Log => (1, Some(2)),
            Function::Min | Function::Max => (1, None),
            _ => (1, Some(1)),
        }
    }

    pub(crate) fn describe_arity(self) -> String {
        match self.arity() {
            (min, Some(max)) if min == max => min.to_string(),
            (min, Some(max)) => format!("{min} to {max}"),
            (min, None) => format!("at least {min}"),
        }
    }

    fn apply(self, args: &[f64]) -> Result<f64, EvalError> {
        let x = args.first().copied().unwrap_or(0.0);
        let y = args.get(1).copied();
        let value = match self {
            Function::Sin => x.sin(),
            Function::Cos => x.cos(),
            Function::Tan => x.tan(),
            Function::Asin => x.asin(),
            Function::Acos => x.acos(),
            Function::Atan => x.atan(),
            Function::Atan2 => x.atan2(y.unwrap_or(0.0)),
            Function::Sinh => x.sinh(),
            Function::Cosh => x.cosh(),
            Function::Tanh => x.tanh(),
            Function::Sqrt => x.sqrt(),
            Function::Exp => x.exp(),
            Function::Ln => x.ln(),
            Function::Log => match y {
                Some(base) => {
                    let denominator = base.ln();
                    if denominator == 0.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    x.ln() / denominator
                }
                None => x.ln(),
            },
            Function::Log2 => x.log2(),
            Function::Log10 => x.log10(),
            Function::Abs => x.abs(),
            Function::Floor => x.floor(),
            Function::Ceil => x.ceil(),
            Function::Round => x.round_ties_even(),
            Function::Sign => {
                if x > 0.0 {
                    1.0
                } else if x < 0.0 {
                    -1.0
                } else {
                    0.0
                }
            }
            Function::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
            Function::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Function::Pow => x.powf(y.unwrap_or(1.0)),
            Function::Hypot => x.hypot(y.unwrap_or(0.0)),
        };
        finite(value, self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Number(f64),
    Time,
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
}

impl Expr {
    pub(crate) fn eval(&self, t: f64) -> Result<f64, EvalError> {
        match self {
            Expr::Number(value) => Ok(*value),
            Expr::Time => Ok(t),
            Expr::Neg(inner) => Ok(-inner.eval(t)?),
            Expr::Binary(op, lhs, rhs) => op.apply(lhs.eval(t)?, rhs.eval(t)?),
            Expr::Call(function, args) => {
                let values = args
                    .iter()
                    .map(|arg| arg.eval(t))
                    .collect::<Result<Vec<_>, _>>()?;
                function.apply(&values)
            }
        }
    }
}

fn finite(value: f64, operation: &'static str) -> Result<f64, EvalError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::NonFinite { operation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modulo_follows_divisor_sign() {
        assert_eq!(BinaryOp::Rem.apply(7.0, 3.0), Ok(1.0));
        assert_eq!(BinaryOp::Rem.apply(-7.0, 3.0), Ok(2.0));
        assert_eq!(BinaryOp::Rem.apply(1.0, 0.0), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn domain_errors_surface_as_non_finite() {
        assert_eq!(
            Function::Sqrt.apply(&[-1.0]),
            Err(EvalError::NonFinite { operation: "sqrt" })
        );
        assert_eq!(
            Function::Ln.apply(&[0.0]),
            Err(EvalError::NonFinite { operation: "ln" })
        );
    }

    #[test]
    fn log_accepts_optional_base() {
        let value = Function::Log.apply(&[8.0, 2.0]).unwrap();
        assert!((value - 3.0).abs() < 1e-12);
        assert_eq!(Function::Log.apply(&[4.0, 1.0]), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn every_function_has_a_unique_name() {
        for function in FUNCTIONS {
            assert_eq!(Function::lookup(function.name()), Some(*function));
        }
    }
}
