use std::cmp::Ordering;
use std::fmt;

use crate::language::Value;

// ============================================================================
// Numeric Type System
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub enum Numeric {
    /// Whole numbers; overflow is an error rather than a promotion
    Int(i64),

    /// IEEE 754 double precision floating point
    Float(f64),
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Numeric::Int(n) => write!(f, "{n}"),
            Numeric::Float(x) => write!(f, "{x}"),
        }
    }
}

// ============================================================================
// Equality and Comparison
// ============================================================================

impl PartialEq for Numeric {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Numeric {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) => Some(a.cmp(b)),
            _ => self.to_float().partial_cmp(&other.to_float()),
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl Numeric {
    pub fn from_value(value: &Value) -> Option<Numeric> {
        match value {
            Value::Number(n) => Some(Numeric::Int(*n)),
            Value::Decimal(d) => Some(Numeric::Float(*d)),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Numeric::Int(n) => Value::Number(n),
            Numeric::Float(x) => Value::Decimal(x),
        }
    }

    pub fn to_float(&self) -> f64 {
        match self {
            Numeric::Int(n) => *n as f64,
            Numeric::Float(x) => *x,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Numeric::Int(n) => *n == 0,
            Numeric::Float(x) => *x == 0.0,
        }
    }
}

// ============================================================================
// Arithmetic Operations
// ============================================================================

const OVERFLOW: &str = "Integer overflow!";
const DIVISION_BY_ZERO: &str = "Division By Zero!";

impl Numeric {
    pub fn add(&self, other: &Numeric) -> Result<Numeric, String> {
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) => a
                .checked_add(*b)
                .map(Numeric::Int)
                .ok_or_else(|| OVERFLOW.to_string()),
            _ => Ok(Numeric::Float(self.to_float() + other.to_float())),
        }
    }

    pub fn sub(&self, other: &Numeric) -> Result<Numeric, String> {
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) => a
                .checked_sub(*b)
                .map(Numeric::Int)
                .ok_or_else(|| OVERFLOW.to_string()),
            _ => Ok(Numeric::Float(self.to_float() - other.to_float())),
        }
    }

    pub fn mul(&self, other: &Numeric) -> Result<Numeric, String> {
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) => a
                .checked_mul(*b)
                .map(Numeric::Int)
                .ok_or_else(|| OVERFLOW.to_string()),
            _ => Ok(Numeric::Float(self.to_float() * other.to_float())),
        }
    }

    /// Integer division truncates; a zero divisor is an error for both kinds.
    pub fn div(&self, other: &Numeric) -> Result<Numeric, String> {
        if other.is_zero() {
            return Err(DIVISION_BY_ZERO.to_string());
        }
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) => a
                .checked_div(*b)
                .map(Numeric::Int)
                .ok_or_else(|| OVERFLOW.to_string()),
            _ => Ok(Numeric::Float(self.to_float() / other.to_float())),
        }
    }

    pub fn rem(&self, other: &Numeric) -> Result<Numeric, String> {
        match (self, other) {
            (Numeric::Int(_), Numeric::Int(0)) => Err(DIVISION_BY_ZERO.to_string()),
            (Numeric::Int(a), Numeric::Int(b)) => a
                .checked_rem(*b)
                .map(Numeric::Int)
                .ok_or_else(|| OVERFLOW.to_string()),
            _ => Err("Modulo not supported for decimals!".to_string()),
        }
    }

    pub fn neg(&self) -> Result<Numeric, String> {
        match self {
            Numeric::Int(n) => n
                .checked_neg()
                .map(Numeric::Int)
                .ok_or_else(|| OVERFLOW.to_string()),
            Numeric::Float(x) => Ok(Numeric::Float(-x)),
        }
    }
}
