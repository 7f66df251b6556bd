use rust_decimal::Decimal;

/// Syntax-neutral logical expression shared by both output formats.
///
/// The constructors below fold boolean constants so generated guards stay
/// readable: `and([true, x])` is `x`, `ite(true, a, b)` is `a`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Bool(bool),
    Int(i64),
    Real(Decimal),
    /// A variable or constant reference.
    Var(String),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    Eq(Box<Expr>, Box<Expr>),
    Neq(Box<Expr>, Box<Expr>),
    Ite(Box<Expr>, Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Expr::Bool(value)
    }
}

impl From<usize> for Expr {
    fn from(value: usize) -> Self {
        Expr::Int(value as i64)
    }
}

impl From<Decimal> for Expr {
    fn from(value: Decimal) -> Self {
        Expr::Real(value)
    }
}

pub fn var(name: impl Into<String>) -> Expr {
    Expr::Var(name.into())
}

pub fn and(operands: impl IntoIterator<Item = Expr>) -> Expr {
    let mut flat = Vec::new();
    for operand in operands {
        match operand {
            Expr::Bool(true) => {}
            Expr::Bool(false) => return Expr::Bool(false),
            Expr::And(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }
    match flat.len() {
        0 => Expr::Bool(true),
        1 => flat.remove(0),
        _ => Expr::And(flat),
    }
}

pub fn or(operands: impl IntoIterator<Item = Expr>) -> Expr {
    let mut flat = Vec::new();
    for operand in operands {
        match operand {
            Expr::Bool(false) => {}
            Expr::Bool(true) => return Expr::Bool(true),
            Expr::Or(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }
    match flat.len() {
        0 => Expr::Bool(false),
        1 => flat.remove(0),
        _ => Expr::Or(flat),
    }
}

pub fn not(operand: Expr) -> Expr {
    match operand {
        Expr::Bool(value) => Expr::Bool(!value),
        Expr::Not(inner) => *inner,
        other => Expr::Not(Box::new(other)),
    }
}

pub fn eq(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    Expr::Eq(Box::new(left.into()), Box::new(right.into()))
}

pub fn neq(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    Expr::Neq(Box::new(left.into()), Box::new(right.into()))
}

pub fn ite(cond: Expr, then: impl Into<Expr>, otherwise: impl Into<Expr>) -> Expr {
    let then = then.into();
    let otherwise = otherwise.into();
    match cond {
        Expr::Bool(true) => then,
        Expr::Bool(false) => otherwise,
        _ if then == otherwise => then,
        cond => Expr::Ite(Box::new(cond), Box::new(then), Box::new(otherwise)),
    }
}

pub fn sub(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    Expr::Sub(Box::new(left.into()), Box::new(right.into()))
}

pub fn mul(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    Expr::Mul(Box::new(left.into()), Box::new(right.into()))
}

pub fn div(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    Expr::Div(Box::new(left.into()), Box::new(right.into()))
}
