use rust_decimal::Decimal;

use crate::expr::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    Bool,
    Bounded { lower: usize, upper: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub kind: VarType,
    pub initial: Expr,
}

impl Variable {
    pub fn boolean(name: impl Into<String>, initial: bool) -> Self {
        Variable {
            name: name.into(),
            kind: VarType::Bool,
            initial: Expr::Bool(initial),
        }
    }

    pub fn bounded(name: impl Into<String>, lower: usize, upper: usize, initial: usize) -> Self {
        Variable {
            name: name.into(),
            kind: VarType::Bounded { lower, upper },
            initial: Expr::from(initial),
        }
    }
}

/// A named real-valued constant, left open when `value` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constant {
    pub name: String,
    pub value: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub var: String,
    pub value: Expr,
}

impl Assignment {
    pub fn new(var: impl Into<String>, value: impl Into<Expr>) -> Self {
        Assignment {
            var: var.into(),
            value: value.into(),
        }
    }
}

/// One probabilistic outcome of a command. A missing probability means the
/// outcome is certain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub probability: Option<Expr>,
    pub assignments: Vec<Assignment>,
}

/// A guarded command: `[action] guard -> p1:update1 + p2:update2 + ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub action: Option<String>,
    pub guard: Expr,
    pub branches: Vec<Branch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    Min,
    Max,
}

/// Syntax-neutral MDP handed to the JANI and PRISM renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    /// Free-form text rendered as a leading comment where the syntax allows.
    pub comment: Option<String>,
    pub constants: Vec<Constant>,
    pub actions: Vec<String>,
    pub variables: Vec<Variable>,
    pub commands: Vec<Command>,
    pub goal: Expr,
    pub objective: Objective,
    pub rewards: bool,
}
