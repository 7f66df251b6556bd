use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::ProbabilityError;
use crate::expr::{Expr, div, mul, sub, var};
use crate::level::Direction;

pub const MU: &str = "mu";

/// Probability keys accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionLabel {
    Up,
    Down,
    Left,
    Right,
    /// A random box slides one cell.
    Drift,
}

impl ActionLabel {
    pub const ALL: [ActionLabel; 5] = [
        ActionLabel::Up,
        ActionLabel::Down,
        ActionLabel::Left,
        ActionLabel::Right,
        ActionLabel::Drift,
    ];

    pub fn key(self) -> char {
        match self {
            ActionLabel::Up => 'u',
            ActionLabel::Down => 'd',
            ActionLabel::Left => 'l',
            ActionLabel::Right => 'r',
            ActionLabel::Drift => 'b',
        }
    }

    fn from_key(key: char) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.key() == key)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl From<Direction> for ActionLabel {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::Up => ActionLabel::Up,
            Direction::Down => ActionLabel::Down,
            Direction::Left => ActionLabel::Left,
            Direction::Right => ActionLabel::Right,
        }
    }
}

/// Normalized weight per action label. Labels never mentioned weigh zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbabilityMap {
    weights: [Decimal; 5],
}

impl ProbabilityMap {
    /// Scales the given weights so they sum to one.
    pub fn new(
        entries: impl IntoIterator<Item = (ActionLabel, Decimal)>,
    ) -> Result<Self, ProbabilityError> {
        let mut weights = [Decimal::ZERO; 5];
        for (label, weight) in entries {
            if weight.is_sign_negative() && !weight.is_zero() {
                return Err(ProbabilityError::Negative(format!("{}={}", label.key(), weight)));
            }
            weights[label.index()] += weight;
        }

        let total: Decimal = weights.iter().sum();
        if total.is_zero() {
            return Err(ProbabilityError::ZeroSum);
        }
        for weight in weights.iter_mut() {
            *weight /= total;
        }
        Ok(ProbabilityMap { weights })
    }

    pub fn get(&self, label: ActionLabel) -> Decimal {
        self.weights[label.index()]
    }

    pub fn direction(&self, dir: Direction) -> Decimal {
        self.get(dir.into())
    }

    pub fn drift(&self) -> Decimal {
        self.get(ActionLabel::Drift)
    }
}

impl Default for ProbabilityMap {
    fn default() -> Self {
        let quarter = Decimal::new(25, 2);
        ProbabilityMap {
            weights: [quarter, quarter, quarter, quarter, Decimal::ZERO],
        }
    }
}

/// Parses `u=0.4,d=0.1,l=0.25,r=0.25,b=0`. Keys are case-insensitive.
impl FromStr for ProbabilityMap {
    type Err = ProbabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut seen = [false; 5];
        let mut entries = Vec::new();

        for item in s.split(',').map(str::trim).filter(|item| !item.is_empty()) {
            let (key, value) = item
                .split_once('=')
                .ok_or_else(|| ProbabilityError::Malformed(item.to_string()))?;

            let key = key.trim().to_lowercase();
            let mut chars = key.chars();
            let label = match (chars.next(), chars.next()) {
                (Some(c), None) => ActionLabel::from_key(c),
                _ => None,
            }
            .ok_or_else(|| ProbabilityError::UnknownKey(item.to_string()))?;

            if seen[label.index()] {
                return Err(ProbabilityError::DuplicateKey(label.key()));
            }
            seen[label.index()] = true;

            let value = Decimal::from_str(value.trim())
                .map_err(|_| ProbabilityError::InvalidValue(item.to_string()))?;
            if value.is_sign_negative() && !value.is_zero() {
                return Err(ProbabilityError::Negative(item.to_string()));
            }
            entries.push((label, value));
        }

        ProbabilityMap::new(entries)
    }
}

impl fmt::Display for ProbabilityMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts: Vec<String> = ActionLabel::ALL
            .iter()
            .map(|&label| format!("{}={}", label.key(), self.get(label).normalize()))
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Scales `weights` to sum to exactly one. The last entry absorbs whatever
/// rounding the divisions leave behind. Returns `None` for an all-zero input.
pub fn normalize_exact(weights: &[Decimal]) -> Option<Vec<Decimal>> {
    let total: Decimal = weights.iter().sum();
    if total.is_zero() {
        return None;
    }

    let mut shares: Vec<Decimal> = weights.iter().map(|w| w / total).collect();
    if let Some((last, rest)) = shares.split_last_mut() {
        *last = Decimal::ONE - rest.iter().sum::<Decimal>();
    }
    Some(shares)
}

/// How the `1 - mu` left over by the intended direction is spread over the
/// other enabled directions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Residual {
    /// Every other direction gets `(1-mu)/N`.
    #[default]
    Uniform,
    /// Each other direction gets `(1-mu) * w / Σw`.
    Weighted(ProbabilityMap),
}

/// Directional noise: the intended direction succeeds with probability `mu`.
/// `mu` stays a symbolic constant; a concrete value only fixes its
/// declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoiseConfig {
    mu: Option<Decimal>,
    residual: Residual,
}

impl NoiseConfig {
    pub fn new(mu: Option<Decimal>, residual: Residual) -> Result<Self, ProbabilityError> {
        if let Some(value) = mu {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(ProbabilityError::MuOutOfRange(value.to_string()));
            }
        }
        Ok(NoiseConfig { mu, residual })
    }

    pub fn mu(&self) -> Option<Decimal> {
        self.mu
    }

    /// Probability of the intended direction plus a probability for each of
    /// `others` that receives a share. With no other direction the intended
    /// one is certain and gets no probability.
    pub fn distribute(
        &self,
        others: &[Direction],
    ) -> (Option<Expr>, Vec<(Direction, Expr)>) {
        if others.is_empty() {
            return (None, Vec::new());
        }

        let rest = || sub(1usize, var(MU));

        if let Residual::Weighted(map) = &self.residual {
            let weighted: Vec<Direction> = others
                .iter()
                .copied()
                .filter(|&dir| !map.direction(dir).is_zero())
                .collect();
            let weights: Vec<Decimal> = weighted.iter().map(|&dir| map.direction(dir)).collect();
            if let Some(shares) = normalize_exact(&weights) {
                let branches = weighted
                    .into_iter()
                    .zip(shares)
                    .map(|(dir, share)| {
                        let p = if share == Decimal::ONE {
                            rest()
                        } else {
                            mul(rest(), share)
                        };
                        (dir, p)
                    })
                    .collect();
                return (Some(var(MU)), branches);
            }
        }

        let branches = others
            .iter()
            .map(|&dir| {
                let p = if others.len() == 1 {
                    rest()
                } else {
                    div(rest(), others.len())
                };
                (dir, p)
            })
            .collect();
        (Some(var(MU)), branches)
    }
}
