use rust_decimal::Decimal;
use tracing::debug;

use crate::encoding::{BoxEncoding, Encoding, EncodingKind, POSITION, TileEncoding, conditional};
use crate::error::GenerateError;
use crate::expr::{Expr, and, eq, neq, not, var};
use crate::level::{ALL_DIRECTIONS, Direction, Level};
use crate::model::{Assignment, Branch, Command, Constant, Model, Objective, Variable};
use crate::probability::{MU, NoiseConfig, ProbabilityMap, normalize_exact};
use crate::rules::{Motion, Step, step_table};
use crate::{jani, prism};

pub const DRIFT: &str = "drift";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Jani,
    Prism,
}

/// Who resolves the choice between directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Nature picks a direction with a fixed probability each step.
    Fixed(ProbabilityMap),
    /// The player picks a direction, which succeeds with probability `mu`.
    Noise(NoiseConfig),
    /// The player picks a direction, which always succeeds.
    Nondeterministic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub syntax: Syntax,
    pub encoding: EncodingKind,
    pub mode: Mode,
    /// Overrides the mode's default objective when set.
    pub objective: Option<Objective>,
    /// Emit a reward structure counting steps.
    pub rewards: bool,
}

impl GeneratorConfig {
    /// Fixed mode has no player choice left, so the interesting question is
    /// how likely the walk ends up solved at all; otherwise the best player.
    pub fn objective(&self) -> Objective {
        self.objective.unwrap_or(match self.mode {
            Mode::Fixed(_) => Objective::Min,
            Mode::Noise(_) | Mode::Nondeterministic => Objective::Max,
        })
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            syntax: Syntax::Jani,
            encoding: EncodingKind::Tile,
            mode: Mode::Fixed(ProbabilityMap::default()),
            objective: None,
            rewards: false,
        }
    }
}

/// A guarded update: the condition under which a motion is possible and the
/// state change it makes.
#[derive(Debug, Clone)]
struct Effect {
    guard: Expr,
    updates: Vec<Assignment>,
}

impl Effect {
    /// The updates in a form that leaves the state untouched when the guard
    /// does not hold.
    fn conditional(&self) -> Vec<Assignment> {
        conditional(&self.guard, self.updates.clone())
    }
}

fn motion_effect<E: Encoding>(encoding: &E, motion: Motion) -> Effect {
    match motion {
        Motion::Walk { to } => Effect {
            guard: not(encoding.occupied(to)),
            updates: vec![Assignment::new(POSITION, to)],
        },
        Motion::Shove { to, beyond } => {
            let mut updates = vec![Assignment::new(POSITION, to)];
            updates.extend(encoding.shove(to, beyond));
            Effect {
                guard: and([encoding.occupied(to), not(encoding.occupied(beyond))]),
                updates,
            }
        }
    }
}

/// Both motions of a step folded into one effect.
fn step_effect<E: Encoding>(encoding: &E, step: Step) -> Effect {
    match step {
        Step::Move { to, .. } => motion_effect(encoding, Motion::Walk { to }),
        Step::Push { to, beyond, .. } => {
            let mut updates = vec![Assignment::new(POSITION, to)];
            updates.extend(encoding.shove(to, beyond));
            Effect {
                guard: not(and([encoding.occupied(to), encoding.occupied(beyond)])),
                updates,
            }
        }
    }
}

fn at(cell: usize) -> Expr {
    eq(var(POSITION), cell)
}

fn certain(assignments: Vec<Assignment>) -> Vec<Branch> {
    vec![Branch {
        probability: None,
        assignments,
    }]
}

/// Turns shares into branches with probabilities summing to exactly one.
/// Zero shares are dropped; with nothing left the state stays put.
fn weighted_branches(shares: Vec<(Decimal, Vec<Assignment>)>) -> Vec<Branch> {
    let mut shares: Vec<_> = shares.into_iter().filter(|(p, _)| !p.is_zero()).collect();
    if shares.len() == 1 {
        if let Some((_, assignments)) = shares.pop() {
            return certain(assignments);
        }
    }

    let weights: Vec<Decimal> = shares.iter().map(|(p, _)| *p).collect();
    match normalize_exact(&weights) {
        Some(normalized) => shares
            .into_iter()
            .zip(normalized)
            .map(|((_, assignments), p)| Branch {
                probability: Some(p.into()),
                assignments,
            })
            .collect(),
        None => certain(Vec::new()),
    }
}

fn nondeterministic_commands<E: Encoding>(level: &Level, encoding: &E) -> Vec<Command> {
    let mut commands = Vec::new();
    for (cell, row) in step_table(level) {
        for (dir, step) in row {
            let effect = step_effect(encoding, step);
            commands.push(Command {
                action: Some(dir.name().to_string()),
                guard: and([at(cell), effect.guard]),
                branches: certain(effect.updates),
            });
        }
    }
    commands
}

/// One labelled command per enabled direction: the intended step happens
/// with probability `mu`, otherwise one of the other directions is tried.
fn noise_commands<E: Encoding>(level: &Level, encoding: &E, noise: &NoiseConfig) -> Vec<Command> {
    let mut commands = Vec::new();
    for (cell, row) in step_table(level) {
        let effects: Vec<(Direction, Effect)> = row
            .iter()
            .map(|&(dir, step)| (dir, step_effect(encoding, step)))
            .collect();

        for (dir, effect) in &effects {
            let others: Vec<Direction> = effects
                .iter()
                .map(|(other, _)| *other)
                .filter(|other| other != dir)
                .collect();
            let (intended, residual) = noise.distribute(&others);

            let mut branches = vec![Branch {
                probability: intended,
                assignments: effect.updates.clone(),
            }];
            for (other, probability) in residual {
                if let Some((_, slip)) = effects.iter().find(|(d, _)| *d == other) {
                    branches.push(Branch {
                        probability: Some(probability),
                        assignments: slip.conditional(),
                    });
                }
            }

            commands.push(Command {
                action: Some(dir.name().to_string()),
                guard: and([at(cell), effect.guard.clone()]),
                branches,
            });
        }
    }
    commands
}

/// One unlabelled command per cell. Each direction's share goes to its walk
/// and shove outcomes in equal parts; a drift share hands the next move to
/// the box-sliding adversary.
fn fixed_commands<E: Encoding>(level: &Level, encoding: &E, map: &ProbabilityMap) -> Vec<Command> {
    let drift = !map.drift().is_zero();
    let mut commands = Vec::new();

    for (cell, row) in step_table(level) {
        let mut shares = Vec::new();
        for (dir, step) in row {
            let motions = step.motions();
            let share = map.direction(dir) / Decimal::from(motions.len());
            for motion in motions {
                shares.push((share, motion_effect(encoding, motion).conditional()));
            }
        }
        if drift {
            shares.push((map.drift(), vec![Assignment::new(DRIFT, true)]));
        }

        let guard = if drift {
            and([at(cell), not(var(DRIFT))])
        } else {
            at(cell)
        };
        commands.push(Command {
            action: None,
            guard,
            branches: weighted_branches(shares),
        });
    }

    if drift {
        commands.extend(drift_commands(level, encoding));
    }
    commands
}

/// Adversarial box slides: any box may move to a free adjacent reachable
/// cell the player does not stand on, or nothing moves.
fn drift_commands<E: Encoding>(level: &Level, encoding: &E) -> Vec<Command> {
    let reachable = level.reachable_tiles();
    let mut commands = Vec::new();

    for from in reachable.iter() {
        for dir in ALL_DIRECTIONS {
            let Some(to) = level.neighbor(from, dir).filter(|&to| reachable.contains(to)) else {
                continue;
            };
            for (pick, mut updates) in encoding.slides(from, to) {
                updates.push(Assignment::new(DRIFT, false));
                commands.push(Command {
                    action: Some(DRIFT.to_string()),
                    guard: and([
                        var(DRIFT),
                        pick,
                        not(encoding.occupied(to)),
                        neq(var(POSITION), to),
                    ]),
                    branches: certain(updates),
                });
            }
        }
    }

    commands.push(Command {
        action: Some(DRIFT.to_string()),
        guard: var(DRIFT),
        branches: certain(vec![Assignment::new(DRIFT, false)]),
    });
    commands
}

/// Builds the syntax-neutral model of `level` under one encoding.
pub fn build_model<E: Encoding>(level: &Level, encoding: &E, config: &GeneratorConfig) -> Model {
    let mut variables = vec![Variable::bounded(
        POSITION,
        level.first_pos(),
        level.last_pos(),
        level.player(),
    )];
    variables.extend(encoding.variables());

    let mut constants = Vec::new();
    let actions: Vec<String>;
    let commands = match &config.mode {
        Mode::Fixed(map) => {
            if map.drift().is_zero() {
                actions = Vec::new();
            } else {
                variables.push(Variable::boolean(DRIFT, false));
                actions = vec![DRIFT.to_string()];
            }
            fixed_commands(level, encoding, map)
        }
        Mode::Noise(noise) => {
            constants.push(Constant {
                name: MU.to_string(),
                value: noise.mu(),
            });
            actions = direction_actions();
            noise_commands(level, encoding, noise)
        }
        Mode::Nondeterministic => {
            actions = direction_actions();
            nondeterministic_commands(level, encoding)
        }
    };

    let comment = level.to_string();
    Model {
        comment: Some(comment.trim_end().to_string()),
        constants,
        actions,
        variables,
        commands,
        goal: encoding.goal(),
        objective: config.objective(),
        rewards: config.rewards,
    }
}

fn direction_actions() -> Vec<String> {
    ALL_DIRECTIONS.iter().map(|dir| dir.name().to_string()).collect()
}

/// Renders the model of one level in the configured syntax.
pub fn generate(level: &Level, config: &GeneratorConfig) -> Result<String, GenerateError> {
    let model = match config.encoding {
        EncodingKind::Tile => build_model(level, &TileEncoding::new(level), config),
        EncodingKind::Box => build_model(level, &BoxEncoding::new(level), config),
    };
    debug!(
        variables = model.variables.len(),
        commands = model.commands.len(),
        "built model"
    );

    match config.syntax {
        Syntax::Jani => jani::render(&model),
        Syntax::Prism => Ok(prism::render(&model)),
    }
}
