//! Turns Sokoban levels into Markov decision processes for probabilistic
//! model checkers, in JANI or PRISM syntax.

mod bits;
pub mod encoding;
pub mod error;
pub mod expr;
pub mod generator;
pub mod jani;
pub mod level;
pub mod levels;
pub mod model;
pub mod output;
pub mod prism;
pub mod probability;
pub mod rle;
pub mod rules;

pub use bits::CellSet;
pub use encoding::EncodingKind;
pub use generator::{GeneratorConfig, Mode, Syntax, generate};
pub use level::{Direction, Level, Tile};
pub use levels::parse_levels;
pub use model::Objective;
pub use output::{OverwritePolicy, write_models};
pub use probability::{ActionLabel, NoiseConfig, ProbabilityMap, Residual};
