use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

use sokomdp::{
    EncodingKind, GeneratorConfig, Mode, NoiseConfig, Objective, OverwritePolicy, ProbabilityMap,
    Residual, Syntax, parse_levels, write_models,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SyntaxArg {
    Jani,
    Prism,
}

impl From<SyntaxArg> for Syntax {
    fn from(syntax: SyntaxArg) -> Self {
        match syntax {
            SyntaxArg::Jani => Syntax::Jani,
            SyntaxArg::Prism => Syntax::Prism,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EncodingArg {
    Tile,
    Box,
}

impl From<EncodingArg> for EncodingKind {
    fn from(encoding: EncodingArg) -> Self {
        match encoding {
            EncodingArg::Tile => EncodingKind::Tile,
            EncodingArg::Box => EncodingKind::Box,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Fixed,
    Noise,
    Nondeterministic,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ResidualArg {
    Uniform,
    Weighted,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ObjectiveArg {
    Min,
    Max,
}

impl From<ObjectiveArg> for Objective {
    fn from(objective: ObjectiveArg) -> Self {
        match objective {
            ObjectiveArg::Min => Objective::Min,
            ObjectiveArg::Max => Objective::Max,
        }
    }
}

#[derive(Parser)]
#[command(name = "sokomdp")]
#[command(about = "Generate probabilistic models from Sokoban levels", long_about = None)]
struct Args {
    /// Levels file (read from stdin when omitted)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file; one file per level named <stem>_<index>.<ext>
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Overwrite existing output files without a warning
    #[arg(short, long)]
    force: bool,

    /// Never overwrite existing output files
    #[arg(long, conflicts_with = "force")]
    strict: bool,

    /// Output syntax
    #[arg(long, value_enum, default_value = "jani")]
    syntax: SyntaxArg,

    /// State encoding for boxes
    #[arg(long, value_enum, default_value = "tile")]
    encoding: EncodingArg,

    /// Who chooses the direction of each step
    #[arg(long, value_enum, default_value = "fixed")]
    mode: ModeArg,

    /// Action weights, e.g. "u=0.4,d=0.2,l=0.2,r=0.2,b=0"
    #[arg(short = 'x', long, value_name = "WEIGHTS")]
    probabilities: Option<String>,

    /// Success probability of the intended direction in noise mode
    #[arg(long)]
    mu: Option<Decimal>,

    /// How the failure probability is spread in noise mode
    #[arg(long, value_enum, default_value = "uniform")]
    residual: ResidualArg,

    /// Extremum of the reachability property (default depends on the mode)
    #[arg(long, value_enum)]
    objective: Option<ObjectiveArg>,

    /// Count steps with a reward structure
    #[arg(long)]
    rewards: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn exit_with_error(message: impl std::fmt::Display) -> ! {
    error!("{}", message);
    process::exit(1);
}

fn read_input(path: Option<&PathBuf>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn build_config(args: &Args) -> GeneratorConfig {
    let probabilities = match &args.probabilities {
        Some(text) => text
            .parse::<ProbabilityMap>()
            .unwrap_or_else(|e| exit_with_error(e)),
        None => ProbabilityMap::default(),
    };
    debug!("using probabilities {}", probabilities);

    let mode = match args.mode {
        ModeArg::Fixed => Mode::Fixed(probabilities),
        ModeArg::Noise => {
            let residual = match args.residual {
                ResidualArg::Uniform => Residual::Uniform,
                ResidualArg::Weighted => Residual::Weighted(probabilities),
            };
            Mode::Noise(NoiseConfig::new(args.mu, residual).unwrap_or_else(|e| exit_with_error(e)))
        }
        ModeArg::Nondeterministic => Mode::Nondeterministic,
    };

    if args.mu.is_some() && !matches!(mode, Mode::Noise(_)) {
        warn!("argument --mu ignored outside noise mode");
    }

    GeneratorConfig {
        syntax: args.syntax.into(),
        encoding: args.encoding.into(),
        mode,
        objective: args.objective.map(Into::into),
        rewards: args.rewards,
    }
}

fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if args.debug { "debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let config = build_config(&args);

    let text = read_input(args.input.as_ref())
        .unwrap_or_else(|e| exit_with_error(format!("error reading input: {}", e)));
    let levels = parse_levels(&text).unwrap_or_else(|e| exit_with_error(e));
    debug!("found {} levels", levels.len());

    let policy = if args.force {
        OverwritePolicy::Force
    } else if args.strict {
        OverwritePolicy::Strict
    } else {
        OverwritePolicy::Warn
    };
    if args.output.is_none() && args.force {
        warn!("argument --force ignored as no output file is specified");
    }

    let failures = write_models(
        &levels,
        &config,
        args.output.as_deref(),
        policy,
        &mut io::stdout().lock(),
    );
    if !failures.is_empty() {
        if args.output.is_none() {
            for failure in &failures {
                error!("{}", failure);
            }
        } else {
            error!("{} of {} levels failed", failures.len(), levels.len());
        }
        process::exit(1);
    }
}
