use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::error::OutputError;
use crate::generator::{GeneratorConfig, generate};
use crate::level::Level;

/// What to do when a target file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Overwrite, with a warning.
    #[default]
    Warn,
    /// Overwrite silently.
    Force,
    /// Leave the file alone and report the level as failed.
    Strict,
}

/// `out/model.jani` becomes `out/model_<index>.jani`.
pub fn indexed_path(base: &Path, index: usize) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{}_{}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}_{}", stem, index),
    };
    base.with_file_name(name)
}

fn write_file(path: &Path, text: &str, policy: OverwritePolicy) -> Result<(), OutputError> {
    if path.exists() {
        match policy {
            OverwritePolicy::Strict => {
                return Err(OutputError::Collision {
                    path: path.to_path_buf(),
                });
            }
            OverwritePolicy::Warn => {
                warn!("file '{}' already exists, overwriting", path.display());
            }
            OverwritePolicy::Force => {}
        }
    }

    let io_error = |source: io::Error| OutputError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    fs::write(path, text).map_err(io_error)?;
    debug!("wrote {}", path.display());
    Ok(())
}

/// Generates and places one model per level.
///
/// Without `target` the single model goes to `stdout`. With a target every
/// level goes to its own indexed file; a failing level is logged and
/// collected while the rest of the batch carries on.
pub fn write_models<W: Write>(
    levels: &[Level],
    config: &GeneratorConfig,
    target: Option<&Path>,
    policy: OverwritePolicy,
    stdout: &mut W,
) -> Vec<OutputError> {
    let Some(base) = target else {
        if levels.len() != 1 {
            return vec![OutputError::AmbiguousStdout {
                levels: levels.len(),
            }];
        }
        let result = generate(&levels[0], config)
            .map_err(OutputError::from)
            .and_then(|text| {
                stdout.write_all(text.as_bytes()).map_err(|source| OutputError::Io {
                    path: PathBuf::from("<stdout>"),
                    source,
                })
            });
        return result.err().into_iter().collect();
    };

    let mut failures = Vec::new();
    for (index, level) in levels.iter().enumerate() {
        let path = indexed_path(base, index);
        let result = generate(level, config)
            .map_err(OutputError::from)
            .and_then(|text| write_file(&path, &text, policy));
        if let Err(err) = result {
            error!("level {}: {}", index, err);
            failures.push(err);
        }
    }
    failures
}
