//! Turns command-line input options into a loaded [`Session`].

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use clap::Args;
use modelsift_config::Settings;
use modelsift_engine::{EngineError, FileDescriptor, Session};
use modelsift_io::{read_path_list, scan_directory, ScanError};

use crate::exit_codes::{EXIT_IO, EXIT_NO_MODELS, EXIT_PARSE, EXIT_USAGE};
use crate::CliError;

/// Where the model directories come from.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Directory holding one folder per model (e.g. ./models)
    pub dir: Option<PathBuf>,

    /// Read marker paths from a file instead, one per line (- for stdin)
    #[arg(long, value_name = "FILE", conflicts_with = "dir")]
    pub from_list: Option<String>,
}

impl InputArgs {
    /// Short label for titles and messages.
    pub fn label(&self) -> String {
        match (&self.dir, &self.from_list) {
            (Some(dir), _) => dir.display().to_string(),
            (None, Some(list)) if list == "-" => "<stdin>".to_string(),
            (None, Some(list)) => list.clone(),
            (None, None) => String::new(),
        }
    }

    pub fn reads_stdin(&self) -> bool {
        self.from_list.as_deref() == Some("-")
    }
}

/// A session plus what is needed to find files next to its records.
pub struct Loaded {
    pub session: Session,
    /// Base that record paths are relative to.
    pub base: PathBuf,
}

/// Collect file descriptors for `input`. Returns the resolution base too.
pub fn collect_files(input: &InputArgs) -> Result<(Vec<FileDescriptor>, PathBuf), CliError> {
    match (&input.dir, &input.from_list) {
        (Some(dir), _) => {
            let scan = scan_directory(dir).map_err(scan_error)?;
            Ok((scan.files, scan.base))
        }
        (None, Some(list)) => {
            let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            let files = if list == "-" {
                read_path_list(io::stdin().lock(), &base)
            } else {
                let file = File::open(list)
                    .map_err(|e| CliError::new(EXIT_IO, format!("{list}: {e}")))?;
                read_path_list(BufReader::new(file), &base)
            }
            .map_err(scan_error)?;
            Ok((files, base))
        }
        (None, None) => Err(CliError::new(EXIT_USAGE, "no input given")
            .with_hint("pass a models directory, or --from-list FILE")),
    }
}

fn scan_error(err: ScanError) -> CliError {
    match err {
        ScanError::OutsideBase { .. } => CliError::new(EXIT_USAGE, err.to_string())
            .with_hint("list paths from inside the current directory, e.g. find models -name model.ckpt.meta"),
        _ => CliError::new(EXIT_IO, err.to_string()),
    }
}

pub fn load_session(input: &InputArgs, settings: &Settings) -> Result<Loaded, CliError> {
    let (files, base) = collect_files(input)?;
    let session = Session::load(settings.session_options(), &files)
        .map_err(|e| engine_error(e, input, settings))?;
    Ok(Loaded { session, base })
}

/// Map an engine failure to an exit code and a hint.
pub fn engine_error(err: EngineError, input: &InputArgs, settings: &Settings) -> CliError {
    match &err {
        EngineError::EmptyCatalog => {
            CliError::new(EXIT_NO_MODELS, format!("no models found in {}", input.label()))
                .with_hint(format!(
                    "expected <dir>/<model>/<timestamp>/{}",
                    settings.marker_filename
                ))
        }
        EngineError::InvalidPath { .. } => CliError::new(EXIT_PARSE, err.to_string())
            .with_hint("paths must include the selected directory name as their first segment"),
        EngineError::UnparseableTitle { .. } => CliError::new(EXIT_PARSE, err.to_string())
            .with_hint("drop --strict (or parsing.strict_titles) to keep such models"),
        EngineError::UnknownAttribute(_) => CliError::new(EXIT_USAGE, err.to_string()),
    }
}
