use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ScanError {
    /// The selected path is missing or is not a directory.
    NotADirectory(PathBuf),
    /// Reading the directory tree or a path list failed.
    Io { path: PathBuf, message: String },
    /// A path-list line points outside the directory it is read against.
    OutsideBase { line: String, base: PathBuf },
}

impl ScanError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: impl fmt::Display) -> Self {
        Self::Io { path: path.into(), message: err.to_string() }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotADirectory(path) => write!(f, "{} is not a directory", path.display()),
            Self::Io { path, message } => write!(f, "{}: {message}", path.display()),
            Self::OutsideBase { line, base } => {
                write!(f, "path list entry '{line}' is not inside {}", base.display())
            }
        }
    }
}

impl std::error::Error for ScanError {}
