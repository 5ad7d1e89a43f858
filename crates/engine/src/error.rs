use std::fmt;

/// Why a checkpoint folder title did not fit the `type-key-value-...-x-y` convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleIssue {
    /// Fewer than 3 hyphen-delimited tokens; no attributes can be read.
    TooFewTokens { tokens: usize },
    /// A key token reached the end of the attribute range without a value.
    DanglingKey { key: String },
    /// The same key appeared twice; the later value was kept.
    DuplicateKey { key: String },
    /// An attribute used a reserved key; filters on that key never read it.
    ReservedKey { key: String },
}

impl TitleIssue {
    /// Whether strict parsing refuses a title with this issue.
    pub fn is_fatal_when_strict(&self) -> bool {
        matches!(self, Self::TooFewTokens { .. } | Self::DanglingKey { .. })
    }
}

impl fmt::Display for TitleIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewTokens { tokens } => {
                write!(f, "expected at least 3 '-' separated tokens, found {tokens}")
            }
            Self::DanglingKey { key } => write!(f, "key '{key}' has no value"),
            Self::DuplicateKey { key } => write!(f, "key '{key}' appears more than once"),
            Self::ReservedKey { key } => {
                write!(f, "key '{key}' is reserved and cannot be filtered on")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No marker files were found, so there is nothing to filter.
    EmptyCatalog,
    /// A path does not have the `<root>/<title>/<timestamp>/...` shape.
    InvalidPath { path: String },
    /// Strict parsing rejected a title.
    UnparseableTitle { title: String, issue: TitleIssue },
    /// A filter operation named a key that is not part of the selection.
    UnknownAttribute(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCatalog => write!(f, "no models found"),
            Self::InvalidPath { path } => {
                write!(f, "'{path}' is not of the form <root>/<model>/<timestamp>/<file>")
            }
            Self::UnparseableTitle { title, issue } => {
                write!(f, "cannot parse model title '{title}': {issue}")
            }
            Self::UnknownAttribute(key) => write!(f, "unknown attribute: {key}"),
        }
    }
}

impl std::error::Error for EngineError {}
