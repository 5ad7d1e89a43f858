//! `modelsift-engine`: checkpoint-folder parsing, filtering and command rendering.
//!
//! Pure engine crate: receives file descriptors, returns records, selections
//! and command strings. No CLI or filesystem dependencies.

pub mod catalog;
pub mod command;
pub mod error;
pub mod filter;
pub mod parser;
pub mod record;
pub mod session;

pub use catalog::{KeyScope, ModelCatalog, ValueCount, DEFAULT_MARKER_FILENAME};
pub use command::CommandBuilder;
pub use error::{EngineError, TitleIssue};
pub use filter::{matches, FilterSelection, SelectionGroup};
pub use parser::{parse_title, NameParser};
pub use record::{Attributes, FileDescriptor, ModelRecord};
pub use session::{NameParserMode, Session, SessionOptions, SessionView};
