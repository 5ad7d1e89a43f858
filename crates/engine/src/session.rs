//! Session state: one catalog, one selection, one command builder.
//!
//! A `Session` is owned by exactly one controller (a CLI command or the
//! interactive browser). Mutations go through `&mut self`; renderers only
//! read the [`SessionView`] returned by [`Session::view`].

use serde::Serialize;

use crate::catalog::{KeyScope, ModelCatalog, DEFAULT_MARKER_FILENAME};
use crate::command::CommandBuilder;
use crate::error::EngineError;
use crate::filter::{self, FilterSelection};
use crate::parser::NameParser;
use crate::record::{FileDescriptor, ModelRecord};

/// Knobs that decide how a directory selection becomes a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub marker_filename: String,
    pub parser: NameParserMode,
    pub key_scope: KeyScope,
    pub command: CommandBuilder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameParserMode {
    #[default]
    Lenient,
    Strict,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            marker_filename: DEFAULT_MARKER_FILENAME.to_string(),
            parser: NameParserMode::Lenient,
            key_scope: KeyScope::First,
            command: CommandBuilder::default(),
        }
    }
}

impl SessionOptions {
    fn name_parser(&self) -> NameParser {
        NameParser {
            strict: self.parser == NameParserMode::Strict,
        }
    }
}

/// Render input derived from the current state.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView<'a> {
    pub matching: Vec<&'a ModelRecord>,
    pub command: String,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct Session {
    options: SessionOptions,
    catalog: ModelCatalog,
    selection: FilterSelection,
}

impl Session {
    /// Build a session from a directory selection.
    ///
    /// Fails with [`EngineError::EmptyCatalog`] when no marker file is found.
    pub fn load(options: SessionOptions, files: &[FileDescriptor]) -> Result<Self, EngineError> {
        let catalog = ModelCatalog::build(files, &options.marker_filename, &options.name_parser())?;
        let selection = FilterSelection::initialize_with(&catalog, options.key_scope)?;
        log::debug!(
            "session loaded: {} models, {} filter keys",
            catalog.len(),
            selection.groups().len()
        );
        Ok(Self { options, catalog, selection })
    }

    /// Replace everything with a new directory selection. On error the
    /// previous state is kept.
    pub fn reload(&mut self, files: &[FileDescriptor]) -> Result<(), EngineError> {
        *self = Self::load(self.options.clone(), files)?;
        Ok(())
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn toggle(&mut self, key: &str, value: &str) -> Result<bool, EngineError> {
        self.selection.toggle(key, value)
    }

    pub fn select_all(&mut self, key: &str) -> Result<(), EngineError> {
        self.selection.select_all(key)
    }

    pub fn deselect_all(&mut self, key: &str) -> Result<(), EngineError> {
        self.selection.deselect_all(key)
    }

    pub fn invert(&mut self, key: &str) -> Result<(), EngineError> {
        self.selection.invert(key)
    }

    pub fn restrict<I, S>(&mut self, key: &str, values: I) -> Result<(), EngineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection.restrict(key, values)
    }

    pub fn matching(&self) -> Vec<&ModelRecord> {
        filter::matches(&self.catalog, &self.selection)
    }

    pub fn command(&self) -> String {
        self.options.command.build(self.matching())
    }

    pub fn view(&self) -> SessionView<'_> {
        let matching = self.matching();
        let command = self.options.command.build(matching.iter().copied());
        SessionView {
            matching,
            command,
            total: self.catalog.len(),
        }
    }
}
