//! Monitoring command rendered from a matching subset.

use std::collections::HashSet;

use crate::record::ModelRecord;

pub const DEFAULT_TOOL: &str = "tensorboard";
pub const DEFAULT_LOGDIR_PREFIX: &str = "models/";

/// Builds `<tool> --logdir=<prefix><title>,...`.
///
/// Directories keep the order of the input. Repeated titles are emitted once
/// per record unless `dedupe` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBuilder {
    pub tool: String,
    pub logdir_prefix: String,
    pub dedupe: bool,
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self {
            tool: DEFAULT_TOOL.to_string(),
            logdir_prefix: DEFAULT_LOGDIR_PREFIX.to_string(),
            dedupe: false,
        }
    }
}

impl CommandBuilder {
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into(), ..Self::default() }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.logdir_prefix = prefix.into();
        self
    }

    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }

    /// Log directories for `models`, in order.
    pub fn logdirs<'a, I>(&self, models: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a ModelRecord>,
    {
        let mut seen = HashSet::new();
        models
            .into_iter()
            .map(|m| format!("{}{}", self.logdir_prefix, m.title()))
            .filter(|dir| !self.dedupe || seen.insert(dir.clone()))
            .collect()
    }

    pub fn build<'a, I>(&self, models: I) -> String
    where
        I: IntoIterator<Item = &'a ModelRecord>,
    {
        format!("{} --logdir={}", self.tool, self.logdirs(models).join(","))
    }
}
