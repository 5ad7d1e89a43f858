//! `--where` / `--exclude` options: the non-interactive form of the checkboxes.
//!
//! `--where lr=0.1,0.2` keeps only those values selected for `lr`;
//! repeating `--where` for one key adds values. `--exclude lr=0.2` unticks
//! single values. Restrictions are applied before exclusions.

use clap::Args;
use modelsift_engine::Session;

use crate::exit_codes::EXIT_USAGE;
use crate::CliError;

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Keep only these values for a key. Repeatable.
    /// Examples: 'lr=0.1', 'type=Seq2Seq,CNN'
    #[arg(long = "where", value_name = "KEY=VALUES")]
    pub r#where: Vec<String>,

    /// Untick values for a key. Repeatable.
    /// Example: 'lr=0.2'
    #[arg(long, value_name = "KEY=VALUES")]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub key: String,
    pub values: Vec<String>,
}

pub fn parse_clause(expr: &str) -> Result<Clause, CliError> {
    let Some((key, values)) = expr.split_once('=') else {
        return Err(CliError::new(EXIT_USAGE, format!("expected KEY=VALUES, got {expr:?}")));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::new(EXIT_USAGE, format!("empty key in {expr:?}")));
    }
    let values: Vec<String> = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    if values.is_empty() {
        return Err(CliError::new(EXIT_USAGE, format!("no values in {expr:?}")));
    }
    Ok(Clause { key: key.to_string(), values })
}

fn unknown_key(session: &Session, key: &str) -> CliError {
    let keys: Vec<&str> = session.selection().keys().collect();
    CliError::new(EXIT_USAGE, format!("unknown filter key {key:?}"))
        .with_hint(format!("available keys: {}", keys.join(", ")))
}

impl FilterArgs {
    pub fn apply(&self, session: &mut Session) -> Result<(), CliError> {
        let mut restrictions: Vec<Clause> = Vec::new();
        for expr in &self.r#where {
            let clause = parse_clause(expr)?;
            match restrictions.iter_mut().find(|c| c.key == clause.key) {
                Some(existing) => existing.values.extend(clause.values),
                None => restrictions.push(clause),
            }
        }

        for clause in restrictions {
            let group = session
                .selection()
                .group(&clause.key)
                .ok_or_else(|| unknown_key(session, &clause.key))?;
            for value in &clause.values {
                if !group.domain().contains(value) {
                    tracing::warn!("no model has {}={}", clause.key, value);
                }
            }
            session
                .restrict(&clause.key, clause.values)
                .map_err(|e| CliError::new(EXIT_USAGE, e.to_string()))?;
        }

        for expr in &self.exclude {
            let clause = parse_clause(expr)?;
            if session.selection().group(&clause.key).is_none() {
                return Err(unknown_key(session, &clause.key));
            }
            for value in &clause.values {
                if session.selection().is_selected(&clause.key, value) {
                    session
                        .toggle(&clause.key, value)
                        .map_err(|e| CliError::new(EXIT_USAGE, e.to_string()))?;
                }
            }
        }
        Ok(())
    }
}
