//! Folder-name parser.
//!
//! Checkpoint folders are named `<type>-<k1>-<v1>-...-<kN>-<vN>-<x>-<y>`.
//! The first token is the model type, the final two tokens are a suffix that
//! carries no attributes, and everything in between is read as alternating
//! key/value tokens.
//!
//! Key/value reading is a two-state machine over the attribute range only:
//!
//! ```text
//!   AwaitKey --token--> AwaitValue(key) --token--> AwaitKey   (insert key=token)
//! ```
//!
//! A key still in `AwaitValue` when the range ends takes the first suffix
//! token as its value and is reported as [`TitleIssue::DanglingKey`].

use crate::error::{EngineError, TitleIssue};
use crate::record::{Attributes, ModelRecord, RESERVED_KEYS, TYPE_KEY};

/// Number of trailing title tokens that never carry attributes.
const SUFFIX_TOKENS: usize = 2;

/// Minimum token count for a title to follow the naming convention.
const MIN_TOKENS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairState<'a> {
    AwaitKey,
    AwaitValue(&'a str),
}

/// Result of reading one folder title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTitle {
    pub model_type: String,
    pub attributes: Attributes,
    /// Everything that did not fit the convention, in discovery order.
    pub issues: Vec<TitleIssue>,
}

impl ParsedTitle {
    /// True when the title was too short to carry any attributes.
    pub fn is_degenerate(&self) -> bool {
        self.issues
            .iter()
            .any(|i| matches!(i, TitleIssue::TooFewTokens { .. }))
    }
}

/// Split a title into type and attributes. Never fails.
pub fn parse_title(title: &str) -> ParsedTitle {
    let tokens: Vec<&str> = title.split('-').collect();
    let model_type = tokens.first().copied().unwrap_or_default().to_string();
    let mut attributes = Attributes::new();
    let mut issues = Vec::new();

    if tokens.len() < MIN_TOKENS {
        issues.push(TitleIssue::TooFewTokens { tokens: tokens.len() });
        return ParsedTitle { model_type, attributes, issues };
    }

    let body = &tokens[1..tokens.len() - SUFFIX_TOKENS];
    let mut state = PairState::AwaitKey;
    for &token in body {
        state = match state {
            PairState::AwaitKey => PairState::AwaitValue(token),
            PairState::AwaitValue(key) => {
                insert_pair(&mut attributes, &mut issues, key, token);
                PairState::AwaitKey
            }
        };
    }
    if let PairState::AwaitValue(key) = state {
        issues.push(TitleIssue::DanglingKey { key: key.to_string() });
        let value = tokens[tokens.len() - SUFFIX_TOKENS];
        insert_pair(&mut attributes, &mut issues, key, value);
    }

    ParsedTitle { model_type, attributes, issues }
}

fn insert_pair(attributes: &mut Attributes, issues: &mut Vec<TitleIssue>, key: &str, value: &str) {
    if key == TYPE_KEY || RESERVED_KEYS.contains(&key) {
        issues.push(TitleIssue::ReservedKey { key: key.to_string() });
    }
    if attributes.insert(key, value) {
        issues.push(TitleIssue::DuplicateKey { key: key.to_string() });
    }
}

/// A record plus the title issues met while building it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub record: ModelRecord,
    pub issues: Vec<TitleIssue>,
}

/// Turns `<root>/<title>/<timestamp>/...` paths into [`ModelRecord`]s.
///
/// Lenient by default: odd titles still produce a record and the problems are
/// reported in [`ParsedRecord::issues`]. With `strict` set, any issue for which
/// [`TitleIssue::is_fatal_when_strict`] holds is returned as an error instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameParser {
    pub strict: bool,
}

impl NameParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        Self { strict: true }
    }

    pub fn parse(&self, relative_path: &str) -> Result<ParsedRecord, EngineError> {
        let segments: Vec<&str> = relative_path.split('/').collect();
        if segments.len() < 3 {
            return Err(EngineError::InvalidPath {
                path: relative_path.to_string(),
            });
        }
        let title = segments[1];
        let timestamp = segments[2];

        let parsed = parse_title(title);
        if self.strict {
            if let Some(issue) = parsed.issues.iter().find(|i| i.is_fatal_when_strict()) {
                return Err(EngineError::UnparseableTitle {
                    title: title.to_string(),
                    issue: issue.clone(),
                });
            }
        }

        let record = ModelRecord::new(
            relative_path,
            title,
            timestamp,
            parsed.model_type,
            parsed.attributes,
        );
        Ok(ParsedRecord { record, issues: parsed.issues })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(rec: &ParsedTitle) -> Vec<(&str, &str)> {
        rec.attributes.iter().collect()
    }

    #[test]
    fn pairs_are_read_and_suffix_dropped() {
        let parsed = parse_title("A-k1-v1-k2-v2-x-y");
        assert_eq!(parsed.model_type, "A");
        assert_eq!(attrs(&parsed), vec![("k1", "v1"), ("k2", "v2")]);
        assert!(parsed.issues.is_empty());
    }

    #[test]
    fn single_token_is_degenerate() {
        let parsed = parse_title("A");
        assert_eq!(parsed.model_type, "A");
        assert!(parsed.attributes.is_empty());
        assert!(parsed.is_degenerate());
        assert_eq!(parsed.issues, vec![TitleIssue::TooFewTokens { tokens: 1 }]);
    }

    #[test]
    fn two_tokens_are_degenerate() {
        let parsed = parse_title("A-b");
        assert_eq!(parsed.model_type, "A");
        assert!(parsed.attributes.is_empty());
        assert!(parsed.is_degenerate());
    }

    #[test]
    fn three_tokens_have_only_suffix() {
        let parsed = parse_title("A-x-y");
        assert_eq!(parsed.model_type, "A");
        assert!(parsed.attributes.is_empty());
        assert!(parsed.issues.is_empty());
    }

    #[test]
    fn dangling_key_takes_first_suffix_token() {
        let parsed = parse_title("A-k1-v1-k2-x-y");
        assert_eq!(attrs(&parsed), vec![("k1", "v1"), ("k2", "x")]);
        assert_eq!(
            parsed.issues,
            vec![TitleIssue::DanglingKey { key: "k2".into() }]
        );
    }

    #[test]
    fn dangling_key_overwrites_earlier_pair() {
        let parsed = parse_title("A-lr-0.1-lr-x-y");
        assert_eq!(attrs(&parsed), vec![("lr", "x")]);
        assert_eq!(
            parsed.issues,
            vec![
                TitleIssue::DanglingKey { key: "lr".into() },
                TitleIssue::DuplicateKey { key: "lr".into() },
            ]
        );
    }

    #[test]
    fn type_attribute_is_reported_as_reserved() {
        let parsed = parse_title("A-type-B-lr-0.1-x-y");
        assert_eq!(parsed.model_type, "A");
        assert_eq!(attrs(&parsed), vec![("type", "B"), ("lr", "0.1")]);
        assert_eq!(
            parsed.issues,
            vec![TitleIssue::ReservedKey { key: "type".into() }]
        );
    }

    #[test]
    fn type_filter_still_reads_model_type() {
        let parsed = NameParser::new()
            .parse("models/A-type-B-x-y/t/model.ckpt.meta")
            .unwrap();
        assert_eq!(parsed.record.value_of("type"), Some("A"));
        assert_eq!(parsed.record.attributes().get("type"), Some("B"));
        assert!(NameParser::strict().parse("models/A-type-B-x-y/t/f").is_ok());
    }

    #[test]
    fn repeated_key_keeps_last_value() {
        let parsed = parse_title("A-lr-0.1-lr-0.2-x-y");
        assert_eq!(attrs(&parsed), vec![("lr", "0.2")]);
        assert_eq!(
            parsed.issues,
            vec![TitleIssue::DuplicateKey { key: "lr".into() }]
        );
    }

    #[test]
    fn writer_style_name() {
        let parsed = parse_title("Seq2SeqRegressor-X-200-H-50_30_10-I-he-D-None");
        assert_eq!(parsed.model_type, "Seq2SeqRegressor");
        assert_eq!(attrs(&parsed), vec![("X", "200"), ("H", "50_30_10"), ("I", "he")]);
        assert_eq!(parsed.issues, vec![]);
    }

    #[test]
    fn parse_reads_title_and_timestamp_segments() {
        let parsed = NameParser::new()
            .parse("models/A-lr-0.1-x-y/20171116-2329/model.ckpt.meta")
            .unwrap();
        assert_eq!(parsed.record.title(), "A-lr-0.1-x-y");
        assert_eq!(parsed.record.timestamp(), "20171116-2329");
        assert_eq!(parsed.record.model_type(), "A");
        assert_eq!(parsed.record.attributes().get("lr"), Some("0.1"));
        assert_eq!(parsed.record.path(), "models/A-lr-0.1-x-y/20171116-2329/model.ckpt.meta");
    }

    #[test]
    fn short_path_is_rejected() {
        let err = NameParser::new().parse("models/A-lr-0.1-x-y").unwrap_err();
        assert!(matches!(err, EngineError::InvalidPath { .. }));
    }

    #[test]
    fn lenient_parse_keeps_degenerate_titles() {
        let parsed = NameParser::new().parse("models/A/t/model.ckpt.meta").unwrap();
        assert_eq!(parsed.record.model_type(), "A");
        assert!(parsed.record.attributes().is_empty());
        assert_eq!(parsed.issues.len(), 1);
    }

    #[test]
    fn strict_parse_rejects_short_and_dangling_titles() {
        let strict = NameParser::strict();
        let err = strict.parse("models/A/t/model.ckpt.meta").unwrap_err();
        assert_eq!(
            err,
            EngineError::UnparseableTitle {
                title: "A".into(),
                issue: TitleIssue::TooFewTokens { tokens: 1 },
            }
        );
        let err = strict.parse("models/A-k-v-k2-x-y/t/f").unwrap_err();
        assert_eq!(
            err,
            EngineError::UnparseableTitle {
                title: "A-k-v-k2-x-y".into(),
                issue: TitleIssue::DanglingKey { key: "k2".into() },
            }
        );
    }

    #[test]
    fn strict_parse_allows_duplicate_keys() {
        let parsed = NameParser::strict()
            .parse("models/A-lr-1-lr-2-x-y/t/f")
            .unwrap();
        assert_eq!(parsed.record.attributes().get("lr"), Some("2"));
    }
}
