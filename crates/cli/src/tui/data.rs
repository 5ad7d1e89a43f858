//! Flattened rows for the filter panel.

use modelsift_engine::Session;

/// One line of the filter panel: a key heading or a value checkbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterRow {
    Header { key: String },
    Value { key: String, value: String, count: usize },
}

impl FilterRow {
    pub fn key(&self) -> &str {
        match self {
            FilterRow::Header { key } | FilterRow::Value { key, .. } => key,
        }
    }
}

/// Header row per key followed by its values, in filter-key order.
pub fn filter_rows(session: &Session) -> Vec<FilterRow> {
    let catalog = session.catalog();
    let mut rows = Vec::new();
    for group in session.selection().groups() {
        rows.push(FilterRow::Header { key: group.key().to_string() });
        for vc in catalog.value_counts(group.key()) {
            rows.push(FilterRow::Value {
                key: group.key().to_string(),
                value: vc.value,
                count: vc.count,
            });
        }
    }
    rows
}

/// `[x]`, `[ ]`, or `[-]` for a partially selected key.
pub fn checkbox(session: &Session, row: &FilterRow) -> &'static str {
    let selection = session.selection();
    match row {
        FilterRow::Header { key } => match selection.group(key) {
            Some(g) if g.is_fully_selected() => "[x]",
            Some(g) if g.selected_values().is_empty() => "[ ]",
            _ => "[-]",
        },
        FilterRow::Value { key, value, .. } => {
            if selection.is_selected(key, value) {
                "[x]"
            } else {
                "[ ]"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelsift_engine::{FileDescriptor, SessionOptions};

    fn session() -> Session {
        let files: Vec<FileDescriptor> = ["A-lr-0.1-x-y", "B-lr-0.1-x-y", "A-lr-0.2-x-y"]
            .iter()
            .map(|t| FileDescriptor::from_relative_path(format!("models/{t}/t/model.ckpt.meta")))
            .collect();
        Session::load(SessionOptions::default(), &files).unwrap()
    }

    #[test]
    fn rows_group_values_under_headers() {
        let rows = filter_rows(&session());
        let expected = vec![
            FilterRow::Header { key: "type".into() },
            FilterRow::Value { key: "type".into(), value: "A".into(), count: 2 },
            FilterRow::Value { key: "type".into(), value: "B".into(), count: 1 },
            FilterRow::Header { key: "lr".into() },
            FilterRow::Value { key: "lr".into(), value: "0.1".into(), count: 2 },
            FilterRow::Value { key: "lr".into(), value: "0.2".into(), count: 1 },
        ];
        assert_eq!(rows, expected);
    }

    #[test]
    fn header_checkbox_tracks_group_state() {
        let mut s = session();
        let header = FilterRow::Header { key: "lr".into() };
        assert_eq!(checkbox(&s, &header), "[x]");
        s.toggle("lr", "0.2").unwrap();
        assert_eq!(checkbox(&s, &header), "[-]");
        s.deselect_all("lr").unwrap();
        assert_eq!(checkbox(&s, &header), "[ ]");
    }
}
