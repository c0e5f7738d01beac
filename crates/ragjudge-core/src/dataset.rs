//! CSV input loader.
//!
//! Columns are matched by exact header name, case and spacing included; any
//! other columns are ignored.
//! Missing columns, short records and empty cells all read as empty strings.

use crate::errors::RunError;
use crate::model::RagRow;
use std::path::Path;

pub const COL_QUESTION: &str = "Current User Question";
pub const COL_HISTORY: &str = "Conversation History";
pub const COL_FRAGMENTS: &str = "Fragment Texts";
pub const COL_ANSWER: &str = "Assistant Answer";

struct ColumnMap {
    question: Option<usize>,
    history: Option<usize>,
    fragments: Option<usize>,
    answer: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let find = |name: &str| headers.iter().position(|h| h == name);
        Self {
            question: find(COL_QUESTION),
            history: find(COL_HISTORY),
            fragments: find(COL_FRAGMENTS),
            answer: find(COL_ANSWER),
        }
    }

    fn missing(&self) -> Vec<&'static str> {
        [
            (self.question, COL_QUESTION),
            (self.history, COL_HISTORY),
            (self.fragments, COL_FRAGMENTS),
            (self.answer, COL_ANSWER),
        ]
        .into_iter()
        .filter(|(idx, _)| idx.is_none())
        .map(|(_, name)| name)
        .collect()
    }

    fn row(&self, record: &csv::StringRecord) -> RagRow {
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .unwrap_or_default()
                .to_string()
        };
        RagRow::new(
            cell(self.question),
            cell(self.history),
            cell(self.fragments),
            cell(self.answer),
        )
    }
}

/// Read rows from a CSV file with a header row. `limit` keeps only the first
/// N data rows.
pub fn load_rows(path: &Path, limit: Option<usize>) -> Result<Vec<RagRow>, RunError> {
    let unavailable = |detail: String| RunError::input_unavailable(path.display().to_string(), detail);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| unavailable(e.to_string()))?;

    let headers = reader
        .headers()
        .map_err(|e| unavailable(e.to_string()))?
        .clone();
    let columns = ColumnMap::from_headers(&headers);
    let missing = columns.missing();
    if !missing.is_empty() {
        tracing::warn!(
            path = %path.display(),
            missing = ?missing,
            "input is missing columns; they will be read as empty"
        );
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        if limit.is_some_and(|n| rows.len() >= n) {
            break;
        }
        let record = record.map_err(|e| unavailable(e.to_string()))?;
        rows.push(columns.row(&record));
    }

    tracing::info!(path = %path.display(), rows = rows.len(), "loaded input rows");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RunErrorKind;
    use std::io::Write;

    fn csv_file(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn reads_named_columns_in_any_order() {
        let f = csv_file(
            "Assistant Answer,Fragment Texts,Id,Current User Question,Conversation History\n\
             \"Use the reset link.\",\"Reset via email.\",17,How do I reset?,\n",
        );

        let rows = load_rows(f.path(), None).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].current_user_question, "How do I reset?");
        assert_eq!(rows[0].fragment_texts, "Reset via email.");
        assert_eq!(rows[0].assistant_answer, "Use the reset link.");
        assert_eq!(rows[0].conversation_history, "");
        assert!(!rows[0].has_history());
    }

    #[test]
    fn quoted_multiline_cells_are_preserved() {
        let f = csv_file(
            "Current User Question,Conversation History,Fragment Texts,Assistant Answer\n\
             q,\"user: hi\nassistant: hello\",\"a, b\",ans\n",
        );
        let rows = load_rows(f.path(), None).unwrap();
        assert_eq!(rows[0].conversation_history, "user: hi\nassistant: hello");
        assert_eq!(rows[0].fragment_texts, "a, b");
    }

    #[test]
    fn missing_columns_and_short_records_read_as_empty() {
        let f = csv_file("Current User Question,Assistant Answer\nq1,a1\nq2\n");
        let rows = load_rows(f.path(), None).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fragment_texts, "");
        assert_eq!(rows[1].current_user_question, "q2");
        assert_eq!(rows[1].assistant_answer, "");
    }

    #[test]
    fn headers_must_match_exactly() {
        let f = csv_file(
            " Current User Question,current user question,Assistant Answer \nq,q2,a\n",
        );
        let rows = load_rows(f.path(), None).unwrap();
        assert_eq!(rows[0].current_user_question, "");
        assert_eq!(rows[0].assistant_answer, "");
    }

    #[test]
    fn limit_keeps_first_rows() {
        let f = csv_file("Current User Question\nq0\nq1\nq2\n");
        let rows = load_rows(f.path(), Some(2)).unwrap();
        let questions: Vec<_> = rows.iter().map(|r| r.current_user_question.as_str()).collect();
        assert_eq!(questions, ["q0", "q1"]);
    }

    #[test]
    fn header_only_file_has_no_rows() {
        let f = csv_file("Current User Question,Conversation History,Fragment Texts,Assistant Answer\n");
        assert!(load_rows(f.path(), None).unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_input_unavailable() {
        let err = load_rows(Path::new("/no/such/input.csv"), None).unwrap_err();
        assert_eq!(err.kind, RunErrorKind::InputUnavailable);
        assert!(err.message.contains("/no/such/input.csv"));
    }
}
