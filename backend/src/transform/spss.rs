//! Reduce a merged table to SPSS-ready numeric columns.
//!
//! ```text
//! RecordID (Value)          -> dropped
//! RecordID (Label)          -> RecordID
//! Q7. How often ... (Label) -> dropped
//! Q7. How often ... (Value) -> {prefix}_Q7
//! anything else             -> unchanged
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::logs::log_warning;
use crate::models::{label_column_name, value_column_name, Column, MergedTable, SpssTable, RECORD_ID};

/// Question id at the start of a header: "Q" followed by digits.
static QUESTION_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(Q\d+)").expect("valid regex"));

/// Leading question id of a column name, if any.
pub fn question_id(column_name: &str) -> Option<&str> {
    QUESTION_ID
        .captures(column_name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Drop labels and RecordID's value half, rename question values to `{prefix}_{QuestionId}`.
///
/// Two questions that share an id after stripping (e.g. `Q5_1` and `Q5_2`
/// both become `{prefix}_Q5`) collide: the later column replaces the earlier
/// one in place. Each collision is logged.
pub fn reduce_for_spss(table: &MergedTable, prefix: &str) -> SpssTable {
    let record_value = value_column_name(RECORD_ID);
    let record_label = label_column_name(RECORD_ID);

    let mut out: Vec<Column> = Vec::new();

    for column in table.columns() {
        if column.name == record_value {
            continue;
        }

        let renamed = if column.name == record_label {
            Some(RECORD_ID.to_string())
        } else if let Some(qid) = question_id(&column.name) {
            if column.is_label() {
                continue;
            }
            column.is_value().then(|| format!("{}_{}", prefix, qid))
        } else {
            None
        };

        let column = match renamed {
            Some(name) => Column { name, data: column.data.clone() },
            None => column.clone(),
        };

        match out.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => {
                log_warning(format!(
                    "SPSS column '{}' produced by more than one question; keeping the last",
                    column.name
                ));
                *existing = column;
            }
            None => out.push(column),
        }
    }

    SpssTable::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellValue, ColumnData};
    use crate::transform::merge::merge;
    use crate::transform::merge::tests::{qualtrics_grid, sample_pair};

    #[test]
    fn test_question_id() {
        assert_eq!(question_id("Q12. Text (Value)"), Some("Q12"));
        assert_eq!(question_id("Q5_3. Grid row (Label)"), Some("Q5"));
        assert_eq!(question_id("RecordID (Label)"), None);
        assert_eq!(question_id("QID12"), None);
        assert_eq!(question_id("Duration Q1"), None);
    }

    #[test]
    fn test_reduce_merged_table() {
        let (values, labels) = sample_pair();
        let merged = merge(&values, &labels, None).unwrap().table;
        let spss = reduce_for_spss(&merged, "pre");

        assert_eq!(spss.column_names(), vec!["RecordID", "pre_Q1", "pre_Q2"]);
        assert!(spss
            .column_names()
            .iter()
            .all(|n| !n.ends_with("(Label)") && !n.ends_with("(Value)")));
        assert_eq!(spss.column_names().iter().filter(|n| **n == "RecordID").count(), 1);
    }

    #[test]
    fn test_record_id_comes_from_label() {
        let questions = [("Q22", "Record ID"), ("Q1", "Text")];
        let values = qualtrics_grid(&questions, &[vec!["0042", "1"]]);
        let labels = qualtrics_grid(&questions, &[vec!["ID-0042", "One"]]);
        let merged = merge(&values, &labels, None).unwrap().table;
        let spss = reduce_for_spss(&merged, "post");

        assert_eq!(spss.column("RecordID").unwrap().data.get(0), CellValue::Text("ID-0042"));
        assert_eq!(spss.column("post_Q1").unwrap().data, ColumnData::Integer(vec![Some(1)]));
    }

    #[test]
    fn test_unrecognized_columns_untouched() {
        let table = MergedTable::new(vec![
            Column::text("Duration (Value)", vec!["30".into()]),
            Column::text("Duration (Label)", vec!["30 s".into()]),
            Column::integer("Q3. Text (Value)", vec![Some(2)]),
        ]);
        let spss = reduce_for_spss(&table, "pre");
        assert_eq!(spss.column_names(), vec!["Duration (Value)", "Duration (Label)", "pre_Q3"]);
    }

    #[test]
    fn test_collision_last_rename_wins() {
        let table = MergedTable::new(vec![
            Column::integer("Q5_1. Row one (Value)", vec![Some(1)]),
            Column::text("Q5_1. Row one (Label)", vec!["A".into()]),
            Column::integer("Q5_2. Row two (Value)", vec![Some(9)]),
            Column::text("Q5_2. Row two (Label)", vec!["B".into()]),
        ]);
        let spss = reduce_for_spss(&table, "pre");

        assert_eq!(spss.column_names(), vec!["pre_Q5"]);
        assert_eq!(spss.column("pre_Q5").unwrap().data.get(0), CellValue::Integer(9));
    }

    #[test]
    fn test_collision_is_logged() {
        use crate::api::logs::{LogLevel, LOG_BROADCASTER};
        use tokio::sync::broadcast::error::TryRecvError;

        let mut rx = LOG_BROADCASTER.subscribe();
        let table = MergedTable::new(vec![
            Column::integer("Q8_1. First (Value)", vec![Some(1)]),
            Column::integer("Q8_2. Second (Value)", vec![Some(2)]),
        ]);
        reduce_for_spss(&table, "clash");

        let mut warnings = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(entry) if entry.level == LogLevel::Warning => warnings.push(entry.message),
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        assert_eq!(
            warnings.iter().filter(|m| m.contains("'clash_Q8'")).count(),
            1,
            "warnings seen: {:?}",
            warnings
        );
    }

    #[test]
    fn test_table_without_record_id() {
        let table = MergedTable::new(vec![Column::integer("Q1. X (Value)", vec![None])]);
        let spss = reduce_for_spss(&table, "x");
        assert_eq!(spss.column_names(), vec!["x_Q1"]);
        assert_eq!(spss.row_count(), 1);
    }
}
