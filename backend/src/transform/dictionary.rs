//! Data dictionary: the coded values observed for each question.
//!
//! Scans Value columns left to right, pairs each with its Label column by
//! name and lists the distinct (Value, Label) pairs.

use std::collections::BTreeSet;
use std::collections::HashSet;

use chrono::Local;

use crate::export::document::Document;
use crate::models::{label_column_name, MergedTable, VALUE_SUFFIX};

/// Distinct coded values of one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    /// Question header without the `(Value)` suffix
    pub question: String,
    /// Sorted (value, label) pairs
    pub pairs: Vec<(String, String)>,
}

/// Collect one entry per question that has both a Value and a Label column.
pub fn dictionary_entries(table: &MergedTable) -> Vec<DictionaryEntry> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut entries = Vec::new();

    for value_col in table.columns() {
        let Some(base) = value_col.name.strip_suffix(VALUE_SUFFIX) else {
            continue;
        };
        if !seen.insert(base) {
            continue;
        }
        let Some(label_col) = table.column(&label_column_name(base)) else {
            continue;
        };

        let rows = value_col.data.len().max(label_col.data.len());
        let distinct: BTreeSet<(String, String)> = (0..rows)
            .filter_map(|r| {
                let value = value_col.data.get(r);
                if value.is_missing() {
                    return None;
                }
                Some((value.to_text(), label_col.data.get(r).to_text()))
            })
            .collect();

        entries.push(DictionaryEntry {
            question: base.to_string(),
            pairs: sort_pairs(distinct.into_iter().collect()),
        });
    }

    entries
}

/// Numeric order when every value parses as a number, lexical otherwise.
fn sort_pairs(mut pairs: Vec<(String, String)>) -> Vec<(String, String)> {
    let numeric: Option<Vec<f64>> = pairs.iter().map(|(v, _)| v.parse::<f64>().ok()).collect();
    match numeric {
        Some(_) => pairs.sort_by(|a, b| {
            let x: f64 = a.0.parse().unwrap_or(f64::NAN);
            let y: f64 = b.0.parse().unwrap_or(f64::NAN);
            x.total_cmp(&y).then_with(|| a.1.cmp(&b.1))
        }),
        None => pairs.sort(),
    }
    pairs
}

/// Build the human-readable dictionary document for a merged table.
pub fn build_dictionary(table: &MergedTable) -> Document {
    build_dictionary_titled(table, "Data Dictionary")
}

/// Same as [`build_dictionary`] with a custom title (usually the dataset name).
pub fn build_dictionary_titled(table: &MergedTable, title: &str) -> Document {
    let mut doc = Document::new();
    doc.heading(title, 1);
    doc.heading(format!("Generated {}", Local::now().format("%Y-%m-%d")), 3);

    for entry in dictionary_entries(table) {
        doc.heading(&entry.question, 2);
        let rows = entry.pairs.into_iter().map(|(v, l)| vec![v, l]).collect();
        doc.table(vec!["Value".to_string(), "Label".to_string()], rows);
        doc.paragraph_break();
    }

    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::document::Block;
    use crate::models::Column;
    use crate::transform::merge::merge;
    use crate::transform::merge::tests::sample_pair;

    fn pair(v: &str, l: &str) -> (String, String) {
        (v.to_string(), l.to_string())
    }

    #[test]
    fn test_distinct_pairs_sorted() {
        let table = MergedTable::new(vec![
            Column::integer("Q1 (Value)", vec![Some(1), Some(2), Some(1)]),
            Column::text("Q1 (Label)", vec!["Agree".into(), "Disagree".into(), "Agree".into()]),
        ]);
        let entries = dictionary_entries(&table);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].question, "Q1");
        assert_eq!(entries[0].pairs, vec![pair("1", "Agree"), pair("2", "Disagree")]);
    }

    #[test]
    fn test_numeric_not_lexical_order() {
        let table = MergedTable::new(vec![
            Column::integer("Q3 (Value)", vec![Some(10), Some(2), Some(-1)]),
            Column::text("Q3 (Label)", vec!["Ten".into(), "Two".into(), "Refused".into()]),
        ]);
        let values: Vec<String> = dictionary_entries(&table)[0].pairs.iter().map(|p| p.0.clone()).collect();
        assert_eq!(values, vec!["-1", "2", "10"]);
    }

    #[test]
    fn test_lexical_fallback() {
        let table = MergedTable::new(vec![
            Column::text("RecordID (Value)", vec!["b7".into(), "10".into(), "a1".into()]),
            Column::text("RecordID (Label)", vec!["b7".into(), "10".into(), "a1".into()]),
        ]);
        let values: Vec<String> = dictionary_entries(&table)[0].pairs.iter().map(|p| p.0.clone()).collect();
        assert_eq!(values, vec!["10", "a1", "b7"]);
    }

    #[test]
    fn test_missing_label_column_skipped() {
        let table = MergedTable::new(vec![
            Column::integer("Q1 (Value)", vec![Some(1)]),
            Column::integer("Q2 (Value)", vec![Some(1)]),
            Column::text("Q2 (Label)", vec!["Yes".into()]),
        ]);
        let questions: Vec<_> = dictionary_entries(&table).into_iter().map(|e| e.question).collect();
        assert_eq!(questions, vec!["Q2"]);
    }

    #[test]
    fn test_duplicate_headers_processed_once() {
        let table = MergedTable::new(vec![
            Column::integer("Q1 (Value)", vec![Some(1)]),
            Column::text("Q1 (Label)", vec!["Yes".into()]),
            Column::integer("Q1 (Value)", vec![Some(2)]),
        ]);
        assert_eq!(dictionary_entries(&table).len(), 1);
    }

    #[test]
    fn test_null_values_excluded() {
        let (values, labels) = sample_pair();
        let merged = merge(&values, &labels, None).unwrap().table;
        let entries = dictionary_entries(&merged);

        let age = entries.iter().find(|e| e.question == "Q2. Age group").unwrap();
        assert_eq!(age.pairs, vec![pair("3", "35-44")]);
    }

    #[test]
    fn test_document_sections_follow_column_order() {
        let (values, labels) = sample_pair();
        let merged = merge(&values, &labels, None).unwrap().table;
        let doc = build_dictionary(&merged);

        assert_eq!(
            doc.headings(2),
            vec!["RecordID", "Q1. How satisfied are you?", "Q2. Age group"]
        );
        let tables = doc.blocks().iter().filter(|b| matches!(b, Block::Table { .. })).count();
        assert_eq!(tables, 3);
    }
}
