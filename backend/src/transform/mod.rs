//! Transformation module.
//!
//! - Merge: values/labels export pair into paired Value/Label columns
//! - Duplicates: repeated RecordIDs and summary counts
//! - Dictionary: distinct coded values per question
//! - SPSS: flattened numeric table
//! - Pipeline: end-to-end processing of survey waves

pub mod dictionary;
pub mod duplicates;
pub mod merge;
pub mod pipeline;
pub mod spss;

pub use dictionary::{build_dictionary, build_dictionary_titled, dictionary_entries, DictionaryEntry};
pub use duplicates::{duplicate_count, duplicate_record_ids, DuplicateId, MergeSummary};
pub use merge::{merge, MergeOutcome, MergeWarning};
pub use pipeline::*;
pub use spss::{question_id, reduce_for_spss};
