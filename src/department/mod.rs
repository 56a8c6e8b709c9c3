//! Department name reconciliation.
//!
//! Free-text department strings are reduced to a single key token, which is
//! then fuzzy-matched against a controlled vocabulary of canonical labels.

mod matcher;
mod text;
mod vocabulary;

pub use matcher::{best_match, reconcile, similarity, DEFAULT_THRESHOLD};
pub use text::{extract_key, normalize, STOPWORDS};
pub use vocabulary::{
    build_vocabulary, load_override_table, OverrideRow, Vocabulary, BUILTIN_DEPARTMENTS,
    GENERAL_SURGERY,
};
