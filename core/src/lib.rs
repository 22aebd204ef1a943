//! Document indexing and retrieval over a corpus of articles.
//!
//! The engine builds an inverted index (term -> documents) in a sled-backed
//! [`PostingsStore`], answers boolean AND queries, ranks candidates with a
//! vector-space cosine score, and keeps a character-bigram fallback index for
//! queries the morphological analyzer cannot segment into usable terms.
//!
//! Collaborators the engine consumes rather than owns: the morphological
//! analyzer (the [`Tokenizer`] trait) and the article store (the
//! [`Collection`] trait).

pub mod builder;
pub mod document;
pub mod error;
pub mod ngram;
pub mod postings;
pub mod query;
pub mod tokenizer;

pub use builder::IndexBuilder;
pub use document::{Article, Collection, MemoryCollection, SledCollection};
pub use error::{Error, Result};
pub use postings::PostingsStore;
pub use query::{best_of_table, merge, NgramSearchMode, QueryEngine, RankTable};
pub use tokenizer::{extract_terms, MecabTokenizer, TaggedToken, Tokenizer};
