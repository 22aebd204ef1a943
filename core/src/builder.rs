use std::collections::HashMap;

use crate::document::Collection;
use crate::error::Result;
use crate::ngram::divide_ngrams;
use crate::postings::PostingsStore;
use crate::tokenizer::{should_be_included, Tokenizer};

/// How many articles the excerpt and n-gram passes cover. Both are bounded
/// fallback indexes over a prefix of the corpus, not full secondary indexes.
pub const DEFAULT_SAMPLE_LIMIT: usize = 100;

/// Writer side of the postings store. Each build pass is a single batch
/// run over the collection scan; any error aborts the whole pass. Target
/// stores are expected to be freshly created — the indexer removes any
/// previous index directory before rebuilding.
pub struct IndexBuilder<'a> {
    store: &'a PostingsStore,
    collection: &'a dyn Collection,
    tokenizer: &'a dyn Tokenizer,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(
        store: &'a PostingsStore,
        collection: &'a dyn Collection,
        tokenizer: &'a dyn Tokenizer,
    ) -> Self {
        Self {
            store,
            collection,
            tokenizer,
        }
    }

    /// Indexes the full body text of every article in the collection.
    pub fn build_full(&self) -> Result<()> {
        let mut indexed = 0u64;
        for article in self.collection.scan()? {
            let article = article?;
            let counts = self.term_counts(&article.text)?;
            self.store.put_postings(&article.title, &counts)?;
            indexed += 1;
        }
        self.store.flush()?;
        tracing::info!(indexed, "full-text index pass complete");
        Ok(())
    }

    /// Indexes the opening text of the first `limit` articles in scan
    /// order. A truncation, not a sample.
    pub fn build_from_excerpt(&self, limit: usize) -> Result<()> {
        let mut indexed = 0u64;
        for article in self.collection.scan()?.take(limit) {
            let article = article?;
            let counts = self.term_counts(&article.opening_text)?;
            self.store.put_postings(&article.title, &counts)?;
            indexed += 1;
        }
        self.store.flush()?;
        tracing::info!(indexed, limit, "opening-text index pass complete");
        Ok(())
    }

    /// Builds the character-bigram fallback index over the first `limit`
    /// articles in scan order.
    pub fn build_ngrams(&self, limit: usize) -> Result<()> {
        let mut indexed = 0u64;
        for article in self.collection.scan()?.take(limit) {
            let article = article?;
            let grams = divide_ngrams(&article.text);
            self.store.put_ngrams(&article.title, &grams)?;
            indexed += 1;
        }
        self.store.flush()?;
        tracing::info!(indexed, limit, "bigram index pass complete");
        Ok(())
    }

    /// Tokenizes one text and aggregates term frequencies over the tokens
    /// that pass the index-worthiness filter.
    fn term_counts(&self, text: &str) -> Result<HashMap<String, u32>> {
        let mut counts = HashMap::new();
        for token in self.tokenizer.tokenize(text)? {
            if should_be_included(&token.features) {
                *counts.entry(token.index_term().to_string()).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}
