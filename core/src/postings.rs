use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;

/// Key separator between term and document id. Terms come out of the
/// analyzer or the n-gram splitter and document ids are article titles;
/// neither contains NUL.
const SEP: u8 = 0;

/// Durable inverted index: a linguistic postings tree mapping
/// `(term, document_id)` to an occurrence count, and a presence-only bigram
/// tree for the fallback index. Keys sort by `(term, document_id)`, so a
/// prefix scan on the term is the equality lookup every query needs.
///
/// Build passes assume a freshly created store; the keyed layout makes a
/// re-run overwrite rather than duplicate rows, but mixing passes over the
/// same pair (body and excerpt both cover the first hundred articles) is
/// last-writer-wins.
pub struct PostingsStore {
    db: sled::Db,
    postings: sled::Tree,
    ngrams: sled::Tree,
}

impl PostingsStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_db(sled::open(path)?)
    }

    /// In-memory store that vanishes on drop. Test use.
    pub fn temporary() -> Result<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: sled::Db) -> Result<Self> {
        let postings = db.open_tree("postings")?;
        let ngrams = db.open_tree("ngrams")?;
        Ok(Self {
            db,
            postings,
            ngrams,
        })
    }

    fn key(term: &str, document_id: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(term.len() + 1 + document_id.len());
        key.extend_from_slice(term.as_bytes());
        key.push(SEP);
        key.extend_from_slice(document_id.as_bytes());
        key
    }

    fn term_prefix(term: &str) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(term.len() + 1);
        prefix.extend_from_slice(term.as_bytes());
        prefix.push(SEP);
        prefix
    }

    fn document_id_of(key: &[u8], prefix_len: usize) -> String {
        String::from_utf8_lossy(&key[prefix_len..]).into_owned()
    }

    /// Persists one row per distinct term of a document.
    pub fn put_postings(&self, document_id: &str, counts: &HashMap<String, u32>) -> Result<()> {
        for (term, frequency) in counts {
            self.postings
                .insert(Self::key(term, document_id), &frequency.to_be_bytes()[..])?;
        }
        Ok(())
    }

    /// Persists one presence-only row per bigram of a document.
    pub fn put_ngrams(&self, document_id: &str, grams: &[String]) -> Result<()> {
        for gram in grams {
            self.ngrams
                .insert(Self::key(gram, document_id), sled::IVec::default())?;
        }
        Ok(())
    }

    /// Documents holding at least one posting for the term, in key order.
    pub fn candidates(&self, term: &str) -> Result<Vec<String>> {
        let prefix = Self::term_prefix(term);
        let mut ids = Vec::new();
        for kv in self.postings.scan_prefix(&prefix) {
            let (key, _) = kv?;
            ids.push(Self::document_id_of(&key, prefix.len()));
        }
        Ok(ids)
    }

    /// Number of documents the term occurs in.
    pub fn document_frequency(&self, term: &str) -> Result<usize> {
        let mut df = 0;
        for kv in self.postings.scan_prefix(Self::term_prefix(term)) {
            kv?;
            df += 1;
        }
        Ok(df)
    }

    /// Recorded occurrence count for one `(term, document)` pair.
    pub fn frequency(&self, term: &str, document_id: &str) -> Result<Option<u32>> {
        match self.postings.get(Self::key(term, document_id))? {
            Some(bytes) if bytes.len() == 4 => {
                Ok(Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])))
            }
            _ => Ok(None),
        }
    }

    /// Documents holding the bigram, in key order.
    pub fn ngram_candidates(&self, gram: &str) -> Result<Vec<String>> {
        let prefix = Self::term_prefix(gram);
        let mut ids = Vec::new();
        for kv in self.ngrams.scan_prefix(&prefix) {
            let (key, _) = kv?;
            ids.push(Self::document_id_of(&key, prefix.len()));
        }
        Ok(ids)
    }

    /// Durability point at the end of a build pass; the whole pass is the
    /// unit of atomicity.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}
