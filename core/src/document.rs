use std::collections::VecDeque;
use std::ops::Bound;
use std::path::Path;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Number of records fetched per round trip when scanning a collection.
pub const SCAN_BATCH: usize = 1000;

/// One corpus article. The title is the unique id (always under 256 bytes
/// in the source dumps). The engine never mutates articles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    /// Plain-text article body.
    pub text: String,
    /// First paragraph of the body.
    pub opening_text: String,
    #[serde(default)]
    pub auxiliary_text: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub headings: Vec<String>,
    #[serde(default)]
    pub wiki_text: String,
    #[serde(default)]
    pub popularity_score: f64,
    #[serde(default)]
    pub num_incoming_links: u64,
}

/// Read-only document store capability consumed by the engine.
pub trait Collection {
    /// Looks up one article by id. Absence is `Ok(None)`, never an error.
    fn get(&self, id: &str) -> Result<Option<Article>>;

    /// Total number of articles in the store.
    fn count(&self) -> Result<u64>;

    /// Iterates every article in store order. Each call starts a fresh,
    /// finite scan; implementations fetch in batches of [`SCAN_BATCH`] to
    /// bound memory.
    fn scan(&self) -> Result<Box<dyn Iterator<Item = Result<Article>> + '_>>;
}

/// Article store backed by a sled tree of bincode records keyed by title.
/// Store order is therefore title order. The count is cached after the
/// first call, since sled computes tree length by iteration.
pub struct SledCollection {
    db: sled::Db,
    articles: sled::Tree,
    cached_count: Mutex<Option<u64>>,
}

impl SledCollection {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_db(sled::open(path)?)
    }

    /// In-memory store that vanishes on drop. Test use.
    pub fn temporary() -> Result<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: sled::Db) -> Result<Self> {
        let articles = db.open_tree("articles")?;
        Ok(Self {
            db,
            articles,
            cached_count: Mutex::new(None),
        })
    }

    /// Writer-side entry point used by the corpus loader; the engine itself
    /// only reads.
    pub fn insert(&self, article: &Article) -> Result<()> {
        let bytes = bincode::serialize(article)?;
        self.articles.insert(article.title.as_bytes(), bytes)?;
        *self.cached_count.lock() = None;
        Ok(())
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl Collection for SledCollection {
    fn get(&self, id: &str) -> Result<Option<Article>> {
        match self.articles.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn count(&self) -> Result<u64> {
        let mut cached = self.cached_count.lock();
        if let Some(n) = *cached {
            return Ok(n);
        }
        let n = self.articles.len() as u64;
        *cached = Some(n);
        Ok(n)
    }

    fn scan(&self) -> Result<Box<dyn Iterator<Item = Result<Article>> + '_>> {
        Ok(Box::new(ArticleScan {
            tree: &self.articles,
            buf: VecDeque::new(),
            resume_after: None,
            done: false,
        }))
    }
}

/// Batched cursor over a sled article tree. Pulls [`SCAN_BATCH`] records at
/// a time and resumes from the last key seen.
struct ArticleScan<'a> {
    tree: &'a sled::Tree,
    buf: VecDeque<Result<Article>>,
    resume_after: Option<sled::IVec>,
    done: bool,
}

impl ArticleScan<'_> {
    fn refill(&mut self) {
        let iter: Box<dyn Iterator<Item = sled::Result<(sled::IVec, sled::IVec)>>> =
            match &self.resume_after {
                Some(key) => Box::new(
                    self.tree
                        .range((Bound::Excluded(key.clone()), Bound::Unbounded)),
                ),
                None => Box::new(self.tree.iter()),
            };

        let mut fetched = 0;
        for kv in iter.take(SCAN_BATCH) {
            fetched += 1;
            match kv {
                Ok((key, value)) => {
                    self.resume_after = Some(key);
                    self.buf
                        .push_back(bincode::deserialize(&value).map_err(Into::into));
                }
                Err(e) => {
                    self.buf.push_back(Err(e.into()));
                    self.done = true;
                    return;
                }
            }
        }
        if fetched < SCAN_BATCH {
            self.done = true;
        }
    }
}

impl Iterator for ArticleScan<'_> {
    type Item = Result<Article>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.is_empty() && !self.done {
            self.refill();
        }
        self.buf.pop_front()
    }
}

/// In-memory collection preserving insertion order. Useful for tests and
/// small fixed corpora.
#[derive(Default)]
pub struct MemoryCollection {
    articles: Vec<Article>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, article: Article) {
        self.articles.push(article);
    }
}

impl Collection for MemoryCollection {
    fn get(&self, id: &str) -> Result<Option<Article>> {
        Ok(self.articles.iter().find(|a| a.title == id).cloned())
    }

    fn count(&self) -> Result<u64> {
        Ok(self.articles.len() as u64)
    }

    fn scan(&self) -> Result<Box<dyn Iterator<Item = Result<Article>> + '_>> {
        Ok(Box::new(self.articles.iter().cloned().map(Ok)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, text: &str) -> Article {
        Article {
            title: title.to_string(),
            text: text.to_string(),
            opening_text: String::new(),
            auxiliary_text: Vec::new(),
            categories: Vec::new(),
            headings: Vec::new(),
            wiki_text: String::new(),
            popularity_score: 0.0,
            num_incoming_links: 0,
        }
    }

    #[test]
    fn sled_roundtrip_and_absence() {
        let store = SledCollection::temporary().unwrap();
        store.insert(&article("ラーメン", "麺料理")).unwrap();

        let got = store.get("ラーメン").unwrap().unwrap();
        assert_eq!(got.text, "麺料理");
        assert!(store.get("うどん").unwrap().is_none());
    }

    #[test]
    fn count_is_cached_and_invalidated() {
        let store = SledCollection::temporary().unwrap();
        store.insert(&article("a", "")).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        store.insert(&article("b", "")).unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn scan_visits_every_article_and_restarts() {
        let store = SledCollection::temporary().unwrap();
        for i in 0..7 {
            store.insert(&article(&format!("t{i}"), "x")).unwrap();
        }
        let first: Vec<_> = store.scan().unwrap().map(|a| a.unwrap().title).collect();
        let second: Vec<_> = store.scan().unwrap().map(|a| a.unwrap().title).collect();
        assert_eq!(first.len(), 7);
        assert_eq!(first, second);
    }
}
