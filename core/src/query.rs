use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::document::Collection;
use crate::error::{Error, Result};
use crate::postings::PostingsStore;

/// Document id to relevance score. Order carries no meaning.
pub type RankTable = HashMap<String, f64>;

/// Behavior of the bigram fallback search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NgramSearchMode {
    /// Return the candidate set of the first bigram that has any postings,
    /// ignoring the rest of the query. This reproduces the behavior the
    /// dialogue layer shipped with and exists for compatibility.
    LegacyFirstHit,
    /// Intersect the candidate sets of every bigram that has postings.
    FullScan,
}

/// Read side of the postings store: boolean retrieval, vector-space
/// ranking and the bigram fallback. The collection is consulted only for
/// its document count.
pub struct QueryEngine<'a> {
    store: &'a PostingsStore,
    collection: &'a dyn Collection,
}

impl<'a> QueryEngine<'a> {
    pub fn new(store: &'a PostingsStore, collection: &'a dyn Collection) -> Self {
        Self { store, collection }
    }

    /// Strict AND retrieval: the intersection of every term's candidate
    /// set. A term with no postings still participates, forcing an empty
    /// result; duplicate terms are harmless; an empty term list yields the
    /// empty set.
    pub fn search(&self, terms: &[String]) -> Result<HashSet<String>> {
        let mut result: Option<HashSet<String>> = None;
        for term in terms {
            let cands: HashSet<String> = self.store.candidates(term)?.into_iter().collect();
            tracing::debug!(term = %term, candidates = cands.len(), "boolean term lookup");
            result = Some(match result {
                None => cands,
                Some(acc) => acc.intersection(&cands).cloned().collect(),
            });
        }
        Ok(result.unwrap_or_default())
    }

    /// Ranks every document that matches at least one query term by cosine
    /// similarity against the query's term-weight vector.
    ///
    /// Fails with [`Error::DegenerateQuery`] when no query term appears in
    /// the index at all, so callers can tell "no confident match" apart
    /// from an honest zero-hit result.
    pub fn rank_table(&self, terms: &[String]) -> Result<RankTable> {
        let total = self.collection.count()? as f64;

        let mut query_vector = vec![0.0f64; terms.len()];
        let mut document_vectors: HashMap<String, Vec<f64>> = HashMap::new();
        for (position, term) in terms.iter().enumerate() {
            let cands = self.store.candidates(term)?;
            if cands.is_empty() {
                continue;
            }
            let weight = term_weight(cands.len(), total);
            query_vector[position] = weight;
            for id in cands {
                document_vectors
                    .entry(id)
                    .or_insert_with(|| vec![0.0; terms.len()])[position] = weight;
            }
        }

        if !terms.is_empty() && query_vector.iter().all(|w| *w == 0.0) {
            return Err(Error::DegenerateQuery);
        }

        let table = document_vectors
            .into_iter()
            .map(|(id, vector)| {
                let score = cosine(&vector, &query_vector);
                (id, score)
            })
            .collect();
        Ok(table)
    }

    /// Best-scoring document for the query, if any document matches.
    pub fn best(&self, terms: &[String]) -> Result<Option<String>> {
        let table = self.rank_table(terms)?;
        Ok(best_of_table(&table))
    }

    /// Bigram fallback retrieval over the n-gram table. Bigrams with no
    /// postings are skipped in both modes; see [`NgramSearchMode`] for the
    /// two scan policies.
    pub fn search_ngrams(
        &self,
        bigrams: &[String],
        mode: NgramSearchMode,
    ) -> Result<HashSet<String>> {
        let mut result: Option<HashSet<String>> = None;
        for gram in bigrams {
            let cands = self.store.ngram_candidates(gram)?;
            if cands.is_empty() {
                continue;
            }
            let cands: HashSet<String> = cands.into_iter().collect();
            result = Some(match result {
                None => cands,
                Some(acc) => acc.intersection(&cands).cloned().collect(),
            });
            if mode == NgramSearchMode::LegacyFirstHit {
                break;
            }
        }
        Ok(result.unwrap_or_default())
    }
}

/// Weight of a term seen in `df` documents out of `total`.
///
/// This is deliberately NOT a conventional tf-idf: the `ln(df)` factor
/// makes the weight grow with document frequency whenever `df < total`.
/// Ranking parity with the index this replaces depends on the exact
/// formula, so do not "correct" it to an inverse-document-frequency form.
fn term_weight(df: usize, total: f64) -> f64 {
    let df = df as f64;
    1.0 + df.ln() * (total / df).ln()
}

/// Cosine similarity. A zero-magnitude vector on either side scores 0.0
/// instead of dividing by zero; the degenerate all-terms-unseen case is
/// already rejected before any document is scored.
fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Highest-scoring document in a rank table. Ties break toward the
/// lexicographically smaller id so the answer does not depend on hash
/// iteration order.
pub fn best_of_table(table: &RankTable) -> Option<String> {
    table
        .iter()
        .max_by(|(id_a, score_a), (id_b, score_b)| {
            score_a
                .partial_cmp(score_b)
                .unwrap_or(Ordering::Equal)
                .then_with(|| id_b.cmp(id_a))
        })
        .map(|(id, _)| id.clone())
}

/// Asymmetric rank fusion: every document of `primary` keeps its score,
/// boosted by half the `secondary` score when the same document appears
/// there. Documents only in `secondary` never enter the result, so the
/// corroborating signal cannot introduce new candidates.
pub fn merge(primary: &RankTable, secondary: &RankTable) -> RankTable {
    primary
        .iter()
        .map(|(id, score)| {
            let fused = match secondary.get(id) {
                Some(boost) => score + boost * 0.5,
                None => *score,
            };
            (id.clone(), fused)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, f64)]) -> RankTable {
        pairs.iter().map(|(id, s)| (id.to_string(), *s)).collect()
    }

    #[test]
    fn merge_boosts_shared_documents_by_half() {
        let fused = merge(&table(&[("D1", 2.0), ("D2", 1.0)]), &table(&[("D1", 1.0)]));
        assert_eq!(fused, table(&[("D1", 2.5), ("D2", 1.0)]));
    }

    #[test]
    fn merge_never_introduces_secondary_only_documents() {
        let fused = merge(&table(&[("D1", 1.0)]), &table(&[("D2", 9.0)]));
        assert_eq!(fused, table(&[("D1", 1.0)]));
    }

    #[test]
    fn best_of_table_breaks_ties_toward_smaller_id() {
        let t = table(&[("zzz", 1.0), ("aaa", 1.0), ("mmm", 0.5)]);
        assert_eq!(best_of_table(&t), Some("aaa".to_string()));
        assert_eq!(best_of_table(&RankTable::new()), None);
    }

    #[test]
    fn term_weight_matches_reference_formula() {
        // df = 4, N = 100: 1 + ln(4) * ln(25)
        let w = term_weight(4, 100.0);
        assert!((w - (1.0 + 4.0f64.ln() * 25.0f64.ln())).abs() < 1e-12);
        // df = N collapses the second factor to zero.
        assert!((term_weight(100, 100.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cosine_guards_zero_magnitude() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert!((cosine(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-12);
    }
}
