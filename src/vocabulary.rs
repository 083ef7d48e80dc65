use std::collections::HashMap;

use counter::Counter;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TopicError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyConfig {
    /// Keep only this many of the most frequent terms. `None` keeps all.
    pub max_features: Option<usize>,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        VocabularyConfig {
            max_features: Some(1000),
        }
    }
}

/// Read access to per-document term counts.
///
/// Implemented by both [`BagOfWordsCorpus`] and [`DocumentTermMatrix`]; the
/// fitter only ever sees this trait, so the two are interchangeable views
/// of the same counts.
pub trait TermCounts {
    fn num_documents(&self) -> usize;

    fn num_terms(&self) -> usize;

    /// `(term_id, count)` pairs for one document, sorted by term id.
    fn document(&self, doc: usize) -> &[(usize, u32)];

    fn total_count(&self) -> u64 {
        (0..self.num_documents())
            .flat_map(|doc| self.document(doc).iter())
            .map(|&(_, count)| count as u64)
            .sum()
    }
}

/// Frozen bijection between tokens and dense ids.
///
/// Ids follow lexicographic token order, so the same token set always
/// yields the same ids regardless of the order tokens were seen in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    terms: Vec<String>,
    ids: HashMap<String, usize>,
}

impl TryFrom<Vec<String>> for Vocabulary {
    type Error = TopicError;

    fn try_from(terms: Vec<String>) -> Result<Self> {
        Vocabulary::from_terms(terms)
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocabulary: Vocabulary) -> Self {
        vocabulary.terms
    }
}

impl Vocabulary {
    pub fn from_documents(documents: &[Vec<String>]) -> Self {
        let mut terms: Vec<String> = Self::count_tokens(documents).keys().cloned().collect();
        terms.sort();
        Self::from_sorted(terms)
    }

    /// Keeps the `max_terms` most frequent tokens. Frequency ties are
    /// broken by token order so the cut is deterministic.
    pub fn from_documents_capped(documents: &[Vec<String>], max_terms: usize) -> Self {
        let counts = Self::count_tokens(documents);

        let mut terms: Vec<String> = counts
            .most_common_ordered()
            .into_iter()
            .take(max_terms)
            .map(|(term, _)| term)
            .collect();
        terms.sort();
        Self::from_sorted(terms)
    }

    /// Adopts an ordered feature-name list as-is; position `i` gets id `i`.
    pub fn from_terms(terms: Vec<String>) -> Result<Self> {
        let mut ids = HashMap::with_capacity(terms.len());
        for (id, term) in terms.iter().enumerate() {
            if ids.insert(term.clone(), id).is_some() {
                return Err(TopicError::Input(format!(
                    "duplicate term {:?} in feature names",
                    term
                )));
            }
        }
        Ok(Vocabulary { terms, ids })
    }

    fn count_tokens(documents: &[Vec<String>]) -> Counter<String> {
        let mut counts: Counter<String> = Counter::new();
        for doc in documents {
            for word in doc {
                counts[word] += 1;
            }
        }
        counts
    }

    fn from_sorted(terms: Vec<String>) -> Self {
        let ids = terms
            .iter()
            .enumerate()
            .map(|(id, term)| (term.clone(), id))
            .collect();
        Vocabulary { terms, ids }
    }

    pub fn id(&self, term: &str) -> Option<usize> {
        self.ids.get(term).copied()
    }

    pub fn term(&self, id: usize) -> Option<&str> {
        self.terms.get(id).map(String::as_str)
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Sparse counts for one document; out-of-vocabulary tokens are dropped.
    pub fn bag_of_words(&self, document: &[String]) -> Vec<(usize, u32)> {
        let mut counts: Counter<usize, u32> = Counter::new();
        for word in document {
            if let Some(id) = self.id(word) {
                counts[&id] += 1;
            }
        }

        let mut bow: Vec<(usize, u32)> = counts.into_iter().collect();
        bow.sort_unstable_by_key(|&(id, _)| id);
        bow
    }

    pub fn corpus(&self, documents: &[Vec<String>]) -> BagOfWordsCorpus {
        BagOfWordsCorpus {
            documents: documents.iter().map(|doc| self.bag_of_words(doc)).collect(),
            num_terms: self.len(),
        }
    }

    pub fn document_term_matrix(&self, documents: &[Vec<String>]) -> DocumentTermMatrix {
        let mut row_offsets = Vec::with_capacity(documents.len() + 1);
        let mut entries = Vec::new();
        row_offsets.push(0);
        for doc in documents {
            entries.extend(self.bag_of_words(doc));
            row_offsets.push(entries.len());
        }

        DocumentTermMatrix {
            row_offsets,
            entries,
            num_terms: self.len(),
        }
    }
}

/// Dictionary-style corpus: one `(term_id, count)` list per document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BagOfWordsCorpus {
    documents: Vec<Vec<(usize, u32)>>,
    num_terms: usize,
}

impl BagOfWordsCorpus {
    pub fn documents(&self) -> &[Vec<(usize, u32)>] {
        &self.documents
    }
}

impl TermCounts for BagOfWordsCorpus {
    fn num_documents(&self) -> usize {
        self.documents.len()
    }

    fn num_terms(&self) -> usize {
        self.num_terms
    }

    fn document(&self, doc: usize) -> &[(usize, u32)] {
        &self.documents[doc]
    }
}

/// Row-compressed sparse document-term matrix.
///
/// Row `d` occupies `entries[row_offsets[d]..row_offsets[d + 1]]`. Entries
/// within a row are sorted by term id, and every stored count is non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTermMatrix {
    row_offsets: Vec<usize>,
    entries: Vec<(usize, u32)>,
    num_terms: usize,
}

impl DocumentTermMatrix {
    /// Builds a matrix from dense rows; every row must have `num_terms` columns.
    pub fn from_dense(rows: &[Vec<u32>], num_terms: usize) -> Result<Self> {
        let sparse_rows = rows
            .iter()
            .enumerate()
            .map(|(doc, row)| {
                if row.len() != num_terms {
                    return Err(TopicError::Input(format!(
                        "row {} has {} columns, expected {}",
                        doc,
                        row.len(),
                        num_terms
                    )));
                }
                Ok(row
                    .iter()
                    .enumerate()
                    .filter(|(_, &count)| count > 0)
                    .map(|(term, &count)| (term, count))
                    .collect())
            })
            .collect::<Result<Vec<Vec<(usize, u32)>>>>()?;

        Self::from_rows(sparse_rows, num_terms)
    }

    /// Builds a matrix from sparse rows supplied by a collaborator.
    /// Duplicate term ids within a row are summed; zero counts are dropped.
    pub fn from_rows(rows: Vec<Vec<(usize, u32)>>, num_terms: usize) -> Result<Self> {
        let mut row_offsets = Vec::with_capacity(rows.len() + 1);
        let mut entries = Vec::new();
        row_offsets.push(0);

        for (doc, mut row) in rows.into_iter().enumerate() {
            if let Some(&(term, _)) = row.iter().find(|&&(term, _)| term >= num_terms) {
                return Err(TopicError::Input(format!(
                    "row {} references term {} but the matrix has {} terms",
                    doc, term, num_terms
                )));
            }
            row.sort_unstable_by_key(|&(term, _)| term);

            let start = entries.len();
            for (term, count) in row {
                if count == 0 {
                    continue;
                }
                let in_row = entries.len() > start;
                match entries.last_mut() {
                    Some((last_term, last_count)) if in_row && *last_term == term => {
                        *last_count += count;
                    }
                    _ => entries.push((term, count)),
                }
            }
            row_offsets.push(entries.len());
        }

        Ok(DocumentTermMatrix {
            row_offsets,
            entries,
            num_terms,
        })
    }

    pub fn get(&self, doc: usize, term: usize) -> u32 {
        let row = self.document(doc);
        row.binary_search_by_key(&term, |&(id, _)| id)
            .map(|pos| row[pos].1)
            .unwrap_or(0)
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }
}

impl TermCounts for DocumentTermMatrix {
    fn num_documents(&self) -> usize {
        self.row_offsets.len().saturating_sub(1)
    }

    fn num_terms(&self) -> usize {
        self.num_terms
    }

    fn document(&self, doc: usize) -> &[(usize, u32)] {
        &self.entries[self.row_offsets[doc]..self.row_offsets[doc + 1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(raw: &[&str]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|doc| doc.split_whitespace().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_every_distinct_token_gets_one_id() {
        let corpus = docs(&["tea coffee tea", "coffee mug", "kettle"]);
        let vocab = Vocabulary::from_documents(&corpus);

        assert_eq!(vocab.terms(), &["coffee", "kettle", "mug", "tea"]);
        for (id, term) in vocab.terms().iter().enumerate() {
            assert_eq!(vocab.id(term), Some(id));
            assert_eq!(vocab.term(id), Some(term.as_str()));
        }
        assert_eq!(vocab.id("spoon"), None);
    }

    #[test]
    fn test_ids_do_not_depend_on_document_order() {
        let a = Vocabulary::from_documents(&docs(&["tea coffee", "mug"]));
        let b = Vocabulary::from_documents(&docs(&["mug", "coffee tea"]));
        assert_eq!(a.terms(), b.terms());
    }

    #[test]
    fn test_capped_vocabulary_keeps_most_frequent() {
        let corpus = docs(&["tea tea tea coffee coffee mug", "kettle tea coffee"]);
        let vocab = Vocabulary::from_documents_capped(&corpus, 2);
        assert_eq!(vocab.terms(), &["coffee", "tea"]);
    }

    #[test]
    fn test_capped_vocabulary_breaks_ties_by_token() {
        let corpus = docs(&["zeta alpha mid"]);
        let vocab = Vocabulary::from_documents_capped(&corpus, 2);
        assert_eq!(vocab.terms(), &["alpha", "mid"]);
    }

    #[test]
    fn test_from_terms_rejects_duplicates() {
        let result = Vocabulary::from_terms(vec!["tea".to_string(), "tea".to_string()]);
        assert!(matches!(result, Err(TopicError::Input(_))));
    }

    #[test]
    fn test_bag_of_words_counts_and_drops_unknown() {
        let vocab = Vocabulary::from_documents(&docs(&["tea coffee"]));
        let bow = vocab.bag_of_words(&docs(&["tea tea biscuit coffee"])[0]);
        assert_eq!(bow, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_matrix_and_corpus_are_equivalent_views() {
        let corpus = docs(&["tea coffee tea", "", "mug coffee"]);
        let vocab = Vocabulary::from_documents(&corpus);
        let bow = vocab.corpus(&corpus);
        let dtm = vocab.document_term_matrix(&corpus);

        assert_eq!(bow.num_documents(), dtm.num_documents());
        assert_eq!(bow.num_terms(), dtm.num_terms());
        for doc in 0..bow.num_documents() {
            assert_eq!(bow.document(doc), dtm.document(doc));
        }
        assert_eq!(dtm.total_count(), 5);
        assert_eq!(dtm.get(0, vocab.id("tea").unwrap()), 2);
        assert_eq!(dtm.get(1, 0), 0);
    }

    #[test]
    fn test_from_dense_validates_width() {
        let result = DocumentTermMatrix::from_dense(&[vec![1, 0], vec![0]], 2);
        assert!(matches!(result, Err(TopicError::Input(_))));

        let dtm = DocumentTermMatrix::from_dense(&[vec![1, 0, 3], vec![0, 0, 0]], 3).unwrap();
        assert_eq!(dtm.num_documents(), 2);
        assert_eq!(dtm.document(0), &[(0, 1), (2, 3)]);
        assert!(dtm.document(1).is_empty());
        assert_eq!(dtm.nnz(), 2);
    }

    #[test]
    fn test_from_rows_rejects_out_of_range_terms() {
        let result = DocumentTermMatrix::from_rows(vec![vec![(5, 1)]], 3);
        assert!(matches!(result, Err(TopicError::Input(_))));
    }

    #[test]
    fn test_from_rows_merges_duplicates() {
        let dtm = DocumentTermMatrix::from_rows(vec![vec![(2, 1), (0, 1), (2, 2), (1, 0)]], 3)
            .unwrap();
        assert_eq!(dtm.document(0), &[(0, 1), (2, 3)]);
    }

    #[test]
    fn test_deserialized_vocabulary_resolves_ids() {
        let vocab = Vocabulary::from_documents(&docs(&["tea coffee"]));
        let json = serde_json::to_string(&vocab).unwrap();
        assert_eq!(json, r#"["coffee","tea"]"#);

        let restored: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.id("tea"), Some(1));
        assert_eq!(restored.id("coffee"), Some(0));
        assert_eq!(restored, vocab);
    }

    #[test]
    fn test_deserializing_duplicate_terms_fails() {
        let result: std::result::Result<Vocabulary, _> = serde_json::from_str(r#"["tea","tea"]"#);
        assert!(result.is_err());
    }
}
