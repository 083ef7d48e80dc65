//! Topic coherence over a tokenized corpus.
//!
//! Three confirmation measures are supported:
//!
//! - [`CoherenceMeasure::CV`]: NPMI context vectors per top term, compared
//!   by cosine similarity against the topic's summed vector.
//! - [`CoherenceMeasure::Npmi`]: mean pairwise normalized PMI.
//! - [`CoherenceMeasure::UMass`]: mean log conditional probability of each
//!   term given the terms ranked above it, over whole documents.
//!
//! C_V and NPMI count co-occurrence in boolean sliding windows. Every
//! co-occurrence probability is smoothed by [`EPSILON`] before a logarithm is
//! taken, so topics whose terms never meet score at a floor instead of
//! producing infinities.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TopicError};
use crate::vocabulary::Vocabulary;

pub const EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoherenceMeasure {
    #[serde(rename = "c_v")]
    CV,
    #[serde(rename = "c_npmi")]
    Npmi,
    #[serde(rename = "u_mass")]
    UMass,
}

impl fmt::Display for CoherenceMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoherenceMeasure::CV => "c_v",
            CoherenceMeasure::Npmi => "c_npmi",
            CoherenceMeasure::UMass => "u_mass",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for CoherenceMeasure {
    type Err = TopicError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cv" | "c_v" => Ok(CoherenceMeasure::CV),
            "npmi" | "c_npmi" => Ok(CoherenceMeasure::Npmi),
            "umass" | "u_mass" => Ok(CoherenceMeasure::UMass),
            other => Err(TopicError::Configuration(format!(
                "unknown coherence measure {:?} (expected c_v, c_npmi or u_mass)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoherenceConfig {
    pub measure: CoherenceMeasure,
    /// Top terms per topic that enter the score.
    pub top_n: usize,
    /// Sliding window length in tokens (C_V and NPMI only).
    pub window_size: usize,
}

impl Default for CoherenceConfig {
    fn default() -> Self {
        CoherenceConfig {
            measure: CoherenceMeasure::CV,
            top_n: 10,
            window_size: 110,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoherenceScore {
    pub mean: f64,
    pub per_topic: Vec<f64>,
}

/// Window and pair counts for the terms under evaluation.
struct Occurrences {
    num_contexts: u64,
    single: Vec<u64>,
    // upper triangle, row-major over `n` slots
    joint: Vec<u64>,
    n: usize,
}

impl Occurrences {
    fn new(n: usize) -> Self {
        Occurrences {
            num_contexts: 0,
            single: vec![0; n],
            joint: vec![0; n * n],
            n,
        }
    }

    fn record(&mut self, present: &mut Vec<usize>) {
        present.sort_unstable();
        present.dedup();

        self.num_contexts += 1;
        for (pos, &a) in present.iter().enumerate() {
            self.single[a] += 1;
            for &b in &present[pos + 1..] {
                self.joint[a * self.n + b] += 1;
            }
        }
    }

    fn prob(&self, slot: usize) -> f64 {
        self.single[slot] as f64 / self.num_contexts as f64
    }

    fn joint_prob(&self, a: usize, b: usize) -> f64 {
        let count = match a.cmp(&b) {
            std::cmp::Ordering::Equal => self.single[a],
            std::cmp::Ordering::Less => self.joint[a * self.n + b],
            std::cmp::Ordering::Greater => self.joint[b * self.n + a],
        };
        count as f64 / self.num_contexts as f64
    }

    fn npmi(&self, a: usize, b: usize) -> f64 {
        if self.single[a] == 0 || self.single[b] == 0 {
            return -1.0;
        }
        let p_ab = self.joint_prob(a, b) + EPSILON;
        let denom = -p_ab.ln();
        if denom <= EPSILON {
            return 1.0;
        }
        let pmi = (p_ab / (self.prob(a) * self.prob(b))).ln();
        (pmi / denom).clamp(-1.0, 1.0)
    }

    /// ln P(a | b), smoothed.
    fn log_conditional(&self, a: usize, b: usize) -> f64 {
        if self.single[b] == 0 {
            return EPSILON.ln();
        }
        ((self.joint_prob(a, b) + EPSILON) / self.prob(b)).ln()
    }
}

/// Scores topics against a fixed tokenized corpus.
///
/// The corpus is encoded against the vocabulary once, so one model can
/// score every candidate topic count of a sweep.
#[derive(Debug, Clone)]
pub struct CoherenceModel {
    encoded: Vec<Vec<Option<usize>>>,
    config: CoherenceConfig,
}

impl CoherenceModel {
    pub fn new(texts: &[Vec<String>], vocabulary: &Vocabulary, config: CoherenceConfig) -> Result<Self> {
        let total_tokens: usize = texts.iter().map(Vec::len).sum();
        if total_tokens == 0 {
            return Err(TopicError::Scoring(format!(
                "tokenized corpus is empty ({} documents, no tokens)",
                texts.len()
            )));
        }
        if config.window_size == 0 {
            return Err(TopicError::Configuration(
                "coherence window_size must be at least 1".to_string(),
            ));
        }

        let encoded = texts
            .iter()
            .map(|doc| doc.iter().map(|token| vocabulary.id(token)).collect())
            .collect();

        Ok(CoherenceModel { encoded, config })
    }

    pub fn config(&self) -> &CoherenceConfig {
        &self.config
    }

    /// Scores each topic (a ranked list of term ids) and averages.
    pub fn score(&self, topics: &[Vec<usize>]) -> Result<CoherenceScore> {
        if topics.is_empty() {
            return Err(TopicError::Scoring("no topics to score".to_string()));
        }

        let topics: Vec<Vec<usize>> = topics.iter().map(|ids| dedup_in_order(ids)).collect();

        let mut slots: BTreeMap<usize, usize> = BTreeMap::new();
        for &id in topics.iter().flatten() {
            let next = slots.len();
            slots.entry(id).or_insert(next);
        }
        let slots: HashMap<usize, usize> = slots.into_iter().collect();

        let occurrences = self.accumulate(&slots);

        let per_topic: Vec<f64> = topics
            .iter()
            .map(|ids| {
                let topic_slots: Vec<usize> = ids.iter().map(|id| slots[id]).collect();
                self.score_topic(&occurrences, &topic_slots)
            })
            .collect();

        let mean = per_topic.iter().sum::<f64>() / per_topic.len() as f64;
        Ok(CoherenceScore { mean, per_topic })
    }

    fn accumulate(&self, slots: &HashMap<usize, usize>) -> Occurrences {
        let mut occurrences = Occurrences::new(slots.len());
        let mut present = Vec::new();

        for doc in &self.encoded {
            let doc_slots: Vec<Option<usize>> = doc
                .iter()
                .map(|id| id.and_then(|id| slots.get(&id).copied()))
                .collect();

            match self.config.measure {
                CoherenceMeasure::UMass => {
                    present.clear();
                    present.extend(doc_slots.iter().flatten());
                    occurrences.record(&mut present);
                }
                CoherenceMeasure::CV | CoherenceMeasure::Npmi => {
                    if doc_slots.is_empty() {
                        continue;
                    }
                    let window = self.config.window_size.min(doc_slots.len());
                    for context in doc_slots.windows(window) {
                        present.clear();
                        present.extend(context.iter().flatten());
                        occurrences.record(&mut present);
                    }
                }
            }
        }

        occurrences
    }

    fn score_topic(&self, occurrences: &Occurrences, slots: &[usize]) -> f64 {
        if slots.len() < 2 {
            return 0.0;
        }

        match self.config.measure {
            CoherenceMeasure::CV => {
                let vectors: Vec<Vec<f64>> = slots
                    .iter()
                    .map(|&a| slots.iter().map(|&b| occurrences.npmi(a, b)).collect())
                    .collect();
                let topic_vector: Vec<f64> = (0..slots.len())
                    .map(|j| vectors.iter().map(|v| v[j]).sum::<f64>())
                    .collect();

                let similarities: f64 = vectors.iter().map(|v| cosine(v, &topic_vector)).sum();
                similarities / slots.len() as f64
            }
            CoherenceMeasure::Npmi => {
                let mut total = 0.0;
                let mut pairs = 0usize;
                for (i, &a) in slots.iter().enumerate() {
                    for &b in &slots[i + 1..] {
                        total += occurrences.npmi(a, b);
                        pairs += 1;
                    }
                }
                total / pairs as f64
            }
            CoherenceMeasure::UMass => {
                let mut total = 0.0;
                let mut pairs = 0usize;
                for (i, &a) in slots.iter().enumerate().skip(1) {
                    for &b in &slots[..i] {
                        total += occurrences.log_conditional(a, b);
                        pairs += 1;
                    }
                }
                total / pairs as f64
            }
        }
    }
}

fn dedup_in_order(ids: &[usize]) -> Vec<usize> {
    let mut seen = std::collections::HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a <= EPSILON || norm_b <= EPSILON {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
