use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TopicError};
use crate::results::top_term_ids;
use crate::vocabulary::TermCounts;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LdaConfig {
    pub max_iterations: usize,
    /// Document-topic concentration. Defaults to `1 / K`.
    pub alpha: Option<f64>,
    /// Topic-term concentration. Defaults to `1 / K`.
    pub beta: Option<f64>,
    pub seed: u64,
    /// Stop early once the fraction of tokens that changed topic during a
    /// sweep is at or below this value.
    pub convergence_tolerance: f64,
}

impl Default for LdaConfig {
    fn default() -> Self {
        LdaConfig {
            max_iterations: 50,
            alpha: None,
            beta: None,
            seed: 42,
            convergence_tolerance: 0.0,
        }
    }
}

/// A fitted topic model for one topic count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicModel {
    /// Topics x terms; each row sums to 1.
    topic_term: Vec<Vec<f64>>,
    /// Documents x topics; each row sums to 1.
    doc_topic: Vec<Vec<f64>>,
    iterations: usize,
    converged: bool,
}

impl TopicModel {
    pub fn num_topics(&self) -> usize {
        self.topic_term.len()
    }

    pub fn num_terms(&self) -> usize {
        self.topic_term.first().map_or(0, Vec::len)
    }

    pub fn num_documents(&self) -> usize {
        self.doc_topic.len()
    }

    pub fn topic_term(&self) -> &[Vec<f64>] {
        &self.topic_term
    }

    pub fn doc_topic(&self) -> &[Vec<f64>] {
        &self.doc_topic
    }

    pub fn into_doc_topic(self) -> Vec<Vec<f64>> {
        self.doc_topic
    }

    /// Number of Gibbs sweeps actually run.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Top `n` term ids per topic, heaviest first.
    pub fn top_term_ids(&self, n: usize) -> Vec<Vec<usize>> {
        self.topic_term
            .iter()
            .map(|weights| top_term_ids(weights, n))
            .collect()
    }

    /// Highest-weight topic per document; ties go to the lower topic id.
    pub fn dominant_topics(&self) -> Vec<usize> {
        self.doc_topic
            .iter()
            .map(|probs| {
                probs
                    .iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |best, (topic, &p)| {
                        if p > best.1 {
                            (topic, p)
                        } else {
                            best
                        }
                    })
                    .0
            })
            .collect()
    }
}

/// Latent Dirichlet Allocation fitted by collapsed Gibbs sampling.
#[derive(Debug, Clone)]
pub struct LatentDirichletAllocation {
    config: LdaConfig,
}

impl LatentDirichletAllocation {
    pub fn new(config: LdaConfig) -> Self {
        LatentDirichletAllocation { config }
    }

    pub fn config(&self) -> &LdaConfig {
        &self.config
    }

    /// Fits `num_topics` topics to `counts`.
    ///
    /// Deterministic for a given input, topic count, iteration bound and
    /// seed. Reaching `max_iterations` without converging is not an error.
    pub fn fit<C: TermCounts + ?Sized>(&self, counts: &C, num_topics: usize) -> Result<TopicModel> {
        let num_docs = counts.num_documents();
        let vocab_size = counts.num_terms();

        if num_docs == 0 || vocab_size == 0 {
            return Err(TopicError::Input(format!(
                "document-term representation is empty ({} documents x {} terms)",
                num_docs, vocab_size
            )));
        }
        if num_topics < 2 {
            return Err(TopicError::Input(format!(
                "topic count must be at least 2, got {}",
                num_topics
            )));
        }
        if num_topics > vocab_size {
            return Err(TopicError::Input(format!(
                "topic count {} exceeds the {} available terms",
                num_topics, vocab_size
            )));
        }

        let alpha = self.prior("alpha", self.config.alpha, num_topics)?;
        let beta = self.prior("beta", self.config.beta, num_topics)?;

        let word_docs = Self::expand_tokens(counts)?;
        let total_tokens: usize = word_docs.iter().map(Vec::len).sum();
        if total_tokens == 0 {
            return Err(TopicError::Input(
                "document-term representation has no tokens".to_string(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let mut word_topic_counts = vec![vec![0usize; num_topics]; vocab_size];
        let mut doc_topic_counts = vec![vec![0usize; num_topics]; num_docs];
        let mut topic_counts = vec![0usize; num_topics];
        let mut doc_word_topics: Vec<Vec<usize>> = Vec::with_capacity(num_docs);

        for (doc_id, doc) in word_docs.iter().enumerate() {
            let mut word_topics = Vec::with_capacity(doc.len());
            for &word_id in doc {
                let topic = rng.gen_range(0..num_topics);
                word_topic_counts[word_id][topic] += 1;
                doc_topic_counts[doc_id][topic] += 1;
                topic_counts[topic] += 1;
                word_topics.push(topic);
            }
            doc_word_topics.push(word_topics);
        }

        let vocab_beta = vocab_size as f64 * beta;
        let mut weights = vec![0.0f64; num_topics];
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_iterations {
            iterations += 1;
            let mut changed = 0usize;

            for (doc_id, doc) in word_docs.iter().enumerate() {
                for (word_pos, &word_id) in doc.iter().enumerate() {
                    let old_topic = doc_word_topics[doc_id][word_pos];

                    word_topic_counts[word_id][old_topic] -= 1;
                    doc_topic_counts[doc_id][old_topic] -= 1;
                    topic_counts[old_topic] -= 1;

                    // p(k) ∝ (n_dk + α) (n_kw + β) / (n_k + Vβ)
                    for (topic, weight) in weights.iter_mut().enumerate() {
                        let doc_part = doc_topic_counts[doc_id][topic] as f64 + alpha;
                        let word_part = (word_topic_counts[word_id][topic] as f64 + beta)
                            / (topic_counts[topic] as f64 + vocab_beta);
                        *weight = doc_part * word_part;
                    }
                    let new_topic = Self::sample_topic(&weights, &mut rng);

                    word_topic_counts[word_id][new_topic] += 1;
                    doc_topic_counts[doc_id][new_topic] += 1;
                    topic_counts[new_topic] += 1;
                    doc_word_topics[doc_id][word_pos] = new_topic;

                    if new_topic != old_topic {
                        changed += 1;
                    }
                }
            }

            let changed_fraction = changed as f64 / total_tokens as f64;
            debug!(
                "LDA k={} iteration {}/{}: {:.4} of tokens reassigned",
                num_topics, iterations, self.config.max_iterations, changed_fraction
            );

            if changed_fraction <= self.config.convergence_tolerance {
                converged = true;
                break;
            }
        }

        let topic_term = Self::normalize_topic_term(&word_topic_counts, &topic_counts, beta);
        let doc_topic = Self::normalize_doc_topic(&doc_topic_counts, alpha);

        Ok(TopicModel {
            topic_term,
            doc_topic,
            iterations,
            converged,
        })
    }

    fn prior(&self, name: &str, value: Option<f64>, num_topics: usize) -> Result<f64> {
        let prior = value.unwrap_or(1.0 / num_topics as f64);
        if !prior.is_finite() || prior <= 0.0 {
            return Err(TopicError::Input(format!(
                "{} must be a positive finite number, got {}",
                name, prior
            )));
        }
        Ok(prior)
    }

    /// One term id per token occurrence, in row order.
    fn expand_tokens<C: TermCounts + ?Sized>(counts: &C) -> Result<Vec<Vec<usize>>> {
        let vocab_size = counts.num_terms();
        (0..counts.num_documents())
            .map(|doc| {
                let mut tokens = Vec::new();
                for &(term, count) in counts.document(doc) {
                    if term >= vocab_size {
                        return Err(TopicError::Input(format!(
                            "document {} references term {} outside a vocabulary of {}",
                            doc, term, vocab_size
                        )));
                    }
                    tokens.extend(std::iter::repeat(term).take(count as usize));
                }
                Ok(tokens)
            })
            .collect()
    }

    fn sample_topic(weights: &[f64], rng: &mut StdRng) -> usize {
        let total: f64 = weights.iter().sum();
        if !(total > 0.0) || !total.is_finite() {
            return rng.gen_range(0..weights.len());
        }

        let mut target = rng.gen::<f64>() * total;
        for (topic, &weight) in weights.iter().enumerate() {
            if target < weight {
                return topic;
            }
            target -= weight;
        }
        weights.len() - 1
    }

    // φ[k][w] = (n_kw + β) / (n_k + Vβ)
    fn normalize_topic_term(
        word_topic_counts: &[Vec<usize>],
        topic_counts: &[usize],
        beta: f64,
    ) -> Vec<Vec<f64>> {
        let vocab_beta = word_topic_counts.len() as f64 * beta;
        topic_counts
            .iter()
            .enumerate()
            .map(|(topic, &topic_total)| {
                word_topic_counts
                    .iter()
                    .map(|word_counts| {
                        (word_counts[topic] as f64 + beta) / (topic_total as f64 + vocab_beta)
                    })
                    .collect()
            })
            .collect()
    }

    // θ[d][k] = (n_dk + α) / (N_d + Kα); an empty document comes out uniform.
    fn normalize_doc_topic(doc_topic_counts: &[Vec<usize>], alpha: f64) -> Vec<Vec<f64>> {
        doc_topic_counts
            .iter()
            .map(|doc_counts| {
                let total: usize = doc_counts.iter().sum();
                let denom = total as f64 + doc_counts.len() as f64 * alpha;
                doc_counts
                    .iter()
                    .map(|&count| (count as f64 + alpha) / denom)
                    .collect()
            })
            .collect()
    }
}
