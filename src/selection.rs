use std::collections::BTreeMap;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::coherence::CoherenceModel;
use crate::error::{Result, TopicError};
use crate::topic_modeling::LatentDirichletAllocation;
use crate::vocabulary::TermCounts;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub min_topics: usize,
    /// Inclusive upper bound; the sweep never goes past it.
    pub max_topics: usize,
    pub step: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            min_topics: 5,
            max_topics: 15,
            step: 5,
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_topics < 2 {
            return Err(TopicError::Configuration(format!(
                "min_topics must be at least 2, got {}",
                self.min_topics
            )));
        }
        if self.min_topics > self.max_topics {
            return Err(TopicError::Configuration(format!(
                "min_topics ({}) is greater than max_topics ({})",
                self.min_topics, self.max_topics
            )));
        }
        if self.step == 0 {
            return Err(TopicError::Configuration(
                "step must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Topic counts the sweep attempts, in increasing order.
    pub fn candidates(&self) -> Vec<usize> {
        if self.step == 0 {
            return Vec::new();
        }
        (self.min_topics..=self.max_topics)
            .step_by(self.step)
            .collect()
    }
}

/// Scores one candidate topic count. Higher is better.
pub trait CandidateScorer: Sync {
    /// Checks inputs shared by every candidate. Called once before the
    /// sweep; an error here aborts it instead of failing each count.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn score(&self, num_topics: usize) -> Result<f64>;
}

/// Fits LDA at the candidate count and scores its top terms by coherence.
pub struct LdaCoherenceScorer<'a, C: TermCounts + Sync + ?Sized> {
    counts: &'a C,
    lda: &'a LatentDirichletAllocation,
    coherence: &'a CoherenceModel,
}

impl<'a, C: TermCounts + Sync + ?Sized> LdaCoherenceScorer<'a, C> {
    pub fn new(counts: &'a C, lda: &'a LatentDirichletAllocation, coherence: &'a CoherenceModel) -> Self {
        LdaCoherenceScorer {
            counts,
            lda,
            coherence,
        }
    }
}

impl<'a, C: TermCounts + Sync + ?Sized> CandidateScorer for LdaCoherenceScorer<'a, C> {
    fn validate(&self) -> Result<()> {
        let num_docs = self.counts.num_documents();
        let num_terms = self.counts.num_terms();
        if num_docs == 0 || num_terms == 0 {
            return Err(TopicError::Input(format!(
                "document-term representation is empty ({} documents x {} terms)",
                num_docs, num_terms
            )));
        }
        if self.counts.total_count() == 0 {
            return Err(TopicError::Input(
                "document-term representation has no tokens".to_string(),
            ));
        }
        Ok(())
    }

    fn score(&self, num_topics: usize) -> Result<f64> {
        let model = self.lda.fit(self.counts, num_topics)?;
        let top_ids = model.top_term_ids(self.coherence.config().top_n);
        let coherence = self.coherence.score(&top_ids)?;
        Ok(coherence.mean)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub scores: BTreeMap<usize, f64>,
    pub best_topics: usize,
    pub best_score: f64,
}

/// Picks the best-scoring topic count. Scans in increasing order and only
/// moves on a strictly greater score, so exact ties keep the smaller count.
pub fn select_best(scores: &BTreeMap<usize, f64>) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (&num_topics, &score) in scores {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((num_topics, score)),
        }
    }
    best
}

#[derive(Debug, Clone)]
pub struct TopicCountSelector {
    config: SweepConfig,
}

impl TopicCountSelector {
    pub fn new(config: SweepConfig) -> Result<Self> {
        config.validate()?;
        Ok(TopicCountSelector { config })
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Scores every candidate count. A count that fails is logged and left
    /// out of the result; the sweep fails only if every count fails. Errors
    /// from [`CandidateScorer::validate`] are returned as-is.
    pub fn sweep<S: CandidateScorer + ?Sized>(&self, scorer: &S) -> Result<SweepOutcome> {
        scorer.validate()?;

        let candidates = self.config.candidates();
        info!(
            "Sweeping topic counts {:?} ({} candidates)",
            candidates,
            candidates.len()
        );

        let results = Self::evaluate(&candidates, scorer);

        let mut scores = BTreeMap::new();
        let mut failures = Vec::new();
        for (num_topics, result) in results {
            match result {
                Ok(score) if score.is_nan() => {
                    warn!("Excluding k={}: coherence is NaN", num_topics);
                    failures.push(format!("k={}: coherence is NaN", num_topics));
                }
                Ok(score) => {
                    info!("k={} coherence={:.4}", num_topics, score);
                    scores.insert(num_topics, score);
                }
                Err(e) => {
                    warn!("Excluding k={}: {}", num_topics, e);
                    failures.push(format!("k={}: {}", num_topics, e));
                }
            }
        }

        let (best_topics, best_score) = select_best(&scores).ok_or_else(|| {
            TopicError::Configuration(format!(
                "every topic count in {}..={} step {} failed ({})",
                self.config.min_topics,
                self.config.max_topics,
                self.config.step,
                failures.join("; ")
            ))
        })?;

        info!(
            "Optimal number of topics: {} (coherence {:.4})",
            best_topics, best_score
        );

        Ok(SweepOutcome {
            scores,
            best_topics,
            best_score,
        })
    }

    #[cfg(not(feature = "parallel"))]
    fn evaluate<S: CandidateScorer + ?Sized>(candidates: &[usize], scorer: &S) -> Vec<(usize, Result<f64>)> {
        candidates
            .iter()
            .map(|&num_topics| {
                info!("Computing coherence for {} topics...", num_topics);
                (num_topics, scorer.score(num_topics))
            })
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn evaluate<S: CandidateScorer + ?Sized>(candidates: &[usize], scorer: &S) -> Vec<(usize, Result<f64>)> {
        use rayon::prelude::*;

        candidates
            .par_iter()
            .map(|&num_topics| {
                info!("Computing coherence for {} topics...", num_topics);
                (num_topics, scorer.score(num_topics))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coherence::CoherenceConfig;
    use crate::topic_modeling::LdaConfig;
    use crate::vocabulary::Vocabulary;

    struct FixedScores(BTreeMap<usize, Result<f64>>);

    impl FixedScores {
        fn new(entries: Vec<(usize, Result<f64>)>) -> Self {
            FixedScores(entries.into_iter().collect())
        }
    }

    impl CandidateScorer for FixedScores {
        fn score(&self, num_topics: usize) -> Result<f64> {
            match self.0.get(&num_topics) {
                Some(Ok(score)) => Ok(*score),
                Some(Err(e)) => Err(TopicError::Input(e.to_string())),
                None => Err(TopicError::Input(format!("no score for {}", num_topics))),
            }
        }
    }

    fn selector(min_topics: usize, max_topics: usize, step: usize) -> TopicCountSelector {
        TopicCountSelector::new(SweepConfig {
            min_topics,
            max_topics,
            step,
        })
        .expect("valid sweep")
    }

    #[test]
    fn test_candidates_stop_at_or_before_max() {
        let config = SweepConfig {
            min_topics: 5,
            max_topics: 17,
            step: 5,
        };
        assert_eq!(config.candidates(), vec![5, 10, 15]);

        let config = SweepConfig {
            min_topics: 5,
            max_topics: 15,
            step: 5,
        };
        assert_eq!(config.candidates(), vec![5, 10, 15]);

        let config = SweepConfig {
            min_topics: 3,
            max_topics: 3,
            step: 5,
        };
        assert_eq!(config.candidates(), vec![3]);
    }

    #[test]
    fn test_min_topics_below_two_rejected() {
        let result = TopicCountSelector::new(SweepConfig {
            min_topics: 1,
            max_topics: 5,
            step: 1,
        });
        assert!(matches!(result, Err(TopicError::Configuration(_))));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let result = TopicCountSelector::new(SweepConfig {
            min_topics: 10,
            max_topics: 5,
            step: 1,
        });
        assert!(matches!(result, Err(TopicError::Configuration(_))));
    }

    #[test]
    fn test_zero_step_rejected() {
        let result = TopicCountSelector::new(SweepConfig {
            min_topics: 2,
            max_topics: 5,
            step: 0,
        });
        assert!(matches!(result, Err(TopicError::Configuration(_))));
    }

    #[test]
    fn test_tie_prefers_smaller_topic_count() {
        let scorer = FixedScores::new(vec![(5, Ok(0.42)), (10, Ok(0.42))]);
        let outcome = selector(5, 10, 5).sweep(&scorer).unwrap();
        assert_eq!(outcome.best_topics, 5);
        assert_eq!(outcome.scores.len(), 2);
    }

    #[test]
    fn test_strictly_higher_score_wins() {
        let scorer = FixedScores::new(vec![(2, Ok(0.3)), (4, Ok(0.5)), (6, Ok(0.5)), (8, Ok(0.1))]);
        let outcome = selector(2, 8, 2).sweep(&scorer).unwrap();
        assert_eq!(outcome.best_topics, 4);
        assert_eq!(outcome.best_score, 0.5);
    }

    #[test]
    fn test_negative_scores_still_select() {
        let scorer = FixedScores::new(vec![(2, Ok(-3.0)), (3, Ok(-1.5))]);
        let outcome = selector(2, 3, 1).sweep(&scorer).unwrap();
        assert_eq!(outcome.best_topics, 3);
    }

    #[test]
    fn test_failed_candidate_is_excluded() {
        let scorer = FixedScores::new(vec![
            (2, Ok(0.2)),
            (3, Err(TopicError::Input("boom".to_string()))),
            (4, Ok(0.1)),
        ]);
        let outcome = selector(2, 4, 1).sweep(&scorer).unwrap();
        assert_eq!(outcome.scores.keys().copied().collect::<Vec<_>>(), vec![2, 4]);
        assert_eq!(outcome.best_topics, 2);
    }

    #[test]
    fn test_nan_candidate_is_excluded() {
        let scorer = FixedScores::new(vec![(2, Ok(f64::NAN)), (3, Ok(0.1))]);
        let outcome = selector(2, 3, 1).sweep(&scorer).unwrap();
        assert_eq!(outcome.scores.len(), 1);
        assert_eq!(outcome.best_topics, 3);
    }

    #[test]
    fn test_all_candidates_failing_is_configuration_error() {
        let scorer = FixedScores::new(vec![]);
        let result = selector(2, 4, 1).sweep(&scorer);
        match result {
            Err(TopicError::Configuration(msg)) => assert!(msg.contains("k=3")),
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_select_best_on_map() {
        let mut scores = BTreeMap::new();
        assert_eq!(select_best(&scores), None);
        scores.insert(10, 0.7);
        scores.insert(5, 0.7);
        assert_eq!(select_best(&scores), Some((5, 0.7)));
    }

    #[test]
    fn test_lda_scorer_excludes_oversized_topic_count() {
        let texts: Vec<Vec<String>> = ["tea kettle mug", "coffee mug cup", "tea cup kettle"]
            .iter()
            .map(|doc| doc.split_whitespace().map(str::to_string).collect())
            .collect();
        let vocab = Vocabulary::from_documents(&texts);
        let corpus = vocab.corpus(&texts);
        let lda = LatentDirichletAllocation::new(LdaConfig::default());
        let coherence = CoherenceModel::new(&texts, &vocab, CoherenceConfig::default()).unwrap();
        let scorer = LdaCoherenceScorer::new(&corpus, &lda, &coherence);

        // five terms: k=6 cannot be fitted
        let outcome = selector(2, 6, 2).sweep(&scorer).unwrap();
        assert_eq!(outcome.scores.keys().copied().collect::<Vec<_>>(), vec![2, 4]);
    }

    #[test]
    fn test_empty_representation_aborts_sweep_with_input_error() {
        let texts: Vec<Vec<String>> = ["tea kettle mug"]
            .iter()
            .map(|doc| doc.split_whitespace().map(str::to_string).collect())
            .collect();
        let vocab = Vocabulary::from_documents(&texts);
        let empty = vocab.corpus(&[]);
        let lda = LatentDirichletAllocation::new(LdaConfig::default());
        let coherence = CoherenceModel::new(&texts, &vocab, CoherenceConfig::default()).unwrap();
        let scorer = LdaCoherenceScorer::new(&empty, &lda, &coherence);

        let result = selector(2, 3, 1).sweep(&scorer);
        assert!(matches!(result, Err(TopicError::Input(_))));
    }

    #[test]
    fn test_tokenless_representation_aborts_sweep_with_input_error() {
        let texts: Vec<Vec<String>> = ["tea kettle mug"]
            .iter()
            .map(|doc| doc.split_whitespace().map(str::to_string).collect())
            .collect();
        let vocab = Vocabulary::from_documents(&texts);
        let unseen = vec![vec!["coffee".to_string()], Vec::new()];
        let tokenless = vocab.corpus(&unseen);
        let lda = LatentDirichletAllocation::new(LdaConfig::default());
        let coherence = CoherenceModel::new(&texts, &vocab, CoherenceConfig::default()).unwrap();
        let scorer = LdaCoherenceScorer::new(&tokenless, &lda, &coherence);

        let result = selector(2, 3, 1).sweep(&scorer);
        assert!(matches!(result, Err(TopicError::Input(_))));
    }
}
