use log::info;

use crate::coherence::CoherenceModel;
use crate::config::AnalysisConfig;
use crate::error::{Result, TopicError};
use crate::loader::ReviewCorpus;
use crate::results::{self, TopicAnalysis};
use crate::selection::{LdaCoherenceScorer, TopicCountSelector};
use crate::text::Tokenizer;
use crate::topic_modeling::LatentDirichletAllocation;
use crate::vocabulary::{TermCounts, Vocabulary};

/// Runs tokenization, vocabulary building, the topic-count sweep, the final
/// fit and result assembly for one review corpus.
#[derive(Debug, Clone)]
pub struct TopicPipeline {
    config: AnalysisConfig,
}

impl TopicPipeline {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(TopicPipeline { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn run(&self, corpus: &ReviewCorpus) -> Result<TopicAnalysis> {
        if corpus.is_empty() {
            return Err(TopicError::Input("review corpus has no documents".to_string()));
        }
        if let Some(sentiments) = &corpus.sentiments {
            if sentiments.len() != corpus.len() {
                return Err(TopicError::Input(format!(
                    "{} sentiment scores for {} reviews",
                    sentiments.len(),
                    corpus.len()
                )));
            }
        }

        let tokenizer = Tokenizer::new(&self.config.tokenizer)?;
        let texts = tokenizer.tokenize_all(&corpus.texts);
        self.run_tokenized(&texts, corpus.sentiments.as_deref())
    }

    /// Same as [`run`](Self::run) for documents that are already tokenized.
    pub fn run_tokenized(&self, texts: &[Vec<String>], sentiments: Option<&[f64]>) -> Result<TopicAnalysis> {
        info!("Building vocabulary over {} documents...", texts.len());
        let vocabulary = match self.config.vocabulary.max_features {
            Some(max_terms) => Vocabulary::from_documents_capped(texts, max_terms),
            None => Vocabulary::from_documents(texts),
        };
        if vocabulary.is_empty() {
            return Err(TopicError::Input(
                "documents contain no tokens to build a vocabulary from".to_string(),
            ));
        }
        info!("Vocabulary has {} terms", vocabulary.len());

        // both views come from the same vocabulary
        let corpus = vocabulary.corpus(texts);
        let matrix = vocabulary.document_term_matrix(texts);
        if matrix.total_count() == 0 {
            return Err(TopicError::Input("document-term matrix is empty".to_string()));
        }

        let coherence = CoherenceModel::new(texts, &vocabulary, self.config.coherence.clone())?;
        let lda = LatentDirichletAllocation::new(self.config.lda.clone());
        let selector = TopicCountSelector::new(self.config.sweep.clone())?;

        info!("Finding optimal number of topics...");
        let scorer = LdaCoherenceScorer::new(&corpus, &lda, &coherence);
        let outcome = selector.sweep(&scorer)?;

        info!("Fitting LDA model with {} topics...", outcome.best_topics);
        let model = lda.fit(&matrix, outcome.best_topics)?;
        if !model.converged() {
            info!(
                "Final fit stopped at the {} iteration bound",
                model.iterations()
            );
        }

        results::assemble(
            model,
            outcome.scores,
            vocabulary.terms(),
            sentiments,
            self.config.results.top_n_terms,
        )
    }
}
