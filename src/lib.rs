//! Topic-count selection for product-review corpora.
//!
//! Reviews are tokenized, mapped through one canonical [`Vocabulary`], and
//! swept over a range of topic counts. Each count gets an LDA fit and a
//! coherence score; the best count (ties to the smaller one) is refitted
//! and packaged with its top terms, per-topic sentiment and document-topic
//! distribution.
//!
//! ```no_run
//! use review_topics::{AnalysisConfig, ReviewCorpus, TopicPipeline};
//!
//! let corpus = ReviewCorpus::new(
//!     vec!["fresh tea leaves".to_string(), "bitter coffee roast".to_string()],
//!     Some(vec![0.8, -0.4]),
//! );
//! let pipeline = TopicPipeline::new(AnalysisConfig::default())?;
//! let analysis = pipeline.run(&corpus)?;
//! println!("best k = {}", analysis.num_topics);
//! # Ok::<(), review_topics::TopicError>(())
//! ```

pub mod coherence;
pub mod config;
pub mod error;
pub mod loader;
pub mod persistence;
pub mod pipeline;
pub mod results;
pub mod selection;
pub mod text;
pub mod topic_modeling;
pub mod vocabulary;

pub use coherence::{CoherenceConfig, CoherenceMeasure, CoherenceModel, CoherenceScore};
pub use config::AnalysisConfig;
pub use error::{Result, TopicError};
pub use loader::{load_reviews, ReviewCorpus};
pub use persistence::ResultWriter;
pub use pipeline::TopicPipeline;
pub use results::TopicAnalysis;
pub use selection::{select_best, CandidateScorer, SweepConfig, SweepOutcome, TopicCountSelector};
pub use text::{Tokenizer, TokenizerConfig};
pub use topic_modeling::{LatentDirichletAllocation, LdaConfig, TopicModel};
pub use vocabulary::{BagOfWordsCorpus, DocumentTermMatrix, TermCounts, Vocabulary};
