use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::coherence::CoherenceConfig;
use crate::error::{Result, TopicError};
use crate::selection::SweepConfig;
use crate::text::TokenizerConfig;
use crate::topic_modeling::LdaConfig;
use crate::vocabulary::VocabularyConfig;

/// Settings for a full analysis run. Every section falls back to its
/// defaults when missing from a config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub tokenizer: TokenizerConfig,
    pub vocabulary: VocabularyConfig,
    pub lda: LdaConfig,
    pub sweep: SweepConfig,
    pub coherence: CoherenceConfig,
    pub results: ResultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsConfig {
    /// Terms reported per topic.
    pub top_n_terms: usize,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        ResultsConfig { top_n_terms: 10 }
    }
}

impl AnalysisConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: AnalysisConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.sweep.validate()?;

        if self.vocabulary.max_features == Some(0) {
            return Err(TopicError::Configuration(
                "vocabulary.max_features must be at least 1".to_string(),
            ));
        }
        if self.lda.max_iterations == 0 {
            return Err(TopicError::Configuration(
                "lda.max_iterations must be at least 1".to_string(),
            ));
        }
        if self.coherence.top_n < 2 {
            return Err(TopicError::Configuration(format!(
                "coherence.top_n must be at least 2, got {}",
                self.coherence.top_n
            )));
        }
        if self.coherence.window_size == 0 {
            return Err(TopicError::Configuration(
                "coherence.window_size must be at least 1".to_string(),
            ));
        }
        if self.results.top_n_terms == 0 {
            return Err(TopicError::Configuration(
                "results.top_n_terms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coherence::CoherenceMeasure;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_run() {
        let config = AnalysisConfig::default();
        assert_eq!(config.sweep.min_topics, 5);
        assert_eq!(config.sweep.max_topics, 15);
        assert_eq!(config.sweep.step, 5);
        assert_eq!(config.vocabulary.max_features, Some(1000));
        assert_eq!(config.coherence.top_n, 10);
        assert_eq!(config.coherence.measure, CoherenceMeasure::CV);
        assert_eq!(config.lda.seed, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"sweep": {{"min_topics": 2, "max_topics": 4}}, "coherence": {{"measure": "u_mass"}}}}"#
        )
        .unwrap();

        let config = AnalysisConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.sweep.min_topics, 2);
        assert_eq!(config.sweep.max_topics, 4);
        assert_eq!(config.sweep.step, 5);
        assert_eq!(config.coherence.measure, CoherenceMeasure::UMass);
        assert_eq!(config.coherence.window_size, 110);
    }

    #[test]
    fn test_invalid_sweep_in_file_is_configuration_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"sweep": {{"min_topics": 1}}}}"#).unwrap();
        assert!(matches!(
            AnalysisConfig::from_json_file(file.path()),
            Err(TopicError::Configuration(_))
        ));
    }

    #[test]
    fn test_malformed_json_is_json_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            AnalysisConfig::from_json_file(file.path()),
            Err(TopicError::Json(_))
        ));
    }

    #[test]
    fn test_zero_max_features_rejected() {
        let mut config = AnalysisConfig::default();
        config.vocabulary.max_features = Some(0);
        assert!(matches!(config.validate(), Err(TopicError::Configuration(_))));
    }
}
