use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TopicError};
use crate::topic_modeling::TopicModel;

/// Everything a run hands over to persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicAnalysis {
    /// Coherence per attempted topic count that succeeded.
    pub coherence_scores: BTreeMap<usize, f64>,
    pub num_topics: usize,
    /// Top terms per topic, heaviest first.
    pub top_terms: Vec<Vec<String>>,
    /// Membership-weighted mean sentiment per topic; absent when no
    /// sentiment scores were supplied.
    pub topic_sentiment: Option<Vec<f64>>,
    /// Documents x topics.
    pub document_topics: Vec<Vec<f64>>,
    pub dominant_topics: Vec<usize>,
}

/// Indices of the `n` largest weights, heaviest first; ties go to the lower index.
pub fn top_term_ids(weights: &[f64], n: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by(|&a, &b| weights[b].total_cmp(&weights[a]).then(a.cmp(&b)));
    order.truncate(n);
    order
}

pub fn top_terms(model: &TopicModel, feature_names: &[String], n: usize) -> Result<Vec<Vec<String>>> {
    if feature_names.len() != model.num_terms() {
        return Err(TopicError::Input(format!(
            "{} feature names for a model over {} terms",
            feature_names.len(),
            model.num_terms()
        )));
    }

    Ok(model
        .top_term_ids(n)
        .into_iter()
        .map(|ids| ids.into_iter().map(|id| feature_names[id].clone()).collect())
        .collect())
}

/// Average sentiment per topic, weighting each document by its membership in
/// that topic. A topic whose weights sum to zero averages to 0.0.
pub fn topic_sentiment(doc_topic: &[Vec<f64>], sentiments: &[f64]) -> Result<Vec<f64>> {
    if doc_topic.len() != sentiments.len() {
        return Err(TopicError::Input(format!(
            "{} sentiment scores for {} documents",
            sentiments.len(),
            doc_topic.len()
        )));
    }

    let num_topics = doc_topic.first().map_or(0, Vec::len);
    if let Some(doc) = doc_topic.iter().position(|row| row.len() != num_topics) {
        return Err(TopicError::Input(format!(
            "document {} has {} topic weights, expected {}",
            doc,
            doc_topic[doc].len(),
            num_topics
        )));
    }

    Ok((0..num_topics)
        .map(|topic| {
            let (weighted, total) = doc_topic.iter().zip(sentiments).fold(
                (0.0, 0.0),
                |(weighted, total), (row, &sentiment)| {
                    (weighted + row[topic] * sentiment, total + row[topic])
                },
            );
            if total == 0.0 || !total.is_finite() {
                0.0
            } else {
                weighted / total
            }
        })
        .collect())
}

/// Packages the winning model into a [`TopicAnalysis`].
pub fn assemble(
    model: TopicModel,
    coherence_scores: BTreeMap<usize, f64>,
    feature_names: &[String],
    sentiments: Option<&[f64]>,
    top_n: usize,
) -> Result<TopicAnalysis> {
    let top_terms = top_terms(&model, feature_names, top_n)?;

    let topic_sentiment = match sentiments {
        Some(scores) => Some(topic_sentiment(model.doc_topic(), scores)?),
        None => {
            warn!("No sentiment scores supplied; skipping per-topic sentiment");
            None
        }
    };

    let dominant_topics = model.dominant_topics();
    let num_topics = model.num_topics();

    Ok(TopicAnalysis {
        coherence_scores,
        num_topics,
        top_terms,
        topic_sentiment,
        document_topics: model.into_doc_topic(),
        dominant_topics,
    })
}
