use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::{Result, TopicError};

pub const PROCESSED_PREFIX: &str = "processed_reviews_";

/// Cleaned review texts with optional per-review sentiment, aligned by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewCorpus {
    pub texts: Vec<String>,
    pub sentiments: Option<Vec<f64>>,
}

impl ReviewCorpus {
    pub fn new(texts: Vec<String>, sentiments: Option<Vec<f64>>) -> Self {
        ReviewCorpus { texts, sentiments }
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Finds the newest `processed_reviews_*.csv` in `dir`. Timestamped names
/// sort chronologically, so the lexicographic maximum is the latest.
pub fn latest_processed_file<P: AsRef<Path>>(dir: P) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let mut latest: Option<PathBuf> = None;

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !(name.starts_with(PROCESSED_PREFIX) && name.ends_with(".csv")) {
            continue;
        }
        if latest.as_ref().map_or(true, |current| path > *current) {
            latest = Some(path);
        }
    }

    latest.ok_or_else(|| {
        TopicError::Input(format!(
            "no {}*.csv files found in {}",
            PROCESSED_PREFIX,
            dir.display()
        ))
    })
}

/// Reads reviews from a CSV file, or from the latest processed file when
/// `path` is a directory.
///
/// A missing sentiment column is not an error: the corpus comes back
/// without sentiment and the caller skips per-topic sentiment.
pub fn load_reviews<P: AsRef<Path>>(path: P, text_column: &str, sentiment_column: &str) -> Result<ReviewCorpus> {
    let path = path.as_ref();
    let path = if path.is_dir() {
        latest_processed_file(path)?
    } else {
        path.to_path_buf()
    };

    let mut reader = csv::Reader::from_path(&path)?;
    let headers = reader.headers()?.clone();

    let text_idx = headers.iter().position(|h| h == text_column).ok_or_else(|| {
        TopicError::Input(format!(
            "column {:?} not found in {}",
            text_column,
            path.display()
        ))
    })?;
    let sentiment_idx = headers.iter().position(|h| h == sentiment_column);
    if sentiment_idx.is_none() {
        warn!(
            "No {:?} column in {}; sentiment will not be analyzed",
            sentiment_column,
            path.display()
        );
    }

    let mut texts = Vec::new();
    let mut sentiments = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        texts.push(record.get(text_idx).unwrap_or("").to_string());

        if let Some(idx) = sentiment_idx {
            let raw = record.get(idx).unwrap_or("").trim();
            let value = if raw.is_empty() {
                0.0
            } else {
                raw.parse::<f64>().map_err(|e| {
                    TopicError::Input(format!(
                        "row {}: invalid {} value {:?}: {}",
                        row + 1,
                        sentiment_column,
                        raw,
                        e
                    ))
                })?
            };
            sentiments.push(value);
        }
    }

    info!("Loaded {} reviews from {}", texts.len(), path.display());

    Ok(ReviewCorpus {
        texts,
        sentiments: sentiment_idx.map(|_| sentiments),
    })
}
