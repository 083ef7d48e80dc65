use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{info, warn};

use crate::error::Result;
use crate::results::TopicAnalysis;

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Writes a [`TopicAnalysis`] as timestamped files in one directory.
#[derive(Debug, Clone)]
pub struct ResultWriter {
    output_dir: PathBuf,
}

impl ResultWriter {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        ResultWriter {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes every artifact using the current local time as suffix.
    pub fn write(&self, analysis: &TopicAnalysis) -> Result<Vec<PathBuf>> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.write_with_timestamp(analysis, &timestamp)
    }

    /// Writes every artifact. If any write fails, the files already written
    /// for this run are removed before the error is returned.
    pub fn write_with_timestamp(&self, analysis: &TopicAnalysis, timestamp: &str) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_dir)?;

        let mut written = Vec::new();
        match self.write_all(analysis, timestamp, &mut written) {
            Ok(()) => {
                info!(
                    "Results saved in {} with timestamp {}",
                    self.output_dir.display(),
                    timestamp
                );
                Ok(written)
            }
            Err(e) => {
                for path in &written {
                    if let Err(remove_err) = fs::remove_file(path) {
                        warn!("Could not remove {}: {}", path.display(), remove_err);
                    }
                }
                Err(e)
            }
        }
    }

    fn write_all(&self, analysis: &TopicAnalysis, timestamp: &str, written: &mut Vec<PathBuf>) -> Result<()> {
        let path = self.path("topic_distributions", timestamp, "csv");
        written.push(path.clone());
        write_topic_distributions(&path, analysis)?;

        let path = self.path("top_terms", timestamp, "txt");
        written.push(path.clone());
        write_top_terms(&path, analysis)?;

        let path = self.path("coherence_scores", timestamp, "csv");
        written.push(path.clone());
        write_coherence_scores(&path, analysis)?;

        if let Some(sentiment) = &analysis.topic_sentiment {
            let path = self.path("topic_sentiment", timestamp, "csv");
            written.push(path.clone());
            write_topic_sentiment(&path, sentiment)?;
        }

        let path = self.path("analysis", timestamp, "json");
        written.push(path.clone());
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, analysis)?;
        writer.flush()?;

        Ok(())
    }

    fn path(&self, stem: &str, timestamp: &str, extension: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}.{}", stem, timestamp, extension))
    }
}

/// Reads back an `analysis_<timestamp>.json` file.
pub fn read_analysis<P: AsRef<Path>>(path: P) -> Result<TopicAnalysis> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}

fn write_topic_distributions(path: &Path, analysis: &TopicAnalysis) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    let header: Vec<String> = (1..=analysis.num_topics)
        .map(|topic| format!("Topic_{}", topic))
        .collect();
    writer.write_record(&header)?;
    for row in &analysis.document_topics {
        writer.write_record(row.iter().map(|p| p.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_top_terms(path: &Path, analysis: &TopicAnalysis) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for (topic, terms) in analysis.top_terms.iter().enumerate() {
        writeln!(writer, "Topic {}:\n{}\n", topic + 1, terms.join(", "))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_coherence_scores(path: &Path, analysis: &TopicAnalysis) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["n_topics", "coherence_score"])?;
    for (num_topics, score) in &analysis.coherence_scores {
        writer.write_record([num_topics.to_string(), score.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_topic_sentiment(path: &Path, sentiment: &[f64]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["topic", "avg_sentiment"])?;
    for (topic, avg) in sentiment.iter().enumerate() {
        writer.write_record([topic.to_string(), avg.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}
