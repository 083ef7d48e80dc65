use std::path::PathBuf;

use clap::Parser;
use log::error;
use review_topics::{
    load_reviews, AnalysisConfig, CoherenceMeasure, ResultWriter, TopicAnalysis, TopicPipeline,
};

#[derive(Parser, Debug)]
#[command(version, about = "Pick a topic count for a review corpus by coherence", long_about = None)]
struct Args {
    #[clap(help = "Processed reviews CSV, or a directory holding processed_reviews_*.csv files")]
    input: PathBuf,
    #[clap(short, long, help = "JSON config file; flags below override its values")]
    config: Option<PathBuf>,
    #[clap(short, long, default_value = "topic_models")]
    output: PathBuf,
    #[clap(long, default_value = "clean_text")]
    text_column: String,
    #[clap(long, default_value = "sentiment_score")]
    sentiment_column: String,
    #[clap(long)]
    min_topics: Option<usize>,
    #[clap(long)]
    max_topics: Option<usize>,
    #[clap(long)]
    step: Option<usize>,
    #[clap(long)]
    max_iterations: Option<usize>,
    #[clap(long)]
    seed: Option<u64>,
    #[clap(long, help = "Coherence measure: c_v, c_npmi or u_mass")]
    measure: Option<CoherenceMeasure>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(args)?;
    let corpus = load_reviews(&args.input, &args.text_column, &args.sentiment_column)?;
    println!("Loaded {} reviews from {}", corpus.len(), args.input.display());

    let analysis = TopicPipeline::new(config)?.run(&corpus)?;
    print_summary(&analysis);

    let written = ResultWriter::new(&args.output).write(&analysis)?;
    println!("\nWrote {} files to {}", written.len(), args.output.display());
    Ok(())
}

fn build_config(args: &Args) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::default(),
    };

    if let Some(min_topics) = args.min_topics {
        config.sweep.min_topics = min_topics;
    }
    if let Some(max_topics) = args.max_topics {
        config.sweep.max_topics = max_topics;
    }
    if let Some(step) = args.step {
        config.sweep.step = step;
    }
    if let Some(max_iterations) = args.max_iterations {
        config.lda.max_iterations = max_iterations;
    }
    if let Some(seed) = args.seed {
        config.lda.seed = seed;
    }
    if let Some(measure) = args.measure {
        config.coherence.measure = measure;
    }

    config.validate()?;
    Ok(config)
}

fn print_summary(analysis: &TopicAnalysis) {
    println!("\nCoherence by number of topics:");
    for (num_topics, score) in &analysis.coherence_scores {
        let marker = if *num_topics == analysis.num_topics { "*" } else { " " };
        println!("  {} {:>3}  {:.4}", marker, num_topics, score);
    }
    println!("Optimal number of topics: {}", analysis.num_topics);

    println!("\nTop terms per topic:");
    for (topic, terms) in analysis.top_terms.iter().enumerate() {
        match &analysis.topic_sentiment {
            Some(sentiment) => println!(
                "\nTopic {} (avg sentiment {:+.3}):",
                topic + 1,
                sentiment[topic]
            ),
            None => println!("\nTopic {}:", topic + 1),
        }
        println!("{}", terms.join(", "));
    }
}
