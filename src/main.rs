use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use issue_triage::config::Config;
use issue_triage::db::Db;
use issue_triage::embedder::openai::OpenAiEmbedder;
use issue_triage::experiment;
use issue_triage::github::fetch::IssueFetcher;
use issue_triage::github::segregate;
use issue_triage::indexer::Indexer;
use issue_triage::llm::openai::OpenAiChat;
use issue_triage::predictor::LabelPredictor;
use issue_triage::predictor::direct::DirectPredictor;
use issue_triage::predictor::retrieval::RetrievalPredictor;
use issue_triage::search::SimilaritySearch;
use issue_triage::splitter::TextSplitter;

#[derive(Parser)]
#[command(name = "issue-triage", version, about = "GitHub issue label prediction by analogy")]
struct Cli {
    /// Path to the JSON config file
    #[arg(long, default_value = "config.json")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch all issues from the configured repository into the issues dir
    Fetch,
    /// Partition stored issues into devset/testset by label prefix
    Segregate,
    /// Rebuild the vector index from stored issues
    Index {
        /// Index on top of existing rows instead of clearing first
        #[arg(long)]
        keep_existing: bool,
    },
    /// Search the index for chunks similar to a query
    Search {
        query: String,
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Predict labels for a single issue
    Predict {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Classify against the fixed label set without retrieval
        #[arg(long)]
        direct: bool,
    },
    /// Evaluate the direct predictor over the devset
    Experiment,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    config.validate()?;

    match cli.command {
        Command::Fetch => {
            let fetcher = IssueFetcher::new(config.github.clone(), Config::github_token())?;
            let summary = fetcher.run(&config.issues_dir())?;
            println!(
                "Fetched {} issues, saved {} ({} pull requests skipped)",
                summary.fetched, summary.saved, summary.pull_requests
            );
        }

        Command::Segregate => {
            let summary = segregate::segregate(
                &config.issues_dir(),
                &config.devset_dir(),
                &config.testset_dir(),
                &config.label_prefix,
            )?;
            println!(
                "Segregated {} of {} issues: {} devset / {} testset",
                summary.filtered, summary.total, summary.devset, summary.testset
            );
            println!("Labels: {}", summary.labels.join(", "));
        }

        Command::Index { keep_existing } => {
            let api_key = Config::openai_api_key()?;
            let embedder = OpenAiEmbedder::new(&config.embedding, &api_key)?;
            let mut db = Db::open(&config.db_path, config.embedding.dimensions)
                .context("failed to open database")?;
            let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap);
            let mut indexer = Indexer::new(
                &mut db,
                &embedder,
                splitter,
                config.issues_dir(),
                config.batch_size,
            );

            let summary = if keep_existing {
                indexer.index_github_issues()?
            } else {
                indexer.index_all()?
            };
            println!(
                "Indexed {} chunks from {} labeled issues ({} unlabeled skipped)",
                summary.chunks, summary.with_labels, summary.without_labels
            );
        }

        Command::Search { query, top_k } => {
            let api_key = Config::openai_api_key()?;
            let embedder = OpenAiEmbedder::new(&config.embedding, &api_key)?;
            let db = Db::open(&config.db_path, config.embedding.dimensions)
                .context("failed to open database")?;
            let search = SimilaritySearch::new(&db, &embedder);

            let results =
                search.search_similar_issues(&query, top_k.unwrap_or(config.search_top_k))?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }

        Command::Predict {
            title,
            description,
            direct,
        } => {
            let api_key = Config::openai_api_key()?;
            let model = OpenAiChat::new(&config.chat, &api_key)?;

            if direct {
                let predictor = DirectPredictor::new(&model);
                let labels = predictor.predict_labels(&title, &description)?;
                println!("Predicted labels: {}", labels.join(", "));
            } else {
                let embedder = OpenAiEmbedder::new(&config.embedding, &api_key)?;
                let db = Db::open(&config.db_path, config.embedding.dimensions)
                    .context("failed to open database")?;
                let predictor =
                    RetrievalPredictor::new(&db, &embedder, &model, config.search_top_k);
                let prediction = predictor.predict(&title, &description)?;
                println!(
                    "Predicted labels: {}",
                    prediction.predicted_labels.join(", ")
                );
                println!("Similar issues: {}", prediction.similar_issues.len());
            }
        }

        Command::Experiment => {
            let api_key = Config::openai_api_key()?;
            let model = OpenAiChat::new(&config.chat, &api_key)?;
            let predictor = DirectPredictor::new(&model);

            let summary =
                experiment::run(&predictor, &config.devset_dir(), &config.results_dir())?;
            println!("Mismatches: {}/{}", summary.mismatches, summary.total);
            println!("Results: {}", summary.json_path.display());
            println!("         {}", summary.csv_path.display());
        }
    }

    Ok(())
}
