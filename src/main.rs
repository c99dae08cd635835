//! photopoem command line: ingest poems into the index or ask for a recommendation.
//!
//! Configuration comes from `photopoem.yaml` (or `--config`), `PHOTOPOEM__*`
//! environment variables and a `.env` file if one is present.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use photopoem::{LogFormat, PhotopoemConfig, RecommendRequest, Recommender};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "photopoem", version, about = "Recommend a poem for a photo, a story and a mood")]
struct Cli {
    /// YAML configuration file. Defaults to ./photopoem.yaml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Embed one poem and add it to the index.
    Ingest {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        /// File holding the excerpt; stanzas separated by blank lines.
        #[arg(long)]
        excerpt_file: PathBuf,
        #[arg(long)]
        source: String,
    },
    /// Recommend one poem. At least one of the inputs is required.
    Recommend {
        /// Publicly resolvable image URL, captioned before retrieval.
        #[arg(long)]
        image_url: Option<String>,
        /// Image caption, used instead of captioning `--image-url`.
        #[arg(long)]
        caption: Option<String>,
        /// Free-form story.
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        mood: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = PhotopoemConfig::load(cli.config.as_deref()).context("loading configuration")?;
    init_tracing(&config);

    let recommender = Recommender::from_config(&config)
        .await
        .context("building pipeline")?;

    let outcome = run(&recommender, cli.command).await;
    recommender.close().await.context("closing index")?;
    outcome
}

async fn run(recommender: &Recommender, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Ingest {
            title,
            author,
            excerpt_file,
            source,
        } => {
            let excerpt = std::fs::read_to_string(&excerpt_file)
                .with_context(|| format!("reading {}", excerpt_file.display()))?;
            match recommender.ingest(&title, &author, &excerpt, &source).await {
                Ok(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                Err(err) => {
                    tracing::error!(error = %err, "ingest failed");
                    anyhow::bail!("{}: {}", err.kind(), err.safe_message());
                }
            }
        }
        Command::Recommend {
            image_url,
            caption,
            text,
            mood,
        } => {
            let request = RecommendRequest {
                image_url,
                caption,
                free_text: text,
                mood_tag: mood,
            };
            match recommender.recommend_request(request).await {
                Ok(rec) => println!("{}", serde_json::to_string_pretty(&rec)?),
                Err(err) => {
                    tracing::error!(error = %err, "recommend failed");
                    anyhow::bail!("{}: {}", err.kind(), err.safe_message());
                }
            }
        }
    }
    Ok(())
}

fn init_tracing(config: &PhotopoemConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
