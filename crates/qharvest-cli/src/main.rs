use std::sync::Arc;

use clap::{Parser, Subcommand};
use qharvest_collect::{CollectRequest, CollectionService};
use qharvest_core::{load_app_config, AnswerStore, ProblemStore};
use qharvest_db::{connect_pool, run_migrations, SqliteAnswerStore, SqliteProblemStore};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "qharvest")]
#[command(about = "Question collection for the personal library")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect questions for a topic and print the outcome as JSON.
    Collect {
        /// The search term driving the run.
        #[arg(long)]
        topic: String,

        #[arg(long, default_value_t = 50)]
        max_results: usize,

        /// Restrict the run to one platform slug (e.g. zhihu).
        #[arg(long)]
        platform: Option<String>,

        /// Persist surviving questions and answers.
        #[arg(long)]
        auto_save: bool,

        /// Skip answer harvesting.
        #[arg(long)]
        no_answers: bool,

        #[arg(long, default_value_t = 3)]
        max_answers: usize,

        #[arg(long, default_value_t = 10)]
        min_answer_upvotes: u32,
    },
    /// List collection platforms.
    Platforms {
        /// Include platforms whose credentials are missing.
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_app_config()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let pool = connect_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    let problems: Arc<dyn ProblemStore> = Arc::new(SqliteProblemStore::new(pool.clone()));
    let answers: Arc<dyn AnswerStore> = Arc::new(SqliteAnswerStore::new(pool));
    let mut service = CollectionService::new(&config, problems, answers)?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Collect {
            topic,
            max_results,
            platform,
            auto_save,
            no_answers,
            max_answers,
            min_answer_upvotes,
        } => {
            let mut request = CollectRequest::new(topic);
            request.max_results = max_results;
            request.platform = platform;
            request.auto_save = auto_save;
            request.collect_answers = !no_answers;
            request.max_answers_per_question = max_answers;
            request.min_answer_upvotes = min_answer_upvotes;

            let outcome = service.collect_questions(request).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Platforms { all } => {
            let platforms = if all {
                service.all_platforms()
            } else {
                service.available_platforms()
            };
            for platform in platforms {
                println!("{platform}");
            }
        }
    }

    Ok(())
}
