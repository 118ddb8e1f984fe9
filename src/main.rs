use anyhow::Result;
use clap::{Parser, Subcommand};
use inventory_insight::agent::{sample_questions, AnswerRecord, InsightAgent};
use inventory_insight::catalog::SchemaCatalog;
use inventory_insight::config::{AssistantConfig, StatementPolicy};
use inventory_insight::execution::{RelationalStore, SqliteStore};
use inventory_insight::llm::{LanguageModel, LlmClient, UnavailableModel};
use inventory_insight::snapshot::BusinessSnapshot;
use inventory_insight::synthesizer::PatternSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "inventory-insight")]
#[command(about = "Ask business questions about the inventory & sales database")]
struct Args {
    /// SQLite database file (or set INSIGHT_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// LLM API key (or set GROQ_API_KEY / OPENAI_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Model name (or set INSIGHT_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    /// JSON file with fast-path question patterns (or set INSIGHT_PATTERNS_FILE)
    #[arg(long, global = true)]
    patterns: Option<PathBuf>,

    /// Allow statements that modify the database
    #[arg(long, global = true)]
    allow_writes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one question
    Ask {
        question: String,

        /// Print the full answer record as JSON
        #[arg(long)]
        json: bool,
    },
    /// List sample questions
    Samples,
    /// Run a few sample questions end to end
    Demo,
    /// Print headline business KPIs
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;

    match args.command {
        Commands::Samples => {
            for (i, question) in sample_questions().iter().enumerate() {
                println!("{:>2}. {}", i + 1, question);
            }
            Ok(())
        }
        Commands::Ask { question, json } => {
            let agent = build_agent(&config)?;
            let record = agent.answer_question(&question).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print_record(&record);
            }
            Ok(())
        }
        Commands::Demo => run_demo(&config).await,
        Commands::Stats => {
            let agent = build_agent(&config)?;
            let snapshot = BusinessSnapshot::collect(agent.executor())
                .await
                .map_err(|e| anyhow::anyhow!("Failed to collect stats: {}", e))?;
            println!("Active products : {}", snapshot.total_products);
            println!("Customers       : {}", snapshot.total_customers);
            println!("Orders          : {}", snapshot.total_orders);
            println!("Revenue         : {:.2}", snapshot.total_revenue);
            println!("Pending orders  : {}", snapshot.pending_orders);
            println!("Low-stock items : {}", snapshot.low_stock_items);
            Ok(())
        }
    }
}

fn build_config(args: &Args) -> Result<AssistantConfig> {
    let mut config = AssistantConfig::from_env()?;
    if let Some(ref db) = args.db {
        config.db_path = db.clone();
    }
    if let Some(ref key) = args.api_key {
        config.api_key = Some(key.clone());
    }
    if let Some(ref model) = args.model {
        config.model = model.clone();
    }
    if let Some(ref patterns) = args.patterns {
        config.patterns_file = Some(patterns.clone());
    }
    if args.allow_writes {
        config.statement_policy = StatementPolicy::AllowWrites;
    }
    Ok(config)
}

fn build_agent(config: &AssistantConfig) -> Result<InsightAgent> {
    let model: Arc<dyn LanguageModel> = match LlmClient::from_config(config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!("{} - only fast-path questions can be answered", e);
            Arc::new(UnavailableModel::new(e.to_string()))
        }
    };

    let patterns = match config.patterns_file {
        Some(ref path) => PatternSet::load(path)
            .map_err(|e| anyhow::anyhow!("Failed to load patterns from {:?}: {}", path, e))?,
        None => PatternSet::default(),
    };

    if config.statement_policy == StatementPolicy::AllowWrites {
        warn!("Write statements are enabled for {:?}", config.db_path);
    }
    info!("Using database {:?} with model {}", config.db_path, model.name());

    let store: Arc<dyn RelationalStore> = Arc::new(SqliteStore::new(config.db_path.clone()));
    Ok(InsightAgent::new(
        config,
        model,
        store,
        Arc::new(SchemaCatalog::inventory_sales()),
        Arc::new(patterns),
    ))
}

async fn run_demo(config: &AssistantConfig) -> Result<()> {
    println!("Testing Business AI Agent");
    println!("{}", "=".repeat(50));

    let agent = build_agent(config)?;
    let questions = [
        "What are our top 5 products by total sales revenue?",
        "How many orders do we have in each status?",
        "Which warehouse has the most inventory?",
    ];

    for (i, question) in questions.iter().enumerate() {
        println!("\nTest {}: {}", i + 1, question);
        println!("{}", "-".repeat(40));

        let record = agent.answer_question(question).await;
        if record.success {
            println!("Query executed successfully!");
            println!("Found {} records", record.record_count);
            println!("Analysis: {}...", record.narrative.chars().take(200).collect::<String>());
        } else {
            println!(
                "Query failed: {}",
                record.error_detail.as_deref().unwrap_or("unknown error")
            );
        }
    }
    Ok(())
}

fn print_record(record: &AnswerRecord) {
    println!("\nQuestion: {}", record.question);
    if let Some(ref sql) = record.synthesized_query {
        println!("\nSQL:\n{}", sql);
    }
    if record.success {
        let results = &record.result_set;
        println!("\nResults ({} records):", record.record_count);
        for (i, row) in results.rows.iter().take(20).enumerate() {
            println!("{:>3}. {}", i + 1, results.render_row(row));
        }
        if results.len() > 20 {
            println!("     ... {} more", results.len() - 20);
        }
    }
    println!("\n{}", record.narrative);
}
