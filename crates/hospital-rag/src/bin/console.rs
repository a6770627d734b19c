//! Console entry point
//!
//! Run with: cargo run -p hospital-rag -- --config config/default.toml console

use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hospital_rag::{corpus, HospitalConfig, HospitalQa, QueryResult};

#[derive(Parser)]
#[command(name = "hospital-rag", about = "Hospital customer-support question answering")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Clean the raw corpus files and write the processed corpus
    Prepare,
    /// Build (or refresh) the vector index from the processed corpus
    Index,
    /// Answer a single question
    Ask {
        question: String,
        /// Skip retrieval and answer from the model alone
        #[arg(long)]
        direct: bool,
    },
    /// Interactive question loop
    Console,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hospital_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = HospitalConfig::load(&cli.config)?;

    match cli.command {
        Command::Prepare => prepare(&config),
        Command::Index => {
            let qa = HospitalQa::new(config)?;
            qa.initialize().await?;
            if let Some(count) = qa.chunk_count() {
                tracing::info!("index ready with {} chunks", count);
            }
            Ok(())
        }
        Command::Ask { question, direct } => {
            let qa = HospitalQa::new(config)?;
            let result = if direct {
                qa.query_direct(&question).await
            } else {
                qa.query(&question).await
            };
            print_result(&result);
            Ok(())
        }
        Command::Console => console(config).await,
    }
}

/// Load both raw corpora, log their quality, and persist the cleaned units.
fn prepare(config: &HospitalConfig) -> anyhow::Result<()> {
    let (train, validation) = corpus::load(&config.data.train_path, &config.data.validation_path)?;

    let report = corpus::quality_report(&train);
    tracing::info!(
        "train corpus: {} rows, {} missing questions, {} missing answers, {} duplicate questions",
        report.total_rows,
        report.missing_questions,
        report.missing_answers,
        report.duplicate_questions
    );
    tracing::info!(
        "mean lengths: question {:.1} chars, answer {:.1} chars ({} distinct questions)",
        report.mean_question_length,
        report.mean_answer_length,
        report.distinct_questions
    );

    let train_units = corpus::build_units(&train);
    corpus::save_units(&train_units, &config.data.corpus_path)?;

    let validation_units = corpus::build_units(&validation);
    corpus::save_units(&validation_units, &config.data.validation_corpus_path)?;

    tracing::info!(
        "prepared {} train units and {} validation units",
        train_units.len(),
        validation_units.len()
    );
    Ok(())
}

async fn console(config: HospitalConfig) -> anyhow::Result<()> {
    let qa = HospitalQa::new(config)?;
    qa.initialize().await?;

    println!("병원 고객 질의응답 시스템입니다. 질문을 입력하세요. (종료: exit)");
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "질문> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question == "exit" || question == "quit" {
            break;
        }

        let result = qa.query(question).await;
        print_result(&result);
    }

    Ok(())
}

fn print_result(result: &QueryResult) {
    println!("\n답변: {}", result.answer);
    println!("신뢰도: {:.0}%", result.confidence * 100.0);
    if !result.sources.is_empty() {
        println!("참고 사례:");
        for (position, source) in result.sources.iter().enumerate().take(3) {
            let question = source
                .chunk
                .metadata
                .get("question")
                .map(String::as_str)
                .unwrap_or("-");
            println!("  {}. ({:.2}) {}", position + 1, source.score, question);
        }
    }
    println!();
}
