use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use pdf_chat_core::{
    discover_pdf_files, read_pdf_payloads, ChatSession, ChunkingConfig, OpenAiClient,
    OpenAiConfig, SessionOptions,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use url::Url;

#[derive(Parser)]
#[command(name = "pdf-chat", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// OpenAI-compatible API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/")]
    base_url: String,

    /// Embedding model name
    #[arg(long, default_value = "text-embedding-3-small")]
    embedding_model: String,

    /// Chat model name
    #[arg(long, default_value = "gpt-4o-mini")]
    chat_model: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Chunk size in characters
    #[arg(long, default_value = "1000")]
    chunk_size: usize,

    /// Chunk overlap in characters
    #[arg(long, default_value = "200")]
    chunk_overlap: usize,

    /// How many chunks ground each answer
    #[arg(long, default_value = "4")]
    top_k: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Process PDFs and answer questions interactively.
    Chat {
        /// PDF files to process, in upload order. Repeatable.
        #[arg(long = "pdf")]
        pdfs: Vec<PathBuf>,
        /// Folder scanned recursively for PDFs.
        #[arg(long)]
        folder: Option<PathBuf>,
    },
    /// Print a short summary of the processed PDFs.
    Summarize {
        #[arg(long = "pdf")]
        pdfs: Vec<PathBuf>,
        #[arg(long)]
        folder: Option<PathBuf>,
    },
    /// Print example questions a reader might ask about the PDFs.
    Questions {
        #[arg(long = "pdf")]
        pdfs: Vec<PathBuf>,
        #[arg(long)]
        folder: Option<PathBuf>,
        /// How many questions to generate.
        #[arg(long, default_value = "5")]
        count: usize,
    },
}

fn collect_payloads(pdfs: &[PathBuf], folder: &Option<PathBuf>) -> anyhow::Result<Vec<Vec<u8>>> {
    let mut paths = pdfs.to_vec();
    if let Some(folder) = folder {
        paths.extend(discover_pdf_files(folder));
    }
    anyhow::ensure!(
        !paths.is_empty(),
        "no PDFs given; pass --pdf <file> or --folder <dir>"
    );
    let payloads = read_pdf_payloads(&paths).context("reading pdf files")?;
    Ok(payloads)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut provider_config = OpenAiConfig::new(cli.api_key.clone())?;
    provider_config.base_url = Url::parse(&cli.base_url).context("parsing --base-url")?;
    provider_config.embedding_model = cli.embedding_model.clone();
    provider_config.chat_model = cli.chat_model.clone();
    provider_config.timeout = Duration::from_secs(cli.timeout_secs);

    let client = OpenAiClient::new(provider_config)?;
    let chunking = ChunkingConfig {
        chunk_size: cli.chunk_size,
        chunk_overlap: cli.chunk_overlap,
        separator: "\n".to_string(),
    };
    let options = SessionOptions {
        retrieval_width: cli.top_k,
        ..SessionOptions::default()
    };
    let mut session = ChatSession::with_options(client.clone(), client, chunking, options);

    info!(started_at = %Utc::now().to_rfc3339(), "pdf-chat boot");

    match cli.command {
        Command::Chat { pdfs, folder } => {
            let payloads = collect_payloads(&pdfs, &folder)?;
            let started = Instant::now();
            let indexed = session.process_documents(&payloads).await?;
            info!(
                documents = payloads.len(),
                chunks = indexed,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "documents processed"
            );
            println!("{indexed} chunks indexed from {} document(s)", payloads.len());

            let stdin = std::io::stdin();
            loop {
                print!("? ");
                std::io::stdout().flush()?;

                let mut question = String::new();
                if stdin.lock().read_line(&mut question)? == 0 {
                    break;
                }
                let question = question.trim();
                if question.is_empty() || question == "exit" {
                    break;
                }

                let started = Instant::now();
                match session.ask(question).await {
                    Ok(answer) => {
                        info!(
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "answer generated"
                        );
                        println!("{answer}\n");
                    }
                    Err(error) => eprintln!("error: {error}"),
                }
            }
        }
        Command::Summarize { pdfs, folder } => {
            let payloads = collect_payloads(&pdfs, &folder)?;
            session.process_documents(&payloads).await?;
            let summary = session.summarize().await?;
            println!("{summary}");
        }
        Command::Questions {
            pdfs,
            folder,
            count,
        } => {
            let payloads = collect_payloads(&pdfs, &folder)?;
            session.process_documents(&payloads).await?;
            for question in session.suggest_questions(count).await? {
                println!("{question}");
            }
        }
    }

    Ok(())
}
