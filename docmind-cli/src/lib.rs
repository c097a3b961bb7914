//! Command-line driver for the DocuMind retrieval core.
//!
//! Reads documents from disk, chunks them into an in-memory store and answers
//! questions with ranked passages and a prompt-ready context block.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use docmind_rag::{
    Chunker, Document, InMemoryChunkStore, ParagraphChunker, RagConfig, RagError, RagPipeline,
    Retrieval, RetrievalRequest, SourceFormat, extract_text, extraction_placeholder,
};
use tracing::{debug, info, warn};

/// Chunk documents and retrieve passages relevant to a question.
#[derive(Debug, Parser)]
#[command(name = "docmind", version, about)]
pub struct Cli {
    /// JSON file with retrieval settings; missing fields use the defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Split a document into chunks and print them
    Chunk {
        /// Document to chunk (.txt, .md; other formats get placeholder text)
        file: PathBuf,

        /// Print the chunks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Retrieve the passages most relevant to a question
    Query {
        /// The question to answer
        question: String,

        /// Document to search; repeat for several documents
        #[arg(long = "doc", required = true)]
        docs: Vec<PathBuf>,

        /// Only search documents with this file name; repeatable
        #[arg(long)]
        only: Vec<String>,

        /// Number of passages to return
        #[arg(long, allow_negative_numbers = true)]
        top_k: Option<i64>,

        /// Print the retrieval as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// The log filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "docmind_cli=debug,docmind_rag=debug"
        } else {
            "docmind_cli=info,docmind_rag=info"
        }
    }
}

/// Load the configuration file if one was given.
pub fn load_config(path: Option<&Path>) -> Result<RagConfig> {
    match path {
        Some(path) => RagConfig::load(path)
            .with_context(|| format!("invalid configuration in {}", path.display())),
        None => Ok(RagConfig::default()),
    }
}

/// Read a file into a [`Document`]. Files whose extension is not accepted are
/// rejected. Accepted formats that cannot be decoded here are kept with
/// placeholder text so they still appear in the store.
pub async fn load_document(path: &Path) -> Result<Document> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = SourceFormat::from_path(path).mime_type();
    debug!(file = %path.display(), mime_type, "loading document");

    let text = match extract_text(path).await {
        Ok(text) => text,
        Err(RagError::UnsupportedFormat { extension }) => {
            warn!(file = %path.display(), %extension, "cannot extract text, storing placeholder");
            extraction_placeholder(&name)
        }
        Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
    };

    Ok(Document::new(path.display().to_string(), name, text))
}

/// Execute a parsed command, writing results to stdout.
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Chunk { file, json } => {
            let document = load_document(&file).await?;
            let chunks = ParagraphChunker::from_config(&config).chunk(&document);
            info!(file = %file.display(), chunk_count = chunks.len(), "chunked document");

            if json {
                println!("{}", serde_json::to_string_pretty(&chunks)?);
            } else {
                for chunk in &chunks {
                    let words = chunk.content.split_whitespace().count();
                    println!("[{}] {words} words\n{}\n", chunk.chunk_index, chunk.content);
                }
            }
        }
        Command::Query { question, docs, only, top_k, json } => {
            let retrieval = query(config, &question, &docs, &only, top_k).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&retrieval)?);
            } else {
                println!("{}", render(&retrieval));
            }
        }
    }

    Ok(())
}

/// Ingest `docs` into a fresh in-memory store and answer `question`.
pub async fn query(
    config: RagConfig,
    question: &str,
    docs: &[PathBuf],
    only: &[String],
    top_k: Option<i64>,
) -> Result<Retrieval> {
    let pipeline = RagPipeline::builder()
        .config(config)
        .chunk_store(Arc::new(InMemoryChunkStore::new()))
        .build()?;

    let mut documents = Vec::with_capacity(docs.len());
    for path in docs {
        documents.push(load_document(path).await?);
    }
    pipeline.ingest_batch(&documents).await?;

    let mut document_ids = Vec::new();
    for name in only {
        let matching: Vec<String> =
            documents.iter().filter(|d| &d.name == name).map(|d| d.id.clone()).collect();
        if matching.is_empty() {
            bail!("--only {name}: no document with that file name was given");
        }
        document_ids.extend(matching);
    }

    let request = RetrievalRequest { query: question.to_string(), document_ids, top_k };
    Ok(pipeline.query(&request).await?)
}

/// Human-readable rendering of a retrieval.
pub fn render(retrieval: &Retrieval) -> String {
    let mut out = retrieval.context.clone();
    if !retrieval.sources.is_empty() {
        out.push_str("\n\nSources:");
        for (scored, rank) in retrieval.chunks.iter().zip(1..) {
            out.push_str(&format!(
                "\n  {rank}. {} #{} (score {:.3})",
                scored.chunk.document_name, scored.chunk.chunk_index, scored.score
            ));
        }
    }
    out
}
