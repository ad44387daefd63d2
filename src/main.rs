use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use logsai::chat::OpenAiChatClient;
use logsai::config::{self, State};
use logsai::embedding::OpenAiEmbeddingClient;
use logsai::error::LogsaiError;
use logsai::openai::OpenAiEndpoint;
use logsai::router::{format_issue_report, rank_issues, QueryRouter};
use logsai::session::Session;
use logsai::upload::{read_document, split_lines};
use logsai::vector_entry::LogLine;

type OpenAiRouter = QueryRouter<OpenAiEmbeddingClient, OpenAiChatClient>;

#[derive(Parser)]
#[command(name = "logsai")]
#[command(version = "0.1")]
#[command(about = "Ask questions about a log file", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective configuration
    Config,
    /// Rank the most frequent lines without calling any remote service
    Top {
        file: PathBuf,
        #[arg(short, default_value_t = 5)]
        n: usize,
    },
    /// Print the lines nearest to a query as JSON
    Search {
        file: PathBuf,
        query: String,
        #[arg(short, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
        k: Option<usize>,
    },
    /// Answer one or more queries about a file
    Ask {
        file: PathBuf,
        #[arg(required = true)]
        queries: Vec<String>,
        /// Print the query history as JSON
        #[arg(long)]
        json: bool,
    },
    /// Answer queries read from stdin, one per line
    Repl { file: PathBuf },
}

fn load_text(path: &Path, state: &State) -> Result<String> {
    read_document(path, state.max_upload_bytes)
        .with_context(|| format!("Failed to load '{}'", path.display()))
}

fn build_router(state: &State) -> Result<OpenAiRouter> {
    let endpoint = OpenAiEndpoint::from_state(state)?;
    let embedder = OpenAiEmbeddingClient::from_state(endpoint.clone(), state);
    let chat = OpenAiChatClient::from_state(endpoint, state);
    Ok(QueryRouter::new(embedder, chat).with_top_k(state.top_k))
}

fn open_session(path: &Path, state: &State, router: &OpenAiRouter) -> Result<Session> {
    let text = load_text(path, state)?;
    let mut session = Session::new(state.dimensions);
    let lines = router
        .ingest(&mut session, &text)
        .context("Failed to index the uploaded file")?;
    tracing::info!(lines, indexed = session.index().len(), "file ready");
    Ok(session)
}

fn top_command(state: &State, file: &Path, n: usize) -> Result<()> {
    let text = load_text(file, state)?;
    let logs: Vec<LogLine> = split_lines(&text)
        .into_iter()
        .enumerate()
        .map(|(index, content)| LogLine { index, content })
        .collect();
    println!("{}", format_issue_report(n, &rank_issues(&logs, n)));
    Ok(())
}

fn search_command(state: &State, file: &Path, query: &str, k: Option<usize>) -> Result<()> {
    let router = build_router(state)?.with_top_k(k.unwrap_or(state.top_k));
    let mut session = open_session(file, state, &router)?;
    let results = router.retrieve(&mut session, query)?;

    let output = serde_json::json!({
        "query": query,
        "index_record_count": session.index().len(),
        "results": &results,
        "actual_results_count": results.len(),
        "requested_results_count": k.unwrap_or(state.top_k),
    });
    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

fn ask_command(state: &State, file: &Path, queries: &[String], json: bool) -> Result<()> {
    let router = build_router(state)?;
    let mut session = open_session(file, state, &router)?;

    for query in queries.iter().filter(|q| !q.trim().is_empty()) {
        let answer = router
            .route(&mut session, query)
            .with_context(|| format!("Failed to answer '{query}'"))?;
        if !json {
            println!("Q: {query}\nA: {answer}\n");
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(session.history())?);
    }
    Ok(())
}

fn repl_command(state: &State, file: &Path) -> Result<()> {
    let router = build_router(state)?;
    let mut session = open_session(file, state, &router)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    print!("query> ");
    stdout.flush()?;

    for line in stdin.lock().lines() {
        let query = line?;
        let query = query.trim();
        if !query.is_empty() {
            match router.route(&mut session, query) {
                Ok(answer) => println!("{answer}\n"),
                Err(err @ LogsaiError::RemoteService { .. }) => {
                    eprintln!("Could not process the query: {err}");
                }
                Err(err) => return Err(err.into()),
            }
        }
        print!("query> ");
        stdout.flush()?;
    }

    if !session.history().is_empty() {
        println!("\n### History");
        for record in session.history() {
            println!("Q: {}\nA: {}\n", record.query, record.response);
        }
    }
    Ok(())
}

fn config_command(state: &State) -> Result<()> {
    state.print_config();
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let state = State::new()?;
    config::init_logging(state.verbose);

    match args.command {
        Commands::Config => config_command(&state)?,
        Commands::Top { file, n } => top_command(&state, &file, n)?,
        Commands::Search { file, query, k } => search_command(&state, &file, &query, k)?,
        Commands::Ask {
            file,
            queries,
            json,
        } => ask_command(&state, &file, &queries, json)?,
        Commands::Repl { file } => repl_command(&state, &file)?,
    }
    Ok(())
}
