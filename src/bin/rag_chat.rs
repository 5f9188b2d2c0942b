//! rag-chat: RAG 问答服务的命令行客户端
//!
//! Usage:
//!   rag-chat chat [--config <path>]            Interactive session with streamed answers
//!   rag-chat ask <question> [--config <path>]  Ask one question and print the answer
//!   rag-chat status [--config <path>]          Show backend health

use anyhow::Context;
use rag_chat_client::{
    CancelHandle, CancelReason, ClientConfig, Error, Message, QueryResponse, RagClient, RagClientBuilder,
};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const GREETING: &str = "Hello! I'm your Civic Nexus assistant. Ask me anything about your documents.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    match args[1].as_str() {
        "chat" => cmd_chat(&args[2..]).await,
        "ask" => cmd_ask(&args[2..]).await,
        "status" => cmd_status(&args[2..]).await,
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!(
        r#"rag-chat: RAG 问答服务命令行工具

USAGE:
    rag-chat <COMMAND> [OPTIONS]

COMMANDS:
    chat                        Start an interactive session
    ask <question>              Ask a single question
    status                      Show backend status
    version                     Show version information
    help                        Show this help message

OPTIONS:
    --config <path>             Load client settings from a YAML file

ENVIRONMENT:
    RAG_API_BASE_URL            Service base URL (default http://127.0.0.1:8000)
    RAG_TIMEOUT_MS              Per-attempt request timeout
    RAG_MAX_RETRIES             Retries for transient failures
    RAG_API_TOKEN               Bearer token sent with every request
    RUST_LOG                    Log filter (default warn)"#
    );
}

fn cmd_version() {
    println!(
        "rag-chat {} (rag-chat-client {})",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_VERSION"),
    );
}

/// Split `--config <path>` out of the arguments; the rest are positional.
fn parse_args(args: &[String]) -> (Option<String>, Vec<String>) {
    let mut config = None;
    let mut rest = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            config = iter.next().cloned();
        } else {
            rest.push(arg.clone());
        }
    }
    (config, rest)
}

fn build_client(config_path: Option<&str>) -> anyhow::Result<RagClient> {
    let config = match config_path {
        Some(path) => ClientConfig::from_yaml_file(path)
            .with_context(|| format!("loading config from {path}"))?,
        None => ClientConfig::from_env(),
    };
    Ok(RagClientBuilder::new().config(config).build()?)
}

async fn cmd_ask(args: &[String]) -> anyhow::Result<()> {
    let (config_path, rest) = parse_args(args);
    let question = rest.join(" ");
    if question.trim().is_empty() {
        eprintln!("Usage: rag-chat ask <question>");
        std::process::exit(1);
    }

    let client = build_client(config_path.as_deref())?;
    match client.query(&[Message::user(question)]).await {
        Ok(response) => {
            print_response(&response);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    }
}

fn print_response(response: &QueryResponse) {
    println!("{}", response.answer);
    if let Some(sources) = response.sources.as_ref().filter(|s| !s.is_empty()) {
        println!();
        println!("Sources:");
        for (i, source) in sources.iter().enumerate() {
            println!("  {}. {}", i + 1, source.filename);
        }
    }
    if let Some(secs) = response.processing_time {
        println!();
        println!("Processing time: {secs:.2}s");
    }
}

async fn cmd_status(args: &[String]) -> anyhow::Result<()> {
    let (config_path, _) = parse_args(args);
    let client = build_client(config_path.as_deref())?;
    match client.status().await {
        Ok(status) => {
            let mark = |ok: bool| if ok { "✓" } else { "✗" };
            println!("Service:       {}", client.config().base_url);
            println!("Status:        {}", status.status);
            println!("Documents:     {}", status.documents_ingested);
            println!("Vector store:  {}", mark(status.vector_store_ready));
            println!("Model backend: {}", mark(status.ollama_available));
            if !status.is_healthy() {
                std::process::exit(2);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    }
}

async fn cmd_chat(args: &[String]) -> anyhow::Result<()> {
    let (config_path, _) = parse_args(args);
    let client = build_client(config_path.as_deref())?;

    println!("{GREETING}");
    println!("(type 'clear' to reset the conversation, 'quit' to leave)");

    let mut transcript = vec![Message::assistant(GREETING).system_greeting()];
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        match input {
            "" => continue,
            "quit" | "exit" | "q" => break,
            "clear" => {
                transcript.truncate(1);
                println!("Conversation cleared.");
                continue;
            }
            _ => {}
        }

        transcript.push(Message::user(input));

        // Ctrl-C abandons the current answer without leaving the session.
        let cancel = CancelHandle::new();
        let interrupt = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };

        let result = client
            .chat()
            .messages(transcript.clone())
            .cancel_handle(cancel)
            .execute_stream_with(|fragment| {
                print!("{fragment}");
                std::io::stdout().flush()?;
                Ok(())
            })
            .await;
        interrupt.abort();
        println!();

        match result {
            Ok(answer) => transcript.push(Message::assistant(answer)),
            Err(Error::Cancelled {
                reason: CancelReason::Caller,
            }) => println!("[interrupted]"),
            Err(e) => {
                let text = e.user_message();
                eprintln!("{text}");
                transcript.push(Message::assistant(text).error());
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}
