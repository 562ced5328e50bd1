mod client;
mod session;

use clap::Parser;
use client::{BackendClient, ClientError};
use session::{Phase, Role, Session};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-qa-chat", version)]
struct Cli {
    /// Base URL of the pdf-qa-server instance.
    #[arg(long, env = "PDF_QA_API_URL", default_value = "http://localhost:8000")]
    api_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let backend = BackendClient::new(&cli.api_url)?;
    let mut session = Session::new();
    let mut selected_path: Option<PathBuf> = None;

    println!("Chat with your PDF ({})", cli.api_url);
    println!("Commands: /open <path>  /process  /quit");
    println!();

    let stdin = io::stdin();
    loop {
        prompt(&session);
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(path) = line.strip_prefix("/open ") {
            let path = PathBuf::from(path.trim());
            match path
                .file_name()
                .and_then(|name| name.to_str())
                .map(str::to_owned)
            {
                Some(filename) => {
                    session.select_file(filename.as_str());
                    selected_path = Some(path);
                    println!("Selected `{filename}`. Run /process to ingest it.");
                }
                None => println!("That path has no filename."),
            }
            continue;
        }

        match line {
            "/quit" | "/exit" => break,
            "/process" => {
                let Some(path) = selected_path.clone() else {
                    println!("Select a file first with /open <path>.");
                    continue;
                };
                if !session.begin_processing() {
                    println!("Nothing to process in the current state.");
                    continue;
                }

                println!("Processing {} ...", path.display());
                let outcome = backend
                    .upload(&path)
                    .await
                    .map(|receipt| {
                        println!("Processed `{}`. Ask away!", receipt.filename);
                    })
                    .map_err(|error| error.to_string());

                if let Err(message) = &outcome {
                    println!("Processing failed: {message}");
                    println!("Fix the file or try /process again.");
                }
                session.finish_processing(outcome);
            }
            question => {
                if session.phase() != Phase::Ready {
                    println!("Upload and process a PDF before asking questions.");
                    continue;
                }
                if !session.push_question(question) {
                    continue;
                }

                let reply = match backend.query(question).await {
                    Ok(answer) => answer,
                    Err(ClientError::NotReady(message)) => {
                        format!("Processing not complete, please wait or re-upload. ({message})")
                    }
                    Err(error) => {
                        format!("Sorry, an error occurred while fetching the answer. ({error})")
                    }
                };

                session.push_reply(&reply);
                print_last_exchange(&session);
            }
        }
    }

    Ok(())
}

fn prompt(session: &Session) {
    let marker = match session.phase() {
        Phase::NoFile => "no file".to_string(),
        Phase::Selected => format!("{} (unprocessed)", session.file().unwrap_or("?")),
        Phase::Processing => "processing".to_string(),
        Phase::Ready => session.file().unwrap_or("?").to_string(),
    };
    print!("[{marker}] > ");
    let _ = io::stdout().flush();
}

fn print_last_exchange(session: &Session) {
    for turn in session.transcript().iter().rev().take(1) {
        if turn.role == Role::Assistant {
            println!("assistant: {}", turn.text);
        }
    }
}
