//! Asks for a query on the terminal and prints the refined prompt.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::process::ExitCode;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use prompt_refiner::core::{Error, RefinementEvent};
use prompt_refiner::{Config, FailureNotice, PipelineBuilder, StatusLine};
use prompt_refiner_openai_model::OpenAIProvider;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err.bright_red());
            return ExitCode::FAILURE;
        }
    };
    debug!("loaded {config:?}");

    print!("Please enter your prompt generation query: ");
    std::io::stdout().flush().ok();
    let Some(query) = read_line().await else {
        // Input closed before a query was entered.
        println!("{}", FailureNotice(&Error::EmptyQuery));
        return ExitCode::FAILURE;
    };

    println!("\nStarting prompt generation process...");
    println!("This may take a few moments...\n");

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let model_provider = OpenAIProvider::new(config.to_openai_config());
    let pipeline = PipelineBuilder::with_model_provider(model_provider)
        .on_event(move |event| {
            event_tx.send(event.clone()).ok();
        })
        .build();

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(progress_style);
    progress_bar.set_message("🤔 Thinking...");

    let run = pipeline.run(query.trim());
    tokio::pin!(run);
    let result = loop {
        select! {
            result = &mut run => break result,
            Some(event) = event_rx.recv() => {
                progress_bar.suspend(|| print_event(&event));
            }
            _ = sleep(Duration::from_millis(100)) => {
                progress_bar.inc(1);
            }
        }
    };

    // Finish the progress bar before printing anything else.
    progress_bar.finish_and_clear();
    while let Ok(event) = event_rx.try_recv() {
        print_event(&event);
    }

    match result {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("refinement failed: {err}");
            println!("{}", FailureNotice(&err));
            ExitCode::FAILURE
        }
    }
}

fn print_event(event: &RefinementEvent) {
    let line = StatusLine(event);
    if line.is_warning() {
        println!("{}{}", BAR_CHAR.bright_yellow(), line.bright_yellow());
    } else {
        println!("{}{}", BAR_CHAR.bright_cyan(), line.bright_white());
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
