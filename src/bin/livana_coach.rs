//! livana-coach: talk to a running chat proxy from the terminal.
//!
//! Usage:
//!   livana-coach chat                 Interactive coach conversation
//!   livana-coach ask <text>           One coach question, streamed
//!   livana-coach analyze <meal>       Structured meal analysis

use anyhow::Context;
use clap::{Parser, Subcommand};
use livana_chat::client::{ChatClient, CoachSession};
use livana_chat::structured::AnalysisResult;
use std::io::{BufRead, Write};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "livana-coach", version, about = "Livana nutrition coach client")]
struct Args {
    /// Proxy `/chat` endpoint.
    #[arg(long, env = "LIVANA_CHAT_URL", default_value = "http://127.0.0.1:8787/chat")]
    endpoint: String,

    /// Bearer token sent to the endpoint.
    #[arg(long, env = "LIVANA_CHAT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive conversation; an empty line or EOF quits.
    Chat,
    /// Ask a single question.
    Ask {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Analyze a meal description.
    Analyze {
        #[arg(required = true, num_args = 1..)]
        meal: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("livana_chat=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut builder = ChatClient::builder(&args.endpoint);
    if let Some(token) = &args.token {
        builder = builder.token(token);
    }
    let client = builder.build().context("building chat client")?;

    match args.command {
        Command::Chat => chat(client).await,
        Command::Ask { text } => {
            let mut session = CoachSession::new(client);
            ask(&mut session, &text.join(" ")).await
        }
        Command::Analyze { meal } => {
            let result = client.analyze_meal(&meal.join(" ")).await?;
            print_analysis(&result);
            Ok(())
        }
    }
}

async fn chat(client: ChatClient) -> anyhow::Result<()> {
    let mut session = CoachSession::new(client);
    if let Some(greeting) = session.transcript().last() {
        println!("{}\n", greeting.content);
    }

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 || line.trim().is_empty() {
            return Ok(());
        }
        if let Err(e) = ask(&mut session, line.trim_end()).await {
            eprintln!("error: {e:#}");
        }
    }
}

async fn ask(session: &mut CoachSession, text: &str) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    session
        .send(text, |delta| {
            let _ = write!(stdout, "{delta}");
            let _ = stdout.flush();
        })
        .await?;
    println!("\n");
    Ok(())
}

fn print_analysis(result: &AnalysisResult) {
    println!("{} ({:.0} kcal, score {:.0}/100)", result.name, result.calories, result.score);
    let m = &result.macros;
    println!(
        "protein {:.0} g | carbs {:.0} g | fat {:.0} g | fiber {:.0} g",
        m.protein, m.carbs, m.fat, m.fiber
    );
    if !result.insights.is_empty() {
        println!("\nInsights:");
        for insight in &result.insights {
            println!("  - {insight}");
        }
    }
    if !result.suggestions.is_empty() {
        println!("\nSuggestions:");
        for suggestion in &result.suggestions {
            println!("  - {suggestion}");
        }
    }
}
