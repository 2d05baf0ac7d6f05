use anyhow::Result;
use clap::{Parser, Subcommand};
use linkedin_post_generator::app::App;
use linkedin_post_generator::console;
use linkedin_post_generator::models::Config;
use linkedin_post_generator::output::save_post;
use linkedin_post_generator::share::share_post;
use linkedin_post_generator::workflow::{CycleOutcome, SuggestOutcome};
use std::io::Write;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "linkedin-post-generator")]
#[command(about = "Generate LinkedIn posts with an illustration using generative AI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print one suggested post topic.
    Suggest,
    /// Run one generation cycle and print the result.
    Generate {
        /// Topic to write about. Defaults to DEFAULT_TOPIC.
        #[arg(long)]
        topic: Option<String>,
        /// Ask the model for a topic first.
        #[arg(long, conflicts_with = "topic")]
        suggest: bool,
        /// Save the post under OUTPUT_DIR.
        #[arg(long)]
        save: bool,
        /// Copy the post and open LinkedIn.
        #[arg(long)]
        share: bool,
        /// Print the session snapshot as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Interactive terminal session (default).
    Interactive,
}

struct GenerateArgs {
    topic: Option<String>,
    suggest: bool,
    save: bool,
    share: bool,
    json: bool,
}

/// Ask for a topic; failures are reported on stderr.
async fn suggest_topic(app: &App) -> Option<String> {
    match app.workflow.suggest().await {
        SuggestOutcome::Suggested(topic) => Some(topic),
        _ => {
            if let Some(err) = app.workflow.error() {
                eprintln!("{}", err.user_message);
            }
            None
        }
    }
}

async fn run_suggest(app: &App, out: &mut impl Write) -> Result<bool> {
    match suggest_topic(app).await {
        Some(topic) => {
            writeln!(out, "{}", topic)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Stdout only ever carries the post or the JSON snapshot.
async fn run_generate(app: &App, args: GenerateArgs, out: &mut impl Write) -> Result<bool> {
    if let Some(topic) = args.topic {
        app.workflow.set_topic(topic);
    }
    if args.suggest {
        match suggest_topic(app).await {
            Some(topic) => eprintln!("Topic: {}", topic),
            None => return Ok(false),
        }
    }

    let outcome = app.workflow.generate().await;
    let session = app.workflow.snapshot();

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&session)?)?;
    } else {
        if !session.post.text.is_empty() {
            writeln!(out, "{}", console::format_post(&session.post))?;
        }
        match outcome {
            CycleOutcome::Rejected(rejection) => {
                eprintln!("{}", console::rejection_message(rejection))
            }
            _ => {
                if let Some(err) = &session.error {
                    eprintln!("{}", err.user_message);
                }
            }
        }
    }

    if args.save && !session.post.text.is_empty() {
        let saved = save_post(&session.post, &app.output_dir)?;
        info!("Post saved to {}", saved.dir.display());
    }

    if args.share && session.post.is_shareable() {
        let status = share_post(
            &session.post.text,
            app.clipboard.as_ref(),
            app.opener.as_ref(),
            &app.share_url,
        )
        .await;
        eprintln!("{}", status.message());
    }

    Ok(outcome == CycleOutcome::Done)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "linkedin_post_generator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let app = match Config::from_env().and_then(|config| App::new(&config)) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    let succeeded = match cli.command.unwrap_or(Commands::Interactive) {
        Commands::Suggest => run_suggest(&app, &mut std::io::stdout()).await?,
        Commands::Generate {
            topic,
            suggest,
            save,
            share,
            json,
        } => {
            run_generate(
                &app,
                GenerateArgs {
                    topic,
                    suggest,
                    save,
                    share,
                    json,
                },
                &mut std::io::stdout(),
            )
            .await?
        }
        Commands::Interactive => {
            console::run(app, BufReader::new(tokio::io::stdin())).await?;
            true
        }
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
