//! # draftloop CLI
//!
//! Runs the code and story bots from the command line or serves them as a
//! web form.
//!
//! Usage:
//!   draftloop run --bot code <request>
//!   draftloop run --bot story --feedback <text> <preferences>
//!   draftloop bots
//!   draftloop check
//!   draftloop serve [--bind <addr>]
//!
//! Examples:
//!   draftloop run --bot code "Write a Python function to reverse a string"
//!   draftloop run --bot code --param Rust --json "parse a CSV line"
//!   draftloop --flow strict run --bot story "Genre: Fantasy, Theme: Adventure"

mod check;
mod config;
mod logging;
mod output;
mod web;

use clap::{Parser, Subcommand};
use config::{FileConfig, Overrides, Settings};
use draftloop_error::Result;
use draftloop_llm::OpenAIProvider;
use draftloop_workflow::{validate_input, BotProfile, Controller, FlowPreset, Presentation, RunInput, Step};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "draftloop")]
#[command(author, version, about = "draftloop - generate, review and refine with an LLM")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ./draftloop.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show the result
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Model name, overrides the config file
    #[arg(long, global = true)]
    model: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Flow preset: strict or iterative
    #[arg(long, global = true)]
    flow: Option<FlowPreset>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one bot once
    Run {
        /// Bot to run: code or story
        #[arg(short, long)]
        bot: String,

        /// Bot parameter (the code bot's language)
        #[arg(short, long)]
        param: Option<String>,

        /// Feedback for the first draft
        #[arg(short, long)]
        feedback: Option<String>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,

        /// The request (code bot) or preferences (story bot)
        #[arg(trailing_var_arg = true)]
        request: Vec<String>,
    },
    /// List bots and their prompts
    Bots,
    /// Send one small request to verify the key, endpoint and model
    Check,
    /// Serve the bot forms over HTTP
    Serve {
        /// Address to bind, e.g. 127.0.0.1:8501
        #[arg(long)]
        bind: Option<String>,
    },
}

/// Exit status for an empty request
const EXIT_USAGE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // before the subscriber so RUST_LOG may come from .env
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => debug!("no .env file"),
        Err(e) => warn!(error = %e, "could not read .env"),
    }

    match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            debug!(error = ?e, "fatal");
            eprintln!("Error: {}", e.message());
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<ExitCode> {
    let overrides = Overrides {
        model: cli.model.clone(),
        base_url: cli.base_url.clone(),
        bind: None,
        flow: cli.flow,
    };

    match cli.command {
        Commands::Bots => {
            list_bots();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check => {
            let settings = load_settings(cli.config.as_deref(), &overrides)?;
            let provider = OpenAIProvider::new(settings.provider)?;
            let report = check::run(&provider).await?;
            println!("{}", report);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run {
            bot,
            param,
            feedback,
            json,
            request,
        } => {
            let profile = BotProfile::by_id(&bot).ok_or_else(|| {
                draftloop_error::Error::invalid_argument(format!(
                    "unknown bot '{}', expected 'code' or 'story'",
                    bot
                ))
            })?;

            let input = RunInput {
                input_spec: request.join(" "),
                parameters: param,
                feedback,
            }
            .normalized();
            if let Err(e) = validate_input(&profile, &input) {
                eprintln!("{}", e.message());
                return Ok(ExitCode::from(EXIT_USAGE));
            }

            let settings = load_settings(cli.config.as_deref(), &overrides)?;
            let controller = controller(&settings)?;
            run_once(&controller, &profile, input, json, cli.quiet).await
        }
        Commands::Serve { bind } => {
            let overrides = Overrides { bind, ..overrides };
            let settings = load_settings(cli.config.as_deref(), &overrides)?;
            let state = web::AppState {
                controller: controller(&settings)?,
            };
            web::serve(state, settings.bind).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_settings(path: Option<&std::path::Path>, overrides: &Overrides) -> Result<Settings> {
    let file = FileConfig::load(path)?;
    Settings::resolve(&file, overrides, |var| std::env::var(var).ok())
}

fn controller(settings: &Settings) -> Result<Controller> {
    let provider = OpenAIProvider::new(settings.provider.clone())?;
    Ok(Controller::new(Arc::new(provider)).with_flow(settings.flow))
}

async fn run_once(
    controller: &Controller,
    profile: &BotProfile,
    input: RunInput,
    json: bool,
    quiet: bool,
) -> Result<ExitCode> {
    if !quiet {
        let flow = controller
            .flow()
            .preset()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "custom".to_string());
        eprintln!("{} ({}, {} flow)", profile.form.spinner, controller.model(), flow);
    }

    let report = controller.run(profile, input).await;

    if json {
        let body = serde_json::to_string_pretty(&output::RunResponse::from(&report)).map_err(|e| {
            draftloop_error::Error::unexpected("failed to serialize report").set_source(e)
        })?;
        println!("{}", body);
    }

    let code = match report.presentation() {
        Presentation::Failure { error } => {
            if !json {
                eprintln!("Error: {}", error);
            }
            ExitCode::FAILURE
        }
        Presentation::Success {
            artifact,
            feedback,
            iterations,
        } => {
            if !json {
                println!("{}", output::success_text(profile, &artifact, &feedback, iterations));
            }
            ExitCode::SUCCESS
        }
    };

    if !quiet && !json {
        eprintln!("\n{}", output::trace_text(&report));
    }

    Ok(code)
}

fn list_bots() {
    const STEPS: [Step; 4] = [Step::Generate, Step::Review, Step::Refine, Step::HandleFeedback];

    for profile in BotProfile::all() {
        println!("{} - {}", profile.id, profile.form.title);
        if let Some(param) = &profile.parameter {
            println!("  --param: {} (default {})", param.label, param.default);
        }
        for step in STEPS {
            let prompt = profile.prompt(step);
            println!("  {} [{} tokens]", step, prompt.max_tokens);
            for line in prompt.template.source().lines() {
                println!("    {}", line);
            }
        }
        println!();
    }
}
