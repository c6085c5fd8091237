use crate::{
    advisor::GenerationParams,
    clock::SystemClock,
    config::{EtlConfig, Overrides},
    error::ConfigError,
    llm::Client,
    model::User,
    pipeline::{Pipeline, RunSettings},
    users::HttpUserSource,
};
use anyhow::Result;
use clap::{ArgAction, Parser};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sdw-etl",
    version,
    about = "Fetch users, draft a personalized investment message for each, and save the results"
)]
pub struct Args {
    #[arg(help = "CSV file with the user id column (default: SDW2023.csv)")]
    pub input: Option<PathBuf>,

    #[arg(long, help = "TOML config file")]
    pub config: Option<PathBuf>,

    #[arg(
        long = "api-key",
        env = "OPENAI_API_KEY",
        hide_env_values = true,
        help = "API key for the text-generation service"
    )]
    pub api_key: Option<String>,

    #[arg(
        long = "base-url",
        env = "OPENAI_BASE_URL",
        help = "Base URL of the OpenAI-compatible API"
    )]
    pub base_url: Option<String>,

    #[arg(long, help = "Model used to write the messages")]
    pub model: Option<String>,

    #[arg(long = "users-url", help = "Base URL of the users API")]
    pub users_url: Option<String>,

    #[arg(long = "output-dir", help = "Directory for per-user JSON files")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, help = "Path of the summary report")]
    pub report: Option<PathBuf>,

    #[arg(long, help = "Seed for the simulated account balances")]
    pub seed: Option<u64>,

    #[arg(short, long, action = ArgAction::Count, help = "Increase log verbosity (-v, -vv, -vvv)")]
    pub verbose: u8,

    #[arg(long = "show-config", help = "Print the resolved configuration and exit")]
    pub show_config: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            input_path: self.input.clone(),
            users_api_url: self.users_url.clone(),
            output_dir: self.output_dir.clone(),
            report_path: self.report.clone(),
            seed: self.seed,
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            api_key: self.api_key.clone(),
        }
    }
}

/// Defaults, then the config file if given, then flags and environment.
pub fn resolve_config(args: &Args) -> Result<EtlConfig> {
    let base = match &args.config {
        Some(path) => EtlConfig::load_from(path)?,
        None => EtlConfig::default(),
    };
    Ok(base.apply(args.overrides()))
}

pub fn run_settings(cfg: &EtlConfig) -> RunSettings {
    RunSettings {
        id_column: cfg.id_column.clone(),
        output_dir: cfg.output_dir.clone(),
        report_path: cfg.report_path.clone(),
        generation: GenerationParams {
            model: cfg.llm.model.clone(),
            max_tokens: cfg.llm.max_tokens,
            temperature: cfg.llm.temperature,
        },
    }
}

fn print_recap(users: &[User]) {
    if users.is_empty() {
        return;
    }
    println!("\nPROCESSED CLIENTS:");
    for user in users {
        println!(
            "   • {}: {}",
            user.name,
            user.ai_generated_message.as_deref().unwrap_or("")
        );
    }
}

/// The single line printed to stderr when a run fails.
pub fn exit_message(err: &anyhow::Error) -> String {
    format!("Pipeline error: {:#}", err)
}

pub fn run(args: Args) -> Result<()> {
    let mut cfg = resolve_config(&args)?;

    if args.show_config {
        println!("{}", cfg.describe());
        return Ok(());
    }

    cfg.validate()?;
    let api_key = cfg.llm.api_key.take().ok_or(ConfigError::MissingApiKey)?;

    let rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut pipeline = Pipeline::new(
        HttpUserSource::new(&cfg.users_api_url),
        Client::new(&cfg.llm.base_url, api_key),
        SystemClock,
        rng,
        run_settings(&cfg),
    );

    if let Some(outcome) = pipeline.run(&cfg.input_path)? {
        print_recap(&outcome.users);
    }
    Ok(())
}
