// Event banner analysis CLI: prints an AnalysisResult as JSON on stdout.

use bannerscan::{AnalyzerConfig, BannerAnalyzer, ImageInput};
use clap::Parser;
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "bannerscan")]
#[command(about = "Extract structured event details from a banner image")]
struct Args {
    /// Banner image to analyze
    image: PathBuf,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip LLM structuring and use rule-based extraction only
    #[arg(long)]
    heuristic_only: bool,

    /// Pretty-print the JSON result
    #[arg(long)]
    pretty: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config = match AnalyzerConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(2);
        }
    };

    let analyzer = match BannerAnalyzer::from_config(config) {
        Ok(analyzer) => analyzer.heuristic_only(args.heuristic_only),
        Err(e) => {
            error!("Failed to set up backends: {}", e);
            return ExitCode::from(2);
        }
    };

    let result = analyzer.analyze(&ImageInput::from(args.image));

    let output = if args.pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    };
    match output {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Failed to serialize result: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
