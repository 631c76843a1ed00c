// Runs every preprocessing variant of an image through OCR and reports how
// each one scored.

use bannerscan::backends::TesseractOcr;
use bannerscan::models::OcrStrategyResult;
use bannerscan::processing::{ImageInput, ImageProcessor, StrategySelector, TextCleaner};
use bannerscan::utils::Result;
use bannerscan::AnalyzerConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "strategy_report")]
#[command(about = "Compare OCR preprocessing strategies on one image")]
struct Args {
    image: PathBuf,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also print the cleaned text of every variant
    #[arg(long)]
    show_text: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let config = AnalyzerConfig::load(args.config.as_deref())?;
    let ocr = TesseractOcr::new(config.ocr.datapath.clone(), &config.ocr.language);
    let selector = StrategySelector::new(&ocr, &config.ocr);

    let image = ImageProcessor::load(&ImageInput::from(args.image.clone()))?;
    println!("Image: {} ({}x{})", args.image.display(), image.width(), image.height());

    let attempts = selector.evaluate_all(&image);
    let best = StrategySelector::pick_best(attempts.clone());

    println!("{:<22} {:>10} {:>8} {:>8}", "STRATEGY", "CONFIDENCE", "TOKENS", "CHARS");
    for attempt in &attempts {
        print_row(attempt, attempt.strategy == best.strategy && best.accepted_tokens > 0);
        if args.show_text {
            for line in TextCleaner::clean(&attempt.text).lines() {
                println!("    | {}", line);
            }
        }
    }

    if best.accepted_tokens == 0 {
        println!("\nNo variant produced readable text.");
    } else {
        println!("\nSelected: {} ({:.2}%)", best.strategy, best.average_confidence);
    }
    Ok(())
}

fn print_row(attempt: &OcrStrategyResult, selected: bool) {
    println!(
        "{:<22} {:>9.2}% {:>8} {:>8}{}",
        attempt.strategy,
        attempt.average_confidence,
        attempt.accepted_tokens,
        attempt.text.chars().count(),
        if selected { "  <- selected" } else { "" }
    );
}
