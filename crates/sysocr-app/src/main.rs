use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use sysocr::{Config, Input, OcrOutput, Options};
use tracing_subscriber::EnvFilter;

/// Recognize text in an image with the system OCR engine
#[derive(Parser, Debug)]
#[command(name = "sysocr", version)]
struct Args {
    /// Image file path, or an http(s) URL
    input: String,

    /// Language hint such as "ja" or "en-US"; repeat to try several in order
    #[arg(short, long = "lang")]
    lang: Vec<String>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn options(&self) -> Options {
        let input = if self.input.starts_with("http://") || self.input.starts_with("https://") {
            Input::from_url(self.input.as_str())
        } else {
            Input::from_path(PathBuf::from(&self.input))
        };
        Options::new(input).with_languages(self.lang.iter().cloned())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "sysocr=info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::new();

    let start = Instant::now();
    let output = sysocr::recognize_with_config(&args.options(), &config)
        .await
        .with_context(|| format!("failed to recognize text in {}", args.input))?;
    let elapsed = start.elapsed();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_output(&output, elapsed);
    }
    Ok(())
}

fn print_output(output: &OcrOutput, elapsed: std::time::Duration) {
    println!("Recognized in {:?}", elapsed);
    println!();
    println!("{}", output.text);
    println!();
    println!("{} blocks:", output.blocks.len());
    for (i, block) in output.blocks.iter().enumerate() {
        let b = &block.bounding_box;
        println!(
            "  [{}] {:?} at ({:.3}, {:.3}) size {:.3}x{:.3}",
            i + 1,
            block.text,
            b.x,
            b.y,
            b.width,
            b.height
        );
    }
}
