//! Precis CLI - chunked summarisation of text, PDFs and audio
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use precis::server::{self, AppState};
use precis::{Config, Input, MergePolicy, Pipeline, Summary};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "precis")]
#[command(author, version, about = "Summarise text, PDF documents and audio recordings", long_about = None)]
struct Cli {
    /// Config file (defaults to ./precis.toml, then ~/.config/precis/precis.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Print the result as JSON
    #[arg(long, global = true)]
    json: bool,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(flatten)]
    settings: SettingsArgs,
    #[command(subcommand)]
    command: Commands,
}

/// Overrides for the `[summarization]` and `[merge]` config sections
#[derive(Args)]
struct SettingsArgs {
    /// Model identifier (e.g. facebook/bart-large-cnn)
    #[arg(long, global = true)]
    model: Option<String>,
    /// Maximum tokens per chunk
    #[arg(long, global = true)]
    max_chunk_tokens: Option<usize>,
    /// Tokens shared by consecutive chunks
    #[arg(long, global = true)]
    overlap_tokens: Option<usize>,
    #[arg(long, global = true)]
    min_summary_tokens: Option<usize>,
    #[arg(long, global = true)]
    max_summary_tokens: Option<usize>,
    /// Sample instead of decoding greedily
    #[arg(long, global = true, overrides_with = "no_sample")]
    sample: bool,
    /// Decode greedily even if the config file enables sampling
    #[arg(long, global = true, overrides_with = "sample")]
    no_sample: bool,
    #[arg(long, global = true)]
    temperature: Option<f32>,
    /// How chunk summaries are combined
    #[arg(long, value_enum, global = true)]
    merge: Option<MergeArg>,
    /// Threshold for the chunks/tokens merge policies
    #[arg(long, global = true)]
    merge_limit: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum MergeArg {
    /// Join chunk summaries as they are
    Concatenate,
    /// Summarise again when there are more than --merge-limit chunk summaries
    Chunks,
    /// Summarise again when the joined summaries exceed --merge-limit tokens
    Tokens,
}

impl SettingsArgs {
    fn apply(&self, config: &mut Config) {
        let settings = &mut config.summarization;
        if let Some(model) = &self.model {
            settings.model = model.clone();
        }
        if let Some(max) = self.max_chunk_tokens {
            settings.max_chunk_tokens = max;
        }
        if let Some(overlap) = self.overlap_tokens {
            settings.chunk_overlap_tokens = overlap;
        }
        if let Some(min) = self.min_summary_tokens {
            settings.min_summary_tokens = min;
        }
        if let Some(max) = self.max_summary_tokens {
            settings.max_summary_tokens = max;
        }
        if self.sample {
            settings.do_sample = true;
        } else if self.no_sample {
            settings.do_sample = false;
        }
        if let Some(temperature) = self.temperature {
            settings.temperature = temperature;
        }

        let limit = self.merge_limit;
        config.merge = match self.merge {
            Some(MergeArg::Concatenate) => MergePolicy::Concatenate,
            Some(MergeArg::Chunks) => MergePolicy::ResummarizeAboveChunks {
                chunks: limit.unwrap_or(3),
            },
            Some(MergeArg::Tokens) => MergePolicy::ResummarizeAboveTokens {
                tokens: limit.unwrap_or(config.summarization.max_summary_tokens),
            },
            None => match (config.merge, limit) {
                (MergePolicy::ResummarizeAboveChunks { .. }, Some(chunks)) => {
                    MergePolicy::ResummarizeAboveChunks { chunks }
                }
                (MergePolicy::ResummarizeAboveTokens { .. }, Some(tokens)) => {
                    MergePolicy::ResummarizeAboveTokens { tokens }
                }
                (policy, _) => policy,
            },
        };
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise text given as an argument, read from a file, or piped on stdin
    Text {
        /// Text to summarise
        text: Option<String>,
        /// Read the text from a file
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },
    /// Extract and summarise a PDF document
    Pdf {
        path: PathBuf,
        /// Also print the extracted text
        #[arg(long)]
        show_text: bool,
    },
    /// Transcribe and summarise an audio file (MP3, WAV, OGG)
    Audio {
        path: PathBuf,
        /// Also print the transcript
        #[arg(long)]
        show_text: bool,
    },
    /// Run the JSON HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the effective configuration
    Config,
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose, matches!(cli.command, Commands::Serve { .. }));

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "precis", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load()?,
    };
    cli.settings.apply(&mut config);
    config.validate()?;

    match cli.command {
        Commands::Text { text, file } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                (None, None) => {
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };
            if text.trim().is_empty() {
                anyhow::bail!("Please provide non-empty text.");
            }
            summarise(&config, Input::Text(text), cli.json, None).await?;
        }
        Commands::Pdf { path, show_text } => {
            let bytes = read_file(&path)?;
            let label = show_text.then_some("Extracted text");
            summarise(&config, Input::Pdf(bytes), cli.json, label).await?;
        }
        Commands::Audio { path, show_text } => {
            let bytes = read_file(&path)?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "audio.mp3".to_string());
            let label = show_text.then_some("Transcribed text");
            summarise(&config, Input::Audio { bytes, file_name }, cli.json, label).await?;
        }
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let pipeline = Pipeline::from_config(&config)?;
            server::serve(AppState::new(pipeline), &config.server).await?;
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
        // Generated before the config is loaded
        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Filter used when `RUST_LOG` is unset
fn default_filter(verbose: bool, serving: bool) -> &'static str {
    match (verbose, serving) {
        (true, _) => "precis=debug,tower_http=debug",
        (false, true) => "precis=info,tower_http=info",
        (false, false) => "precis=info",
    }
}

fn init_tracing(verbose: bool, serving: bool) {
    let default = default_filter(verbose, serving);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn read_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

/// Run the pipeline once and print the result
async fn summarise(
    config: &Config,
    input: Input,
    json: bool,
    source_label: Option<&str>,
) -> anyhow::Result<()> {
    let pipeline = Pipeline::from_config(config)?;
    if !json {
        println!("Summarising {} input...", input.provenance());
    }

    let start = Instant::now();
    let summary = pipeline.run(input).await?;
    let elapsed = start.elapsed();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, source_label, elapsed.as_secs_f64());
    }
    Ok(())
}

fn print_summary(summary: &Summary, source_label: Option<&str>, elapsed_secs: f64) {
    if let Some(label) = source_label {
        println!("\n{}\n", format!("=== {} ===", label).bold());
        println!("{}", summary.source_text);
    }

    println!("\n{}\n", "✨ Summary".bold());
    if summary.is_empty() {
        println!("{}", "(Empty summary)".dimmed());
    } else {
        println!("{}", summary.text);
    }

    let passes = if summary.resummarized { ", merged in a second pass" } else { "" };
    println!(
        "\n{}",
        format!(
            "⏱️  {} chunk(s) with {}{} in {:.1}s",
            summary.chunk_count, summary.model, passes, elapsed_secs
        )
        .dimmed()
    );
}
