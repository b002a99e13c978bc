//! CLI entry point for the knowledge-base assistant.
//!
//! Provides an interactive chat session, one-shot queries with optional JSON
//! output, and settings management.

use anyhow::Context;
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::io::BufRead;
use std::path::PathBuf;
use std::time::Instant;
use tracing::Level;

use streamkb::display::{THEME, Theme};
use streamkb::io::{ExitCode, JsonResponse, OutputFormat, ResponseMeta};
use streamkb::knowledge::{
    KnowledgeBase, MatchInfo, SessionOptions, Variant, footer, load_corpus,
};
use streamkb::{KnowledgeError, KnowledgeResult, Settings};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Create custom help text with consistent styling
fn create_custom_help() -> String {
    use console::style;

    let section = |title: &str| {
        if Theme::should_disable_colors() {
            format!("{title}\n")
        } else {
            format!("{}\n", style(title).cyan().bold())
        }
    };

    let mut help = String::new();

    help.push_str(&section("Quick Start:"));
    help.push_str("  $ streamkb chat                          # Chat with the built-in articles\n");
    help.push_str("  $ streamkb chat --variant faq            # Customer-support FAQ bot\n");
    help.push_str("  $ streamkb ask \"what is blockchain\"      # One question, then exit\n");
    help.push_str("  $ streamkb chat --variant instruction --dataset alpaca.json\n\n");

    help.push_str("Answer questions from a local knowledge base, streamed as they are typed.\n\n");

    help.push_str(&section("Usage:"));
    help.push_str("  streamkb [OPTIONS] <COMMAND>\n\n");

    help.push_str(&section("Commands:"));
    help.push_str("  chat        Start an interactive session\n");
    help.push_str("  ask         Answer one query and exit\n");
    help.push_str("  config      Display active settings\n");
    help.push_str("  init        Create .streamkb/settings.toml\n");
    help.push_str("  help        Print this message or the help of the given subcommand(s)\n\n");

    help.push_str("See 'streamkb help <command>' for more information on a specific command.\n\n");

    help.push_str(&section("Options:"));
    help.push_str("  -c, --config <CONFIG>  Path to custom settings.toml file\n");
    help.push_str("      --debug            Write debug logs to stderr\n");
    help.push_str("  -h, --help             Print help\n");
    help.push_str("  -V, --version          Print version");

    help
}

/// Streaming knowledge-base assistant
#[derive(Parser)]
#[command(
    name = "streamkb",
    version = env!("CARGO_PKG_VERSION"),
    about = "Streaming knowledge-base assistant",
    long_about = "Answer questions from a local knowledge base, streamed as they are typed.",
    next_line_help = true,
    styles = clap_cargo_style(),
    override_help = create_custom_help()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write debug logs to stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Knowledge-base selection shared by `chat` and `ask`
#[derive(clap::Args, Debug, Clone)]
struct KnowledgeArgs {
    /// Kind of knowledge base (overrides config)
    #[arg(long, value_enum)]
    variant: Option<Variant>,

    /// JSON dataset file (overrides config)
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Keep at most this many valid entries from the dataset
    #[arg(long)]
    max_entries: Option<usize>,

    /// Skip the thinking steps before each answer
    #[arg(long)]
    no_thinking: bool,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Interactive session
    #[command(
        about = "Start an interactive session",
        after_help = "Session commands:\n  quit, exit, bye   End the session ('see you' also works for instruction)\n  fast, toggle      Turn thinking steps on or off"
    )]
    Chat {
        #[command(flatten)]
        knowledge: KnowledgeArgs,
    },

    /// One-shot query
    #[command(
        about = "Answer one query and exit",
        after_help = "Exit codes:\n  0  confident answer\n  3  no confident match (canned answer printed)\n\nJSON paths:\n  .data.answer\n  .data.matched.variant"
    )]
    Ask {
        /// The question to answer
        query: String,

        #[command(flatten)]
        knowledge: KnowledgeArgs,

        /// Output format: JSON instead of streamed text
        #[arg(long)]
        json: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings")]
    Config,

    /// Initialize project
    #[command(about = "Create .streamkb/settings.toml with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Payload of `ask --json`
#[derive(Debug, serde::Serialize)]
struct AskData<'a> {
    variant: Variant,
    query: &'a str,
    answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    matched: Option<MatchInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    thinking: Vec<String>,
}

fn init_logging(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::WARN };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

fn load_settings(cli: &Cli) -> KnowledgeResult<Settings> {
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .map_err(|e| KnowledgeError::Config {
        reason: e.to_string(),
    })?;
    settings.validate()?;
    Ok(settings)
}

/// Apply command-line overrides on top of loaded settings.
fn apply_overrides(settings: &mut Settings, args: &KnowledgeArgs) {
    if let Some(variant) = args.variant {
        settings.knowledge.variant = variant;
    }
    if let Some(dataset) = &args.dataset {
        settings.knowledge.dataset = Some(dataset.clone());
    }
    if let Some(max) = args.max_entries {
        settings.knowledge.max_entries = max;
    }
}

fn open_session(settings: &Settings) -> KnowledgeResult<KnowledgeBase> {
    let loaded = load_corpus(
        settings.knowledge.variant,
        settings.knowledge.dataset.as_deref(),
        Some(settings.knowledge.max_entries),
    )?;
    // stderr keeps `ask --json` output parseable
    if loaded.source.is_some() {
        eprintln!("{}", THEME.success_with_icon(&loaded.summary()));
    }
    KnowledgeBase::new(loaded.corpus, SessionOptions::from_settings(settings))
}

fn banner_title(variant: Variant) -> &'static str {
    match variant {
        Variant::Faq => "Streaming FAQ Chatbot",
        Variant::Article => "Knowledge Assistant",
        Variant::Instruction => "Instruction Knowledge Assistant",
    }
}

fn run_chat(settings: &Settings, args: &KnowledgeArgs) -> KnowledgeResult<ExitCode> {
    let mut kb = open_session(settings)?;
    let variant = kb.variant();
    let mut show_thinking = !args.no_thinking;

    kb.say(&format!(
        "{}\nType 'quit' to exit, 'fast' to toggle thinking steps\n\n",
        THEME.banner(banner_title(variant))
    ));

    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        kb.say(&format!("{} ", THEME.apply(&THEME.prompt, "You:")));

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            kb.say("\n");
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }

        if variant.is_quit_command(query) {
            kb.say("\nThank you for using the knowledge assistant!\n");
            break;
        }
        if matches!(query.to_lowercase().as_str(), "fast" | "toggle") {
            show_thinking = !show_thinking;
            let state = if show_thinking { "enabled" } else { "disabled" };
            kb.say(&format!("\nThinking steps {state}\n\n"));
            continue;
        }

        let matched = kb.respond(query, show_thinking);
        kb.wait_until_done();
        if let Some(text) = matched.as_ref().and_then(footer) {
            kb.say(&THEME.apply(&THEME.dim, text));
        }
        kb.say("\n\n");
    }

    kb.close();
    Ok(ExitCode::Success)
}

fn run_ask(
    settings: &Settings,
    query: &str,
    args: &KnowledgeArgs,
    format: OutputFormat,
) -> KnowledgeResult<ExitCode> {
    let started = Instant::now();
    let mut kb = open_session(settings)?;

    if format.is_json() {
        let synthesis = kb.answer(query);
        kb.close();
        let exit_code = ExitCode::from_match(&synthesis.matched);
        let data = AskData {
            variant: kb.variant(),
            query,
            answer: synthesis.answer,
            matched: synthesis.matched,
            thinking: synthesis.thinking,
        };
        let response = if exit_code.is_success() {
            JsonResponse::success(data)
        } else {
            JsonResponse::not_found(data, "No confident match for this query")
        }
        .with_meta(ResponseMeta::now(Some(started.elapsed().as_millis() as u64)));
        print_json(&response);
        return Ok(exit_code);
    }

    let matched = kb.respond(query, !args.no_thinking);
    kb.wait_until_done();
    if let Some(text) = matched.as_ref().and_then(footer) {
        kb.say(&THEME.apply(&THEME.dim, text));
    }
    kb.say("\n");

    kb.close();
    Ok(ExitCode::from_match(&matched))
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("{}", THEME.error_with_icon(&format!("JSON output failed: {e}"))),
    }
}

fn run_init(force: bool) -> anyhow::Result<PathBuf> {
    let root = std::env::current_dir().context("Cannot determine current directory")?;
    Settings::init_config_file(&root, force).map_err(|e| anyhow::anyhow!("{e}"))
}

fn run_config(settings: &Settings) -> anyhow::Result<String> {
    settings.to_toml().context("Failed to render settings")
}

fn report_error(error: &KnowledgeError, format: OutputFormat) -> ExitCode {
    if format.is_json() {
        print_json(&JsonResponse::from_error(error));
    } else {
        eprintln!("{}", THEME.error_with_icon(&error.to_string()));
        for suggestion in error.recovery_suggestions() {
            eprintln!("  {}", THEME.apply(&THEME.dim, suggestion));
        }
    }
    ExitCode::from_error(error)
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let format = match &cli.command {
        Commands::Ask { json, .. } => OutputFormat::from_json_flag(*json),
        _ => OutputFormat::Text,
    };

    if let Commands::Init { force } = &cli.command {
        init_logging(cli.debug);
        return match run_init(*force) {
            Ok(path) => {
                println!(
                    "{}",
                    THEME.success_with_icon(&format!(
                        "Created configuration file at: {}",
                        THEME.apply(&THEME.path, path.display())
                    ))
                );
                println!("Edit this file to customize your settings.");
                ExitCode::Success.into()
            }
            Err(e) => {
                eprintln!("{}", THEME.error_with_icon(&format!("{e:#}")));
                ExitCode::ConfigError.into()
            }
        };
    }

    let mut settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            init_logging(cli.debug);
            return report_error(&e, format).into();
        }
    };
    init_logging(cli.debug || settings.debug);

    let result = match &cli.command {
        Commands::Chat { knowledge } => {
            apply_overrides(&mut settings, knowledge);
            run_chat(&settings, knowledge)
        }
        Commands::Ask {
            query, knowledge, ..
        } => {
            apply_overrides(&mut settings, knowledge);
            run_ask(&settings, query, knowledge, format)
        }
        Commands::Config => {
            return match run_config(&settings) {
                Ok(toml_str) => {
                    println!("{}", THEME.apply(&THEME.header, "Current Configuration:"));
                    println!("{}", "=".repeat(50));
                    println!("{toml_str}");
                    ExitCode::Success.into()
                }
                Err(e) => {
                    eprintln!("{}", THEME.error_with_icon(&format!("{e:#}")));
                    ExitCode::GeneralError.into()
                }
            };
        }
        Commands::Init { .. } => Ok(ExitCode::Success),
    };

    match result {
        Ok(code) => code.into(),
        Err(e) => report_error(&e, format).into(),
    }
}
