//! LeanLoad CLI
//!
//! CLI tool for compiling filter lists into declarative rule sets and for
//! driving the rule engine against a local, file-backed host.

mod host;

use std::fs;
use std::path::Path;
use std::time::Instant;

use clap::{Parser, Subcommand};

use ll_compiler::{parse_filter_list_with_stats, RuleCompiler};
use ll_core::{EngineConfig, Mode};
use ll_engine::{format_bytes, Command, EnforcementSurface, ListFetcher, Reply};

#[derive(Parser)]
#[command(name = "ll-cli")]
#[command(about = "LeanLoad filter list compiler and tools")]
struct Cli {
    /// Engine config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the blockable domains from a filter list
    Parse {
        /// Input filter list file
        #[arg(short, long)]
        input: String,

        /// Write the domains as a JSON array
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Compile a filter list into the rule set for a mode
    Compile {
        /// Input filter list file
        #[arg(short, long)]
        input: String,

        /// Filtering mode (off, low, medium, high, extreme)
        #[arg(short, long, default_value = "low")]
        mode: Mode,

        /// Output rules file
        #[arg(short, long, default_value = "rules.json")]
        output: String,
    },

    /// Download the configured filter list
    Fetch {
        /// Output file, stdout if omitted
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Force-refresh the cached list in a store file
    Refresh {
        /// Store file
        #[arg(short, long)]
        store: String,

        /// Read the list from this file instead of the network
        #[arg(short, long)]
        input: Option<String>,
    },

    /// Show what a store file holds
    Status {
        /// Store file
        #[arg(short, long)]
        store: String,
    },

    /// Send one command message to the engine
    Message {
        /// Store file
        #[arg(short, long)]
        store: String,

        /// Read the list from this file instead of the network
        #[arg(short, long)]
        input: Option<String>,

        /// Message JSON, e.g. '{"type":"SET_MODE","mode":"high"}'
        message: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),
        Commands::Compile {
            input,
            mode,
            output,
        } => cmd_compile(&config, &input, mode, &output),
        Commands::Fetch { output } => run_async(cmd_fetch(&config, output.as_deref())),
        Commands::Refresh { store, input } => {
            run_async(cmd_refresh(&config, &store, input.as_deref()))
        }
        Commands::Status { store } => run_async(cmd_status(&config, &store)),
        Commands::Message {
            store,
            input,
            message,
        } => run_async(cmd_message(&config, &store, input.as_deref(), &message)),
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&str>) -> Result<EngineConfig, String> {
    match path {
        Some(path) => EngineConfig::load(Path::new(path)).map_err(|e| e.to_string()),
        None => Ok(EngineConfig::default()),
    }
}

fn run_async<F>(future: F) -> Result<(), String>
where
    F: std::future::Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to start tokio runtime: {}", e))?;
    runtime.block_on(future)
}

fn read_list(path: &str) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e))
}

fn write_file(path: &str, contents: &str) -> Result<(), String> {
    fs::write(path, contents).map_err(|e| format!("Failed to write '{}': {}", path, e))
}

fn cmd_parse(input: &str, output: Option<&str>) -> Result<(), String> {
    let content = read_list(input)?;

    let start = Instant::now();
    let (domains, stats) = parse_filter_list_with_stats(&content);
    let parse_time = start.elapsed();

    println!("Parsed '{}'", input);
    println!("  Lines:       {}", stats.lines);
    println!("  Domains:     {}", stats.domains);
    println!(
        "  Skipped:     {} blank, {} comments, {} exceptions, {} cosmetic",
        stats.blank, stats.comments, stats.exceptions, stats.cosmetic
    );
    println!("  Dropped:     {}", stats.dropped);
    println!("  Time:        {:.1}ms", parse_time.as_secs_f64() * 1000.0);

    if let Some(output) = output {
        let json = serde_json::to_string_pretty(&domains).map_err(|e| e.to_string())?;
        write_file(output, &json)?;
        println!("Wrote {} domains to '{}'", domains.len(), output);
    }

    Ok(())
}

fn cmd_compile(config: &EngineConfig, input: &str, mode: Mode, output: &str) -> Result<(), String> {
    let content = read_list(input)?;

    let start = Instant::now();
    let (domains, _) = parse_filter_list_with_stats(&content);
    let compiler = RuleCompiler::from_config(config);
    let rules = compiler.compile_for_mode(mode, &domains);
    let total_time = start.elapsed();

    let json = serde_json::to_string_pretty(&rules).map_err(|e| e.to_string())?;
    write_file(output, &json)?;

    let truncated = domains.len().saturating_sub(compiler.max_domain_rules);
    println!("Compiled '{}' for mode {} to '{}'", input, mode, output);
    println!("  Domains:     {}", domains.len());
    println!("  Rules:       {}", rules.len());
    if mode.uses_filter_list() && truncated > 0 {
        println!(
            "  Truncated:   {} domains over the cap of {}",
            truncated,
            compiler.max_domain_rules
        );
    }
    println!("  Size:        {} bytes ({:.1} KB)", json.len(), json.len() as f64 / 1024.0);
    println!("  Time:        {:.1}ms", total_time.as_secs_f64() * 1000.0);

    Ok(())
}

async fn cmd_fetch(config: &EngineConfig, output: Option<&str>) -> Result<(), String> {
    let fetcher = host::list_fetcher(config, None)?;
    let text = fetcher.fetch_list().await.map_err(|e| e.to_string())?;

    match output {
        Some(output) => {
            write_file(output, &text)?;
            println!(
                "Fetched {} ({} lines) to '{}'",
                config.list_url,
                text.lines().count(),
                output
            );
        }
        None => print!("{}", text),
    }

    Ok(())
}

async fn cmd_refresh(
    config: &EngineConfig,
    store: &str,
    input: Option<&str>,
) -> Result<(), String> {
    let host = host::local_host(config, Path::new(store), input)?;
    let cache = host
        .controller
        .cache()
        .force_refresh()
        .await
        .map_err(|e| e.to_string())?;

    println!("Refreshed filter cache in '{}'", store);
    println!("  Domains:     {}", cache.domains.len());
    println!("  Fetched at:  {}", cache.fetched_at);

    Ok(())
}

async fn cmd_status(config: &EngineConfig, store: &str) -> Result<(), String> {
    let host = host::local_host(config, Path::new(store), None)?;
    let reply = host
        .controller
        .handle(Command::GetState)
        .await
        .map_err(|e| e.to_string())?;
    let cache = host.controller.cache().read().await.map_err(|e| e.to_string())?;
    let all_time = host
        .controller
        .stats()
        .all_time_stats()
        .await
        .map_err(|e| e.to_string())?;

    println!("Store: {}", store);
    if let Reply::State(state) = reply {
        println!("  Mode:        {}", state.mode);
    }
    match cache {
        Some(cache) => {
            let fresh = if host.controller.cache().is_fresh(&cache) {
                "fresh"
            } else {
                "stale"
            };
            println!(
                "  Cache:       {} domains, fetched at {} ({})",
                cache.domains.len(),
                cache.fetched_at,
                fresh
            );
        }
        None => println!("  Cache:       empty"),
    }
    println!(
        "  All time:    {} blocked, {} saved",
        all_time.blocked_requests,
        format_bytes(all_time.estimated_bytes_saved)
    );

    Ok(())
}

async fn cmd_message(
    config: &EngineConfig,
    store: &str,
    input: Option<&str>,
    message: &str,
) -> Result<(), String> {
    let message: serde_json::Value =
        serde_json::from_str(message).map_err(|e| format!("Invalid message JSON: {}", e))?;

    let host = host::local_host(config, Path::new(store), input)?;
    let reply = host.controller.handle_message(message).await;
    let active = host
        .surface
        .active_rule_ids()
        .await
        .map_err(|e| e.to_string())?;

    println!("{}", serde_json::to_string_pretty(&reply).map_err(|e| e.to_string())?);
    log::info!("{} rules active after message", active.len());

    Ok(())
}
