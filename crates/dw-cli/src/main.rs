#![forbid(unsafe_code)]

//! dotweave CLI - parse, resolve and highlight DOT graphs.
//!
//! # Commands
//!
//! - `convert`: Build the graph model and emit it as JSON, optionally with a highlighted path
//! - `parse`: Output the syntax tree and diagnostics as JSON
//! - `tokens`: List the lexer's tokens with their positions
//! - `validate`: Check input for errors and report diagnostics

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dw_core::{DotError, Graph, PathValidationResult, PipelineConfig};
use dw_parser::{highlight_path, parse, parse_and_convert, summary_json, tokenize};
use serde::Serialize;
use tracing::{debug, info, warn};

/// dotweave CLI - parse, resolve and highlight DOT graphs.
#[derive(Debug, Parser)]
#[command(
    name = "dotweave",
    version,
    about = "dotweave CLI - parse, resolve and highlight DOT graphs",
    long_about = "Reads Graphviz DOT source, resolves defaults, subgraphs and edge chains\n\
        into a flat node/link model, and can validate and mark a path through it."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (can be repeated for more detail: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// TOML file with pipeline settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the graph model and output it as JSON.
    Convert {
        /// Input file path, "-" for stdin, or inline DOT text.
        #[arg(default_value = "-")]
        input: String,

        /// Path to highlight: a DOT file or inline DOT text whose edges name the steps.
        #[arg(short, long)]
        path: Option<String>,

        /// Output file path. If omitted, writes to stdout.
        #[arg(short, long)]
        output: Option<String>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Output counts instead of the full graph
        #[arg(long)]
        summary: bool,
    },

    /// Parse DOT and output the syntax tree with diagnostics as JSON.
    Parse {
        /// Input file path, "-" for stdin, or inline DOT text.
        #[arg(default_value = "-")]
        input: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print one token per line with its position.
    Tokens {
        /// Input file path, "-" for stdin, or inline DOT text.
        #[arg(default_value = "-")]
        input: String,
    },

    /// Validate DOT source and report diagnostics.
    Validate {
        /// Input file path, "-" for stdin, or inline DOT text.
        #[arg(default_value = "-")]
        input: String,

        /// Output as JSON (structured diagnostics)
        #[arg(long)]
        json: bool,
    },
}

/// Loaded input plus the name diagnostics refer to it by.
#[derive(Debug)]
struct Source {
    name: String,
    bytes: Vec<u8>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConvertOutput<'a> {
    graph: &'a Graph,
    path_validation: &'a PathValidationResult,
}

/// Result of validating a graph.
#[derive(Debug, Serialize)]
struct ValidateResult {
    valid: bool,
    directed: bool,
    strict: bool,
    node_count: usize,
    link_count: usize,
    subgraph_count: usize,
    errors: Vec<ValidationError>,
}

#[derive(Debug, Serialize)]
struct ValidationError {
    code: String,
    message: String,
    line: usize,
    column: usize,
}

impl From<&DotError> for ValidationError {
    fn from(err: &DotError) -> Self {
        Self {
            code: err.code().as_str().to_string(),
            message: err.message().to_string(),
            line: err.position().line,
            column: err.position().column,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(cli.verbose, cli.quiet, config.log_filter.as_deref());
    debug!(?config, "loaded configuration");

    match cli.command {
        Command::Convert {
            input,
            path,
            output,
            pretty,
            summary,
        } => cmd_convert(
            &input,
            path.as_deref(),
            output.as_deref(),
            pretty || config.pretty,
            summary,
            &config,
        ),

        Command::Parse { input, pretty } => cmd_parse(&input, pretty || config.pretty, &config),

        Command::Tokens { input } => cmd_tokens(&input, &config),

        Command::Validate { input, json } => cmd_validate(&input, json, &config),
    }
}

fn tracing_filter(verbose: u8, quiet: bool, configured: Option<&str>) -> &str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => configured.unwrap_or("warn"),
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_tracing(verbose: u8, quiet: bool, configured: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_filter(verbose, quiet, configured))
        .with_writer(io::stderr)
        .without_time()
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Invalid config: {}", path.display()))
}

fn load_input(input: &str, config: &PipelineConfig) -> Result<Source> {
    if input == "-" {
        let mut bytes = Vec::new();
        io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read from stdin")?;
        Ok(Source {
            name: config.filename.clone(),
            bytes,
        })
    } else if Path::new(input).exists() {
        let bytes = std::fs::read(input).context(format!("Failed to read file: {input}"))?;
        Ok(Source {
            name: input.to_string(),
            bytes,
        })
    } else {
        // Treat as inline DOT text
        Ok(Source {
            name: config.filename.clone(),
            bytes: input.as_bytes().to_vec(),
        })
    }
}

fn write_output(output: Option<&str>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content).context(format!("Failed to write to: {path}"))?;
            info!("Wrote output to: {path}");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(content.as_bytes())
                .and_then(|()| stdout.flush())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

// =============================================================================
// Command: convert
// =============================================================================

fn cmd_convert(
    input: &str,
    path: Option<&str>,
    output: Option<&str>,
    pretty: bool,
    summary: bool,
    config: &PipelineConfig,
) -> Result<()> {
    if input == "-" && path == Some("-") {
        bail!("Graph and path cannot both be read from stdin");
    }

    let source = load_input(input, config)?;
    let mut graph = parse_and_convert(&source.name, &source.bytes)
        .with_context(|| format!("Failed to parse graph: {}", source.name))?;

    let validation = match path {
        Some(path) => {
            let path_source = load_input(path, config)?;
            let result = highlight_path(&mut graph, &path_source.name, &path_source.bytes)
                .with_context(|| format!("Failed to parse path: {}", path_source.name))?;
            if let Some(error) = &result.error {
                warn!("Path validation failed: {error}");
            }
            Some(result)
        }
        None => None,
    };

    let content = if summary {
        let summary = summary_json(&graph);
        if pretty {
            let value: serde_json::Value = serde_json::from_str(&summary)?;
            serde_json::to_string_pretty(&value)?
        } else {
            summary
        }
    } else {
        match &validation {
            Some(path_validation) => to_json(
                &ConvertOutput {
                    graph: &graph,
                    path_validation,
                },
                pretty,
            )?,
            None => to_json(&graph, pretty)?,
        }
    };

    write_output(output, &format!("{content}\n"))?;

    if validation.is_some_and(|result| !result.valid) && config.fail_on_invalid_path {
        std::process::exit(1);
    }

    Ok(())
}

// =============================================================================
// Command: parse
// =============================================================================

fn cmd_parse(input: &str, pretty: bool, config: &PipelineConfig) -> Result<()> {
    let source = load_input(input, config)?;
    let parsed = parse(&source.name, &source.bytes);

    println!("{}", to_json(&parsed, pretty)?);

    for err in &parsed.errors {
        warn!("Parse error: {err}");
    }

    if !parsed.is_clean() {
        std::process::exit(1);
    }

    Ok(())
}

// =============================================================================
// Command: tokens
// =============================================================================

fn cmd_tokens(input: &str, config: &PipelineConfig) -> Result<()> {
    let source = load_input(input, config)?;
    let (tokens, errors) = tokenize(&source.name, &source.bytes);

    let mut stdout = io::stdout().lock();
    for (position, token) in &tokens {
        writeln!(stdout, "{}:{}\t{token}", position.line, position.column)
            .context("Failed to write to stdout")?;
    }

    for err in &errors {
        eprintln!("{err}");
    }

    if !errors.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}

// =============================================================================
// Command: validate
// =============================================================================

fn cmd_validate(input: &str, json_output: bool, config: &PipelineConfig) -> Result<()> {
    let source = load_input(input, config)?;
    let parsed = parse(&source.name, &source.bytes);
    let graph = dw_parser::convert(&parsed.ast);

    let result = ValidateResult {
        valid: parsed.is_clean(),
        directed: graph.directed,
        strict: graph.strict,
        node_count: graph.nodes.len(),
        link_count: graph.links.len(),
        subgraph_count: graph.subgraphs.len(),
        errors: parsed.errors.iter().map(ValidationError::from).collect(),
    };

    if json_output {
        let output = serde_json::to_string_pretty(&result)?;
        println!("{output}");
    } else {
        let kind = if result.directed { "digraph" } else { "graph" };
        if result.valid {
            println!("✓ Valid {kind}");
        } else {
            println!("✗ Invalid {kind}");
        }

        println!("  Nodes: {}", result.node_count);
        println!("  Links: {}", result.link_count);
        println!("  Subgraphs: {}", result.subgraph_count);

        if !result.errors.is_empty() {
            println!("\nErrors:");
            for err in &result.errors {
                println!(
                    "  [{}] {} (line {}, col {})",
                    err.code, err.message, err.line, err.column
                );
            }
        }
    }

    if !result.valid {
        std::process::exit(1);
    }

    Ok(())
}
