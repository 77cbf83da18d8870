use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use filter_query::error::{self, ParseError};
use filter_query::expr::Expr;
use filter_query::{ParserConfig, parse_query_with};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Filter query, e.g. "A = 1 AND B IN (2, 3)"
    query: String,

    /// How to print the parsed tree
    #[arg(long, value_enum, default_value_t = OutputFormat::Tree)]
    format: OutputFormat,

    /// Require field names to be enclosed in this character, e.g. '`'
    #[arg(long, value_parser = parse_field_delimiter)]
    field_delimiter: Option<char>,

    /// Log scanner and parser events
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum OutputFormat {
    /// Indented tree, one node per line
    Tree,
    /// Canonical query text
    Query,
    Json,
    /// Rust debug representation
    Debug,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = ParserConfig::new();
    if let Some(delimiter) = cli.field_delimiter {
        config = match config.with_field_delimiter(delimiter) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Invalid configuration: {}", e);
                return ExitCode::FAILURE
            }
        };
    }

    let Ok(expr) = run(&cli.query, &config, true) else {
        return ExitCode::FAILURE
    };

    match render(&expr, cli.format) {
        Ok(output) => {
            println!("{}", output.trim_end());
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Could not render parsed query: {}", e);
            ExitCode::FAILURE
        }
    }
}

pub fn run(source: &str, config: &ParserConfig, print_error: bool) -> Result<Expr, ParseError> {
    let expr = parse_query_with(source, config);

    if let Err(e) = &expr {
        if print_error { error::print_error(source, e); }
    }

    expr
}

fn parse_field_delimiter(arg: &str) -> Result<char, String> {
    let delimiter: char = arg.parse().map_err(|_| format!("expected a single character, got '{}'", arg))?;
    ParserConfig::check_field_delimiter(delimiter).map_err(|e| e.to_string())
}

fn render(expr: &Expr, format: OutputFormat) -> Result<String, serde_json::Error> {
    let output = match format {
        OutputFormat::Tree => expr.tree(),
        OutputFormat::Query => expr.to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(expr)?,
        OutputFormat::Debug => format!("{:#?}", expr),
    };
    Ok(output)
}
