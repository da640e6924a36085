use std::io::IsTerminal;
use std::io::Read;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use nqjson::bridge;
use nqjson::error::NqError;
use nqjson::output;
use nqjson::parser;
use nqjson::query::{self, QueryResult};
use nqjson::stream;
use nqjson::value::Value;

#[derive(Clone, Debug, PartialEq, Eq)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl std::str::FromStr for ColorMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(ColorMode::Auto),
            "always" => Ok(ColorMode::Always),
            "never" => Ok(ColorMode::Never),
            other => Err(format!("invalid color mode: {other} (expected auto, always, never)")),
        }
    }
}

#[derive(Parser)]
#[command(name = "nqjson", version, about = "Query and modify JSON documents with path expressions")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Colorize output [auto, always, never]
    #[arg(long, global = true, default_value = "auto")]
    color: ColorMode,

    /// Disable colorized output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the value(s) a path addresses
    Get {
        /// Path expression, e.g. `items[?(@.price>100)].name` or `scores|@avg`
        path: String,

        /// Input file (reads from stdin if omitted)
        file: Option<PathBuf>,

        #[command(flatten)]
        out: OutputArgs,

        /// Raw string output (no quotes for string values)
        #[arg(short, long)]
        raw: bool,

        /// Read input as newline-delimited JSON (NDJSON/JSON Lines)
        #[arg(long)]
        jsonl: bool,
    },

    /// Store a JSON value at a path, creating missing structure
    Set {
        path: String,

        /// JSON text of the value to store (`'"text"'`, `42`, `{"a":1}`)
        #[arg(allow_hyphen_values = true)]
        value: String,

        file: Option<PathBuf>,

        #[command(flatten)]
        edit: EditArgs,
    },

    /// Remove the member or element at a path
    Delete {
        path: String,

        file: Option<PathBuf>,

        #[command(flatten)]
        edit: EditArgs,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Compact output (no pretty printing)
    #[arg(short, long)]
    compact: bool,

    /// Print the boundary response object instead of the bare result
    #[arg(long)]
    envelope: bool,
}

#[derive(Args)]
struct EditArgs {
    #[command(flatten)]
    out: OutputArgs,

    /// Edit file in place
    #[arg(short, long = "in-place", conflicts_with = "envelope")]
    in_place: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let colorize = should_colorize(&cli);

    match &cli.command {
        Command::Get {
            path,
            file,
            out,
            raw,
            jsonl,
        } => {
            let input = read_input(file.as_deref())?;
            if *jsonl {
                run_get_jsonl(&input, path, out, *raw, colorize)
            } else {
                run_get(&input, path, out, *raw, colorize)
            }
        }
        Command::Set {
            path,
            value,
            file,
            edit,
        } => {
            let input = read_input(file.as_deref())?;
            if edit.out.envelope {
                return print_mutation(bridge::set(&input, path, value), edit.out.compact);
            }
            let root = parser::parse(&input)?;
            let value = parser::parse_value(value)?;
            let updated = query::set(&root, path, value)?;
            write_document(&updated, file.as_deref(), edit, colorize)
        }
        Command::Delete { path, file, edit } => {
            let input = read_input(file.as_deref())?;
            if edit.out.envelope {
                return print_mutation(bridge::delete(&input, path), edit.out.compact);
            }
            let root = parser::parse(&input)?;
            let updated = query::delete(&root, path)?;
            write_document(&updated, file.as_deref(), edit, colorize)
        }
    }
}

fn run_get(input: &str, path: &str, out: &OutputArgs, raw: bool, colorize: bool) -> Result<()> {
    if out.envelope {
        let response = bridge::get(input, path);
        print_json(&response, out.compact)?;
        if let Some(error) = response.error {
            anyhow::bail!(error);
        }
        return Ok(());
    }

    let root = parser::parse(input)?;
    match query::query(&root, path)?.into_value() {
        Some(value) => {
            let formatted = output::pretty::format_value_colored(&value, out.compact, raw, colorize)?;
            println!("{formatted}");
            Ok(())
        }
        None => Err(NqError::PathNotFound(path.to_string()).into()),
    }
}

fn run_get_jsonl(input: &str, path: &str, out: &OutputArgs, raw: bool, colorize: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    stream::stream_ndjson(input, path, |line, result| {
        let formatted = if out.envelope {
            let response = bridge::GetResponse::from(result);
            serde_json::to_string(&response).map_err(|e| NqError::InvalidDocument(e.to_string()))?
        } else {
            match result {
                QueryResult::NotFound => {
                    debug!(line, "path not found, skipping record");
                    return Ok(());
                }
                found => {
                    let value = found.into_value().unwrap_or_default();
                    output::pretty::format_value_colored(&value, out.compact, raw, colorize)?
                }
            }
        };
        writeln!(handle, "{formatted}")?;
        Ok(())
    })?;
    Ok(())
}

fn print_mutation(response: bridge::MutationResponse, compact: bool) -> Result<()> {
    print_json(&response, compact)?;
    if let bridge::MutationResponse::Err { error } = response {
        anyhow::bail!(error);
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T, compact: bool) -> Result<()> {
    let text = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .context("serializing response")?;
    println!("{text}");
    Ok(())
}

fn write_document(doc: &Value, file: Option<&Path>, edit: &EditArgs, colorize: bool) -> Result<()> {
    if !edit.in_place {
        let formatted = output::pretty::format_value_colored(doc, edit.out.compact, false, colorize)?;
        println!("{formatted}");
        return Ok(());
    }

    let Some(path) = file else {
        anyhow::bail!("--in-place requires a file argument");
    };
    let mut formatted = output::pretty::format_value(doc, edit.out.compact, false)?;
    formatted.push('\n');

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(parent).context("creating temporary file")?;
    tmp.write_all(formatted.as_bytes())
        .context("writing temporary file")?;
    tmp.persist(path)
        .context("replacing file with updated content")?;
    debug!(file = %path.display(), "rewrote file in place");
    Ok(())
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        }
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn should_colorize(cli: &Cli) -> bool {
    if cli.no_color {
        return false;
    }
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    match cli.color {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::io::stdout().is_terminal(),
    }
}
