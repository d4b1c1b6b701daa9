use clap::{Parser, Subcommand, ValueEnum};
use hostconf::{DocsConfig, Error, StorageFormat, dispatch, generate_docs, package};
use log::{debug, info};
use serde_json::{Value, json};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "hostconf", version, about = "Garbageman nodes manager package hooks")]
struct Cli {
    /// Directory holding the persisted configuration (supports ~)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Encoding of the persisted configuration
    #[arg(long, global = true, value_enum, default_value_t = Format::Yaml)]
    format: Format,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the configuration schema
    Describe,
    /// Print the schema, its rendering and the current configuration
    GetConfig,
    /// Apply a complete configuration read as JSON from stdin
    SetConfig,
    /// Print the properties document
    Properties,
    /// Run one health check
    Health {
        name: String,
        /// Time budget in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Migrate the stored configuration between versions
    Migration {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// Print markdown documentation for the schema
    Docs,
}

fn storage_format(format: Format) -> hostconf::Result<StorageFormat> {
    match format {
        Format::Json => Ok(StorageFormat::Json),
        #[cfg(feature = "yaml")]
        Format::Yaml => Ok(StorageFormat::Yaml),
        #[cfg(not(feature = "yaml"))]
        Format::Yaml => Err(Error::Config("built without YAML support".into())),
    }
}

fn read_stdin_json() -> hostconf::Result<Value> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| Error::Parse(format!("failed to read stdin: {e}")))?;
    Ok(serde_json::from_str(&input)?)
}

async fn run(cli: Cli) -> hostconf::Result<Value> {
    let mut builder = package::default_config_builder().format(storage_format(cli.format)?);
    if let Some(dir) = cli.data_dir {
        builder = builder.data_dir(dir);
    }
    let config = builder.build();
    let default_budget = config.health_timeout;
    let pkg = package::nodes_manager(config)?;

    let (procedure, payload) = match cli.command {
        Command::Docs => {
            let docs = generate_docs(
                pkg.store().spec(),
                &DocsConfig::new().with_title("Garbageman Nodes Manager Configuration"),
            );
            return Ok(Value::String(docs));
        }
        Command::Describe => ("describe-schema", Value::Null),
        Command::GetConfig => ("get-config", Value::Null),
        Command::SetConfig => ("set-config", read_stdin_json()?),
        Command::Properties => ("properties", Value::Null),
        Command::Health { name, timeout_ms } => {
            ("health", json!({"name": name, "timeout-ms": timeout_ms}))
        }
        Command::Migration { from, to } => ("migration", json!({"from": from, "to": to})),
    };
    debug!("Running '{procedure}'");

    dispatch(&pkg, procedure, &payload, default_budget).await
}

fn error_body(err: &Error) -> Value {
    match err {
        Error::Validation(e) => json!({"error": "validation", "path": e.path, "kind": e.kind, "reason": e.reason}),
        Error::Migration(e) => json!({"error": "migration", "kind": e.kind, "detail": e.detail, "boundary": e.boundary}),
        other => json!({"error": other.to_string()}),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    info!("hostconf {}", env!("CARGO_PKG_VERSION"));

    match run(cli).await {
        Ok(Value::String(text)) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
            ExitCode::SUCCESS
        }
        Err(err) => {
            println!("{}", serde_json::to_string_pretty(&error_body(&err)).unwrap_or_default());
            ExitCode::FAILURE
        }
    }
}
