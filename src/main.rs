use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use canopy_config::QueryDef;
use canopy_executor::{
  Concurrency, Executor, ExecutorConfig, FieldResolver, FnResolver, PropertyResolver,
  ResolveContext,
};
use canopy_selection::{PlannedQuery, Planner};

/// Canopy - A concurrent executor for tree-shaped queries
#[derive(Parser)]
#[command(name = "canopy")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Execute a query document against a JSON data document
  Run {
    /// Path to the query document (JSON)
    query_file: PathBuf,

    /// Path to the data document (default: read from stdin)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Variable values as a JSON object, overriding document defaults
    #[arg(long)]
    variables: Option<String>,

    /// Maximum number of fields resolved at once (default: available parallelism)
    #[arg(long, conflicts_with = "unbounded")]
    concurrency: Option<usize>,

    /// Resolve every field as soon as it is dispatched
    #[arg(long)]
    unbounded: bool,

    /// Artificial latency added to every field, in milliseconds
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,
  },

  /// Print the planned field tree of a query document
  Plan {
    /// Path to the query document (JSON)
    query_file: PathBuf,

    /// Variable values as a JSON object, overriding document defaults
    #[arg(long)]
    variables: Option<String>,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();

  match cli.command {
    Some(Commands::Run {
      query_file,
      data,
      variables,
      concurrency,
      unbounded,
      latency_ms,
    }) => {
      let concurrency = match (unbounded, concurrency) {
        (true, _) => Concurrency::Unbounded,
        (false, Some(0)) => bail!("--concurrency must be at least 1"),
        (false, Some(n)) => Concurrency::Bounded(n),
        (false, None) => Concurrency::AvailableParallelism,
      };
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(run_query(
        query_file,
        data,
        variables,
        ExecutorConfig { concurrency },
        Duration::from_millis(latency_ms),
      ))?;
    }
    Some(Commands::Plan {
      query_file,
      variables,
    }) => {
      let planned = plan_query(&query_file, variables.as_deref())?;
      println!("{}", serde_json::to_string_pretty(&planned)?);
    }
    None => {
      println!("canopy - use --help to see available commands");
    }
  }

  Ok(())
}

async fn run_query(
  query_file: PathBuf,
  data_file: Option<PathBuf>,
  variables: Option<String>,
  config: ExecutorConfig,
  latency: Duration,
) -> Result<()> {
  let planned = plan_query(&query_file, variables.as_deref())?;
  eprintln!(
    "Planned query {}with {} fields",
    planned
      .operation_name
      .as_deref()
      .map(|name| format!("'{}' ", name))
      .unwrap_or_default(),
    planned.selection.node_count()
  );

  let data = match &data_file {
    Some(path) => {
      let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read data file: {}", path.display()))?;
      serde_json::from_str(&content)
        .with_context(|| format!("failed to parse data file: {}", path.display()))?
    }
    None => read_data_document_from_stdin()?,
  };

  let executor = Executor::new(config, latency_resolver(latency));
  let result = executor
    .execute_query(&planned, data)
    .await
    .context("query execution failed")?;

  eprintln!("Execution completed: {}", result.operation_id);
  eprintln!("Fields resolved: {}", result.fields_resolved);

  println!("{}", serde_json::to_string_pretty(&result.data)?);

  executor.shutdown().await;
  Ok(())
}

fn plan_query(query_file: &Path, variables: Option<&str>) -> Result<PlannedQuery> {
  let content = std::fs::read_to_string(query_file)
    .with_context(|| format!("failed to read query file: {}", query_file.display()))?;

  let document: QueryDef = serde_json::from_str(&content)
    .with_context(|| format!("failed to parse query file: {}", query_file.display()))?;

  let mut planner = Planner::new(&document);
  if let Some(raw) = variables {
    let value: serde_json::Value =
      serde_json::from_str(raw).context("failed to parse --variables JSON")?;
    let serde_json::Value::Object(map) = value else {
      bail!("--variables must be a JSON object");
    };
    planner = planner.with_variables(map);
  }

  planner
    .plan()
    .with_context(|| format!("failed to plan query: {}", query_file.display()))
}

/// Property lookup, optionally delayed to make concurrency observable.
fn latency_resolver(latency: Duration) -> impl FieldResolver {
  FnResolver::new(move |ctx: ResolveContext| async move {
    if !latency.is_zero() {
      tokio::time::sleep(latency).await;
    }
    PropertyResolver.resolve(&ctx).await
  })
}

/// The root value queries run against when `--data` is not given.
///
/// An interactive terminal or an empty pipe yields an empty root object, so
/// every top-level field resolves to `null`.
fn read_data_document_from_stdin() -> Result<serde_json::Value> {
  use std::io::IsTerminal;

  let stdin = io::stdin();
  if stdin.is_terminal() {
    eprintln!("No data document piped on stdin; querying an empty root object");
    return Ok(serde_json::Value::Object(serde_json::Map::new()));
  }

  let document = io::read_to_string(stdin).context("failed to read data document from stdin")?;
  if document.trim().is_empty() {
    return Ok(serde_json::Value::Object(serde_json::Map::new()));
  }

  serde_json::from_str(&document).context("stdin does not hold a valid JSON data document")
}
