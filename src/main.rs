use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{error, info, warn};

mod catalog;
mod config;
mod describe;
mod generation;
mod mcp;
mod observability;
mod tools;

use config::{GenerationArgs, ToolArgs};
use mcp::contracts::DEFAULT_MAX_CONCURRENT_CALLS;
use tools::ToolRegistry;

#[derive(Parser)]
#[command(name = "design-repo-mcp")]
#[command(
    version,
    about = "MCP tools that pick design assets from curated catalogs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct QueryArgs {
    /// Tool to run (see `tools`)
    tool: String,
    /// Free-text request
    user_query: String,
    /// Output pretty JSON structuredContent
    #[arg(long)]
    json: bool,
    #[command(flatten)]
    tools: ToolArgs,
}

#[derive(Args, Clone)]
struct DescribeArgs {
    /// Folder holding one sub-folder per asset category
    #[arg(long, default_value = "../")]
    root: PathBuf,
    /// Where generated catalogs are written
    #[arg(long, default_value = "./auto_outputs")]
    output_dir: PathBuf,
    /// Append-only log of generated catalogs
    #[arg(long, default_value = "../__All_Errors.txt")]
    master_log: PathBuf,
    #[command(flatten)]
    generation: GenerationArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP stdio server
    Serve {
        /// Serve MCP over stdio (NDJSON)
        #[arg(long)]
        stdio: bool,
        /// Tool calls allowed to run at once; stdin is not read past the cap
        #[arg(
            long,
            env = "DESIGN_REPO_MAX_CONCURRENT_CALLS",
            default_value_t = DEFAULT_MAX_CONCURRENT_CALLS
        )]
        max_concurrent_calls: usize,
        #[command(flatten)]
        tools: ToolArgs,
    },
    /// Run one category tool and print its envelope
    Query(QueryArgs),
    /// List registered tool names
    Tools,
    /// Generate catalogs by describing asset files
    Describe(DescribeArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing();

    match cli.command {
        Commands::Serve {
            stdio,
            max_concurrent_calls,
            tools,
        } => {
            if stdio {
                run_stdio_server(tools.registry(), max_concurrent_calls)
            } else {
                anyhow::bail!("only --stdio transport is supported")
            }
        }
        Commands::Query(args) => run_query(args),
        Commands::Tools => {
            for name in mcp::tool_names() {
                println!("{name}");
            }
            Ok(())
        }
        Commands::Describe(args) => run_describe(args),
    }
}

fn run_query(args: QueryArgs) -> Result<()> {
    if mcp::contracts::category(&args.tool).is_none() {
        eprintln!(
            "unknown tool: {} (expected one of: {})",
            args.tool,
            mcp::tool_names().join(", ")
        );
        process::exit(2);
    }

    let registry = args.tools.registry();
    let tool = registry
        .get(&args.tool)
        .with_context(|| format!("tool not registered: {}", args.tool))?;

    let envelope = tool.run(&args.user_query);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&envelope.to_value())?);
    } else {
        println!("{}", envelope.to_text());
    }
    Ok(())
}

fn run_describe(args: DescribeArgs) -> Result<()> {
    let generator = args.generation.generator();
    let job = describe::DescribeJob {
        root: &args.root,
        output_dir: &args.output_dir,
        master_log: &args.master_log,
        generator: generator.as_ref(),
    };
    for outcome in job.run()? {
        println!(
            "{}: {} files -> {}",
            outcome.tool_name,
            outcome.described,
            outcome.output.display()
        );
    }
    Ok(())
}

type SharedWriter = Arc<Mutex<io::Stdout>>;
/// Request id of every running `tools/call`, flagged once cancelled.
type InFlight = Arc<Mutex<HashMap<String, bool>>>;

fn run_stdio_server(registry: ToolRegistry, max_concurrent_calls: usize) -> Result<()> {
    let registry = Arc::new(registry);
    let max_concurrent_calls = max_concurrent_calls.max(1);
    info!(
        tools = ?registry.names(),
        max_concurrent_calls,
        "design repository MCP server ready"
    );

    let stdin = io::stdin();
    let reader = stdin.lock().lines();
    let writer: SharedWriter = Arc::new(Mutex::new(io::stdout()));
    let in_flight: InFlight = Arc::new(Mutex::new(HashMap::new()));
    let mut workers: VecDeque<JoinHandle<()>> = VecDeque::new();

    for line in reader {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let request: Value = match serde_json::from_str(&line) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "skipping unparseable request line");
                continue;
            }
        };

        let method = request.get("method").and_then(|value| value.as_str());
        let id = request.get("id").cloned();
        let response = match (method, id) {
            (Some("initialize"), Some(id)) => Some(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "protocolVersion": mcp::contracts::PROTOCOL_VERSION,
                    "capabilities": {
                        "tools": {}
                    },
                    "serverInfo": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }
            })),
            (Some("ping"), Some(id)) => Some(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {}
            })),
            (Some("tools/list"), Some(id)) => Some(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "tools": mcp::tool_definitions()
                }
            })),
            (Some("tools/call"), Some(id)) => {
                workers.retain(|worker| !worker.is_finished());
                if workers.len() >= max_concurrent_calls
                    && let Some(oldest) = workers.pop_front()
                {
                    info!(
                        running = workers.len() + 1,
                        "worker cap reached; waiting for the oldest tool call"
                    );
                    join_worker(oldest);
                }
                lock(&in_flight)?.insert(id.to_string(), false);
                workers.push_back(spawn_tool_call(
                    registry.clone(),
                    writer.clone(),
                    in_flight.clone(),
                    id,
                    request.get("params").cloned(),
                ));
                None
            }
            (Some("notifications/cancelled"), None) => {
                if let Some(request_id) = request
                    .get("params")
                    .and_then(|params| params.get("requestId"))
                {
                    match lock(&in_flight)?.get_mut(&request_id.to_string()) {
                        Some(cancelled) => {
                            info!(request_id = %request_id, "cancellation requested");
                            *cancelled = true;
                        }
                        None => {
                            info!(request_id = %request_id, "cancellation for unknown request ignored");
                        }
                    }
                }
                None
            }
            (Some(method), Some(id)) => Some(json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {
                    "code": mcp::errors::METHOD_NOT_FOUND,
                    "message": format!("method not found: {method}")
                }
            })),
            _ => None,
        };

        if let Some(response) = response {
            write_response(&writer, &response)?;
        }
    }

    for worker in workers {
        join_worker(worker);
    }

    Ok(())
}

fn join_worker(worker: JoinHandle<()>) {
    if worker.join().is_err() {
        error!("tool worker panicked");
    }
}

fn spawn_tool_call(
    registry: Arc<ToolRegistry>,
    writer: SharedWriter,
    in_flight: InFlight,
    id: Value,
    params: Option<Value>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let result = registry.call(params.as_ref());

        let key = id.to_string();
        let was_cancelled = match lock(&in_flight) {
            Ok(mut pending) => pending.remove(&key).unwrap_or(false),
            Err(err) => {
                error!(error = %err, "in-flight table unavailable");
                false
            }
        };
        if was_cancelled {
            info!(request_id = %key, "dropping response for cancelled request");
            return;
        }

        let response = json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": result
        });
        if let Err(err) = write_response(&writer, &response) {
            error!(error = %err, "failed to write tool response");
        }
    })
}

fn write_response(writer: &SharedWriter, response: &Value) -> Result<()> {
    let serialized = serde_json::to_string(response).context("failed to serialize response")?;
    let mut stdout = lock(writer)?;
    writeln!(stdout, "{serialized}").context("failed to write response")?;
    stdout.flush().context("failed to flush response")?;
    Ok(())
}

fn lock<T>(mutex: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| anyhow::anyhow!("lock poisoned by a panicked worker"))
}
