use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use toolgate_runtime::{telemetry, ControlPlane, ControlPlaneConfig, Invocation, TRACE_HEADER};
use tracing::error;

#[derive(Parser)]
#[command(name = "toolgate", about = "Audited tool invocation control plane")]
struct Cli {
    /// YAML config file; falls back to environment variables
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered tools
    List,
    /// Invoke a tool through the control plane
    Invoke {
        tool: String,
        /// JSON request payload
        #[arg(short, long, default_value = "{}")]
        payload: String,
        #[arg(long, help = format!("Correlation id, as carried in {}; generated when absent", TRACE_HEADER))]
        trace_id: Option<String>,
        /// Approval token for sensitive targets
        #[arg(long)]
        approval: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    telemetry::init_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ControlPlaneConfig::from_yaml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ControlPlaneConfig::from_env().context("reading environment")?,
    };
    let plane = ControlPlane::from_config(&config).context("starting control plane")?;

    match cli.command {
        Commands::List => {
            for name in plane.registry().list() {
                println!("{}", name);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Invoke {
            tool,
            payload,
            trace_id,
            approval,
        } => {
            let payload = serde_json::from_str(&payload).context("payload is not valid JSON")?;
            let mut invocation = Invocation::new(tool, payload);
            invocation.trace_id = trace_id;
            invocation.approval_token = approval;

            match plane.invoke(invocation).await {
                Ok(reply) => {
                    println!("{}", reply.to_json());
                    Ok(if reply.rejection().is_some() {
                        ExitCode::from(2)
                    } else {
                        ExitCode::SUCCESS
                    })
                }
                Err(fault) => {
                    error!(trace_id = %fault.trace_id, tool = %fault.tool_name, detail = fault.detail(), "Invocation fault");
                    println!("{}", fault.to_json());
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}
