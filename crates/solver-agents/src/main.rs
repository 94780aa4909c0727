use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use sandbox::{Language, TestCase};
use solver_agents::{ProblemRequest, Solver, SolverConfig};

#[derive(Parser)]
#[command(name = "solver-agents", about = "Multi-model algorithmic problem solver")]
struct Cli {
    /// Optional TOML config file (defaults + env overrides otherwise).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve a problem statement end to end.
    Solve {
        /// File containing the problem statement.
        #[arg(long)]
        problem: PathBuf,
        /// Target language: python, javascript, java, cpp.
        #[arg(long, default_value = "python")]
        language: Language,
        /// Optional JSON file with test cases:
        /// [{"input": "...", "expectedOutput": "..."}]
        #[arg(long)]
        tests: Option<PathBuf>,
    },
    /// Probe the reachability of every configured endpoint.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SolverConfig::from_file(path)?,
        None => SolverConfig::default(),
    };

    let solver = Solver::new(config).context("Failed to initialize solver")?;

    match cli.command {
        Command::Solve {
            problem,
            language,
            tests,
        } => {
            let statement = std::fs::read_to_string(&problem)
                .with_context(|| format!("Failed to read problem file {}", problem.display()))?;
            let test_cases: Vec<TestCase> = match tests {
                Some(path) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read test file {}", path.display()))?;
                    serde_json::from_str(&raw)
                        .with_context(|| format!("Failed to parse test file {}", path.display()))?
                }
                None => Vec::new(),
            };

            info!(
                %language,
                test_cases = test_cases.len(),
                "Solving problem"
            );

            let request = ProblemRequest::new(statement, language).with_test_cases(test_cases);
            let outcome = solver.solve(request).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);

            if !outcome.success {
                std::process::exit(1);
            }
        }
        Command::Status => {
            let reports = solver.health().await;
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }

    Ok(())
}
