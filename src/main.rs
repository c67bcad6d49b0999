use anyhow::Context;
use clap::Parser;

use judgelet::config::{CliArgs, CliCommand};
use judgelet::judge::{ExecutionRequest, Judge};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = CliArgs::parse();
    let config = cli.to_config().context("Failed to load configuration")?;
    let judge = Judge::new(config)?;

    match cli.command {
        CliCommand::Run {
            language,
            problem,
            code_path,
            input,
        } => {
            let request = ExecutionRequest {
                language,
                source_code: read_source(&code_path)?,
                argument_input: input,
                problem_id: problem,
            };
            let result = judge.run_one(&request).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        CliCommand::Grade {
            language,
            problem,
            code_path,
        } => {
            let request = ExecutionRequest {
                language,
                source_code: read_source(&code_path)?,
                argument_input: String::new(),
                problem_id: problem,
            };
            let verdict = judge.grade_all(&request).await;
            if verdict.all_passed {
                log::info!("Problem {problem}: all test cases passed");
            } else {
                log::info!(
                    "Problem {problem}: {}/{} test cases passed",
                    verdict.cases.iter().filter(|c| c.passed).count(),
                    verdict.cases.len()
                );
            }
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }
    }

    Ok(())
}

fn read_source(path: &str) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read source file {path}"))
}
