use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::Local;
use tokio::process::Command;
use tokio::time::timeout;
use uuid::Uuid;

use crate::config::LanguageConfig;

use super::harness::Harness;
use super::supervisor::{remove_artifacts, supervise};
use super::{ExecutionResult, JudgeError};

/// Strategy for preparing and launching one generated harness as an
/// operating-system process. One driver per language kind; every temporary
/// artifact a driver creates is gone by the time `execute` returns.
#[async_trait]
pub(super) trait Driver: Send + Sync {
    async fn execute(
        &self,
        harness: &Harness,
        argv: &[String],
        deadline: Duration,
    ) -> Result<ExecutionResult, JudgeError>;
}

/// Selects the driver for a language: a compile command template makes it
/// the compiled two-phase driver, otherwise the interpreted one.
pub(super) fn driver_for(
    language: &LanguageConfig,
    scratch_dir: &Path,
    compile_timeout: Duration,
) -> Box<dyn Driver> {
    if language.compile.is_some() {
        Box::new(CompiledDriver {
            language: language.clone(),
            scratch_dir: scratch_dir.to_path_buf(),
            compile_timeout,
        })
    } else {
        Box::new(InterpretedDriver {
            language: language.clone(),
            scratch_dir: scratch_dir.to_path_buf(),
        })
    }
}

/// Writes the harness to a uniquely named temp file, runs the interpreter
/// on it, and removes the file afterwards.
struct InterpretedDriver {
    language: LanguageConfig,
    scratch_dir: PathBuf,
}

#[async_trait]
impl Driver for InterpretedDriver {
    async fn execute(
        &self,
        harness: &Harness,
        argv: &[String],
        deadline: Duration,
    ) -> Result<ExecutionResult, JudgeError> {
        let Harness::Interpreted { source } = harness else {
            return Err(JudgeError::Internal(anyhow!(
                "interpreted driver received a compiled harness"
            )));
        };

        let file_name = format!("run-{}.{}", Uuid::new_v4(), self.language.extension);
        let source_path = self.scratch_dir.join(file_name);
        tokio::fs::write(&source_path, source)
            .await
            .with_context(|| format!("failed to write harness {}", source_path.display()))?;
        log::debug!("Wrote {} harness to {}", self.language.name, source_path.display());

        let command = build_command(&self.language.run, Some(&source_path), argv)?;
        Ok(supervise(command, &[source_path], deadline).await)
    }
}

/// Two-phase driver: writes driver and solution sources into a working
/// directory unique to this invocation, compiles, then runs the artifact.
/// The unique directory means concurrent compiled-language executions can
/// never see each other's sources or binaries.
struct CompiledDriver {
    language: LanguageConfig,
    scratch_dir: PathBuf,
    compile_timeout: Duration,
}

#[async_trait]
impl Driver for CompiledDriver {
    async fn execute(
        &self,
        harness: &Harness,
        argv: &[String],
        deadline: Duration,
    ) -> Result<ExecutionResult, JudgeError> {
        let Harness::Compiled {
            driver_source,
            solution_source,
        } = harness
        else {
            return Err(JudgeError::Internal(anyhow!(
                "compiled driver received an interpreted harness"
            )));
        };

        let dir_name = format!(
            "{}-{}-{}",
            self.language.name,
            Local::now().format("%y%m%d-%H-%M-%S"),
            Uuid::new_v4()
        );
        let work_dir = self.scratch_dir.join(dir_name);
        tokio::fs::create_dir_all(&work_dir)
            .await
            .with_context(|| format!("failed to create work dir {}", work_dir.display()))?;

        let result = self
            .compile_and_run(&work_dir, driver_source, solution_source, argv, deadline)
            .await;

        // The whole working directory is the artifact; remove it on every
        // exit path, including compile failures.
        remove_artifacts(std::slice::from_ref(&work_dir));
        result
    }
}

impl CompiledDriver {
    async fn compile_and_run(
        &self,
        work_dir: &Path,
        driver_source: &str,
        solution_source: &str,
        argv: &[String],
        deadline: Duration,
    ) -> Result<ExecutionResult, JudgeError> {
        tokio::fs::write(work_dir.join("Main.java"), driver_source)
            .await
            .context("failed to write driver source")?;
        tokio::fs::write(work_dir.join("Solution.java"), solution_source)
            .await
            .context("failed to write solution source")?;

        let compile_template = self
            .language
            .compile
            .as_ref()
            .ok_or_else(|| JudgeError::Internal(anyhow!("compiled driver without compile command")))?;
        let mut compile_command = build_command(compile_template, None, &[])?;
        compile_command.current_dir(work_dir);
        self.run_compiler(compile_command).await?;

        let mut run_command = build_command(&self.language.run, None, argv)?;
        run_command.current_dir(work_dir);
        Ok(supervise(run_command, &[], deadline).await)
    }

    /// Runs the build step. Unlike the run step, failure is decided by the
    /// exit status, and the compiler's diagnostic text is surfaced verbatim.
    async fn run_compiler(&self, mut command: Command) -> Result<(), JudgeError> {
        command.stdin(Stdio::null()).kill_on_drop(true);

        match timeout(self.compile_timeout, command.output()).await {
            Err(_) => Err(JudgeError::CompileTimeout(self.compile_timeout)),
            Ok(Err(e)) => Err(JudgeError::Spawn(e.to_string())),
            Ok(Ok(output)) => {
                if output.status.success() {
                    Ok(())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    let diagnostic = if stderr.trim().is_empty() {
                        String::from_utf8_lossy(&output.stdout).trim().to_string()
                    } else {
                        stderr.trim().to_string()
                    };
                    Err(JudgeError::Compilation(diagnostic))
                }
            }
        }
    }
}

/// Resolves a command template into a runnable command. `%FILE%` expands to
/// the harness path, `%ARGS%` splices in the process arguments.
fn build_command(
    template: &[String],
    file: Option<&Path>,
    argv: &[String],
) -> Result<Command, JudgeError> {
    let mut resolved: Vec<String> = Vec::with_capacity(template.len() + argv.len());
    for part in template {
        if part == "%ARGS%" {
            resolved.extend(argv.iter().cloned());
        } else if let Some(path) = file {
            resolved.push(part.replace("%FILE%", &path.to_string_lossy()));
        } else {
            resolved.push(part.clone());
        }
    }

    let (program, args) = resolved
        .split_first()
        .ok_or_else(|| JudgeError::Internal(anyhow!("empty command template")))?;
    let mut command = Command::new(program);
    command.args(args);
    Ok(command)
}
