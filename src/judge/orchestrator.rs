use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;

use crate::config::{Config, LanguageConfig, ProblemConfig};

use super::compare::outputs_equivalent;
use super::driver::driver_for;
use super::harness::{self, Harness};
use super::{ExecutionRequest, ExecutionResult, JudgeError};

/// Outcome of one test case within a graded submission.
#[derive(Debug, Clone, Serialize)]
pub struct CaseOutcome {
    pub passed: bool,
    pub actual_output: Option<String>,
    pub expected_output: String,
    pub error: Option<String>,
}

/// Aggregate verdict of grading a submission against all of a problem's
/// test cases, in declared order. Score awarding and leaderboard updates
/// belong to the contest collaborator; this record only triggers them.
#[derive(Debug, Clone, Serialize)]
pub struct GradeVerdict {
    pub cases: Vec<CaseOutcome>,
    pub all_passed: bool,
}

impl GradeVerdict {
    /// Verdict for a submission rejected before any case could run
    /// (unknown problem or language).
    fn rejected() -> Self {
        Self {
            cases: Vec::new(),
            all_passed: false,
        }
    }
}

/// Single entry point of the execution core.
///
/// Holds the validated configuration and the scratch directory, which is
/// created idempotently on construction and used exclusively for transient
/// per-execution artifacts.
pub struct Judge {
    config: Config,
    scratch_dir: PathBuf,
    run_timeout: Duration,
    compile_timeout: Duration,
}

impl Judge {
    pub fn new(config: Config) -> Result<Self> {
        let scratch_dir = match &config.judge.scratch_dir {
            Some(dir) => dir.clone(),
            None => default_scratch_dir()?,
        };
        std::fs::create_dir_all(&scratch_dir)
            .with_context(|| format!("failed to create scratch dir {}", scratch_dir.display()))?;
        log::info!("Judge scratch directory: {}", scratch_dir.display());

        Ok(Self {
            run_timeout: Duration::from_millis(config.judge.run_timeout_ms),
            compile_timeout: Duration::from_millis(config.judge.compile_timeout_ms),
            config,
            scratch_dir,
        })
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Runs one ad hoc input and returns the result untouched — no grading,
    /// no persisted state. Total: every error kind folds into a `Failure`.
    pub async fn run_one(&self, request: &ExecutionRequest) -> ExecutionResult {
        match self.execute(request, &request.argument_input).await {
            Ok(result) => result,
            Err(e) => {
                log::debug!("Ad hoc run failed before execution: {e}");
                e.into()
            }
        }
    }

    /// Grades the submission against every declared test case, strictly in
    /// declared order and sequentially. A crash on one case is recorded as a
    /// failed case and never aborts grading of the rest.
    pub async fn grade_all(&self, request: &ExecutionRequest) -> GradeVerdict {
        let problem = match self.find_problem(request.problem_id) {
            Ok(problem) => problem,
            Err(e) => {
                log::warn!("Submission rejected: {e}");
                return GradeVerdict::rejected();
            }
        };
        if let Err(e) = self.find_language(&request.language) {
            log::warn!("Submission rejected: {e}");
            return GradeVerdict::rejected();
        }

        let mut cases = Vec::with_capacity(problem.cases.len());
        for case in &problem.cases {
            let outcome = match self.execute(request, &case.input).await {
                Ok(ExecutionResult::Success { output }) => {
                    let passed = outputs_equivalent(
                        &output,
                        &case.expected_output,
                        problem.order_insensitive_numeric,
                    );
                    CaseOutcome {
                        passed,
                        actual_output: Some(output),
                        expected_output: case.expected_output.clone(),
                        error: None,
                    }
                }
                Ok(ExecutionResult::Failure { message }) => failed_case(case, message),
                Err(e) => failed_case(case, e.to_string()),
            };
            cases.push(outcome);
        }

        let all_passed = cases.iter().all(|c| c.passed);
        GradeVerdict { cases, all_passed }
    }

    /// One full pipeline pass: resolve context, validate input, generate the
    /// harness, select the driver, execute under the deadline.
    async fn execute(
        &self,
        request: &ExecutionRequest,
        argument_input: &str,
    ) -> Result<ExecutionResult, JudgeError> {
        let problem = self.find_problem(request.problem_id)?;
        let language = self.find_language(&request.language)?;

        // Malformed input fails here, before any artifact or process exists.
        let decoded_args = harness::decode_argument_vector(argument_input)?;

        let harness = harness::generate(language.harness, &request.source_code, problem)?;
        let argv = match &harness {
            Harness::Interpreted { .. } => vec![harness::wrapped_argument(argument_input)],
            Harness::Compiled { .. } => {
                let schema = problem
                    .schema
                    .as_ref()
                    .ok_or_else(|| JudgeError::MissingSchema(problem.title.clone()))?;
                harness::reformat_compiled_args(&decoded_args, schema)?
            }
        };

        let driver = driver_for(language, &self.scratch_dir, self.compile_timeout);
        driver.execute(&harness, &argv, self.run_timeout).await
    }

    fn find_problem(&self, problem_id: u32) -> Result<&ProblemConfig, JudgeError> {
        self.config
            .problems
            .iter()
            .find(|p| p.id == problem_id)
            .ok_or(JudgeError::UnknownProblem(problem_id))
    }

    fn find_language(&self, name: &str) -> Result<&LanguageConfig, JudgeError> {
        self.config
            .languages
            .iter()
            .find(|l| l.name == name)
            .ok_or_else(|| JudgeError::UnsupportedLanguage(name.to_string()))
    }
}

fn failed_case(case: &crate::config::TestCaseConfig, message: String) -> CaseOutcome {
    CaseOutcome {
        passed: false,
        actual_output: None,
        expected_output: case.expected_output.clone(),
        error: Some(message),
    }
}

fn default_scratch_dir() -> Result<PathBuf> {
    use directories::ProjectDirs;

    let proj_dirs = ProjectDirs::from("", "", "judgelet")
        .ok_or_else(|| anyhow!("Unable to find user directory"))?;
    Ok(proj_dirs.cache_dir().join("scratch"))
}
