use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "judgelet", version = "1.0", about, long_about = None)]
pub struct CliArgs {
    /// Path to the configuration file
    #[arg(long = "config", short = 'c')]
    pub config_path: String,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand)]
pub enum CliCommand {
    /// Execute code once against an ad hoc argument input
    Run {
        /// Language name as declared in the configuration
        #[arg(long)]
        language: String,

        /// Problem id as declared in the configuration
        #[arg(long)]
        problem: u32,

        /// Path to the user's source file
        #[arg(long = "code")]
        code_path: String,

        /// Argument input: JSON values, comma-joined (e.g. "[2,7,11,15],9")
        #[arg(long)]
        input: String,
    },

    /// Grade code against every declared test case of a problem
    Grade {
        /// Language name as declared in the configuration
        #[arg(long)]
        language: String,

        /// Problem id as declared in the configuration
        #[arg(long)]
        problem: u32,

        /// Path to the user's source file
        #[arg(long = "code")]
        code_path: String,
    },
}

impl CliArgs {
    /// Load the configuration from the specified file
    pub fn to_config(&self) -> std::io::Result<Config> {
        let file = std::fs::File::open(&self.config_path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| e.into())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default)]
    pub judge: JudgeConfig,
    pub problems: Vec<ProblemConfig>,
    pub languages: Vec<LanguageConfig>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct JudgeConfig {
    /// Wall-clock deadline for one child process, in milliseconds
    pub run_timeout_ms: u64,
    /// Deadline for the compiled-path build step, in milliseconds
    pub compile_timeout_ms: u64,
    /// Override for the scratch directory holding transient artifacts
    pub scratch_dir: Option<PathBuf>,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            run_timeout_ms: 5000,
            compile_timeout_ms: 30_000,
            scratch_dir: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ProblemConfig {
    pub id: u32,
    pub title: String,
    /// Ordered entry-point candidate names the generated harness probes for
    pub entry_points: Vec<String>,
    /// Opt-in: sort purely numeric array outputs before comparing.
    ///
    /// Off by default because it silently changes correctness semantics for
    /// problems where output order is significant.
    #[serde(default)]
    pub order_insensitive_numeric: bool,
    /// Entry signature for the compiled-language driver; a compiled-language
    /// submission for a problem without one is rejected.
    pub schema: Option<ProblemSchema>,
    pub cases: Vec<TestCaseConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TestCaseConfig {
    /// Argument input: JSON values, comma-joined
    pub input: String,
    pub expected_output: String,
}

/// Per-problem entry signature used to generate the compiled-language driver.
#[derive(Deserialize, Debug, Clone)]
pub struct ProblemSchema {
    /// Name of the solution method the driver invokes
    pub method: String,
    /// Ordered parameter types of the entry point
    pub params: Vec<ParamKind>,
    pub returns: ParamKind,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Int,
    Long,
    Double,
    Bool,
    String,
    IntArray,
    StringArray,
}

#[derive(Deserialize, Debug, Clone)]
pub struct LanguageConfig {
    pub name: String,
    /// Which harness generator this language uses
    pub harness: HarnessFlavor,
    /// Source file extension, without the dot
    pub extension: String,
    /// Compile command template; present only for compiled languages
    pub compile: Option<Vec<String>>,
    /// Run command template; `%FILE%` expands to the harness path and
    /// `%ARGS%` to the (possibly several) process arguments
    pub run: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HarnessFlavor {
    Javascript,
    Python,
    Java,
}
