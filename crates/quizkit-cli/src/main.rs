//! quizkit CLI — grading, test validation, and gateway sessions.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use quizkit_core::grading::CreditPolicy;

mod commands;

#[derive(Parser)]
#[command(name = "quizkit", version, about = "Quiz grading and session toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade attempts against a test
    Grade {
        /// Test definition (.toml or .json)
        #[arg(long)]
        test: PathBuf,

        /// Attempt JSON: one attempt or an array of attempts
        #[arg(long)]
        attempts: PathBuf,

        /// Partial-credit policy (overrides config): symmetric-difference, all-or-nothing
        #[arg(long)]
        policy: Option<CreditPolicy>,

        /// Remark identifying this publication of the test
        #[arg(long, default_value = "")]
        remark: String,

        /// Write the graded test instance as JSON
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Summarize a graded test instance
    Summarize {
        /// Test instance JSON written by `grade --output`
        #[arg(long)]
        instance: PathBuf,

        /// Only show what this student may see
        #[arg(long)]
        student: Option<String>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate test definition files
    Validate {
        /// Path to a test file or directory
        #[arg(long)]
        test: PathBuf,
    },

    /// Sign in at the gateway and store the session
    Login {
        #[arg(long)]
        username: String,

        /// Password (falls back to QUIZKIT_PASSWORD)
        #[arg(long, env = "QUIZKIT_PASSWORD", hide_env_values = true)]
        password: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Renew the stored token once
    Refresh {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Keep the stored token fresh until interrupted or the session ends
    Keepalive {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the stored identity
    Whoami {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Forget the stored session
    Logout {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example test
    Init,
}

// Single-threaded: `login` stops the refresh cycle it starts before that
// cycle gets a chance to run.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("quizkit=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Grade {
            test,
            attempts,
            policy,
            remark,
            output,
            format,
            config,
        } => commands::grade::execute(test, attempts, policy, remark, output, format, config),
        Commands::Summarize {
            instance,
            student,
            format,
        } => commands::summarize::execute(instance, student, format),
        Commands::Validate { test } => commands::validate::execute(test),
        Commands::Login {
            username,
            password,
            config,
        } => commands::session::login(username, password, config).await,
        Commands::Refresh { config } => commands::session::refresh(config).await,
        Commands::Keepalive { config } => commands::session::keepalive(config).await,
        Commands::Whoami { config } => commands::session::whoami(config),
        Commands::Logout { config } => commands::session::logout(config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
