//! Command-line argument parsing

use crate::error::handlers::ValidationErrorHandler;
use crate::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "registry-endpoints")]
#[command(about = "Push and inspect manifests and blobs on a Docker Registry v2")]
#[command(version, author)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Registry username
    #[arg(
        long = "username",
        short = 'u',
        global = true,
        help = "Username for registry authentication"
    )]
    pub username: Option<String>,

    /// Registry password
    #[arg(
        long = "password",
        short = 'p',
        global = true,
        help = "Password for registry authentication"
    )]
    pub password: Option<String>,

    /// Skip TLS verification
    #[arg(
        long = "skip-tls",
        short = 'k',
        global = true,
        help = "Skip TLS certificate verification"
    )]
    pub skip_tls: bool,

    /// Timeout in seconds for network operations
    #[arg(
        long = "timeout",
        short = 't',
        global = true,
        default_value = "300",
        help = "Timeout for network operations in seconds"
    )]
    pub timeout: u64,

    /// Verbose output
    #[arg(
        long = "verbose",
        short = 'v',
        global = true,
        help = "Enable verbose output"
    )]
    pub verbose: bool,

    /// Quiet mode
    #[arg(
        long = "quiet",
        short = 'q',
        global = true,
        conflicts_with = "verbose",
        help = "Suppress all output except errors"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Push a manifest file to a repository tag
    PushManifest {
        #[arg(
            long = "repository-url",
            short = 'r',
            help = "Full repository URL including registry, project, and tag"
        )]
        repository_url: String,

        #[arg(long = "file", short = 'f', help = "Path to the manifest JSON file")]
        file: PathBuf,
    },

    /// Pull a manifest and print it or save it to a file
    PullManifest {
        #[arg(
            long = "repository-url",
            short = 'r',
            help = "Full repository URL including registry, project, and tag"
        )]
        repository_url: String,

        #[arg(long = "output", short = 'o', help = "Write the manifest to this file")]
        output: Option<PathBuf>,
    },

    /// Check whether a blob exists in a repository
    CheckBlob {
        #[arg(
            long = "repository-url",
            short = 'r',
            help = "Full repository URL including registry and project"
        )]
        repository_url: String,

        #[arg(long = "digest", short = 'd', help = "Blob digest, e.g. sha256:<hex>")]
        digest: String,
    },
}

impl Command {
    pub fn repository_url(&self) -> &str {
        match self {
            Command::PushManifest { repository_url, .. }
            | Command::PullManifest { repository_url, .. }
            | Command::CheckBlob { repository_url, .. } => repository_url,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::PushManifest { .. } => "push-manifest",
            Command::PullManifest { .. } => "pull-manifest",
            Command::CheckBlob { .. } => "check-blob",
        }
    }
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate arguments
    pub fn validate(&self) -> Result<()> {
        ValidationErrorHandler::validate_repository_url(self.command.repository_url())?;
        ValidationErrorHandler::validate_credentials(&self.username, &self.password)?;
        ValidationErrorHandler::validate_timeout(self.timeout)?;
        Ok(())
    }
}
