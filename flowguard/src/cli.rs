// flowguard/src/cli.rs

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "flowguard")]
#[command(about = "Static validator for DDD flow-spec corpora", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Project directory (defaults to current directory). Used when no
    /// subcommand is given — equivalent to `flowguard check`.
    #[arg(default_value = ".")]
    pub project_dir: PathBuf,

    /// Output format for the driver's terminal summary.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Walk a project's specs/ directory and emit the compatibility and
    /// quality reports.
    Check {
        /// Project directory
        #[arg(default_value = ".")]
        project_dir: PathBuf,
    },

    /// Validate a single flow file against one domain's configuration.
    Flow {
        /// Path to the flow YAML file
        path: PathBuf,

        /// Domain id the flow belongs to
        #[arg(long)]
        domain: String,

        /// Directory containing domain.yaml files, used to resolve
        /// sub_flow cross-references (defaults to the flow's grandparent
        /// `domains` directory)
        #[arg(long)]
        domains_dir: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
