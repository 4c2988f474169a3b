use crate::config::PolicyKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Eidos - infer prop types and generate fixtures for a component sandbox
#[derive(Parser, Debug, Clone)]
#[command(name = "eidos", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "EIDOS_CONFIG", default_value = "eidos.toml")]
    pub config: PathBuf,

    /// Directory of component declarations
    #[arg(long, env = "EIDOS_COMPONENTS_DIR")]
    pub components_dir: Option<PathBuf>,

    /// Directory of fixture files
    #[arg(long, env = "EIDOS_FIXTURES_DIR")]
    pub fixtures_dir: Option<PathBuf>,

    /// Value generation policy
    #[arg(long, env = "EIDOS_POLICY", value_enum)]
    pub policy: Option<PolicyKind>,

    /// Seed for the random policy
    #[arg(long, env = "EIDOS_SEED")]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List the declared components
    List,
    /// Print the inferred prop types of a component
    Infer { component: String },
    /// Generate fixture instances for a component
    Generate {
        component: String,
        /// Number of instances to generate
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
        /// Write the fixtures back to the fixture store
        #[arg(long)]
        save: bool,
    },
    /// Validate every stored instance of a component
    Check { component: String },
    /// Print the stored instances as JavaScript literals
    Show { component: String },
    /// Print the editor form for one instance
    Form {
        component: String,
        #[arg(default_value_t = 0)]
        instance: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["eidos", "list"]);
        assert_eq!(cli.config, PathBuf::from("eidos.toml"));
        assert!(cli.components_dir.is_none());
        assert!(cli.fixtures_dir.is_none());
        assert!(cli.policy.is_none());
        assert!(cli.seed.is_none());
        assert_eq!(cli.command, Command::List);
    }

    #[test]
    fn test_cli_with_args() {
        let cli = Cli::parse_from([
            "eidos",
            "--config",
            "custom.toml",
            "--components-dir",
            "ui/components",
            "--policy",
            "random",
            "--seed",
            "42",
            "generate",
            "Button",
            "-n",
            "3",
            "--save",
        ]);
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert_eq!(cli.components_dir, Some(PathBuf::from("ui/components")));
        assert_eq!(cli.policy, Some(PolicyKind::Random));
        assert_eq!(cli.seed, Some(42));
        assert_eq!(
            cli.command,
            Command::Generate {
                component: "Button".to_string(),
                count: 3,
                save: true,
            }
        );
    }

    #[test]
    fn test_form_instance_defaults_to_first() {
        let cli = Cli::parse_from(["eidos", "form", "Card"]);
        assert_eq!(
            cli.command,
            Command::Form {
                component: "Card".to_string(),
                instance: 0,
            }
        );
    }
}
