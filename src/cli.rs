// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::builder::FalseyValueParser;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use switchyard::deploy::{DeployOptions, LaunchMode};
use switchyard::error::{Error, Result};
use switchyard::types::Color;

#[derive(Parser)]
#[command(name = "switchyard")]
#[command(about = "Blue/green deployments for compose stacks behind a reverse proxy")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to switchyard.yml in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print warnings, errors and the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print events and the deployment report as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Deploy flags, for when no subcommand is given
    #[command(flatten)]
    pub deploy: DeployArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy to the inactive color and switch traffic to it (default)
    Deploy(DeployArgs),

    /// Show which color is serving and what the proxy config points at
    Status,

    /// Print the proxy config rendered for a color without touching anything
    Render {
        #[arg(long)]
        color: Color,
    },

    /// Write a starter switchyard.yml and proxy template
    Init {
        /// Overwrite an existing switchyard.yml
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct DeployArgs {
    /// Pull prebuilt images instead of building locally
    #[arg(long, env = "USE_PREBUILT", value_parser = FalseyValueParser::new())]
    pub use_prebuilt: bool,

    /// Re-encrypt every record, not only the ones still on an old key
    #[arg(long, env = "FORCE_REENCRYPT", value_parser = FalseyValueParser::new())]
    pub force_reencrypt: bool,

    /// Skip re-encryption entirely
    #[arg(long, env = "SKIP_REENCRYPT", value_parser = FalseyValueParser::new())]
    pub skip_reencrypt: bool,

    /// Break an existing deploy lock
    #[arg(long)]
    pub force_unlock: bool,
}

impl DeployArgs {
    /// Resolve the toggles. Both re-encryption toggles may be present as
    /// long as at most one of them is on.
    pub fn options(&self) -> Result<DeployOptions> {
        if self.force_reencrypt && self.skip_reencrypt {
            return Err(Error::InvalidConfig(
                "FORCE_REENCRYPT and SKIP_REENCRYPT cannot both be on".to_string(),
            ));
        }
        Ok(DeployOptions {
            mode: if self.use_prebuilt {
                LaunchMode::PullPrebuilt
            } else {
                LaunchMode::BuildLocal
            },
            force_reencrypt: self.force_reencrypt,
            skip_reencrypt: self.skip_reencrypt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_deploy() {
        temp_env::with_vars_unset(TOGGLES, || {
            let cli = Cli::try_parse_from(["switchyard", "--force-unlock"]).unwrap();
            assert!(cli.command.is_none());
            assert!(cli.deploy.force_unlock);
        });
    }

    const TOGGLES: [&str; 3] = ["USE_PREBUILT", "FORCE_REENCRYPT", "SKIP_REENCRYPT"];

    fn parse_deploy(args: &[&str]) -> DeployArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Some(Commands::Deploy(args)) => args,
            None => cli.deploy,
            _ => panic!("expected deploy"),
        }
    }

    #[test]
    fn deploy_flags_parse() {
        temp_env::with_vars_unset(TOGGLES, || {
            let args = parse_deploy(&[
                "switchyard",
                "deploy",
                "--use-prebuilt",
                "--skip-reencrypt",
            ]);
            assert!(args.use_prebuilt);
            assert!(args.skip_reencrypt);
            assert!(!args.force_reencrypt);

            let options = args.options().unwrap();
            assert_eq!(options.mode, LaunchMode::PullPrebuilt);
            assert!(options.skip_reencrypt);
        });
    }

    #[test]
    fn force_and_skip_reencrypt_both_on_is_rejected() {
        temp_env::with_vars_unset(TOGGLES, || {
            let args = parse_deploy(&[
                "switchyard",
                "deploy",
                "--force-reencrypt",
                "--skip-reencrypt",
            ]);
            let err = args.options().unwrap_err();
            assert!(err.to_string().contains("cannot both be on"));
        });
    }

    #[test]
    fn env_toggles_set_to_false_do_not_conflict() {
        temp_env::with_vars(
            [
                ("USE_PREBUILT", Some("0")),
                ("FORCE_REENCRYPT", Some("false")),
                ("SKIP_REENCRYPT", Some("true")),
            ],
            || {
                let args = parse_deploy(&["switchyard"]);
                assert!(!args.force_reencrypt);
                assert!(args.skip_reencrypt);

                let options = args.options().unwrap();
                assert_eq!(options.mode, LaunchMode::BuildLocal);
                assert!(options.skip_reencrypt);
                assert!(!options.force_reencrypt);
            },
        );
    }

    #[test]
    fn env_toggles_both_on_are_rejected() {
        temp_env::with_vars(
            [
                ("USE_PREBUILT", None),
                ("FORCE_REENCRYPT", Some("1")),
                ("SKIP_REENCRYPT", Some("yes")),
            ],
            || {
                assert!(parse_deploy(&["switchyard"]).options().is_err());
            },
        );
    }

    #[test]
    fn render_requires_a_known_color() {
        assert!(Cli::try_parse_from(["switchyard", "render", "--color", "red"]).is_err());
        let cli = Cli::try_parse_from(["switchyard", "render", "--color", "green"]).unwrap();
        match cli.command {
            Some(Commands::Render { color }) => assert_eq!(color, Color::Green),
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from(["switchyard", "status", "--json"]).unwrap();
        assert!(cli.json);
    }
}
