//! CLI parse tests.

use super::{Cli, CliCommand};
use clap::Parser;

pub(super) fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}


#[test]
fn cli_parse_global_config() {
    let cli =
        Cli::try_parse_from(["logoprep", "upload", "out.csv", "--config", "/etc/lp.toml"])
            .unwrap();
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/etc/lp.toml")));
    let cli = Cli::try_parse_from(["logoprep", "--config", "lp.toml", "download", "orgs.csv"])
        .unwrap();
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("lp.toml")));
}

#[test]
fn cli_requires_subcommand() {
    assert!(Cli::try_parse_from(["logoprep"]).is_err());
}
