use crate::{Cli, Commands};

use std::path::PathBuf;

use clap::Parser;
use googletest::prelude::*;

#[test]
fn given_login_args_when_parsed_then_identifier_and_password_captured() {
    // When
    let cli = Cli::try_parse_from([
        "idsync",
        "login",
        "--identifier",
        "199001011234",
        "--password",
        "secret",
        "--pretty",
    ])
    .unwrap();

    // Then
    assert!(cli.pretty);
    let Commands::Login {
        identifier,
        password,
    } = cli.command
    else {
        panic!("expected login");
    };
    assert_that!(identifier, eq("199001011234"));
    assert_that!(password, eq("secret"));
}

#[test]
fn given_global_config_dir_after_subcommand_when_parsed_then_applied() {
    // When
    let cli = Cli::try_parse_from(["idsync", "normalize-id", "900101-1234", "--config-dir", "/tmp/idsync"])
        .unwrap();

    // Then
    assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp/idsync")));
    assert!(matches!(cli.command, Commands::NormalizeId { .. }));
}

#[test]
fn given_empty_first_name_when_parsed_then_accepted() {
    // When
    let cli = Cli::try_parse_from(["idsync", "normalize-name", "", "Doe"]).unwrap();

    // Then
    let Commands::NormalizeName { first, last } = cli.command else {
        panic!("expected normalize-name");
    };
    assert!(first.is_empty());
    assert_that!(last, eq("Doe"));
}

#[test]
fn given_unknown_subcommand_when_parsed_then_error() {
    assert!(Cli::try_parse_from(["idsync", "logout"]).is_err());
}
