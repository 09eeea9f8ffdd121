use clap::Parser;
use finclusion_cli::{Cli, Commands};
use std::path::PathBuf;

#[test]
fn cli_parses_serve_flags() {
    let cli = Cli::parse_from([
        "finclusion",
        "serve",
        "--model-path",
        "/models/financial_model.json",
        "--port",
        "9000",
        "--host",
        "127.0.0.1",
    ]);
    let Commands::Serve(cmd) = cli.command else {
        panic!("expected serve command");
    };
    assert_eq!(cmd.port, Some(9000));
    assert_eq!(cmd.host.as_deref(), Some("127.0.0.1"));

    let config = cmd.resolve_config().unwrap();
    assert_eq!(config.socket_addr(), "127.0.0.1:9000");
    assert_eq!(config.model_path, PathBuf::from("/models/financial_model.json"));
}

#[test]
fn cli_parses_predict_flags_with_spaces() {
    let cli = Cli::parse_from([
        "finclusion",
        "predict",
        "--country",
        "Kenya",
        "--relationship-with-head",
        "Head of Household",
        "--marital-status",
        "Single/Never Married",
        "--json",
    ]);
    let Commands::Predict(cmd) = cli.command else {
        panic!("expected predict command");
    };
    assert!(cmd.json);
    assert_eq!(cmd.country.as_deref(), Some("Kenya"));
    assert_eq!(cmd.relationship_with_head.as_deref(), Some("Head of Household"));
    assert_eq!(cmd.marital_status.as_deref(), Some("Single/Never Married"));
    assert!(cmd.job_type.is_none());
}

#[test]
fn cli_parses_schema() {
    let cli = Cli::parse_from(["finclusion", "schema", "--pretty"]);
    assert!(matches!(cli.command, Commands::Schema(cmd) if cmd.pretty));
}

#[test]
fn cli_rejects_unknown_subcommand() {
    assert!(Cli::try_parse_from(["finclusion", "train"]).is_err());
}
