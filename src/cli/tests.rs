//! Unit tests for CLI argument parsing

use crate::cli::{Cli, Commands};
use clap::Parser;

#[test]
fn test_generate_defaults() {
    let cli = Cli::try_parse_from([
        "sdkgen",
        "generate",
        "--description",
        "widgets.yaml",
        "--output",
        "out",
    ])
    .unwrap();
    assert!(!cli.verbose);
    match cli.command {
        Commands::Generate {
            description,
            output,
            crate_name,
            edition,
            overwrite_cargo_toml,
            overwrite_lib_rs,
            dry_run,
            format,
            ..
        } => {
            assert_eq!(description.to_string_lossy(), "widgets.yaml");
            assert_eq!(output.to_string_lossy(), "out");
            assert!(crate_name.is_none());
            assert_eq!(edition, "2021");
            assert!(!overwrite_cargo_toml);
            assert!(!overwrite_lib_rs);
            assert!(!dry_run);
            assert!(!format);
        }
        _ => panic!("Expected Generate command"),
    }
}

#[test]
fn test_generate_with_flags() {
    let cli = Cli::try_parse_from([
        "sdkgen",
        "-v",
        "generate",
        "-d",
        "widgets.yaml",
        "-o",
        "out",
        "--crate-name",
        "widgets",
        "--crate-version",
        "1.2.3",
        "--workspace-dependencies",
        "--omit-header",
        "--dry-run",
        "--dependencies-config",
        "deps.toml",
    ])
    .unwrap();
    assert!(cli.verbose);
    match cli.command {
        Commands::Generate {
            crate_name,
            crate_version,
            workspace_dependencies,
            omit_header,
            dry_run,
            dependencies_config,
            ..
        } => {
            assert_eq!(crate_name.as_deref(), Some("widgets"));
            assert_eq!(crate_version.as_deref(), Some("1.2.3"));
            assert!(workspace_dependencies);
            assert!(omit_header);
            assert!(dry_run);
            assert_eq!(dependencies_config.unwrap().to_string_lossy(), "deps.toml");
        }
        _ => panic!("Expected Generate command"),
    }
}

#[test]
fn test_check_command() {
    let cli =
        Cli::try_parse_from(["sdkgen", "check", "--description", "w.json", "--deny-warnings"]).unwrap();
    match cli.command {
        Commands::Check {
            description,
            deny_warnings,
        } => {
            assert_eq!(description.to_string_lossy(), "w.json");
            assert!(deny_warnings);
        }
        _ => panic!("Expected Check command"),
    }
}

#[test]
fn test_generate_requires_output() {
    assert!(Cli::try_parse_from(["sdkgen", "generate", "--description", "w.yaml"]).is_err());
}
