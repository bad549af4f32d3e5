use clap::Parser;
use newsbrief_pipeline::{AnalysisRun, ProviderMode};

use super::*;

use crate::run::{mode, narration_or_notice, render_json};

#[test]
fn parses_analyze_command() {
    let cli = Cli::try_parse_from(["newsbrief", "analyze", "Tesla"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Analyze {
            ref company,
            offline: false,
            compact: false,
        } if company == "Tesla"
    ));
}

#[test]
fn parses_analyze_flags() {
    let cli = Cli::try_parse_from(["newsbrief", "analyze", "Acme Corp", "--offline", "--compact"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Analyze {
            offline: true,
            compact: true,
            ..
        }
    ));
}

#[test]
fn parses_narrate_command() {
    let cli = Cli::try_parse_from(["newsbrief", "narrate", "Acme", "--offline"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Narrate { offline: true, .. }
    ));
}

#[test]
fn missing_company_is_an_error() {
    assert!(Cli::try_parse_from(["newsbrief", "analyze"]).is_err());
}

#[test]
fn missing_subcommand_is_an_error() {
    assert!(Cli::try_parse_from(["newsbrief"]).is_err());
}

#[test]
fn fallback_run_prints_notice() {
    let run = AnalysisRun::fallback("Acme");
    assert_eq!(narration_or_notice(&run), "Acme: No valid articles found");
}

#[test]
fn narration_is_printed_without_trailing_newline() {
    let mut run = AnalysisRun::fallback("Acme");
    run.fallback = false;
    run.message = None;
    run.narration_text = Some("Analysis for Acme:\nA total of 1 articles were analyzed.\n".into());
    assert_eq!(
        narration_or_notice(&run),
        "Analysis for Acme:\nA total of 1 articles were analyzed."
    );
}

#[test]
fn compact_json_is_single_line() {
    let run = AnalysisRun::fallback("Acme");
    let compact = render_json(&run, true).expect("serialize");
    let pretty = render_json(&run, false).expect("serialize");
    assert!(!compact.contains('\n'));
    assert!(pretty.contains('\n'));
    assert!(compact.contains("\"fallback\":true"));
}

#[test]
fn offline_flag_selects_offline_providers() {
    assert_eq!(mode(true), ProviderMode::Offline);
    assert_eq!(mode(false), ProviderMode::Online);
}
