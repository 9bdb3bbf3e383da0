//! pmatch CLI: driving adapter for the pmatch engine.
//!
//! Subcommands:
//! - `eval <config> --subject <json> [--scope <json>]`: evaluate a match expression
//! - `check <config>`: validate that the config loads
//! - `info`: print registered extractors, predicates, guards and constants
//!
//! Logging goes to stderr, filtered by `PMATCH_LOG` (default `warn`).

use std::process;

use pmatch::{Bindings, MatchConfig, Registry, Scope, Value};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    init_logging();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "eval" => cmd_eval(&args[2..]),
        "check" => cmd_check(&args[2..]),
        "info" => cmd_info(),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("error: unknown command \"{other}\"");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("PMATCH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_eval(args: &[String]) -> Result<(), String> {
    if args.is_empty() {
        return Err("eval requires a config file path".into());
    }

    let config_path = &args[0];
    let options = parse_eval_options(&args[1..])?;

    let config = load_config(config_path)?;
    let (body, bindings) = evaluate(&build_registry(), config, &options)?;

    println!("{body}");
    println!("{bindings}");
    Ok(())
}

fn cmd_check(args: &[String]) -> Result<(), String> {
    if args.is_empty() {
        return Err("check requires a config file path".into());
    }

    let config_path = &args[0];
    let config = load_config(config_path)?;
    let registry = build_registry();

    registry
        .load_match(config)
        .map_err(|e| format!("config invalid: {e}"))?;

    println!("Config valid");
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Uniform return type for all commands
fn cmd_info() -> Result<(), String> {
    let registry = build_registry();

    let sections = [
        ("Registered extractors", registry.extractor_type_urls()),
        ("Registered predicates", registry.predicate_names()),
        ("Registered guards", registry.guard_names()),
        ("Registered constants", registry.constant_names()),
    ];
    for (i, (title, names)) in sections.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{title}:");
        for name in names {
            println!("  {name}");
        }
    }

    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry assembly (composition root)
// ═══════════════════════════════════════════════════════════════════════════════

fn build_registry() -> Registry {
    let builder = pmatch::RegistryBuilder::new();
    pmatch_test::register(builder).build()
}

/// Load, evaluate, and render the selection as `(body, bindings JSON)`.
fn evaluate(
    registry: &Registry,
    config: MatchConfig<String>,
    options: &EvalOptions,
) -> Result<(String, serde_json::Value), String> {
    let expr = registry
        .load_match(config)
        .map_err(|e| format!("config load failed: {e}"))?;

    let subject = Value::from(options.subject.clone());
    let scope = Scope::from_bindings(options.scope.clone());

    let selection = expr.evaluate(&subject, &scope).map_err(|e| e.to_string())?;
    debug!(
        clause = ?selection.clause,
        default = selection.is_default(),
        "selected"
    );
    Ok((
        selection.body.clone(),
        Value::from(selection.bindings).to_json(),
    ))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Config loading
// ═══════════════════════════════════════════════════════════════════════════════

fn load_config(path: &str) -> Result<MatchConfig<String>, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("failed to read \"{path}\": {e}"))?;

    let is_json = std::path::Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    debug!(path, is_json, "loading config");
    parse_config(&content, is_json)
}

fn parse_config(content: &str, is_json: bool) -> Result<MatchConfig<String>, String> {
    if is_json {
        serde_json::from_str(content).map_err(|e| format!("JSON parse error: {e}"))
    } else {
        // Default to YAML (handles .yaml and .yml)
        serde_yaml::from_str(content).map_err(|e| format!("YAML parse error: {e}"))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Argument parsing
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
struct EvalOptions {
    subject: serde_json::Value,
    scope: Bindings,
}

fn parse_eval_options(args: &[String]) -> Result<EvalOptions, String> {
    let mut subject = None;
    let mut scope = Bindings::new();
    let mut i = 0;

    while i < args.len() {
        let flag = args[i].as_str();
        let value = || {
            args.get(i + 1)
                .ok_or_else(|| format!("{flag} requires a JSON value"))
        };
        match flag {
            "--subject" => {
                let raw = value()?;
                subject = Some(
                    serde_json::from_str(raw)
                        .map_err(|e| format!("invalid --subject JSON \"{raw}\": {e}"))?,
                );
            }
            "--scope" => {
                let raw = value()?;
                let json: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)
                    .map_err(|e| format!("invalid --scope \"{raw}\", expected a JSON object: {e}"))?;
                scope = json.into_iter().map(|(k, v)| (k, Value::from(v))).collect();
            }
            other => return Err(format!("unexpected argument \"{other}\"")),
        }
        i += 2;
    }

    Ok(EvalOptions {
        subject: subject.ok_or("eval requires --subject <json>")?,
        scope,
    })
}

fn print_usage() {
    eprintln!(
        "Usage: pmatch <command> [options]

Commands:
  eval <config> --subject <json> [--scope <json>]   Evaluate a match expression
  check <config>                                    Validate config
  info                                              Print registered names
  help                                              Show this help

Environment:
  PMATCH_LOG   log filter (default: warn), e.g. PMATCH_LOG=pmatch=trace"
    );
}
