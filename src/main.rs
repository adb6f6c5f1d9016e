//! txquery - command-line front end.
//!
//! Parses a query string the way an inbound request would be parsed and
//! prints the resulting query plan. With `--dispatch` it also runs a named
//! operation through the transaction-scoped dispatcher against an in-memory
//! store and prints the store journal.

use std::process::ExitCode;

use http::Method;
use serde_json::json;

use txquery::config::Config;
use txquery::logging::setup_logging;
use txquery::query::QueryPlan;
use txquery::repository::{Operation, OperationTable, RepositoryError};
use txquery::request::{Request, RequestContext};
use txquery::store::MemoryStore;
use txquery::transaction::NestingMode;

struct Args {
    method: Method,
    model: String,
    query: String,
    dispatch: Option<String>,
    fail: bool,
    nesting: Option<NestingMode>,
    config: Option<String>,
    log_level: String,
    json_logs: bool,
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => return ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };

    setup_logging(&args.log_level, args.json_logs);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn parse_args() -> Result<Option<Args>, String> {
    let argv: Vec<String> = std::env::args().collect();

    let mut args = Args {
        method: Method::GET,
        model: "items".to_string(),
        query: String::new(),
        dispatch: None,
        fail: false,
        nesting: None,
        config: None,
        log_level: "warn".to_string(),
        json_logs: false,
    };

    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "-m" | "--method" => {
                i += 1;
                let raw = argv.get(i).ok_or("--method needs a value")?;
                args.method = Method::from_bytes(raw.to_uppercase().as_bytes())
                    .map_err(|_| format!("invalid method: {raw}"))?;
            }
            "--model" => {
                i += 1;
                args.model = argv.get(i).ok_or("--model needs a value")?.clone();
            }
            "--dispatch" => {
                i += 1;
                args.dispatch = Some(argv.get(i).ok_or("--dispatch needs a value")?.clone());
            }
            "--fail" => args.fail = true,
            "--nesting" => {
                i += 1;
                args.nesting = Some(argv.get(i).ok_or("--nesting needs a value")?.parse()?);
            }
            "-c" | "--config" => {
                i += 1;
                args.config = Some(argv.get(i).ok_or("--config needs a value")?.clone());
            }
            "-v" | "--verbose" => args.log_level = "txquery=debug".to_string(),
            "--json-logs" => args.json_logs = true,
            "-h" | "--help" => {
                print_help();
                return Ok(None);
            }
            "--version" => {
                println!("txquery v{}", env!("CARGO_PKG_VERSION"));
                return Ok(None);
            }
            arg if !arg.starts_with('-') => args.query = arg.to_string(),
            arg => return Err(format!("Unknown option: {arg}")),
        }
        i += 1;
    }

    Ok(Some(args))
}

fn print_help() {
    println!("txquery - request-scoped transactions and query-string shaping");
    println!();
    println!("Usage: txquery [OPTIONS] [QUERY_STRING]");
    println!();
    println!("Options:");
    println!("  -m, --method METHOD    Request method (default: GET)");
    println!("      --model NAME       Model name shown in the plan (default: items)");
    println!("      --dispatch OP      Dispatch store/update/delete or any other name");
    println!("      --fail             Make the dispatched operation fail");
    println!("      --nesting MODE     savepoints, flat or passthrough");
    println!("  -c, --config PATH      JSON configuration file");
    println!("  -v, --verbose          Log transaction events");
    println!("      --json-logs        Emit logs as JSON");
    println!("  -h, --help             Show this help message");
    println!("      --version          Show version");
    println!();
    println!("Examples:");
    println!("  txquery 'with=posts,author&sort=age|desc&paginate=true&per_page=20&page=2'");
    println!("  txquery -m POST --dispatch store 'with=posts'");
    println!("  txquery -m DELETE --dispatch archive");
}

/// Configuration file first, then `--nesting` if it was given.
fn load_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => Config::from_json(&std::fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    Ok(apply_overrides(config, args))
}

fn apply_overrides(config: Config, args: &Args) -> Config {
    match args.nesting {
        Some(nesting) => config.nesting(nesting),
        None => config,
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&args)?;
    let store = MemoryStore::new();
    let ctx = RequestContext::new(
        Request::parse(args.method.clone(), &args.query),
        store.clone(),
        config,
    );
    let _entered = ctx.span().clone().entered();

    let plan = ctx.shape(QueryPlan::new(&args.model))?;

    let dispatched = match &args.dispatch {
        Some(name) => {
            let fail = args.fail;
            let table: OperationTable<QueryPlan, (), String> = Operation::ALL
                .into_iter()
                .fold(OperationTable::new(), |table, op| {
                    table.register(op, move |plan: &QueryPlan, _| {
                        if fail {
                            Err(RepositoryError::Operation(format!("{op} failed")))
                        } else {
                            Ok(format!("{op} on {}", plan.model))
                        }
                    })
                });
            let result = ctx.dispatcher().dispatch(&table, &plan, name, ());
            Some(result.map_err(|e| e.to_string()))
        }
        None => None,
    };

    let output = json!({
        "method": args.method.as_str(),
        "read": ctx.is_read(),
        "options": ctx.options(),
        "plan": plan,
        "query": plan.to_string(),
        "dispatch": dispatched.map(|r| match r {
            Ok(message) => json!({"ok": message}),
            Err(message) => json!({"error": message}),
        }),
        "journal": store.journal(),
        "open_scopes": ctx.transactions().active_count(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(nesting: Option<NestingMode>) -> Args {
        Args {
            method: Method::GET,
            model: "items".to_string(),
            query: String::new(),
            dispatch: None,
            fail: false,
            nesting,
            config: None,
            log_level: "warn".to_string(),
            json_logs: false,
        }
    }

    #[test]
    fn test_config_nesting_survives_without_flag() {
        let config = Config::from_json(r#"{"nesting": "passthrough"}"#).unwrap();
        let config = apply_overrides(config, &args(None));
        assert_eq!(config.nesting, NestingMode::Passthrough);
    }

    #[test]
    fn test_nesting_flag_overrides_config() {
        let config = Config::from_json(r#"{"nesting": "passthrough"}"#).unwrap();
        let config = apply_overrides(config, &args(Some(NestingMode::Flat)));
        assert_eq!(config.nesting, NestingMode::Flat);
    }
}
