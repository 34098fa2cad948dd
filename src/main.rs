//! gowershell-client binary entry point.

use std::process::ExitCode;

use gowershell_client::cli::{self, Args};
use gowershell_client::config::Config;
use gowershell_client::{logging, CommandDispatcher, CommandRequest, ResponseEnvelope};
use tracing::{debug, info};

const EXIT_FAILURE: u8 = 1;
const EXIT_USAGE: u8 = 2;
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Try 'gowershell-client --help' for more information.");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(EXIT_USAGE);
        }
    };
    let session_config = match config.to_session_config() {
        Ok(session_config) => session_config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let _ = logging::init_with_filter(config.log_filter());
    info!("gowershell-client v{}", env!("CARGO_PKG_VERSION"));
    debug!("helper: {}", session_config.executable.display());

    run(&args, session_config).await
}

async fn run(args: &Args, session_config: gowershell_client::SessionConfig) -> ExitCode {
    let requests = args.requests();
    let concurrent = args.concurrent;

    let batch = CommandDispatcher::scoped(session_config, |shell| {
        let requests = requests.clone();
        async move { shell.run_batch(&requests, concurrent).await }
    });

    let results = tokio::select! {
        outcome = batch => outcome.and_then(|inner| inner),
        _ = tokio::signal::ctrl_c() => {
            eprintln!("interrupted");
            return ExitCode::from(EXIT_INTERRUPTED);
        }
    };

    let results = match results {
        Ok(results) => results,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    for (request, result) in requests.iter().zip(&results) {
        report(request, result, args.json);
    }

    if results.iter().all(ResponseEnvelope::success) {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FAILURE)
    }
}

fn report(request: &CommandRequest, result: &ResponseEnvelope, json: bool) {
    if json {
        match serde_json::to_string(result) {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("error: failed to encode result: {}", e),
        }
        return;
    }

    if let Some(output) = result.output().filter(|o| !o.is_empty()) {
        if output.ends_with('\n') {
            print!("{}", output);
        } else {
            println!("{}", output);
        }
    }
    if let Some(error) = result.error().filter(|e| !e.is_empty()) {
        eprintln!("error [{}]: {}", request.command, error);
    }
}
