//! DupeCleaner entry point.

use clap::Parser;
use dupecleaner::{
    cli::Cli,
    error::{ExitCode, StructuredError},
    scan::ScanError,
};

fn main() {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;

    match dupecleaner::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let exit_code = match err.downcast_ref::<ScanError>() {
                Some(ScanError::RootNotFound(_) | ScanError::NotADirectory(_)) | None => {
                    ExitCode::GeneralError
                }
                Some(_) => ExitCode::ToolFailure,
            };

            if json_errors {
                let structured = StructuredError::new(&err, exit_code);
                if let Ok(json) = serde_json::to_string_pretty(&structured) {
                    eprintln!("{}", json);
                } else {
                    eprintln!("[{}] Error: {}", exit_code.code_prefix(), err);
                }
            } else {
                eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
            }

            std::process::exit(exit_code.as_i32());
        }
    }
}
