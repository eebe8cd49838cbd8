//! `ibp-reduce`: one positional argument (a config file path), exit code
//! 0 on success, a single-line `Error: ...` on stderr and a non-zero exit
//! otherwise.

use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cwd = std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));

    match ibp_cli::run_cli(&args, &cwd) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("Error: {msg}");
            ExitCode::FAILURE
        }
    }
}
