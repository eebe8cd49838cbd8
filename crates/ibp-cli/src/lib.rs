//! Thin library surface behind the `ibp-reduce` binary, split out so
//! integration tests can drive `run_cli` without spawning a subprocess for
//! every assertion.

use std::path::{Path, PathBuf};

/// Parse `argv` (excluding the program name) and run the reduction.
/// Returns `Ok(())` on success, or the single-line message that should be
/// printed as `Error: {msg}` with a non-zero exit code.
pub fn run_cli(args: &[String], out_dir: &Path) -> Result<(), String> {
    let config_path = parse_args(args)?;
    let output = ibp_core::driver::run(&config_path).map_err(|e| e.to_string())?;
    ibp_core::driver::write_results(out_dir, &output).map_err(|e| e.to_string())?;
    Ok(())
}

fn parse_args(args: &[String]) -> Result<PathBuf, String> {
    match args {
        [path] => Ok(PathBuf::from(path)),
        [] => Err("usage: ibp-reduce <config.toml>".to_string()),
        _ => Err("usage: ibp-reduce <config.toml> (exactly one argument expected)".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_argument() {
        assert!(parse_args(&[]).is_err());
    }

    #[test]
    fn rejects_extra_arguments() {
        let args = vec!["a.toml".to_string(), "b.toml".to_string()];
        assert!(parse_args(&args).is_err());
    }

    #[test]
    fn accepts_single_path() {
        let args = vec!["a.toml".to_string()];
        assert_eq!(parse_args(&args).unwrap(), PathBuf::from("a.toml"));
    }

    #[test]
    fn run_cli_reports_missing_file_as_error() {
        let args = vec!["/nonexistent/path/does-not-exist.toml".to_string()];
        let dir = std::env::temp_dir();
        assert!(run_cli(&args, &dir).is_err());
    }
}
