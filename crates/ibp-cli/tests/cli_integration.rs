//! Subprocess tests against the real `ibp-reduce` binary: exercise the
//! process boundary (argv, exit code, stderr) rather than the library
//! surface `ibp-cli`'s unit tests already cover.

use std::path::PathBuf;
use std::process::Command;

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ibp-reduce"))
}

struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(tag: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "ibp-cli-integration-{tag}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&path).unwrap();
        TempDir { path }
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

const BUBBLE: &str = r#"
    [family]
    name = "bubble"
    dimension = "D"
    internals = ["k1"]
    externals = ["p1"]
    invariants = [["s", 1], ["m", 1]]
    invar_one = "m"
    sp_rules = [["p1", "p1", "s"]]
    propagators = [["k1", "m"], ["k1+p1", "m"]]

    [reduce]
    targets = [[1, 1]]
"#;

#[test]
fn no_arguments_fails_with_usage_message() {
    let output = Command::new(bin()).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("Error: usage: ibp-reduce"));
}

#[test]
fn missing_config_file_fails_with_single_error_line() {
    let output = Command::new(bin())
        .arg("/nonexistent/does-not-exist.toml")
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.lines().count(), 1);
    assert!(stderr.starts_with("Error: "));
}

#[test]
fn valid_config_succeeds_and_writes_result_file() {
    let dir = TempDir::new("bubble");
    let config_path = dir.path.join("bubble.toml");
    std::fs::write(&config_path, BUBBLE).unwrap();

    let output = Command::new(bin())
        .arg(&config_path)
        .current_dir(&dir.path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let result_path = dir.path.join("result_3");
    let contents = std::fs::read_to_string(&result_path).unwrap();
    assert!(contents.contains("1 * "));
}
