//! Tests for the `globalize` binary.

use std::fs;
use std::process::Command;

fn globalize() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_globalize"));
    command.env_remove("RUST_LOG");
    command
}

#[test]
fn bundle_writes_output_and_source_map() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("util.js"), "export default 'foo';").unwrap();
    fs::write(
        dir.path().join("main.js"),
        "import util from './util';\nexport default util + ' bar';",
    )
    .unwrap();
    let output = dir.path().join("out.js");

    let result = globalize()
        .arg("bundle")
        .arg(dir.path().join("main.js"))
        .arg("-o")
        .arg(&output)
        .arg("--map")
        .arg("--global-name")
        .arg("lib")
        .output()
        .expect("failed to run globalize");
    assert!(
        result.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&result.stderr)
    );

    let content = fs::read_to_string(&output).unwrap();
    assert!(content.contains("this.lib.main = util + ' bar';"));
    assert!(content.trim_end().ends_with("//# sourceMappingURL=out.js.map"));

    let map: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("out.js.map")).unwrap()).unwrap();
    assert_eq!(map["file"], "out.js");
    assert_eq!(map["version"], 3);
}

#[test]
fn bundle_reports_compile_errors() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.js");
    fs::write(&input, "let s = 'unterminated").unwrap();

    let result = globalize().arg("bundle").arg(&input).output().unwrap();

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("Unterminated string literal"), "stderr: {stderr}");
}

#[test]
fn bundle_with_config_file_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main.js"), "import gone from './gone';\nexport default 1;").unwrap();
    let config = dir.path().join("globalize.json");
    fs::write(&config, r#"{ "onUnresolvedImport": "warn", "skipNamespaceInit": true }"#).unwrap();

    let result = globalize()
        .arg("bundle")
        .arg(dir.path().join("main.js"))
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    assert!(result.status.success());
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("this.myGlobals.main = 1;"));
    assert!(!stdout.contains("typeof this.myGlobals"));
    assert!(String::from_utf8_lossy(&result.stderr).contains("unresolved import"));
}

#[test]
fn parse_lists_module_declarations() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("m.js");
    fs::write(&input, "import a from './a';\nexport { a };").unwrap();

    let result = globalize().arg("parse").arg(&input).output().unwrap();

    assert!(result.status.success());
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("Module specifiers: [\"./a\"]"));
}

#[test]
fn config_bundle_name_wins_over_output_file_name() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main.js"), "export default 1;").unwrap();
    let config = dir.path().join("globalize.json");
    fs::write(&config, r#"{ "outputArtifactName": "app.bundle.js" }"#).unwrap();
    let output = dir.path().join("out.js");

    let result = globalize()
        .arg("bundle")
        .arg(dir.path().join("main.js"))
        .arg("--config")
        .arg(&config)
        .arg("-o")
        .arg(&output)
        .arg("--map")
        .output()
        .unwrap();
    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));

    let map: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("out.js.map")).unwrap()).unwrap();
    assert_eq!(map["file"], "app.bundle.js");
}

#[test]
fn compile_error_after_non_ascii_text_points_at_its_line() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.js");
    let source = format!("// {}\nexport {{ a from './x';\nlet padding = '{}';\n", "é".repeat(20), "x".repeat(40));
    fs::write(&input, source).unwrap();

    let result = globalize().arg("bundle").arg(&input).output().unwrap();

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("bad.js:2:"), "stderr: {stderr}");
}
