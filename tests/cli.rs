use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    write(root, "package.json", r#"{"dependencies": {"react": "18.2.0"}}"#);
    write(root, "src/a.ts", "import { b } from './b';\n\nexport const a = () => b();\n");
    write(
        root,
        "src/b.ts",
        "export function b(): number {\n  return 42;\n}\n",
    );
    write(root, "src/c.ts", "export const c = 3;\n");
    write(root, ".env", "API_KEY=hunter2\n");
    write(root, "dist/out.js", "console.log('built');\n");

    tmp
}

fn contextify() -> Command {
    Command::cargo_bin("contextify").unwrap()
}

#[test]
fn test_scope_text_output() {
    let tmp = setup_test_project();

    contextify()
        .arg("scope")
        .arg("add logout")
        .arg("--path")
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("# Request: add logout"))
        .stdout(predicate::str::contains("FILE: src/a.ts"))
        .stdout(predicate::str::contains("ROLE: config"))
        .stdout(predicate::str::contains("hunter2").not())
        .stdout(predicate::str::contains("dist/out.js").not());
}

#[test]
fn test_scope_json_tree_shake() {
    let tmp = setup_test_project();

    let output = contextify()
        .current_dir(tmp.path())
        .args(["scope", "--target", "src/a.ts", "--tree-shake", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let files = json["files"].as_array().unwrap();
    let paths: Vec<&str> = files.iter().map(|f| f["path"].as_str().unwrap()).collect();
    assert_eq!(paths, vec!["src/a.ts", "src/b.ts"]);
    assert_eq!(files[0]["role"], "target");
    assert_eq!(files[1]["role"], "dependency");
    assert_eq!(json["files_shown"], 2);
}

#[test]
fn test_scope_xml_output() {
    let tmp = setup_test_project();

    contextify()
        .current_dir(tmp.path())
        .args(["scope", "--format", "xml", "--hard-lock"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<?xml"))
        .stdout(predicate::str::contains("<tech>Library (React): 18.2.0</tech>"))
        .stdout(predicate::str::contains(r#"path="src/b.ts""#));
}

#[test]
fn test_skeleton_context() {
    let tmp = setup_test_project();

    contextify()
        .current_dir(tmp.path())
        .args(["scope", "--target", "src/a.ts", "--skeleton-context"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MODE: skeleton"))
        .stdout(predicate::str::contains("export function b(): number { ... }"))
        .stdout(predicate::str::contains("return 42").not());
}

#[test]
fn test_tree_shake_requires_target() {
    let tmp = setup_test_project();

    contextify()
        .current_dir(tmp.path())
        .args(["scope", "--tree-shake"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--tree-shake requires --target"));
}

#[test]
fn test_missing_target() {
    let tmp = setup_test_project();

    contextify()
        .current_dir(tmp.path())
        .args(["scope", "--target", "src/missing.ts"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("target file not found"));
}

#[test]
fn test_invalid_format() {
    let tmp = setup_test_project();

    contextify()
        .current_dir(tmp.path())
        .args(["scope", "--format", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid format"));
}

#[test]
fn test_tree_flat() {
    let tmp = setup_test_project();

    contextify()
        .args(["tree", "--flat", "--no-color", "--target", "src/c.ts", "--path"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[target]     src/c.ts\n"))
        .stdout(predicate::str::contains("[config]     package.json"));
}

#[test]
fn test_tree_nested() {
    let tmp = setup_test_project();

    contextify()
        .current_dir(tmp.path())
        .args(["tree", "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("├── [config]     package.json"))
        .stdout(predicate::str::contains("└── src/"))
        .stdout(predicate::str::contains("    ├── [normal]     a.ts"));
}

#[test]
fn test_repo_config_caps_files() {
    let tmp = setup_test_project();
    write(tmp.path(), ".contextify.toml", "max_files = 1\nno_color = true\n");

    let output = contextify()
        .current_dir(tmp.path())
        .args(["tree", "--flat"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout, "[config]     package.json\n");
}

#[test]
fn test_profile() {
    let tmp = setup_test_project();

    contextify()
        .current_dir(tmp.path())
        .arg("profile")
        .assert()
        .success()
        .stdout(predicate::str::contains("Framework: React"))
        .stdout(predicate::str::contains("Library (React): 18.2.0"));
}
