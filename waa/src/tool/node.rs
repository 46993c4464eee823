//! Shared helpers for the Node.js-backed tools: `package.json` editing and
//! `npm install`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde_json::{Map, Value, json};
use tracing::debug;

use super::fs::Sandbox;
use crate::core::types::ToolResult;
use crate::io::process::{DEFAULT_OUTPUT_LIMIT, ProcessOutput, command, run_with_timeout};

pub const PACKAGE_NAME: &str = "waa-workspace";

/// Minimal manifest used when no `package.json` exists yet.
pub fn empty_package_json() -> Value {
    json!({
        "name": PACKAGE_NAME,
        "version": "1.0.0",
        "main": "index.js",
        "scripts": {},
        "dependencies": {},
        "devDependencies": {},
    })
}

/// Add `dev_dependencies` and `scripts` to the manifest at `path`, creating
/// it from [`empty_package_json`] when missing. Existing keys not mentioned
/// are preserved.
pub fn merge_package_json(
    path: &Path,
    dev_dependencies: &[(&str, &str)],
    scripts: &[(&str, &str)],
) -> Result<()> {
    let mut manifest = if path.exists() {
        let contents =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        serde_json::from_str::<Value>(&contents)
            .with_context(|| format!("parse {}", path.display()))?
    } else {
        empty_package_json()
    };
    let object = manifest
        .as_object_mut()
        .ok_or_else(|| anyhow!("{} is not a JSON object", path.display()))?;
    insert_all(object, "devDependencies", dev_dependencies)?;
    insert_all(object, "scripts", scripts)?;

    write_package_json(path, &manifest)
}

fn insert_all(object: &mut Map<String, Value>, section: &str, entries: &[(&str, &str)]) -> Result<()> {
    let target = object
        .entry(section.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| anyhow!("package.json {section} is not an object"))?;
    for (key, value) in entries {
        target.insert((*key).to_string(), Value::String((*value).to_string()));
    }
    Ok(())
}

pub fn write_package_json(path: &Path, manifest: &Value) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(manifest).context("serialize package.json")?;
    buf.push('\n');
    fs::write(path, buf).with_context(|| format!("write {}", path.display()))
}

/// Refusal for a `test_file` argument that is not a path inside the
/// sandbox. It ends up in argv, so a leading `-` is not allowed.
pub fn check_test_file(sandbox: &Sandbox, raw: &str) -> Option<ToolResult> {
    if raw.starts_with('-') {
        return Some(ToolResult::failure(format!(
            "Test file must be a path, not an option: {raw}"
        )));
    }
    match sandbox.resolve(raw) {
        Some(_) => None,
        None => Some(ToolResult::failure(format!(
            "Path is outside the working directory: {raw}"
        ))),
    }
}

pub fn npm_install(root: &Path, timeout: Duration) -> Result<ProcessOutput> {
    debug!(root = %root.display(), "running npm install");
    run_with_timeout(
        command("npm", &["install"], root),
        timeout,
        DEFAULT_OUTPUT_LIMIT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_creates_manifest_when_missing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("package.json");
        merge_package_json(&path, &[("jest", "^29.7.0")], &[("test", "jest tests/")])
            .expect("merge");
        let manifest: Value =
            serde_json::from_str(&fs::read_to_string(path).expect("read")).expect("json");
        assert_eq!(manifest["name"], PACKAGE_NAME);
        assert_eq!(manifest["devDependencies"]["jest"], "^29.7.0");
        assert_eq!(manifest["scripts"]["test"], "jest tests/");
    }

    #[test]
    fn merge_preserves_existing_entries() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(
            temp.path().join("package.json"),
            r#"{"name": "blog", "scripts": {"start": "node index.js"}, "dependencies": {"express": "^4"}}"#,
        )
        .expect("seed");
        merge_package_json(
            &temp.path().join("package.json"),
            &[("supertest", "^6.3.3")],
            &[("test", "jest tests/")],
        )
        .expect("merge");
        let manifest: Value = serde_json::from_str(
            &fs::read_to_string(temp.path().join("package.json")).expect("read"),
        )
        .expect("json");
        assert_eq!(manifest["name"], "blog");
        assert_eq!(manifest["scripts"]["start"], "node index.js");
        assert_eq!(manifest["scripts"]["test"], "jest tests/");
        assert_eq!(manifest["dependencies"]["express"], "^4");
        assert_eq!(manifest["devDependencies"]["supertest"], "^6.3.3");
    }

    #[test]
    fn test_file_must_be_a_sandboxed_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let sandbox = Sandbox::new(temp.path(), &[]).expect("sandbox");
        assert!(check_test_file(&sandbox, "tests/api.test.js").is_none());
        for raw in ["--watchAll", "-c=/tmp/evil.js", "../other/api.test.js", "/etc/passwd"] {
            let refused = check_test_file(&sandbox, raw).expect("refused");
            assert!(!refused.ok, "{raw}");
        }
    }

    #[test]
    fn merge_rejects_non_object_sections() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("package.json");
        fs::write(&path, r#"{"scripts": []}"#).expect("seed");
        assert!(merge_package_json(&path, &[], &[("test", "jest")]).is_err());
    }
}
