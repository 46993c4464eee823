//! Filesystem tools (`fs.*`) confined to the working directory.

use std::cmp::Ordering;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};

use super::Tool;
use crate::core::schema::{ArgType, ToolArgument, ToolSchema};
use crate::core::types::{ToolArguments, ToolResult};
use crate::env::AgentEnvironment;

/// Working-directory sandbox shared by the file-mutating tools.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
    protected: Vec<PathBuf>,
}

impl Sandbox {
    pub fn new(working_dir: &Path, protected_files: &[String]) -> Result<Self> {
        let root = working_dir
            .canonicalize()
            .with_context(|| format!("resolve working directory {}", working_dir.display()))?;
        let protected = protected_files
            .iter()
            .filter_map(|raw| resolve_under(&root, raw))
            .collect();
        Ok(Self { root, protected })
    }

    pub fn from_env(env: &AgentEnvironment) -> Result<Self> {
        Self::new(env.working_dir(), &env.config().protected_files)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `raw` against the root. `None` when the result escapes it.
    ///
    /// `..` is folded first, then the longest existing prefix is resolved
    /// through symlinks; a link pointing outside the root is refused.
    pub fn resolve(&self, raw: &str) -> Option<PathBuf> {
        resolve_under(&self.root, raw)
    }

    /// True when mutating `path` would touch a protected file: the path is
    /// protected itself or is a directory holding one.
    pub fn guards(&self, path: &Path) -> bool {
        self.protected.iter().any(|p| p.starts_with(path))
    }

    /// Resolve `raw` for writing, or the failure to report.
    pub fn writable(&self, raw: &str) -> std::result::Result<PathBuf, ToolResult> {
        let Some(path) = self.resolve(raw) else {
            return Err(outside(raw));
        };
        if self.guards(&path) {
            return Err(ToolResult::failure(format!(
                "File is protected and cannot be written to: {raw}"
            )));
        }
        Ok(path)
    }
}

fn outside(raw: &str) -> ToolResult {
    ToolResult::failure(format!("Path is outside the working directory: {raw}"))
}

fn normalize_under(root: &Path, raw: &str) -> Option<PathBuf> {
    let mut resolved = PathBuf::new();
    for component in root.join(raw).components() {
        match component {
            Component::ParentDir => {
                resolved.pop();
            }
            Component::CurDir => {}
            other => resolved.push(other.as_os_str()),
        }
    }
    resolved.starts_with(root).then_some(resolved)
}

fn resolve_under(root: &Path, raw: &str) -> Option<PathBuf> {
    let lexical = normalize_under(root, raw)?;
    let mut existing = lexical.as_path();
    let mut missing = Vec::new();
    // symlink_metadata so a dangling link counts as existing and fails to
    // canonicalize below.
    while fs::symlink_metadata(existing).is_err() {
        missing.push(existing.file_name()?);
        existing = existing.parent()?;
    }
    let mut resolved = existing.canonicalize().ok()?;
    resolved.extend(missing.into_iter().rev());
    resolved.starts_with(root).then_some(resolved)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FsOp {
    Write,
    Delete,
    Read,
    Edit,
    Mkdir,
    Rmdir,
    Ls,
    Tree,
}

/// One `fs.*` tool; the operation decides name, schema and behavior.
pub struct FsTool {
    op: FsOp,
    schema: ToolSchema,
    sandbox: Option<Sandbox>,
}

impl FsTool {
    fn new(op: FsOp) -> Self {
        let path = |description: &str| ToolArgument::required("path", ArgType::String, description);
        let schema = match op {
            FsOp::Write => ToolSchema::new()
                .argument(path("The path of the file to create or overwrite."))
                .argument(ToolArgument::required(
                    "content",
                    ArgType::String,
                    "The content to write to the file.",
                )),
            FsOp::Delete => ToolSchema::new().argument(path("The path of the file to delete.")),
            FsOp::Read => ToolSchema::new().argument(path("The path to the file to read.")),
            FsOp::Edit => ToolSchema::new()
                .argument(path("The path of the file to edit."))
                .argument(ToolArgument::required(
                    "old_text",
                    ArgType::String,
                    "The text to be replaced.",
                ))
                .argument(ToolArgument::required(
                    "new_text",
                    ArgType::String,
                    "The new text to replace the old_text with.",
                )),
            FsOp::Mkdir => ToolSchema::new().argument(path("The path of the directory to create.")),
            FsOp::Rmdir => ToolSchema::new()
                .argument(path("The path of the directory to delete."))
                .argument(ToolArgument::optional(
                    "recursive",
                    ArgType::Boolean,
                    "If true, deletes the directory and all its contents.",
                )),
            FsOp::Ls => ToolSchema::new().argument(path("The path of the directory to list.")),
            FsOp::Tree => ToolSchema::new().argument(ToolArgument::optional(
                "path",
                ArgType::String,
                "The directory to display as a tree. Defaults to the working directory.",
            )),
        };
        Self {
            op,
            schema,
            sandbox: None,
        }
    }

    fn sandbox(&self) -> Result<&Sandbox> {
        self.sandbox
            .as_ref()
            .ok_or_else(|| anyhow!("{} used before initialize", self.name()))
    }

    fn write(&self, sandbox: &Sandbox, raw: &str, target: &Path, args: &ToolArguments) -> Result<ToolResult> {
        if sandbox.guards(target) {
            return Ok(ToolResult::failure(format!(
                "File is protected and cannot be written to: {raw}"
            )));
        }
        let content = str_arg(args, "content")?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(target, content).with_context(|| format!("write {raw}"))?;
        Ok(message(format!("Successfully wrote to file {raw}.")))
    }

    fn delete(&self, sandbox: &Sandbox, raw: &str, target: &Path) -> Result<ToolResult> {
        if sandbox.guards(target) {
            return Ok(ToolResult::failure(format!(
                "File is protected and cannot be deleted: {raw}"
            )));
        }
        if !target.exists() {
            return Ok(ToolResult::failure(format!("File not found: {raw}")));
        }
        if !target.is_file() {
            return Ok(ToolResult::failure(format!(
                "Path is not a file, cannot be deleted with fs.delete: {raw}"
            )));
        }
        fs::remove_file(target).with_context(|| format!("delete {raw}"))?;
        Ok(message(format!("Successfully deleted file {raw}.")))
    }

    fn read(&self, raw: &str, target: &Path) -> Result<ToolResult> {
        if !target.exists() {
            return Ok(ToolResult::failure(format!("File not found: {raw}")));
        }
        if !target.is_file() {
            return Ok(ToolResult::failure(format!("Path is not a file: {raw}")));
        }
        let content = fs::read_to_string(target).with_context(|| format!("read {raw}"))?;
        let size = fs::metadata(target)
            .with_context(|| format!("stat {raw}"))?
            .len();
        Ok(ToolResult::success(json!({
            "line_count": content.lines().count(),
            "size": size,
            "content": content,
            "message": format!("Successfully read file {raw}."),
        })))
    }

    fn edit(&self, sandbox: &Sandbox, raw: &str, target: &Path, args: &ToolArguments) -> Result<ToolResult> {
        if sandbox.guards(target) {
            return Ok(ToolResult::failure(format!(
                "File is protected and cannot be edited: {raw}"
            )));
        }
        if !target.is_file() {
            return Ok(ToolResult::failure(format!("File not found: {raw}")));
        }
        let old_text = str_arg(args, "old_text")?;
        let new_text = str_arg(args, "new_text")?;
        let content = fs::read_to_string(target).with_context(|| format!("read {raw}"))?;
        if old_text.is_empty() || !content.contains(old_text) {
            return Ok(ToolResult::failure(format!(
                "Text to be replaced ('{old_text}') not found in file: {raw}"
            )));
        }
        let updated = content.replacen(old_text, new_text, 1);
        fs::write(target, updated).with_context(|| format!("write {raw}"))?;
        Ok(message(format!("Successfully edited file {raw}.")))
    }

    fn mkdir(&self, raw: &str, target: &Path) -> Result<ToolResult> {
        if target.is_file() {
            return Ok(ToolResult::failure(format!(
                "Path exists and is not a directory: {raw}"
            )));
        }
        fs::create_dir_all(target).with_context(|| format!("create directory {raw}"))?;
        Ok(message(format!("Successfully created directory {raw}.")))
    }

    fn rmdir(&self, sandbox: &Sandbox, raw: &str, target: &Path, args: &ToolArguments) -> Result<ToolResult> {
        if target == sandbox.root() {
            return Ok(ToolResult::failure(
                "Cannot delete the root working directory.",
            ));
        }
        if !target.exists() {
            return Ok(ToolResult::failure(format!("Directory not found: {raw}")));
        }
        if !target.is_dir() {
            return Ok(ToolResult::failure(format!("Path is not a directory: {raw}")));
        }
        if sandbox.guards(target) {
            return Ok(ToolResult::failure(format!(
                "Directory contains protected files and cannot be deleted: {raw}"
            )));
        }
        let recursive = args
            .get("recursive")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if recursive {
            fs::remove_dir_all(target).with_context(|| format!("remove directory {raw}"))?;
            return Ok(message(format!(
                "Successfully recursively deleted directory {raw}."
            )));
        }
        let non_empty = fs::read_dir(target)
            .with_context(|| format!("read directory {raw}"))?
            .next()
            .is_some();
        if non_empty {
            return Ok(ToolResult::failure(format!(
                "Directory not empty. Use recursive=true to delete it: {raw}"
            )));
        }
        fs::remove_dir(target).with_context(|| format!("remove directory {raw}"))?;
        Ok(message(format!("Successfully deleted empty directory {raw}.")))
    }

    fn ls(&self, raw: &str, target: &Path) -> Result<ToolResult> {
        if !target.is_dir() {
            return Ok(ToolResult::failure(format!("Path is not a directory: {raw}")));
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(target).with_context(|| format!("read directory {raw}"))? {
            let entry = entry.with_context(|| format!("read entry in {raw}"))?;
            let meta = entry
                .metadata()
                .with_context(|| format!("stat {}", entry.path().display()))?;
            entries.push(json!({
                "name": entry.file_name().to_string_lossy(),
                "type": if meta.is_dir() { "dir" } else { "file" },
                "size": meta.len(),
            }));
        }
        entries.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));
        Ok(ToolResult::success(json!({ "entries": entries })))
    }

    fn tree(&self, raw: &str, target: &Path) -> Result<ToolResult> {
        if !target.is_dir() {
            return Ok(ToolResult::failure(format!("Path is not a directory: {raw}")));
        }
        let mut lines = vec![raw.to_string()];
        build_tree(target, "", &mut lines)?;
        Ok(ToolResult::success(json!({ "tree": lines })))
    }
}

impl Tool for FsTool {
    fn name(&self) -> &str {
        match self.op {
            FsOp::Write => "fs.write",
            FsOp::Delete => "fs.delete",
            FsOp::Read => "fs.read",
            FsOp::Edit => "fs.edit",
            FsOp::Mkdir => "fs.mkdir",
            FsOp::Rmdir => "fs.rmdir",
            FsOp::Ls => "fs.ls",
            FsOp::Tree => "fs.tree",
        }
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    fn description(&self) -> &str {
        match self.op {
            FsOp::Write => {
                "Creates or overwrites a file with specified content. Creates parent directories if needed."
            }
            FsOp::Delete => "Deletes a specified file.",
            FsOp::Read => "Reads the content of a file. Returns the content, size, and line count.",
            FsOp::Edit => "Edits a file by replacing the first occurrence of old_text with new_text.",
            FsOp::Mkdir => {
                "Creates a new directory. It will also create parent directories if they do not exist."
            }
            FsOp::Rmdir => {
                "Deletes a directory. Use the 'recursive' argument (boolean) to delete non-empty directories."
            }
            FsOp::Ls => {
                "Lists contents of a directory, showing name, type ('file' or 'dir'), and size for each entry."
            }
            FsOp::Tree => {
                "Displays the directory structure as a tree, starting from the given path or the working directory."
            }
        }
    }

    fn initialize(&mut self, env: &AgentEnvironment) -> Result<()> {
        self.sandbox = Some(Sandbox::from_env(env)?);
        Ok(())
    }

    fn execute(&self, args: &ToolArguments) -> Result<ToolResult> {
        let sandbox = self.sandbox()?;
        let raw = match (self.op, args.get("path").and_then(Value::as_str)) {
            (_, Some(raw)) => raw,
            (FsOp::Tree, None) => ".",
            (_, None) => return Err(anyhow!("missing path argument")),
        };
        let Some(target) = sandbox.resolve(raw) else {
            return Ok(outside(raw));
        };
        match self.op {
            FsOp::Write => self.write(sandbox, raw, &target, args),
            FsOp::Delete => self.delete(sandbox, raw, &target),
            FsOp::Read => self.read(raw, &target),
            FsOp::Edit => self.edit(sandbox, raw, &target, args),
            FsOp::Mkdir => self.mkdir(raw, &target),
            FsOp::Rmdir => self.rmdir(sandbox, raw, &target, args),
            FsOp::Ls => self.ls(raw, &target),
            FsOp::Tree => self.tree(raw, &target),
        }
    }
}

fn build_tree(dir: &Path, prefix: &str, lines: &mut Vec<String>) -> Result<()> {
    let mut items: Vec<(String, PathBuf)> = fs::read_dir(dir)
        .with_context(|| format!("read directory {}", dir.display()))?
        .map(|entry| -> Result<(String, PathBuf)> {
            let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
            Ok((entry.file_name().to_string_lossy().into_owned(), entry.path()))
        })
        .collect::<Result<_>>()?;
    items.sort_by(|(a, _), (b, _)| match a.to_lowercase().cmp(&b.to_lowercase()) {
        Ordering::Equal => a.cmp(b),
        other => other,
    });

    let count = items.len();
    for (idx, (name, path)) in items.into_iter().enumerate() {
        let last = idx + 1 == count;
        let connector = if last { "└── " } else { "├── " };
        lines.push(format!("{prefix}{connector}{name}"));
        if path.is_dir() {
            let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
            build_tree(&path, &child_prefix, lines)?;
        }
    }
    Ok(())
}

fn str_arg<'a>(args: &'a ToolArguments, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("missing {key} argument"))
}

fn message(text: String) -> ToolResult {
    ToolResult::success(json!({ "message": text }))
}

pub fn standard_fs_tools() -> Vec<Box<dyn Tool>> {
    [
        FsOp::Write,
        FsOp::Delete,
        FsOp::Read,
        FsOp::Edit,
        FsOp::Mkdir,
        FsOp::Rmdir,
        FsOp::Ls,
        FsOp::Tree,
    ]
    .into_iter()
    .map(|op| Box::new(FsTool::new(op)) as Box<dyn Tool>)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestWorkspace;

    fn tool(ws: &TestWorkspace, name: &str) -> Box<dyn Tool> {
        let env = ws.environment();
        let mut tool = standard_fs_tools()
            .into_iter()
            .find(|t| t.name() == name)
            .expect("tool exists");
        tool.initialize(&env).expect("initialize");
        tool
    }

    fn run(tool: &dyn Tool, args: Value) -> ToolResult {
        let args = args.as_object().cloned().expect("object");
        tool.schema().validate(&args).expect("valid args");
        tool.execute(&args).expect("execute")
    }

    #[test]
    fn write_then_read_reports_metadata() {
        let ws = TestWorkspace::new();
        let write = tool(&ws, "fs.write");
        let result = run(write.as_ref(), json!({"path": "src/app.js", "content": "a\nb\n"}));
        assert!(result.ok, "{result:?}");
        assert_eq!(ws.read("src/app.js"), "a\nb\n");

        let read = tool(&ws, "fs.read");
        let result = run(read.as_ref(), json!({"path": "src/app.js"}));
        assert_eq!(result.data_field("content"), Some(&json!("a\nb\n")));
        assert_eq!(result.data_field("size"), Some(&json!(4)));
        assert_eq!(result.data_field("line_count"), Some(&json!(2)));
    }

    #[test]
    fn refuses_paths_outside_working_dir() {
        let ws = TestWorkspace::new();
        for (name, args) in [
            ("fs.write", json!({"path": "../escape.txt", "content": "x"})),
            ("fs.read", json!({"path": "/etc/passwd"})),
            ("fs.mkdir", json!({"path": "a/../../b"})),
        ] {
            let tool = tool(&ws, name);
            let result = run(tool.as_ref(), args);
            assert!(!result.ok);
            assert!(
                result
                    .error
                    .as_deref()
                    .expect("error")
                    .starts_with("Path is outside the working directory"),
                "{name}: {result:?}"
            );
        }
        assert!(!ws.path().join("..").join("escape.txt").exists());
    }

    #[test]
    fn protected_files_are_not_mutated() {
        let ws = TestWorkspace::with_config(json!({"protected_files": ["package.json"]}));
        ws.write("package.json", "{}");

        let write = tool(&ws, "fs.write");
        let result = run(write.as_ref(), json!({"path": "./package.json", "content": "hacked"}));
        assert!(!result.ok);
        assert!(result.error.expect("error").contains("protected"));

        let edit = tool(&ws, "fs.edit");
        let result = run(
            edit.as_ref(),
            json!({"path": "package.json", "old_text": "{}", "new_text": "[]"}),
        );
        assert!(!result.ok);

        let delete = tool(&ws, "fs.delete");
        assert!(!run(delete.as_ref(), json!({"path": "package.json"})).ok);
        assert_eq!(ws.read("package.json"), "{}");
    }

    #[test]
    fn rmdir_refuses_directories_holding_protected_files() {
        let ws = TestWorkspace::with_config(json!({"protected_files": ["src/keep.txt"]}));
        ws.write("src/keep.txt", "keep");
        ws.write("src/other.txt", "other");
        ws.write("build/out.txt", "x");
        let rmdir = tool(&ws, "fs.rmdir");

        let refused = run(rmdir.as_ref(), json!({"path": "src", "recursive": true}));
        assert!(!refused.ok);
        assert!(refused.error.expect("error").contains("protected"));
        assert_eq!(ws.read("src/keep.txt"), "keep");
        assert!(ws.exists("src/other.txt"));

        let removed = run(rmdir.as_ref(), json!({"path": "build", "recursive": true}));
        assert!(removed.ok, "{removed:?}");
    }

    #[test]
    fn guards_covers_protected_file_and_its_ancestors() {
        let ws = TestWorkspace::new();
        let sandbox = Sandbox::new(ws.path(), &["a/b/c.txt".to_string()]).expect("sandbox");
        let resolve = |raw: &str| sandbox.resolve(raw).expect("inside");
        assert!(sandbox.guards(&resolve("a/b/c.txt")));
        assert!(sandbox.guards(&resolve("a/b")));
        assert!(sandbox.guards(&resolve("a")));
        assert!(!sandbox.guards(&resolve("a/b/d.txt")));
        assert!(!sandbox.guards(&resolve("a/bc")));
        assert!(sandbox.writable("a/b/c.txt").is_err());
        assert_eq!(sandbox.writable("a/x.txt").ok(), Some(resolve("a/x.txt")));
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_out_of_the_working_dir_are_refused() {
        let ws = TestWorkspace::new();
        let outside = tempfile::tempdir().expect("outside");
        std::fs::write(outside.path().join("secret.txt"), "secret").expect("seed");
        std::os::unix::fs::symlink(outside.path(), ws.path().join("link")).expect("symlink");
        std::os::unix::fs::symlink(outside.path().join("gone.txt"), ws.path().join("dangling"))
            .expect("symlink");

        let write = tool(&ws, "fs.write");
        for path in ["link/pwned.txt", "dangling"] {
            let result = run(write.as_ref(), json!({"path": path, "content": "x"}));
            assert!(!result.ok, "{path}: {result:?}");
            assert!(
                result
                    .error
                    .as_deref()
                    .expect("error")
                    .starts_with("Path is outside the working directory")
            );
        }
        assert!(!outside.path().join("pwned.txt").exists());
        assert!(!outside.path().join("gone.txt").exists());

        let read = tool(&ws, "fs.read");
        assert!(!run(read.as_ref(), json!({"path": "link/secret.txt"})).ok);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_inside_the_working_dir_resolve() {
        let ws = TestWorkspace::new();
        ws.write("real/page.txt", "hello");
        std::os::unix::fs::symlink(ws.path().join("real"), ws.path().join("alias"))
            .expect("symlink");
        let read = tool(&ws, "fs.read");
        let result = run(read.as_ref(), json!({"path": "alias/page.txt"}));
        assert_eq!(result.data_field("content"), Some(&json!("hello")));
    }

    #[test]
    fn edit_replaces_first_occurrence_only() {
        let ws = TestWorkspace::new();
        ws.write("notes.txt", "one two one");
        let edit = tool(&ws, "fs.edit");
        let result = run(
            edit.as_ref(),
            json!({"path": "notes.txt", "old_text": "one", "new_text": "1"}),
        );
        assert!(result.ok);
        assert_eq!(ws.read("notes.txt"), "1 two one");

        let missing = run(
            edit.as_ref(),
            json!({"path": "notes.txt", "old_text": "three", "new_text": "3"}),
        );
        assert!(!missing.ok);
    }

    #[test]
    fn delete_refuses_directories() {
        let ws = TestWorkspace::new();
        std::fs::create_dir_all(ws.path().join("dir")).expect("mkdir");
        let delete = tool(&ws, "fs.delete");
        let result = run(delete.as_ref(), json!({"path": "dir"}));
        assert!(!result.ok);
        assert!(ws.path().join("dir").is_dir());
        let missing = run(delete.as_ref(), json!({"path": "nope.txt"}));
        assert_eq!(missing.error.as_deref(), Some("File not found: nope.txt"));
    }

    #[test]
    fn rmdir_requires_recursive_for_non_empty_and_protects_root() {
        let ws = TestWorkspace::new();
        ws.write("build/out.txt", "x");
        let rmdir = tool(&ws, "fs.rmdir");

        let refused = run(rmdir.as_ref(), json!({"path": "build"}));
        assert!(!refused.ok);
        assert!(ws.path().join("build").is_dir());

        let removed = run(rmdir.as_ref(), json!({"path": "build", "recursive": true}));
        assert!(removed.ok);
        assert!(!ws.path().join("build").exists());

        let root = run(rmdir.as_ref(), json!({"path": ".", "recursive": true}));
        assert_eq!(
            root.error.as_deref(),
            Some("Cannot delete the root working directory.")
        );
    }

    #[test]
    fn ls_lists_sorted_entries() {
        let ws = TestWorkspace::new();
        ws.write("b.txt", "bb");
        std::fs::create_dir_all(ws.path().join("a")).expect("mkdir");
        let ls = tool(&ws, "fs.ls");
        let result = run(ls.as_ref(), json!({"path": "."}));
        let entries = result.data_field("entries").expect("entries").as_array().expect("array");
        let names: Vec<&str> = entries.iter().map(|e| e["name"].as_str().expect("name")).collect();
        assert_eq!(names, vec![".waa", "a", "b.txt"]);
        assert_eq!(entries[1]["type"], "dir");
        assert_eq!(entries[2]["type"], "file");
        assert_eq!(entries[2]["size"], 2);
    }

    #[test]
    fn tree_uses_connectors_and_case_insensitive_order() {
        let ws = TestWorkspace::new();
        ws.write("app/views/index.hbs", "");
        ws.write("app/Index.js", "");
        ws.write("README.md", "");
        let tree = tool(&ws, "fs.tree");
        let result = run(tree.as_ref(), json!({"path": "app"}));
        let lines: Vec<&str> = result
            .data_field("tree")
            .expect("tree")
            .as_array()
            .expect("array")
            .iter()
            .map(|l| l.as_str().expect("line"))
            .collect();
        assert_eq!(
            lines,
            vec!["app", "├── Index.js", "└── views", "    └── index.hbs"]
        );

        let whole = run(tree.as_ref(), json!({}));
        assert_eq!(whole.data_field("tree").expect("tree")[0], ".");
    }

    #[test]
    fn execute_before_initialize_is_an_error() {
        let tool = FsTool::new(FsOp::Read);
        let args = json!({"path": "a"}).as_object().cloned().expect("object");
        assert!(tool.execute(&args).is_err());
    }
}
