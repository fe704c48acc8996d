#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

use replisync::core::config::Config;
use tempfile::TempDir;

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_replisync") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) {
        "replisync.exe"
    } else {
        "replisync"
    };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve replisync binary path for integration test"),
    }
}

/// Run the binary and keep a transcript next to the other test logs.
pub fn run_cli_case(case_name: &str, args: &[&str]) -> CmdResult {
    let root = std::env::temp_dir().join("replisync-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let output = Command::new(&bin_path)
        .args(args)
        .env("RUST_BACKTRACE", "1")
        .env_remove("REPLISYNC_INTERVAL")
        .env_remove("REPLISYNC_LOG_FILE")
        .output()
        .expect("execute replisync command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

/// A source tree, a replica tree and a log file under one temp dir.
pub struct MirrorFixture {
    _tmp: TempDir,
    pub src: PathBuf,
    pub rep: PathBuf,
    pub log: PathBuf,
}

impl MirrorFixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create tempdir");
        let root = fs::canonicalize(tmp.path()).expect("canonicalize tempdir");
        let src = root.join("src");
        let rep = root.join("rep");
        fs::create_dir_all(&src).expect("create source");
        fs::create_dir_all(&rep).expect("create replica");
        Self {
            _tmp: tmp,
            src,
            rep,
            log: root.join("sync.log"),
        }
    }

    /// Config pointing at this fixture, with console echo off.
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.sync.source.clone_from(&self.src);
        config.sync.replica.clone_from(&self.rep);
        config.logging.log_file.clone_from(&self.log);
        config.logging.console = false;
        config
    }

    pub fn write_src(&self, rel: &str, contents: &str) -> PathBuf {
        write_file(&self.src, rel, contents)
    }

    pub fn write_rep(&self, rel: &str, contents: &str) -> PathBuf {
        write_file(&self.rep, rel, contents)
    }

    pub fn log_text(&self) -> String {
        fs::read_to_string(&self.log).unwrap_or_default()
    }
}

fn write_file(root: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(&path, contents).expect("write file");
    path
}

/// Relative paths of every entry under `root`, directories suffixed with `/`.
pub fn tree_listing(root: &Path) -> Vec<String> {
    fn visit(root: &Path, dir: &Path, out: &mut Vec<String>) {
        let mut entries: Vec<_> = fs::read_dir(dir)
            .expect("read dir")
            .map(|e| e.expect("dir entry").path())
            .collect();
        entries.sort();
        for path in entries {
            let rel = path
                .strip_prefix(root)
                .expect("under root")
                .to_string_lossy()
                .replace('\\', "/");
            if path.is_dir() {
                out.push(format!("{rel}/"));
                visit(root, &path, out);
            } else {
                out.push(rel);
            }
        }
    }
    let mut out = Vec::new();
    visit(root, root, &mut out);
    out
}
