//! Shared helpers for walscan specs.
//!
//! Every spec runs the real binary against a temporary directory of
//! `<pchannel>.jsonl` dumps read through the file backend.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::OnceLock;
use std::time::Duration;
use tempfile::TempDir;

pub use ws_core::{
    ImmutableMessage, MessageBuilder, MessageId, MessageType, ReplicateHeader, TxnContext,
};

/// Upper bound for a single CLI run; tails that never end fail the spec
const RUN_TIMEOUT: Duration = Duration::from_secs(20);

/// Locate the walscan binary in the target directory this spec binary
/// was built into, building it first when only the specs were compiled
fn walscan_bin() -> &'static Path {
    static BIN: OnceLock<PathBuf> = OnceLock::new();
    BIN.get_or_init(|| {
        let exe = std::env::current_exe().unwrap();
        let mut dir = exe.parent().unwrap().to_path_buf();
        if dir.ends_with("deps") {
            dir.pop();
        }
        let bin = dir.join(format!("walscan{}", std::env::consts::EXE_SUFFIX));
        if !bin.exists() {
            let mut build = std::process::Command::new(env!("CARGO"));
            build
                .args(["build", "--package", "walscan", "--bin", "walscan"])
                .current_dir(env!("CARGO_MANIFEST_DIR"));
            if !cfg!(debug_assertions) {
                build.arg("--release");
            }
            let status = build.status().unwrap();
            assert!(status.success(), "building walscan failed: {status}");
        }
        assert!(bin.exists(), "walscan binary not found at {}", bin.display());
        bin
    })
}

/// A temporary data directory plus an isolated config home
pub struct Dumps {
    dir: TempDir,
}

impl Dumps {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Directory holding the channel dumps
    pub fn data_dir(&self) -> String {
        self.path().join("data").display().to_string()
    }

    /// Write a file relative to the temp root
    pub fn file(&self, rel: &str, content: &str) {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    /// Write the dump of one physical channel
    pub fn channel(&self, name: &str, messages: &[ImmutableMessage]) {
        let mut text = String::new();
        for msg in messages {
            text.push_str(&serde_json::to_string(msg).unwrap());
            text.push('\n');
        }
        self.file(&format!("data/{}.jsonl", name), &text);
    }

    /// The binary, with config lookups confined to the temp dir
    pub fn walscan(&self) -> Cli {
        let mut cmd = Command::new(walscan_bin());
        cmd.current_dir(self.path())
            .env("XDG_CONFIG_HOME", self.path().join("config"))
            .env_remove("RUST_LOG")
            .timeout(RUN_TIMEOUT);
        Cli { cmd }
    }
}

pub struct Cli {
    cmd: Command,
}

impl Cli {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    /// Run and require exit status 0
    pub fn passes(mut self) -> Run {
        let output = self.cmd.output().unwrap();
        let run = Run { output };
        assert!(
            run.output.status.success(),
            "expected success, got {:?}\nstdout:\n{}\nstderr:\n{}",
            run.output.status,
            run.stdout(),
            run.stderr()
        );
        run
    }

    /// Run and require a non-zero exit status
    pub fn fails(mut self) -> Run {
        let output = self.cmd.output().unwrap();
        let run = Run { output };
        assert!(
            !run.output.status.success(),
            "expected failure\nstdout:\n{}\nstderr:\n{}",
            run.stdout(),
            run.stderr()
        );
        run
    }
}

pub struct Run {
    output: Output,
}

impl Run {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_lines(&self) -> Vec<String> {
        self.stdout().lines().map(str::to_string).collect()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            predicate::str::contains(expected).eval(&stdout),
            "stdout missing {:?}:\n{}",
            expected,
            stdout
        );
        self
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            !predicate::str::contains(unexpected).eval(&stdout),
            "stdout unexpectedly has {:?}:\n{}",
            unexpected,
            stdout
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            predicate::str::contains(expected).eval(&stderr),
            "stderr missing {:?}:\n{}",
            expected,
            stderr
        );
        self
    }
}

pub fn insert(id: u64, tick: u64, vchannel: &str) -> ImmutableMessage {
    MessageBuilder::new(MessageType::Insert)
        .id(MessageId::Sequence(id))
        .tick(tick)
        .vchannel(vchannel)
        .build()
}

pub fn message(ty: MessageType, id: u64, tick: u64) -> ImmutableMessage {
    MessageBuilder::new(ty)
        .id(MessageId::Sequence(id))
        .tick(tick)
        .build()
}

pub fn time_tick(id: u64, tick: u64) -> ImmutableMessage {
    message(MessageType::TimeTick, id, tick)
}

pub fn txn(ty: MessageType, id: u64, tick: u64, txn_id: i64) -> ImmutableMessage {
    MessageBuilder::new(ty)
        .id(MessageId::Sequence(id))
        .tick(tick)
        .txn(TxnContext::new(txn_id, Duration::ZERO))
        .build()
}
