//! Yosys subprocess invocation with the SystemVerilog plugin
//!
//! Runs `yosys -qq -p "plugin -i systemverilog; read_systemverilog -synth ..."`
//! and pulls the top module name out of the elaboration notes. The child is
//! killed if it outlives the configured timeout.

use crate::config::SynthConfig;
use crate::error::SynthError;
use crate::synth::SynthesisChecker;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Elaboration note emitted by the plugin for the top-level module
const TOP_MODULE_NOTE: &str = "[NTE:EL0503]";

/// Characters of yosys stderr kept in failure logs
const STDERR_EXCERPT_CHARS: usize = 500;

/// Yosys-backed synthesis checker
#[derive(Debug, Clone)]
pub struct YosysChecker {
    binary: String,
    plugin: String,
    timeout_secs: u64,
}

impl YosysChecker {
    pub fn new(binary: impl Into<String>) -> Self {
        let defaults = SynthConfig::default();
        Self {
            binary: binary.into(),
            plugin: defaults.plugin,
            timeout_secs: defaults.timeout_secs,
        }
    }

    pub fn with_config(config: &SynthConfig) -> Self {
        Self {
            binary: config.yosys_binary.clone(),
            plugin: config.plugin.clone(),
            timeout_secs: config.timeout_secs,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Script passed to `-p`
    pub fn script(&self, files: &[PathBuf]) -> String {
        format!(
            "plugin -i {}; read_systemverilog -synth {}",
            self.plugin,
            join_filepaths(files)
        )
    }

    async fn run(&self, files: &[PathBuf]) -> Result<String, SynthError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["-qq", "-p"])
            .arg(self.script(files))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!("Executing: {} -qq -p [{} files]", self.binary, files.len());

        let child = cmd.spawn().map_err(|e| SynthError::SpawnFailed {
            binary: self.binary.clone(),
            source: e.to_string(),
        })?;

        let output = tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| SynthError::Timeout {
            secs: self.timeout_secs,
        })?
        .map_err(|e| SynthError::SpawnFailed {
            binary: self.binary.clone(),
            source: format!("Process error: {}", e),
        })?;

        if !output.status.success() {
            return Err(SynthError::ExitedUnexpectedly {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Default for YosysChecker {
    fn default() -> Self {
        Self::with_config(&SynthConfig::default())
    }
}

#[async_trait::async_trait]
impl SynthesisChecker for YosysChecker {
    async fn check(&self, files: &[PathBuf]) -> Result<String, SynthError> {
        let result = match self.run(files).await {
            Ok(stdout) => parse_top_module(&stdout).ok_or(SynthError::TopModuleNotFound),
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            debug!("{}", failure_message(e, files));
        }
        result
    }

    fn name(&self) -> &str {
        "yosys"
    }
}

/// Quote each path for the yosys command language
pub fn join_filepaths(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|f| format!("\"{}\"", f.display()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the top module from the first elaboration note.
///
/// The note reads `... Top level module "work@<name>".`; the name runs from
/// the first `@` to the next `"`. A malformed first note yields `None`.
pub fn parse_top_module(stdout: &str) -> Option<String> {
    let line = stdout.lines().find(|l| l.starts_with(TOP_MODULE_NOTE))?;
    let start = line.find('@')? + 1;
    let end = line[start..].find('"')?;
    Some(line[start..start + end].to_string())
}

fn failure_message(err: &SynthError, files: &[PathBuf]) -> String {
    let filelist = files
        .iter()
        .map(|f| f.display().to_string())
        .collect::<Vec<_>>()
        .join("\n\t");
    let mut msg = format!("{}:\n\t{}\n", err, filelist);

    if let SynthError::ExitedUnexpectedly { stderr, .. } = err {
        let stderr = stderr.trim();
        if !stderr.is_empty() {
            let excerpt: String = stderr.chars().take(STDERR_EXCERPT_CHARS).collect();
            msg.push_str("stderr:\n");
            msg.push_str(&excerpt);
            if excerpt.len() < stderr.len() {
                msg.push_str(" [...]");
            }
            msg.push('\n');
        }
    }
    msg
}

/// Convenience for single-file checks
pub async fn check_file(
    checker: &dyn SynthesisChecker,
    path: &Path,
) -> Result<String, SynthError> {
    checker.check(&[path.to_path_buf()]).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_top_module() {
        let stdout = "\
[INF:CM0023] Creating log file ./slpp_all/surelog.log.
[NTE:EL0503] /tmp/rtl/counter.sv:3:1: Top level module \"work@counter\".
[NTE:EL0508] Nb Top level modules: 1.
";
        assert_eq!(parse_top_module(stdout), Some("counter".to_string()));
    }

    #[test]
    fn test_parse_uses_first_note() {
        let stdout = "\
[NTE:EL0503] a.sv:1:1: Top level module \"work@alu\".
[NTE:EL0503] b.sv:1:1: Top level module \"work@fpu\".
";
        assert_eq!(parse_top_module(stdout), Some("alu".to_string()));
    }

    #[test]
    fn test_parse_missing_note() {
        assert_eq!(parse_top_module("[NTE:EL0508] Nb Top level modules: 0.\n"), None);
        assert_eq!(parse_top_module(""), None);
    }

    #[test]
    fn test_parse_malformed_note() {
        assert_eq!(parse_top_module("[NTE:EL0503] no marker here\n"), None);
        assert_eq!(parse_top_module("[NTE:EL0503] work@unterminated\n"), None);
    }

    #[test]
    fn test_script_quotes_every_file() {
        let checker = YosysChecker::new("yosys");
        let script = checker.script(&[PathBuf::from("/a/x.sv"), PathBuf::from("/b/y z.sv")]);
        assert_eq!(
            script,
            "plugin -i systemverilog; read_systemverilog -synth \"/a/x.sv\" \"/b/y z.sv\""
        );
    }

    #[test]
    fn test_failure_message_lists_files() {
        let msg = failure_message(
            &SynthError::Timeout { secs: 5 },
            &[PathBuf::from("a.sv"), PathBuf::from("b.sv")],
        );
        assert_eq!(msg, "TIMEOUT after 5s:\n\ta.sv\n\tb.sv\n");
    }

    #[test]
    fn test_failure_message_includes_stderr() {
        let err = SynthError::ExitedUnexpectedly {
            status: Some(1),
            stderr: "ERROR: syntax error, unexpected endmodule\n".to_string(),
        };
        let msg = failure_message(&err, &[PathBuf::from("a.sv")]);
        assert!(msg.contains("stderr:\nERROR: syntax error, unexpected endmodule\n"));
        assert!(!msg.contains("[...]"));
    }

    #[test]
    fn test_failure_message_truncates_long_stderr() {
        let err = SynthError::ExitedUnexpectedly {
            status: Some(1),
            stderr: "x".repeat(STDERR_EXCERPT_CHARS * 3),
        };
        let msg = failure_message(&err, &[PathBuf::from("a.sv")]);
        assert!(msg.contains(&"x".repeat(STDERR_EXCERPT_CHARS)));
        assert!(!msg.contains(&"x".repeat(STDERR_EXCERPT_CHARS + 1)));
        assert!(msg.ends_with("[...]\n"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_failure() {
        let checker = YosysChecker::new("/nonexistent/yosys-binary");
        let err = checker
            .check(&[PathBuf::from("top.sv")])
            .await
            .unwrap_err();
        assert!(matches!(err, SynthError::SpawnFailed { .. }));
    }
}
