//! Exercises `YosysChecker` against a stand-in yosys shell script.
#![cfg(unix)]

use rtl_collector::config::SynthConfig;
use rtl_collector::error::SynthError;
use rtl_collector::synth::yosys::YosysChecker;
use rtl_collector::synth::SynthesisChecker;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::TempDir;

/// Prints the plugin's top-module note for the last file in the script,
/// fails on files containing BROKEN, prints nothing for files without a module.
const FAKE_YOSYS: &str = r#"#!/bin/sh
script="$3"
top=""
last=""
for f in $(printf '%s' "$script" | grep -o '"[^"]*"' | tr -d '"'); do
  if grep -q BROKEN "$f"; then
    echo "ERROR: syntax error in $f" >&2
    exit 1
  fi
  top=$(sed -n 's/^module \([A-Za-z0-9_]*\).*/\1/p' "$f" | head -n 1)
  last="$f"
done
if [ -n "$top" ]; then
  echo "[NTE:EL0503] $last:1:1: Top level module \"work@$top\"."
fi
echo "[NTE:EL0508] Nb Top level modules: 1."
exit 0
"#;

const SLOW_YOSYS: &str = "#!/bin/sh\nsleep 10\n";

struct Tools {
    _dir: TempDir,
    fake: PathBuf,
    slow: PathBuf,
}

/// Scripts are written once, before any test spawns a child
fn tools() -> &'static Tools {
    static TOOLS: OnceLock<Tools> = OnceLock::new();
    TOOLS.get_or_init(|| {
        let dir = TempDir::new().unwrap();
        let fake = write_script(dir.path(), "fake-yosys", FAKE_YOSYS);
        let slow = write_script(dir.path(), "slow-yosys", SLOW_YOSYS);
        Tools {
            _dir: dir,
            fake,
            slow,
        }
    })
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn checker() -> YosysChecker {
    YosysChecker::new(tools().fake.display().to_string()).with_timeout(30)
}

#[tokio::test]
async fn test_reports_top_module() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("counter.sv");
    fs::write(&file, "module counter(input clk);\nendmodule\n").unwrap();

    let top = checker().check(&[file]).await.unwrap();
    assert_eq!(top, "counter");
}

#[tokio::test]
async fn test_nonzero_exit_is_rejection() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("bad.sv");
    fs::write(&file, "module bad BROKEN\n").unwrap();

    let err = checker().check(&[file]).await.unwrap_err();
    match err {
        SynthError::ExitedUnexpectedly { status, stderr } => {
            assert_eq!(status, Some(1));
            assert!(stderr.contains("syntax error"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_success_without_note_is_top_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("pkg.sv");
    fs::write(&file, "package p;\nendpackage\n").unwrap();

    let err = checker().check(&[file]).await.unwrap_err();
    assert!(matches!(err, SynthError::TopModuleNotFound));
}

#[tokio::test]
async fn test_multiple_files_checked_together() {
    let temp_dir = TempDir::new().unwrap();
    let leaf = temp_dir.path().join("leaf.sv");
    let top = temp_dir.path().join("top.sv");
    fs::write(&leaf, "module leaf;\nendmodule\n").unwrap();
    fs::write(&top, "module soc;\nendmodule\n").unwrap();

    let name = checker().check(&[leaf, top]).await.unwrap();
    assert_eq!(name, "soc");
}

#[tokio::test]
async fn test_timeout_kills_slow_tool() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("counter.sv");
    fs::write(&file, "module counter;\nendmodule\n").unwrap();

    let config = SynthConfig {
        yosys_binary: tools().slow.display().to_string(),
        timeout_secs: 1,
        ..SynthConfig::default()
    };
    let err = YosysChecker::with_config(&config)
        .check(&[file])
        .await
        .unwrap_err();
    assert!(matches!(err, SynthError::Timeout { secs: 1 }));
}
