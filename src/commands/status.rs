use crate::ledger::{Ledger, LEDGER_FILE};
use anyhow::{Context, Result};
use std::path::Path;

/// Show what has been collected so far.
pub fn status_command(output_dir: &Path) -> Result<()> {
    let ledger_path = output_dir.join(LEDGER_FILE);
    let ledger = Ledger::load(&ledger_path).context("Failed to load ledger")?;
    print!("{}", format_status(&ledger));
    Ok(())
}

fn format_status(ledger: &Ledger) -> String {
    let stats = ledger.stats();
    let mut out = String::new();

    out.push_str(&format!("Repositories processed: {}\n", stats.repos_processed));
    out.push_str(&format!(
        "Modules collected:      {}/{}\n",
        stats.files_collected, stats.candidates_seen
    ));
    match stats.last_run {
        Some(ts) => out.push_str(&format!("Last run:               {}\n", ts.to_rfc3339())),
        None => out.push_str("Last run:               never\n"),
    }

    let mut repos: Vec<_> = ledger.repos.values().collect();
    repos.sort_by(|a, b| a.locator.cmp(&b.locator));
    for repo in repos {
        out.push_str(&format!(
            "  {} {}/{}\n",
            repo.locator, repo.extracted, repo.total
        ));
        for file in ledger.files_from(&repo.locator) {
            out.push_str(&format!("    {} ({})\n", file.file, file.source_path));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_empty_ledger() {
        let text = format_status(&Ledger::default());
        assert!(text.contains("Repositories processed: 0"));
        assert!(text.contains("never"));
    }

    #[test]
    fn test_format_lists_repos_sorted() {
        let mut ledger = Ledger::default();
        ledger.record_repo("z/last".to_string(), None, 0, 2);
        ledger.record_repo("a/first".to_string(), None, 1, 5);

        let text = format_status(&ledger);
        let first = text.find("a/first 1/5").unwrap();
        let last = text.find("z/last 0/2").unwrap();
        assert!(first < last);
        assert!(text.contains("Modules collected:      0/7"));
    }

    #[test]
    fn test_format_lists_files_under_their_repo() {
        let mut ledger = Ledger::default();
        ledger.record_repo("a/core".to_string(), None, 2, 2);
        ledger.record_repo("b/misc".to_string(), None, 0, 1);
        ledger.record_file(
            "uart.sv".to_string(),
            "uart".to_string(),
            "a/core".to_string(),
            "rtl/uart.sv".to_string(),
            "h1".to_string(),
        );
        ledger.record_file(
            "alu.sv".to_string(),
            "alu".to_string(),
            "a/core".to_string(),
            "alu.sv".to_string(),
            "h2".to_string(),
        );

        let text = format_status(&ledger);
        let repo = text.find("a/core 2/2").unwrap();
        let alu = text.find("    alu.sv (alu.sv)").unwrap();
        let uart = text.find("    uart.sv (rtl/uart.sv)").unwrap();
        let other = text.find("b/misc 0/1").unwrap();
        assert!(repo < alu && alu < uart && uart < other);
    }
}
