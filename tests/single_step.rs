//! Per-opcode conformance tests.
//!
//! Each JSON file in `tests/data/sm83/v1` holds a list of single-instruction state
//! transitions for one opcode: load the `initial` state, run exactly one `step`, and the
//! CPU must match the `final` state register-for-register and byte-for-byte.
//!
//! The corpus is a submodule of test data and may not be checked out; in that case the
//! test is a no-op rather than a failure.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use sm83_core::{Cpu, FlatBus, Snapshot};

const CORPUS_DIR: &str = "tests/data/sm83/v1";

/// Files whose behavior the core deliberately leaves unspecified: STOP and HALT only
/// decode and consume their base cycles, low-power semantics are a host concern.
const IGNORED_FILES: [&str; 2] = ["10.json", "76.json"];

#[derive(Debug, Deserialize)]
struct TestCase {
    name: String,
    initial: Snapshot,
    #[serde(rename = "final")]
    expected: Snapshot,
}

#[test]
fn single_step_corpus() {
    let corpus = Path::new(CORPUS_DIR);
    if !corpus.is_dir() {
        eprintln!("skipping: conformance corpus not present at {CORPUS_DIR}");
        return;
    }

    let mut files: Vec<_> = fs::read_dir(corpus)
        .expect("corpus directory is readable")
        .map(|entry| entry.expect("corpus directory entry").path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .filter(|path| {
            let name = path.file_name().and_then(|name| name.to_str()).unwrap_or("");
            !IGNORED_FILES.contains(&name)
        })
        .collect();
    files.sort();
    assert!(!files.is_empty(), "corpus directory exists but holds no cases");

    for path in files {
        run_file(&path).unwrap_or_else(|err| panic!("{}: {err:#}", path.display()));
    }
}

fn run_file(path: &Path) -> Result<()> {
    let json = fs::read_to_string(path).context("reading corpus file")?;
    let cases: Vec<TestCase> = serde_json::from_str(&json).context("parsing corpus file")?;

    for case in cases {
        let mut cpu = Cpu::new(FlatBus::new());
        cpu.set_state(&case.initial);

        let cycles = cpu.step();
        anyhow::ensure!(
            cycles.is_some(),
            "case '{}' hit the unknown-opcode sentinel",
            case.name
        );

        if !cpu.compare_state(&case.expected) {
            let actual = cpu.state_for_debug(&case.expected);
            anyhow::bail!(
                "case '{}' mismatch\n  initial:  {:02X?}\n  expected: {:02X?}\n  actual:   {:02X?}",
                case.name,
                case.initial,
                case.expected,
                actual,
            );
        }
    }
    Ok(())
}
