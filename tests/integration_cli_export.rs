// Runs the compiled binary in export mode, which needs no terminal.
use assert_cmd::Command;
use sociacube::clock::ManualClock;
use sociacube::controller::TimerController;
use sociacube::identity::Identity;
use sociacube::puzzle::PuzzleVariant;
use sociacube::remote::RemoteMirror;
use sociacube::scramble::Scrambler;
use sociacube::session::SolveSession;
use sociacube::store::SqliteStore;
use std::path::Path;
use tempfile::tempdir;

fn seed_history(db: &Path, variant: PuzzleVariant, times: &[u64]) {
    let clock = ManualClock::new();
    let session = SolveSession::new(
        variant,
        Box::new(SqliteStore::open(db).unwrap()),
        RemoteMirror::disabled(),
        Identity::anonymous(),
    );
    let mut ctl = TimerController::new(clock.clone(), session, Scrambler::seeded(9), 0);
    for &ms in times {
        ctl.toggle();
        clock.advance_ms(ms);
        ctl.toggle().expect("solve finished");
    }
}

#[test]
fn export_writes_csv_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    seed_history(&dir.path().join("history.db"), PuzzleVariant::TwoByTwo, &[4_321, 999]);
    let out = dir.path().join("solves.csv");

    Command::cargo_bin("sociacube")?
        .arg("--data-dir")
        .arg(dir.path())
        .args(["--puzzle", "2x2", "--export"])
        .arg(&out)
        .assert()
        .success();

    let csv = std::fs::read_to_string(&out)?;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "id,created_at,puzzle,elapsed_ms,time,scramble");
    assert_eq!(lines.len(), 3);
    assert!(lines[1].contains(",2x2,999,0.999s,"));
    assert!(lines[2].contains(",2x2,4321,4.321s,"));
    Ok(())
}

#[test]
fn export_to_stdout_only_includes_requested_puzzle() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let db = dir.path().join("history.db");
    seed_history(&db, PuzzleVariant::TwoByTwo, &[2_000]);
    seed_history(&db, PuzzleVariant::Pyraminx, &[3_500, 4_000]);

    let output = Command::cargo_bin("sociacube")?
        .arg("--data-dir")
        .arg(dir.path())
        .args(["-p", "pyraminx", "--export", "-"])
        .output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert_eq!(stdout.lines().count(), 3);
    assert!(stdout.contains("pyraminx,4000,4.000s"));
    assert!(!stdout.contains("2x2"));
    Ok(())
}

#[test]
fn save_config_persists_flags() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    Command::cargo_bin("sociacube")?
        .arg("--data-dir")
        .arg(dir.path())
        .args(["-p", "3x3oh", "-i", "8", "-u", "ada", "--save-config", "--export", "-"])
        .assert()
        .success();

    let saved = std::fs::read_to_string(dir.path().join("config.json"))?;
    let config: serde_json::Value = serde_json::from_str(&saved)?;
    assert_eq!(config["puzzle"], "3x3oh");
    assert_eq!(config["inspection_secs"], 8);
    assert_eq!(config["username"], "ada");
    Ok(())
}

#[test]
fn rejects_unknown_puzzle() -> Result<(), Box<dyn std::error::Error>> {
    Command::cargo_bin("sociacube")?
        .args(["--puzzle", "megaminx", "--export", "-"])
        .assert()
        .failure();
    Ok(())
}
