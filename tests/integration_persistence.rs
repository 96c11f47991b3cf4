// History written through one session must be visible to the next one that
// opens the same database file.
use sociacube::clock::ManualClock;
use sociacube::controller::TimerController;
use sociacube::identity::Identity;
use sociacube::puzzle::PuzzleVariant;
use sociacube::remote::RemoteMirror;
use sociacube::scramble::Scrambler;
use sociacube::session::{SolveSession, HISTORY_CAP};
use sociacube::store::SqliteStore;
use std::path::Path;
use tempfile::tempdir;

fn open(db: &Path, variant: PuzzleVariant, clock: &ManualClock) -> TimerController<ManualClock> {
    let session = SolveSession::new(
        variant,
        Box::new(SqliteStore::open(db).unwrap()),
        RemoteMirror::disabled(),
        Identity::anonymous(),
    );
    TimerController::new(clock.clone(), session, Scrambler::seeded(1), 0)
}

fn time_solve(ctl: &mut TimerController<ManualClock>, clock: &ManualClock, ms: u64) {
    ctl.toggle();
    clock.advance_ms(ms);
    ctl.toggle().expect("solve finished");
}

#[test]
fn history_survives_restart() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("history.db");
    let clock = ManualClock::new();

    {
        let mut ctl = open(&db, PuzzleVariant::TwoByTwo, &clock);
        for ms in [3_000, 2_500, 4_100] {
            time_solve(&mut ctl, &clock, ms);
        }
    }

    let ctl = open(&db, PuzzleVariant::TwoByTwo, &clock);
    let times: Vec<u64> = ctl
        .session()
        .history()
        .iter()
        .map(|r| r.elapsed_millis)
        .collect();
    assert_eq!(times, vec![4_100, 2_500, 3_000]);
    assert_eq!(
        ctl.session().best().map(|r| r.display_time.as_str()),
        Some("2.500s")
    );
}

#[test]
fn variants_are_stored_apart() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("history.db");
    let clock = ManualClock::new();

    {
        let mut ctl = open(&db, PuzzleVariant::Pyraminx, &clock);
        time_solve(&mut ctl, &clock, 5_000);
        ctl.switch_variant(PuzzleVariant::ThreeByThreeOneHanded);
        time_solve(&mut ctl, &clock, 30_000);
        time_solve(&mut ctl, &clock, 28_000);
    }

    let mut ctl = open(&db, PuzzleVariant::Pyraminx, &clock);
    assert_eq!(ctl.session().history().len(), 1);
    ctl.switch_variant(PuzzleVariant::ThreeByThreeOneHanded);
    assert_eq!(ctl.session().history().len(), 2);
    ctl.switch_variant(PuzzleVariant::ThreeByThree);
    assert!(ctl.session().history().is_empty());
}

#[test]
fn best_outlives_eviction_and_deletion_persists() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("history.db");
    let clock = ManualClock::new();

    let deleted = {
        let mut ctl = open(&db, PuzzleVariant::ThreeByThree, &clock);
        time_solve(&mut ctl, &clock, 1_000);
        for _ in 0..HISTORY_CAP {
            time_solve(&mut ctl, &clock, 9_000);
        }
        assert_eq!(ctl.session().history().len(), HISTORY_CAP);
        let newest = ctl.session().history()[0].id;
        ctl.delete_solve(newest).expect("newest solve deleted");
        newest
    };

    let ctl = open(&db, PuzzleVariant::ThreeByThree, &clock);
    let history = ctl.session().history();
    assert_eq!(history.len(), HISTORY_CAP - 1);
    assert!(history.iter().all(|r| r.id != deleted));
    assert!(history.iter().all(|r| r.elapsed_millis == 9_000));
    assert_eq!(ctl.session().best().map(|r| r.elapsed_millis), Some(1_000));
}

#[test]
fn missing_best_is_rebuilt_and_written_back() {
    use sociacube::session::{best_key, history_key};
    use sociacube::solve::{SolveId, SolveRecord};
    use sociacube::store::HistoryStore;

    let dir = tempdir().unwrap();
    let db = dir.path().join("history.db");
    let record = SolveRecord::new(
        SolveId(5),
        1_000,
        "R U".into(),
        PuzzleVariant::TwoByTwo,
        chrono::Local::now(),
    );
    {
        let mut store = SqliteStore::open(&db).unwrap();
        store
            .set(
                &history_key(PuzzleVariant::TwoByTwo),
                &serde_json::to_string(&vec![record.clone()]).unwrap(),
            )
            .unwrap();
    }

    let clock = ManualClock::new();
    {
        let mut ctl = open(&db, PuzzleVariant::TwoByTwo, &clock);
        time_solve(&mut ctl, &clock, 5_000);
        assert_eq!(ctl.session().best().map(|r| r.id), Some(SolveId(5)));
    }

    let store = SqliteStore::open(&db).unwrap();
    let raw = store
        .get(&best_key(PuzzleVariant::TwoByTwo))
        .unwrap()
        .expect("best written back");
    let best: SolveRecord = serde_json::from_str(&raw).unwrap();
    assert_eq!(best.elapsed_millis, 1_000);
}
