use crate::solve::SolveRecord;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct ExportRow<'a> {
    id: i64,
    created_at: String,
    puzzle: &'a str,
    elapsed_ms: u64,
    time: &'a str,
    scramble: &'a str,
}

/// Write `history` as CSV with a header row, in the order given
pub fn write_csv<W: Write>(history: &[SolveRecord], writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    for record in history {
        out.serialize(ExportRow {
            id: record.id.0,
            created_at: record.created_at.to_rfc3339(),
            puzzle: record.puzzle_variant.key(),
            elapsed_ms: record.elapsed_millis,
            time: &record.display_time,
            scramble: &record.scramble,
        })?;
    }
    out.flush()?;
    Ok(())
}
