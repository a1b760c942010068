//! CSV export of transfer history.

use crate::domain::error::MarketError;
use crate::domain::history::TransferRecord;
use chrono::SecondsFormat;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const HEADER: [&str; 6] = [
    "transfer_id",
    "player_id",
    "sell_price",
    "selling_team",
    "buying_team",
    "transferred_at",
];

/// Write `records` as CSV with a header row. Free-agent signings leave
/// `selling_team` empty.
pub fn write_history<W: Write>(writer: W, records: &[TransferRecord]) -> Result<(), MarketError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER).map_err(csv_err)?;

    for record in records {
        wtr.write_record([
            record.id.to_string(),
            record.player_id.to_string(),
            record.sell_price.to_string(),
            record
                .selling_team
                .map(|id| id.to_string())
                .unwrap_or_default(),
            record.buying_team.to_string(),
            record
                .transferred_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        ])
        .map_err(csv_err)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_history_file(path: &Path, records: &[TransferRecord]) -> Result<(), MarketError> {
    let file = File::create(path)?;
    write_history(file, records)?;
    tracing::info!(path = %path.display(), rows = records.len(), "transfer history exported");
    Ok(())
}

fn csv_err(e: csv::Error) -> MarketError {
    MarketError::Io(std::io::Error::other(format!("CSV write error: {e}")))
}
