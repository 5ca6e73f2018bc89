use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use crate::error::ExportError;
use crate::model::RewardSheet;

pub const COLUMN_TITLES: [&str; 5] = ["Name", "T10", "T8", "Combined", "Gold Rounded"];

const TIMESTAMP_FORMAT: &str = "%d-%m-%Y_%H-%M";

/// `GoldTool_{clan_tag}_{season}_{timestamp}.csv`, with characters that are
/// not allowed in file names replaced.
pub fn export_file_name(clan_tag: &str, season_name: &str, at: DateTime<Local>) -> String {
    let stem = format!(
        "GoldTool_{clan_tag}_{season_name}_{}",
        at.format(TIMESTAMP_FORMAT)
    );
    let stem: String = stem
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{stem}.csv")
}

/// Write the sheet to `writer` as a spreadsheet-compatible CSV table.
///
/// The member table comes first, followed by labeled summary rows for the
/// available gold, the total paid out, the total battles and the gold per
/// battle.
pub fn write_sheet<W: Write>(sheet: &RewardSheet, writer: W) -> Result<(), ExportError> {
    let mut table = csv::WriterBuilder::new().flexible(true).from_writer(writer);

    table.write_record(COLUMN_TITLES)?;
    for row in &sheet.rows {
        table.write_record([
            row.name.clone(),
            row.tier10_battles.to_string(),
            row.tier8_battles.to_string(),
            row.combined_battles.to_string(),
            row.reward.to_string(),
        ])?;
    }

    write_summary(&mut table, "Available gold", sheet.available_gold)?;
    write_summary(&mut table, "Calculated gold to be paid out", sheet.total_reward)?;
    write_summary(&mut table, "Sum of all battles", sheet.total_battles)?;
    write_summary(&mut table, "Gold per battle", sheet.gold_per_battle)?;

    table.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn write_summary<W: Write>(
    table: &mut csv::Writer<W>,
    label: &str,
    value: impl ToString,
) -> Result<(), csv::Error> {
    table.write_record([label, value.to_string().as_str()])
}

/// Write the sheet into `dir` under [`export_file_name`] and return the path.
pub fn export_to_csv(
    sheet: &RewardSheet,
    dir: &Path,
    clan_tag: &str,
    season_name: &str,
) -> Result<PathBuf, ExportError> {
    let path = dir.join(export_file_name(clan_tag, season_name, Local::now()));
    let file = File::create(&path).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    write_sheet(sheet, file)?;
    info!(path = %path.display(), rows = sheet.rows.len(), "exported rewards");
    Ok(path)
}
