//! Comma-delimited serialization of lead lists.

use std::path::Path;

use csv::{QuoteStyle, Terminator, WriterBuilder};
use tracing::debug;

use leadpages_shared::{LeadList, LeadPagesError, Result};

/// Serialize a lead list as comma-delimited text with a header line.
///
/// Fields containing commas, quotes, or newlines are double-quoted; embedded
/// quotes are doubled. Output is always comma-delimited, whatever was read.
pub fn serialize_lead_list(list: &LeadList) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .delimiter(b',')
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(&list.headers)
        .map_err(|e| LeadPagesError::csv(&list.source, e))?;
    for record in list.records() {
        writer
            .write_record(&record)
            .map_err(|e| LeadPagesError::csv(&list.source, e))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| LeadPagesError::csv(&list.source, e.error()))?;
    String::from_utf8(bytes).map_err(|e| LeadPagesError::csv(&list.source, e))
}

/// Write a lead list to `path` via a temp file and rename.
pub async fn write_lead_list(path: &Path, list: &LeadList) -> Result<()> {
    let content = serialize_lead_list(list)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "lead-list.csv".into());
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    tokio::fs::write(&temp, &content)
        .await
        .map_err(|e| LeadPagesError::io(&temp, e))?;
    tokio::fs::rename(&temp, path)
        .await
        .map_err(|e| LeadPagesError::io(path, e))?;

    debug!(path = %path.display(), rows = list.rows.len(), "wrote lead list");
    Ok(())
}
