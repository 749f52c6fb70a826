//! Lead-list ingestion: delimiter sniffing, CSV/TSV parsing, and write-back.
//!
//! Parsing is delegated to the `csv` crate. A file that cannot be opened fails
//! the caller; a record the parser cannot decode is logged and skipped.

mod writer;

use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::{debug, instrument, warn};

use leadpages_shared::{Delimiter, LeadList, LeadPagesError, Result, Row};

pub use writer::{serialize_lead_list, write_lead_list};

/// Pick the delimiter from the first line: tab if it has one, comma otherwise.
pub fn sniff_delimiter(content: &str) -> Delimiter {
    let first_line = content.lines().next().unwrap_or("");
    if first_line.contains('\t') {
        Delimiter::Tab
    } else {
        Delimiter::Comma
    }
}

/// Read and parse a lead list from disk.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn read_lead_list(path: &Path) -> Result<LeadList> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| LeadPagesError::io(path, e))?;

    match String::from_utf8(bytes) {
        Ok(content) => parse_lead_list(path, &content),
        Err(e) => {
            warn!(
                valid_up_to = e.utf8_error().valid_up_to(),
                "lead list is not valid UTF-8, undecodable bytes replaced"
            );
            let content = String::from_utf8_lossy(e.as_bytes()).into_owned();
            let mut list = parse_lead_list(path, &content)?;
            list.decoded_lossily = true;
            Ok(list)
        }
    }
}

/// Parse delimited text already in memory. `path` is recorded as the source.
pub fn parse_lead_list(path: &Path, content: &str) -> Result<LeadList> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let delimiter = sniff_delimiter(content);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .trim(Trim::Headers)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| LeadPagesError::csv(path, format!("failed to read headers: {e}")))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(record = index + 1, error = %e, "skipping unreadable record");
                continue;
            }
        };

        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.as_str(), v))
            .collect();
        rows.push(row);
    }

    debug!(
        ?delimiter,
        columns = headers.len(),
        rows = rows.len(),
        "parsed lead list"
    );

    Ok(LeadList {
        source: path.to_path_buf(),
        delimiter,
        headers,
        rows,
        decoded_lossily: false,
    })
}
