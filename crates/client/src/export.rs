//! CSV export of the wire list.

use wiredesk_shared::Wire;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV export is disabled")]
    Disabled,
    #[error("nothing loaded to export")]
    NothingLoaded,
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV output error: {0}")]
    Output(String),
}

const HEADER: [&str; 8] = [
    "ID",
    "Reference",
    "Sender",
    "Recipient",
    "Amount",
    "Currency",
    "Status",
    "Created",
];

/// Render wires as CSV, one row per wire in the order given.
pub fn wires_to_csv(wires: &[Wire]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(HEADER)?;
    for wire in wires {
        writer.write_record([
            wire.id.to_string(),
            wire.reference_number.clone().unwrap_or_default(),
            wire.sender_name.clone(),
            wire.recipient_name.clone(),
            wire.amount.to_string(),
            wire.currency.clone(),
            wire.status.to_string(),
            wire.created_at.to_rfc3339(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Output(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Output(e.to_string()))
}
