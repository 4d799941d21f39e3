//! Worksheet export for finalized PFMEA results.
//!
//! The CSV layout matches the standard PFMEA worksheet handed to process
//! engineers; JSON export carries the full records for downstream tools.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use riskline_core::PfmeaResult;

/// Column order of the exported worksheet.
pub const CSV_HEADERS: [&str; 14] = [
    "ID",
    "Process",
    "Sub-Process",
    "Failure Mode",
    "Potential Effect",
    "SEV",
    "OCC",
    "RPN",
    "Risk Level",
    "Action Req'd?",
    "Control Point",
    "Confidence",
    "Severity Justification",
    "Occurrence Justification",
];

/// Write results as a PFMEA worksheet CSV. Rows keep pipeline order and
/// are numbered from 1.
pub fn write_csv(results: &[PfmeaResult], path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(CSV_HEADERS)?;

    for (index, result) in results.iter().enumerate() {
        writer.write_record([
            (index + 1).to_string(),
            result.process.clone(),
            result.subprocess.clone().unwrap_or_default(),
            result.failure_mode.clone(),
            result.potential_effect.clone(),
            result.severity.value().to_string(),
            result.occurrence.value().to_string(),
            result.rpn.to_string(),
            result.risk_level.to_string(),
            result.action_required.to_string(),
            result.control_point.clone().unwrap_or_default(),
            format!("{:.1}", result.confidence),
            result.severity_justification.clone(),
            result.occurrence_justification.clone(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the full result records as pretty-printed JSON.
pub fn write_json(results: &[PfmeaResult], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}
