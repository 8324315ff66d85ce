//! End-of-run report: a text summary for the terminal and a JSON export.

use std::path::Path;

use tracing::info;

use crate::contacts::{ContactStatus, EnrichedContact};
use crate::error::ReportError;

/// Render the enriched contacts as a human-readable summary.
pub fn render_text(contacts: &[EnrichedContact]) -> String {
    let enriched = contacts.iter().filter(|c| c.summary.is_some()).count();
    let mut out = format!("Enriched {enriched} of {} contacts\n", contacts.len());

    for contact in contacts {
        out.push_str(&format!("\n{} <{}>\n", contact.seed.name, contact.seed.email));
        if !contact.status.is_settled() {
            out.push_str("  Not processed\n");
            continue;
        }
        match (&contact.summary, &contact.status) {
            (Some(person), status) => {
                out.push_str(&format!("  Company Leader: {}\n", person.name));
                if let Some(title) = &person.title {
                    out.push_str(&format!("  Title: {title}\n"));
                }
                if let Some(location) = &person.location {
                    out.push_str(&format!("  Location: {location}\n"));
                }
                if let Some(url) = &person.profile_url {
                    out.push_str(&format!("  Profile: {url}\n"));
                }
                if *status == ContactStatus::Selected {
                    out.push_str("  (selected by operator)\n");
                }
            }
            (None, ContactStatus::Failed { detail }) => {
                out.push_str(&format!("  Lookup failed: {detail}\n"));
            }
            (None, _) => out.push_str("  No company leader found\n"),
        }
    }
    out
}

/// Write the enriched contacts to `path` as pretty JSON.
pub fn write_json(path: &Path, contacts: &[EnrichedContact]) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(contacts)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)?;
    info!(path = %path.display(), contacts = contacts.len(), "Wrote JSON report");
    Ok(())
}
