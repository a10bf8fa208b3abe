// CSV export of the request collection

use crate::models::Request;
use chrono::SecondsFormat;
use csv::{ReaderBuilder, StringRecord, Writer};
use eyre::{Context, Result, eyre};
use std::fs;
use std::path::Path;
use tracing::info;

pub const CSV_HEADER: [&str; 8] = [
    "createdAt",
    "name",
    "description",
    "dueDate",
    "priority",
    "status",
    "devNotes",
    "pinned",
];

/// Field values of one request in header order
fn row(request: &Request) -> [String; 8] {
    [
        request.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        request.name.clone(),
        request.description.clone(),
        request
            .due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        request.priority.to_string(),
        request.status.to_string(),
        request.dev_notes.clone(),
        request.pinned.to_string(),
    ]
}

/// Encode `requests` as CSV, quoting only fields that need it
pub fn to_csv(requests: &[Request]) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for request in requests {
        writer.write_record(row(request))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| eyre!("Failed to flush CSV writer: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

/// Write the CSV export to `path`
pub fn export_to_path(requests: &[Request], path: &Path) -> Result<()> {
    let csv = to_csv(requests)?;
    fs::write(path, csv).with_context(|| format!("Failed to write export to {:?}", path))?;
    info!(file = ?path, count = requests.len(), "Exported requests");
    Ok(())
}

/// Read an export back as raw string rows (header excluded)
pub fn parse_csv(data: &str) -> Result<Vec<StringRecord>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(data.as_bytes());
    let header = reader.headers()?.clone();
    if header.iter().ne(CSV_HEADER) {
        return Err(eyre!("Unexpected CSV header: {:?}", header));
    }
    reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to parse CSV rows")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, Status};
    use chrono::{NaiveDate, TimeZone, Utc};
    use tempfile::TempDir;

    fn request(name: &str, description: &str, notes: &str) -> Request {
        Request {
            id: "id".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap(),
            name: name.to_string(),
            description: description.to_string(),
            due_date: None,
            priority: Priority::Urgent,
            status: Status::InProgress,
            dev_notes: notes.to_string(),
            pinned: false,
            synced: true,
        }
    }

    #[test]
    fn test_header_and_plain_row() {
        let mut r = request("Alice", "Bracket", "");
        r.due_date = NaiveDate::from_ymd_opt(2026, 10, 20);
        r.pinned = true;

        let csv = to_csv(&[r]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "createdAt,name,description,dueDate,priority,status,devNotes,pinned"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2026-10-18T09:30:00.000Z,Alice,Bracket,2026-10-20,Urgent,In Progress,,true"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_quoting_rules() {
        let csv = to_csv(&[request("Smith, Jo", r#"Say "hi""#, "line one\nline two")]).unwrap();
        let body = csv.split_once('\n').unwrap().1;
        assert_eq!(
            body,
            "2026-10-18T09:30:00.000Z,\"Smith, Jo\",\"Say \"\"hi\"\"\",,Urgent,In Progress,\"line one\nline two\",false\n"
        );
    }

    #[test]
    fn test_round_trip_recovers_fields() {
        let mut tricky = request("O'Neil, \"Dee\"", "Gear,\r\nmodule 2", "notes: \"fast\"");
        tricky.due_date = NaiveDate::from_ymd_opt(2027, 1, 2);
        tricky.pinned = true;
        let requests = vec![tricky, request("Plain", "Thing", "")];

        let rows = parse_csv(&to_csv(&requests).unwrap()).unwrap();
        assert_eq!(rows.len(), requests.len());
        for (row, original) in rows.iter().zip(&requests) {
            assert_eq!(&row[1], original.name);
            assert_eq!(&row[2], original.description);
            assert_eq!(
                &row[3],
                original.due_date.map(|d| d.to_string()).unwrap_or_default()
            );
            assert_eq!(&row[4], original.priority.as_str());
            assert_eq!(&row[5], original.status.as_str());
            assert_eq!(&row[6], original.dev_notes);
            assert_eq!(row[7].parse::<bool>().unwrap(), original.pinned);
            assert_eq!(row[0].parse::<chrono::DateTime<Utc>>().unwrap(), original.created_at);
        }
    }

    #[test]
    fn test_parse_rejects_foreign_header() {
        assert!(parse_csv("id,name\n1,a\n").is_err());
    }

    #[test]
    fn test_export_to_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("requests.csv");
        export_to_path(&[request("Alice", "Bracket", "")], &path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("createdAt,name"));
        assert_eq!(parse_csv(&written).unwrap().len(), 1);
    }
}
