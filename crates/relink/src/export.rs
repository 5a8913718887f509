//! Two-column redirect export.
//!
//! Column one is the path (plus query) of the legacy URL, column two the
//! full target URL so cross-domain redirects survive import. The file starts
//! with a UTF-8 byte-order mark for spreadsheet tools.

use crate::store::LegacyUrlRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::Path;
use url::Url;

const BOM: &[u8] = b"\xEF\xBB\xBF";
pub const HEADER: [&str; 2] = ["Redirect from", "Redirect to"];

/// Path and query of a URL, always starting with `/`.
pub fn url_to_path(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        if parsed.has_host() {
            return match parsed.query() {
                Some(q) => format!("{}?{q}", parsed.path()),
                None => parsed.path().to_string(),
            };
        }
    }
    let relative = url.split('#').next().unwrap_or("");
    if relative.starts_with('/') {
        relative.to_string()
    } else {
        format!("/{relative}")
    }
}

/// The `(from, to)` pair written for a record.
pub fn redirect_row(record: &LegacyUrlRecord) -> Option<(String, String)> {
    let target = record.new_url.as_deref().filter(|u| !u.is_empty())?;
    let to = match Url::parse(target) {
        Ok(_) => target.to_string(),
        Err(_) => url_to_path(target),
    };
    Some((url_to_path(&record.old_url), to))
}

/// Write matched records as CSV. Unmatched records are left out.
pub fn write_redirects<W: Write>(mut out: W, records: &[LegacyUrlRecord]) -> Result<usize> {
    out.write_all(BOM)?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(HEADER)?;

    let mut written = 0;
    for (from, to) in records.iter().filter_map(redirect_row) {
        writer.write_record([from, to])?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

/// Write the export to `path`.
pub fn export_to_file(path: &Path, records: &[LegacyUrlRecord]) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create export file: {}", path.display()))?;
    write_redirects(std::io::BufWriter::new(file), records)
        .with_context(|| format!("failed to write export file: {}", path.display()))
}

/// `redirects-YYYY-mm-dd-HHMMSS.csv`
pub fn default_file_name(now: DateTime<Utc>) -> String {
    format!("redirects-{}.csv", now.format("%Y-%m-%d-%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(old: &str, new: Option<&str>, score: u8) -> LegacyUrlRecord {
        LegacyUrlRecord {
            id: 1,
            session_id: "s".into(),
            old_url: old.into(),
            new_url: new.map(String::from),
            score,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_url_to_path() {
        assert_eq!(url_to_path("https://old.shop.pt/fr/products/x?variant=1#top"), "/fr/products/x?variant=1");
        assert_eq!(url_to_path("https://old.shop.pt"), "/");
        assert_eq!(url_to_path("products/x"), "/products/x");
        assert_eq!(url_to_path("/pages/a#b"), "/pages/a");
    }

    #[test]
    fn test_write_redirects() {
        let records = vec![
            record("https://shop.pt/cs/products/caj?x=1", Some("https://shop.com/cs/products/tea"), 90),
            record("https://shop.pt/pages/old", None, 0),
            record("https://shop.pt/pages/gone", Some("pages/new, improved"), 30),
        ];
        let mut buf = Vec::new();
        let n = write_redirects(&mut buf, &records).unwrap();
        assert_eq!(n, 2);

        assert!(buf.starts_with(BOM));
        let text = String::from_utf8(buf[BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Redirect from,Redirect to");
        assert_eq!(lines[1], "/cs/products/caj?x=1,https://shop.com/cs/products/tea");
        assert_eq!(lines[2], "/pages/gone,\"/pages/new, improved\"");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let n = export_to_file(&path, &[record("https://a.com/x", Some("https://b.com/y"), 80)]).unwrap();
        assert_eq!(n, 1);
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(BOM));
    }

    #[test]
    fn test_default_file_name() {
        let t = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(default_file_name(t), "redirects-2024-03-09-140507.csv");
    }
}
