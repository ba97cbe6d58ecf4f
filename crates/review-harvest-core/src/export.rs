use chrono::{DateTime, Local};
use review_harvest_models::{Batch, Review};
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use crate::error::ExportError;

const HEADERS: [&str; 4] = ["author", "date", "rating", "text"];
const SHEET_NAME: &str = "reviews";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes a full batch to a CSV file and a spreadsheet in one directory.
///
/// Files are named `<prefix>_<YYYYMMDD_HHMMSS>` and never overwrite an
/// earlier export.
#[derive(Debug, Clone)]
pub struct Exporter {
    directory: PathBuf,
    file_prefix: String,
}

/// Per-format result of one export
#[derive(Debug)]
pub struct ExportReport {
    pub csv: Result<PathBuf, ExportError>,
    pub spreadsheet: Result<PathBuf, ExportError>,
}

/// Serializable view of an `ExportReport`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportSummary {
    pub files: Vec<PathBuf>,
    pub errors: Vec<String>,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.csv.is_ok() && self.spreadsheet.is_ok()
    }

    pub fn summary(&self) -> ExportSummary {
        let mut summary = ExportSummary::default();
        for (format, result) in [("csv", &self.csv), ("xlsx", &self.spreadsheet)] {
            match result {
                Ok(path) => summary.files.push(path.clone()),
                Err(e) => summary.errors.push(format!("{}: {}", format, e)),
            }
        }
        summary
    }
}

impl Exporter {
    pub fn new(directory: impl Into<PathBuf>, file_prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            file_prefix: file_prefix.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn export(&self, batch: &Batch) -> ExportReport {
        self.export_at(batch, Local::now())
    }

    /// Export with an explicit timestamp for the file names
    pub fn export_at(&self, batch: &Batch, now: DateTime<Local>) -> ExportReport {
        if let Err(e) = std::fs::create_dir_all(&self.directory) {
            error!("Failed to create output directory {}: {}", self.directory.display(), e);
            let failed = || ExportError::Io(io::Error::new(e.kind(), e.to_string()));
            return ExportReport {
                csv: Err(failed()),
                spreadsheet: Err(failed()),
            };
        }

        let stem = self.unique_stem(&now.format("%Y%m%d_%H%M%S").to_string());
        let csv_path = self.directory.join(format!("{}.csv", stem));
        let xlsx_path = self.directory.join(format!("{}.xlsx", stem));

        let csv = write_csv(&csv_path, batch).map(|_| csv_path);
        log_result("CSV", &csv);

        let spreadsheet = write_spreadsheet(&xlsx_path, batch).map(|_| xlsx_path);
        log_result("Excel", &spreadsheet);

        ExportReport { csv, spreadsheet }
    }

    /// `<prefix>_<stamp>`, or `<prefix>_<stamp>_N` when either file already exists
    fn unique_stem(&self, stamp: &str) -> String {
        let base = format!("{}_{}", self.file_prefix, stamp);
        let taken = |stem: &str| {
            self.directory.join(format!("{}.csv", stem)).exists()
                || self.directory.join(format!("{}.xlsx", stem)).exists()
        };

        if !taken(&base) {
            return base;
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}_{}", base, n);
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

fn log_result(format: &str, result: &Result<PathBuf, ExportError>) {
    match result {
        Ok(path) => info!("Saved to {}: {}", format, path.display()),
        Err(e) => error!("Failed to save {} export: {}", format, e),
    }
}

fn row(review: &Review) -> [String; 4] {
    [
        review.author.clone(),
        review.date_string(),
        review.rating.to_string(),
        review.text.clone(),
    ]
}

fn write_csv(path: &Path, batch: &Batch) -> Result<(), ExportError> {
    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(HEADERS)?;
    for review in batch {
        writer.write_record(row(review))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_spreadsheet(path: &Path, batch: &Batch) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, header) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }

    for (i, review) in batch.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, &review.author)?;
        if let Some(date) = review.published_at {
            sheet.write_string(r, 1, date.format("%Y-%m-%d").to_string())?;
        }
        sheet.write_number(r, 2, review.rating)?;
        sheet.write_string(r, 3, &review.text)?;
    }

    workbook.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use tempfile::TempDir;

    fn batch() -> Batch {
        Batch::new(vec![
            Review {
                author: "Ivan".to_string(),
                published_at: NaiveDate::from_ymd_opt(2023, 11, 14),
                rating: 4,
                text: "Good, \"really\" good".to_string(),
                identity_hash: "h1".to_string(),
            },
            Review {
                author: "anonymous".to_string(),
                published_at: None,
                rating: 1,
                text: String::new(),
                identity_hash: "h2".to_string(),
            },
        ])
    }

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
    }

    #[test]
    fn test_export_writes_both_formats() {
        let dir = TempDir::new().unwrap();
        let exporter = Exporter::new(dir.path().join("out"), "reviews");

        let report = exporter.export_at(&batch(), fixed_time());
        assert!(report.is_complete());

        let csv_path = report.csv.as_ref().unwrap();
        assert_eq!(csv_path.file_name().unwrap(), "reviews_20240305_140709.csv");
        assert_eq!(
            report.spreadsheet.as_ref().unwrap().file_name().unwrap(),
            "reviews_20240305_140709.xlsx"
        );

        let bytes = std::fs::read(csv_path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let content = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "author,date,rating,text");
        assert_eq!(lines[1], "Ivan,2023-11-14,4,\"Good, \"\"really\"\" good\"");
        assert_eq!(lines[2], "anonymous,,1,");
        assert!(!content.contains("h1"));
    }

    #[test]
    fn test_export_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let exporter = Exporter::new(dir.path(), "reviews");

        let first = exporter.export_at(&batch(), fixed_time());
        let second = exporter.export_at(&batch(), fixed_time());
        let third = exporter.export_at(&batch(), fixed_time());

        assert_eq!(
            second.csv.as_ref().unwrap().file_name().unwrap(),
            "reviews_20240305_140709_1.csv"
        );
        assert_eq!(
            third.spreadsheet.as_ref().unwrap().file_name().unwrap(),
            "reviews_20240305_140709_2.xlsx"
        );
        assert_ne!(first.csv.unwrap(), second.csv.unwrap());
    }

    #[test]
    fn test_unwritable_directory_is_reported() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        let exporter = Exporter::new(blocker.join("out"), "reviews");
        let report = exporter.export_at(&batch(), fixed_time());

        assert!(report.csv.is_err());
        assert!(report.spreadsheet.is_err());
        let summary = report.summary();
        assert!(summary.files.is_empty());
        assert_eq!(summary.errors.len(), 2);
    }

    #[test]
    fn test_summary_lists_written_files() {
        let dir = TempDir::new().unwrap();
        let report = Exporter::new(dir.path(), "r").export_at(&batch(), fixed_time());
        let summary = report.summary();
        assert_eq!(summary.files.len(), 2);
        assert!(summary.errors.is_empty());
    }
}
