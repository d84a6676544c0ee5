use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use rayon::prelude::*;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};
use tracing::debug;

use crate::download::{image_file_names, Downloader, ImageSource};
use crate::error::Result;
use crate::model::{ClassInfo, IdCardRecord};

pub const SHEET_NAME: &str = "ID Cards";

pub const HEADERS: [&str; 14] = [
    "Serial No.",
    "Admission No.",
    "Student Photo",
    "Student Name",
    "Class",
    "Date of Birth",
    "Father Photo",
    "Father Name",
    "Father Mobile",
    "Mother Photo",
    "Mother Name",
    "Mother Mobile",
    "Address",
    "Created Date",
];

const COLUMN_WIDTHS: [f64; 14] = [
    10.0, 15.0, 15.0, 25.0, 15.0, 15.0, 15.0, 25.0, 15.0, 15.0, 25.0, 15.0, 40.0, 15.0,
];

const HEADER_FILL: u32 = 0xD3D3D3;

/// Outcome of a best-effort field conversion: either the formatted value, or
/// the raw input passed through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Formatted(String),
    Raw(String),
}

impl Rendered {
    pub fn as_str(&self) -> &str {
        match self {
            Rendered::Formatted(s) | Rendered::Raw(s) => s,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            Rendered::Formatted(s) | Rendered::Raw(s) => s,
        }
    }
}

/// Derived display identifier for one row. Purely positional: the same
/// record lands on a different admission number if a filter reorders or
/// trims the result set.
pub fn admission_number(start_serial: u32, serial_no: u32) -> String {
    format!("ADM{}", admission_serial(start_serial, serial_no))
}

/// Widened to `u64` so a base near `u32::MAX` cannot wrap.
fn admission_serial(start_serial: u32, serial_no: u32) -> u64 {
    u64::from(start_serial) + u64::from(serial_no) - 1
}

/// Resolve a record's class to "{name} {section}" (trimmed), or "Unknown"
/// when the class id is absent from the lookup mapping.
pub fn class_display(class_id: Option<&str>, class_map: &HashMap<String, ClassInfo>) -> String {
    match class_id.and_then(|id| class_map.get(id)) {
        Some(info) => format!("{} {}", info.name, info.section).trim().to_string(),
        None => "Unknown".to_string(),
    }
}

/// Reformat an ISO-8601 date-time to `DD-MM-YYYY` (a trailing `Z` reads as
/// UTC). Unparseable input passes through verbatim, tagged as raw.
pub fn render_date(raw: &str) -> Rendered {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Rendered::Formatted(dt.format("%d-%m-%Y").to_string());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Rendered::Formatted(dt.format("%d-%m-%Y").to_string());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Rendered::Formatted(date.format("%d-%m-%Y").to_string());
    }
    debug!("Unparseable date kept verbatim: {raw:?}");
    Rendered::Raw(raw.to_string())
}

/// One fully formatted spreadsheet row.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub serial_no: u32,
    pub admission_no: String,
    pub student_photo: String,
    pub student_name: String,
    pub class_name: String,
    pub date_of_birth: String,
    pub father_photo: String,
    pub father_name: String,
    pub father_mobile: String,
    pub mother_photo: String,
    pub mother_name: String,
    pub mother_mobile: String,
    pub address: String,
    pub created_date: String,
}

impl ReportRow {
    /// Text cells in column order, excluding the numeric serial column.
    fn text_cells(&self) -> [&str; 13] {
        [
            &self.admission_no,
            &self.student_photo,
            &self.student_name,
            &self.class_name,
            &self.date_of_birth,
            &self.father_photo,
            &self.father_name,
            &self.father_mobile,
            &self.mother_photo,
            &self.mother_name,
            &self.mother_mobile,
            &self.address,
            &self.created_date,
        ]
    }
}

pub struct RowSet {
    pub rows: Vec<ReportRow>,
    pub images: Vec<PathBuf>,
}

/// Format every record and download its images. Records fan out across the
/// rayon pool (downloads are independent), but the collected output keeps
/// input order, so row N is always record N.
pub fn build_rows<S: ImageSource>(
    records: &[IdCardRecord],
    class_map: &HashMap<String, ClassInfo>,
    downloader: &Downloader<'_, S>,
    start_serial: u32,
) -> RowSet {
    let built: Vec<(ReportRow, Vec<PathBuf>)> = records
        .par_iter()
        .enumerate()
        .map(|(idx, record)| {
            build_row(idx as u32 + 1, record, class_map, downloader, start_serial)
        })
        .collect();

    let mut rows = Vec::with_capacity(built.len());
    let mut images = Vec::new();
    for (row, mut paths) in built {
        rows.push(row);
        images.append(&mut paths);
    }

    RowSet { rows, images }
}

fn build_row<S: ImageSource>(
    serial_no: u32,
    record: &IdCardRecord,
    class_map: &HashMap<String, ClassInfo>,
    downloader: &Downloader<'_, S>,
    start_serial: u32,
) -> (ReportRow, Vec<PathBuf>) {
    let serial = admission_serial(start_serial, serial_no);
    let student_name = record.student_name.as_deref().unwrap_or("");
    let father_name = record.father_name.as_deref().unwrap_or("");
    let mother_name = record.mother_name.as_deref().unwrap_or("");

    let names = image_file_names(serial, student_name, father_name, mother_name);

    let mut images = Vec::new();
    let mut photo_cell = |url: Option<&str>, file_name: &str| -> String {
        match downloader.download(url, file_name) {
            Some(path) => {
                images.push(path);
                file_name.to_string()
            }
            None => "N/A".to_string(),
        }
    };

    let student_photo = photo_cell(record.student_photo_url.as_deref(), &names.student);
    let father_photo = photo_cell(record.father_photo_url.as_deref(), &names.father);
    let mother_photo = photo_cell(record.mother_photo_url.as_deref(), &names.mother);

    let row = ReportRow {
        serial_no,
        admission_no: admission_number(start_serial, serial_no),
        student_photo,
        student_name: student_name.to_string(),
        class_name: class_display(record.class_id.as_deref(), class_map),
        date_of_birth: record
            .date_of_birth
            .as_deref()
            .map(render_date)
            .map(Rendered::into_string)
            .unwrap_or_default(),
        father_photo,
        father_name: father_name.to_string(),
        father_mobile: record.father_mobile.clone().unwrap_or_default(),
        mother_photo,
        mother_name: mother_name.to_string(),
        mother_mobile: record.mother_mobile.clone().unwrap_or_default(),
        address: record.address.clone().unwrap_or_default(),
        created_date: record
            .created_at
            .as_deref()
            .map(render_date)
            .map(Rendered::into_string)
            .unwrap_or_default(),
    };

    (row, images)
}

/// Write the rows to a timestamped workbook under `output_dir`: bold shaded
/// header, fixed column widths, thin borders on every populated cell, an
/// autofilter over the populated range, and a frozen header row. The
/// timestamp is taken at save time.
pub fn write_workbook(rows: &[ReportRow], output_dir: &Path) -> Result<PathBuf> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_border(FormatBorder::Thin);
    let cell_format = Format::new().set_border(FormatBorder::Thin);

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }
    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let row_num = idx as u32 + 1;
        worksheet.write_number_with_format(row_num, 0, row.serial_no as f64, &cell_format)?;
        for (offset, value) in row.text_cells().iter().enumerate() {
            worksheet.write_string_with_format(row_num, offset as u16 + 1, *value, &cell_format)?;
        }
    }

    worksheet.autofilter(0, 0, rows.len() as u32, (HEADERS.len() - 1) as u16)?;
    worksheet.set_freeze_panes(1, 0)?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = output_dir.join(format!("ID_Cards_Export_{timestamp}.xlsx"));
    workbook.save(&path)?;
    debug!("Workbook saved to {}", path.display());

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admission_number_is_positional() {
        assert_eq!(admission_number(115601, 1), "ADM115601");
        assert_eq!(admission_number(115601, 3), "ADM115603");
        // Changing the base shifts every number uniformly.
        assert_eq!(admission_number(200, 3), "ADM202");
    }

    #[test]
    fn test_admission_number_near_u32_max_does_not_wrap() {
        assert_eq!(admission_number(u32::MAX, 1), format!("ADM{}", u32::MAX));
        assert_eq!(admission_number(u32::MAX, 2), "ADM4294967296");
    }

    #[test]
    fn test_class_display_known_class() {
        let mut map = HashMap::new();
        map.insert(
            "c1".to_string(),
            ClassInfo {
                name: "Grade 5".to_string(),
                section: "B".to_string(),
            },
        );
        assert_eq!(class_display(Some("c1"), &map), "Grade 5 B");
    }

    #[test]
    fn test_class_display_trims_empty_section() {
        let mut map = HashMap::new();
        map.insert(
            "c1".to_string(),
            ClassInfo {
                name: "Grade 5".to_string(),
                section: String::new(),
            },
        );
        assert_eq!(class_display(Some("c1"), &map), "Grade 5");
    }

    #[test]
    fn test_class_display_unknown_class() {
        let map = HashMap::new();
        assert_eq!(class_display(Some("missing"), &map), "Unknown");
        assert_eq!(class_display(None, &map), "Unknown");
    }

    #[test]
    fn test_render_date_utc_suffix() {
        assert_eq!(
            render_date("1990-05-12T00:00:00Z"),
            Rendered::Formatted("12-05-1990".to_string())
        );
    }

    #[test]
    fn test_render_date_explicit_offset() {
        assert_eq!(
            render_date("2024-01-15T09:30:00+00:00"),
            Rendered::Formatted("15-01-2024".to_string())
        );
    }

    #[test]
    fn test_render_date_date_only() {
        assert_eq!(
            render_date("2015-06-01"),
            Rendered::Formatted("01-06-2015".to_string())
        );
    }

    #[test]
    fn test_render_date_malformed_passes_through() {
        assert_eq!(
            render_date("not-a-date"),
            Rendered::Raw("not-a-date".to_string())
        );
    }
}
