use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use calamine::{DataType, Reader, open_workbook_auto};
use tracing::debug;

use crate::model::DeliveryRow;
use crate::util::format_delivery_date;

/// Fixed column offsets of the source sheet (57 columns, no header binding).
pub mod col {
    pub const SO_NO: usize = 0;
    pub const PROJECT_UNIT_NO: usize = 7;
    pub const PROJECT: usize = 8;
    pub const UNIT_NO: usize = 9;
    pub const HOUSE_NO: usize = 10;
    pub const CUSTOMER_NAME: usize = 13;
    pub const TELEPHONE: usize = 14;
    pub const UNIT_TYPE: usize = 18;
    pub const CATEGORY: usize = 22;
    pub const INSTALLED_PRODUCT: usize = 23;
    pub const PRODUCT_COLOR: usize = 24;
    pub const BRAND: usize = 25;
    pub const PRODUCT_MODEL: usize = 26;
    pub const INSTALLED_ROOM: usize = 27;
    pub const INSTALLED_POINT: usize = 28;
    pub const QUANTITY: usize = 34;
    pub const PO_NO: usize = 36;
    pub const DELIVERY_DATE: usize = 41;
    pub const DELIVERY_TIME_RANGE: usize = 42;
    pub const NOTE: usize = 45;
    pub const BUILDING: usize = 55;
    pub const FLOOR: usize = 56;
}

/// Read-only access to one rectangular grid of cell values.
pub trait SheetSource {
    fn read_rows(&mut self, sheet_name: &str) -> Result<Vec<Vec<String>>>;
}

/// Picks a source implementation from the file extension.
pub fn open_sheet_source(path: &Path) -> Result<Box<dyn SheetSource>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" | "xls" | "xlsm" | "ods" => Ok(Box::new(WorkbookSource {
            path: path.to_path_buf(),
        })),
        "csv" => Ok(Box::new(CsvSource {
            path: path.to_path_buf(),
        })),
        other => Err(anyhow!(
            "unsupported workbook extension '{other}': {}",
            path.display()
        )),
    }
}

struct WorkbookSource {
    path: PathBuf,
}

impl SheetSource for WorkbookSource {
    fn read_rows(&mut self, sheet_name: &str) -> Result<Vec<Vec<String>>> {
        let mut workbook = open_workbook_auto(&self.path)
            .with_context(|| format!("failed to open workbook: {}", self.path.display()))?;

        // A missing sheet surfaces as calamine's own worksheet-not-found error.
        let range = workbook.worksheet_range(sheet_name).with_context(|| {
            format!(
                "failed to read sheet '{sheet_name}' from {}",
                self.path.display()
            )
        })?;

        Ok(range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect())
    }
}

struct CsvSource {
    path: PathBuf,
}

impl SheetSource for CsvSource {
    fn read_rows(&mut self, sheet_name: &str) -> Result<Vec<Vec<String>>> {
        debug!(sheet = %sheet_name, "csv source has no sheets, reading whole file");

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("failed to open csv: {}", self.path.display()))?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record =
                record.with_context(|| format!("failed to read csv: {}", self.path.display()))?;
            rows.push(record.iter().map(|cell| cell.trim().to_owned()).collect());
        }

        Ok(rows)
    }
}

fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        DataType::String(text) => text.trim().to_owned(),
        DataType::Float(value) => {
            if value.fract().abs() < f64::EPSILON {
                format!("{value:.0}")
            } else {
                value.to_string()
            }
        }
        DataType::Int(value) => value.to_string(),
        DataType::Bool(value) => value.to_string(),
        DataType::DateTime(_) => cell
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| cell.to_string()),
        DataType::Error(_) => String::new(),
        _ => cell.to_string(),
    }
}

/// Extracts the typed record from one data row. Rows narrower than 57
/// columns read missing cells as empty strings.
pub fn extract_row(cells: &[String]) -> DeliveryRow {
    let cell = |offset: usize| cells.get(offset).cloned().unwrap_or_default();

    DeliveryRow {
        so_number: cell(col::SO_NO),
        po_number: cell(col::PO_NO),
        customer_name: cell(col::CUSTOMER_NAME),
        telephone: cell(col::TELEPHONE),
        project: cell(col::PROJECT),
        floor: cell(col::FLOOR),
        unit_type: cell(col::UNIT_TYPE),
        unit_no: cell(col::UNIT_NO),
        project_unit_no: cell(col::PROJECT_UNIT_NO),
        building: cell(col::BUILDING),
        house_no: cell(col::HOUSE_NO),
        delivery_date: format_delivery_date(&cell(col::DELIVERY_DATE)),
        delivery_time_range: cell(col::DELIVERY_TIME_RANGE),
        installed_product: cell(col::INSTALLED_PRODUCT),
        category: cell(col::CATEGORY),
        brand: cell(col::BRAND),
        product_model: cell(col::PRODUCT_MODEL),
        product_color: cell(col::PRODUCT_COLOR),
        installed_room: cell(col::INSTALLED_ROOM),
        installed_point: cell(col::INSTALLED_POINT),
        quantity: coerce_quantity(&cell(col::QUANTITY)),
        quantity_raw: cell(col::QUANTITY).trim().to_owned(),
        note: cell(col::NOTE),
    }
}

/// Quantity is a loop bound: non-numeric, missing, or negative cells all
/// coerce to zero so the row expands to nothing instead of failing.
fn coerce_quantity(raw: &str) -> u32 {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return u32::try_from(value).unwrap_or(0);
    }
    if let Ok(value) = trimmed.parse::<f64>() {
        if value.is_finite() && value >= 0.0 {
            return value.trunc() as u32;
        }
    }
    0
}
