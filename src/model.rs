use std::collections::HashMap;

use serde::Serialize;

/// One data row of the source sheet, extracted by fixed column offset.
///
/// `delivery_date` is already reformatted to `dd/mm/yyyy` (or left as the raw
/// cell text when it does not parse as a date). `quantity` is the coerced
/// loop bound for per-item expansion; rows with a non-numeric quantity carry 0.
/// `quantity_raw` keeps the cell text untouched for the grouped item table.
#[derive(Debug, Clone, Default)]
pub struct DeliveryRow {
    pub so_number: String,
    pub po_number: String,
    pub customer_name: String,
    pub telephone: String,
    pub project: String,
    pub floor: String,
    pub unit_type: String,
    pub unit_no: String,
    pub project_unit_no: String,
    pub building: String,
    pub house_no: String,
    pub delivery_date: String,
    pub delivery_time_range: String,
    pub installed_product: String,
    pub category: String,
    pub brand: String,
    pub product_model: String,
    pub product_color: String,
    pub installed_room: String,
    pub installed_point: String,
    pub quantity: u32,
    pub quantity_raw: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub so_number: String,
    pub customer_name: String,
}

impl GroupKey {
    pub fn from_row(row: &DeliveryRow) -> Self {
        Self {
            so_number: row.so_number.clone(),
            customer_name: row.customer_name.clone(),
        }
    }
}

/// One line item inside a unit group (mode B table row source).
#[derive(Debug, Clone)]
pub struct LineItem {
    pub installed_product: String,
    pub category: String,
    pub brand: String,
    pub product_model: String,
    pub product_color: String,
    pub installed_room: String,
    pub installed_point: String,
    /// Raw quantity cell text; the item table shows it as-is (dash if empty).
    pub quantity: String,
    pub delivery_date: String,
    pub delivery_time_range: String,
    pub note: String,
}

impl LineItem {
    pub fn from_row(row: &DeliveryRow) -> Self {
        Self {
            installed_product: row.installed_product.clone(),
            category: row.category.clone(),
            brand: row.brand.clone(),
            product_model: row.product_model.clone(),
            product_color: row.product_color.clone(),
            installed_room: row.installed_room.clone(),
            installed_point: row.installed_point.clone(),
            quantity: row.quantity_raw.clone(),
            delivery_date: row.delivery_date.clone(),
            delivery_time_range: row.delivery_time_range.clone(),
            note: row.note.clone(),
        }
    }
}

/// All line items sharing one sales-order/customer key, plus the header
/// fields copied from the first row seen for that key.
#[derive(Debug, Clone)]
pub struct UnitGroup {
    pub customer_name: String,
    pub telephone: String,
    pub so_number: String,
    pub po_number: String,
    pub project: String,
    pub floor: String,
    pub unit_type: String,
    pub unit_no: String,
    pub project_unit_no: String,
    pub building: String,
    pub house_no: String,
    pub items: Vec<LineItem>,
}

impl UnitGroup {
    fn from_row(row: &DeliveryRow) -> Self {
        Self {
            customer_name: row.customer_name.clone(),
            telephone: row.telephone.clone(),
            so_number: row.so_number.clone(),
            po_number: row.po_number.clone(),
            project: row.project.clone(),
            floor: row.floor.clone(),
            unit_type: row.unit_type.clone(),
            unit_no: row.unit_no.clone(),
            project_unit_no: row.project_unit_no.clone(),
            building: row.building.clone(),
            house_no: row.house_no.clone(),
            items: Vec::new(),
        }
    }
}

/// Ordered accumulation of rows into unit groups.
///
/// Groups come out in first-occurrence order of their key; items within a
/// group keep the row order of the source table.
#[derive(Debug, Default)]
pub struct UnitGrouper {
    index: HashMap<GroupKey, usize>,
    groups: Vec<UnitGroup>,
}

impl UnitGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, row: &DeliveryRow) {
        let key = GroupKey::from_row(row);
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                self.groups.push(UnitGroup::from_row(row));
                let slot = self.groups.len() - 1;
                self.index.insert(key, slot);
                slot
            }
        };
        self.groups[slot].items.push(LineItem::from_row(row));
    }

    pub fn into_groups(self) -> Vec<UnitGroup> {
        self.groups
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub manifest_version: u32,
    pub generated_at: String,
    pub mode: String,
    pub workbook: String,
    pub workbook_sha256: String,
    pub sheet: String,
    pub dry_run: bool,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub groups: usize,
    pub files_written: usize,
    pub files_replaced: usize,
    pub warnings: Vec<String>,
}

impl RunSummary {
    pub fn new(mode: &str, workbook: String, workbook_sha256: String, sheet: &str) -> Self {
        Self {
            manifest_version: 1,
            generated_at: crate::util::now_utc_string(),
            mode: mode.to_owned(),
            workbook,
            workbook_sha256,
            sheet: sheet.to_owned(),
            dry_run: false,
            rows_read: 0,
            rows_skipped: 0,
            groups: 0,
            files_written: 0,
            files_replaced: 0,
            warnings: Vec::new(),
        }
    }
}
