use tracing::trace;

use crate::model::{DeliveryRow, LineItem, UnitGroup};
use crate::template::TemplateDocument;

/// Fills the flat per-item token set. Every generated unit of a row binds
/// the same header fields; `index` is part of the binding context but no
/// current placeholder consumes it (reserved for future templates).
pub fn bind_receipt(doc: &mut TemplateDocument, row: &DeliveryRow, index: u32) {
    let pairs: [(&str, &str); 18] = [
        ("{{CustomerName}}", &row.customer_name),
        ("{{SO_No}}", &row.so_number),
        ("{{PO_No}}", &row.po_number),
        ("{{Project}}", &row.project),
        ("{{floor}}", &row.floor),
        ("{{UnitType}}", &row.unit_type),
        ("{{UnitNo}}", &row.unit_no),
        ("{{Building}}", &row.building),
        ("{{HouseNo}}", &row.house_no),
        ("{{DeliveryDate}}", &row.delivery_date),
        ("{{DeliveryTimeRange}}", &row.delivery_time_range),
        ("{{InstalledProduct}}", &row.installed_product),
        ("{{ProductCate}}", &row.category),
        ("{{Brand}}", &row.brand),
        ("{{ProductHi1}}", &row.product_model),
        ("{{ProductColor}}", &row.product_color),
        ("{{InstalledRoom}}", &row.installed_room),
        ("{{InstalledPoint}}", &row.installed_point),
    ];

    for (token, value) in pairs {
        doc.replace_all(token, value);
    }
    trace!(index, so = %row.so_number, "applied per-item binding");
}

/// Fills the unit-level header tokens for a grouped receipt.
pub fn bind_unit_header(doc: &mut TemplateDocument, group: &UnitGroup) {
    let pairs: [(&str, &str); 10] = [
        ("{{CustomerName}}", &group.customer_name),
        ("{{telNo}}", &group.telephone),
        ("{{SO_No}}", &group.so_number),
        ("{{PO_No}}", &group.po_number),
        ("{{Project}}", &group.project),
        ("{{floor}}", &group.floor),
        ("{{UnitType}}", &group.unit_type),
        ("{{UnitNo}}", &group.unit_no),
        ("{{Building}}", &group.building),
        ("{{HouseNo}}", &group.house_no),
    ];

    for (token, value) in pairs {
        doc.replace_all(token, value);
    }
}

/// Regenerates the item table (the document's second table region): clears
/// every row below the header, then appends one 13-cell row per line item.
/// Returns false when the document has fewer than two tables; the caller
/// logs and carries on.
pub fn populate_item_table(doc: &mut TemplateDocument, items: &[LineItem]) -> bool {
    if doc.table_count() < 2 {
        return false;
    }
    let Some(rows) = doc.table_mut(1) else {
        return false;
    };

    rows.truncate(1);
    for item in items {
        rows.push(vec![
            or_dash(&item.installed_product),
            or_dash(&item.category),
            or_dash(&item.brand),
            or_dash(&item.product_model),
            or_dash(&item.product_color),
            or_dash(&item.installed_room),
            or_dash(&item.installed_point),
            or_dash(&item.note),
            or_dash(&item.delivery_date),
            or_dash(&item.delivery_time_range),
            or_dash(&item.quantity),
            " ".to_owned(),
            " ".to_owned(),
        ]);
    }
    true
}

fn or_dash(value: &str) -> String {
    if value.trim().is_empty() {
        "-".to_owned()
    } else {
        value.to_owned()
    }
}

/// Deterministic per-item file name. Must stay byte-compatible with the
/// documents already filed by earlier runs.
pub fn per_item_file_name(row: &DeliveryRow, index: u32) -> String {
    let base = format!(
        "{}_{}-{}",
        row.project_unit_no, row.category, row.installed_product
    );

    let name = if row.installed_room.trim().is_empty() {
        format!("{base}_{index}")
    } else if row.installed_point.trim().is_empty() {
        format!("{base} ({})_{index}", row.installed_room)
    } else {
        format!(
            "{base} ({} {})_{index}",
            row.installed_room, row.installed_point
        )
    };

    format!("{}.pdf", name.trim())
}

/// File name of a grouped per-unit receipt.
pub fn grouped_file_name(group: &UnitGroup) -> String {
    format!("ใบรับสินค้า_{}.pdf", group.so_number)
}
