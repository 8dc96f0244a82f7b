use anyhow::Result;
use tracing::{debug, info, warn};

use crate::binding::{bind_receipt, per_item_file_name};
use crate::cli::GenerateArgs;
use crate::drive::{Drive, LocalDrive, MAIN_FOLDER_NAME, ROOT_FOLDER_NAME};
use crate::model::RunSummary;
use crate::pdf;
use crate::sheet;
use crate::template::{DirTemplateStore, TemplateStore, template_for_category};
use crate::util::{sha256_file, write_json_pretty};

pub fn run(args: GenerateArgs) -> Result<()> {
    let mut source = sheet::open_sheet_source(&args.workbook)?;
    let rows = source.read_rows(&args.sheet)?;
    info!(
        rows = rows.len().saturating_sub(1),
        sheet = %args.sheet,
        workbook = %args.workbook.display(),
        "loaded sheet data"
    );

    let workbook_sha256 = sha256_file(&args.workbook)?;
    let mut summary = RunSummary::new(
        "per-item",
        args.workbook.display().to_string(),
        workbook_sha256,
        &args.sheet,
    );
    summary.dry_run = args.dry_run;

    let mut templates = DirTemplateStore::new(&args.templates_dir, args.output_root.join(".work"));
    let mut drive = LocalDrive::new(&args.output_root);

    generate(&rows, &mut templates, &mut drive, args.dry_run, &mut summary)?;

    if !args.dry_run {
        let manifest_path = args.output_root.join("manifests").join("run_summary.json");
        write_json_pretty(&manifest_path, &summary)?;
        info!(path = %manifest_path.display(), "wrote run summary");
    }

    info!(
        rows = summary.rows_read,
        skipped = summary.rows_skipped,
        files = summary.files_written,
        replaced = summary.files_replaced,
        "per-item generation completed"
    );
    Ok(())
}

/// Core mode A pipeline: one receipt per unit of every line item. Row 0 is
/// the sheet header and is skipped.
pub(crate) fn generate<S: TemplateStore, D: Drive>(
    rows: &[Vec<String>],
    templates: &mut S,
    drive: &mut D,
    dry_run: bool,
    summary: &mut RunSummary,
) -> Result<()> {
    let main_folder = if dry_run {
        None
    } else {
        let root = drive.resolve_folder(ROOT_FOLDER_NAME, None)?;
        Some(drive.resolve_folder(MAIN_FOLDER_NAME, Some(&root))?)
    };

    for cells in rows.iter().skip(1) {
        let row = sheet::extract_row(cells);
        summary.rows_read += 1;

        let Some(template_id) = template_for_category(&row.category) else {
            warn!(
                category = %row.category,
                so = %row.so_number,
                "no template for category, skipping row"
            );
            summary.rows_skipped += 1;
            summary
                .warnings
                .push(format!("no template for category: {}", row.category));
            continue;
        };

        let Some(main_folder) = main_folder.as_ref() else {
            for index in 1..=row.quantity {
                let file_name = per_item_file_name(&row, index);
                info!(
                    folder = %format!(
                        "{ROOT_FOLDER_NAME}/{MAIN_FOLDER_NAME}/{}/{}",
                        row.project, row.project_unit_no
                    ),
                    file = %file_name,
                    "dry-run, would generate"
                );
            }
            continue;
        };

        let project_folder = drive.resolve_folder(&row.project, Some(main_folder))?;
        let unit_folder = drive.resolve_folder(&row.project_unit_no, Some(&project_folder))?;

        for index in 1..=row.quantity {
            let file_name = per_item_file_name(&row, index);

            for existing in drive.find_files_by_name(&file_name, &unit_folder)? {
                drive.soft_delete(&existing)?;
                info!(file = %file_name, "replaced existing file");
                summary.files_replaced += 1;
            }

            let doc_id = templates.copy(&template_id)?;
            let mut document = templates.open(&doc_id)?;
            bind_receipt(&mut document, &row, index);
            templates.save(&doc_id, &document)?;

            let bytes = pdf::render(&document, &file_name)?;
            drive.store_pdf(&bytes, &file_name, &unit_folder)?;
            templates.delete(&doc_id)?;

            summary.files_written += 1;
            debug!(file = %file_name, "generated receipt pdf");
        }
    }

    Ok(())
}
