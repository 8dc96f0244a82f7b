use anyhow::Result;
use tracing::{debug, info, warn};

use crate::binding::{bind_unit_header, grouped_file_name, populate_item_table};
use crate::cli::GenerateArgs;
use crate::drive::{Drive, LocalDrive, MAIN_FOLDER_NAME};
use crate::model::{RunSummary, UnitGrouper};
use crate::pdf;
use crate::sheet;
use crate::template::{DirTemplateStore, TemplateId, TemplateStore, UNIT_SUMMARY_TEMPLATE};
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
        "grouped",
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
        groups = summary.groups,
        files = summary.files_written,
        replaced = summary.files_replaced,
        "grouped generation completed"
    );
    Ok(())
}

/// Core mode B pipeline: accumulate rows into sales-order/customer groups,
/// then render one receipt per group with the item table regenerated.
pub(crate) fn generate<S: TemplateStore, D: Drive>(
    rows: &[Vec<String>],
    templates: &mut S,
    drive: &mut D,
    dry_run: bool,
    summary: &mut RunSummary,
) -> Result<()> {
    let mut grouper = UnitGrouper::new();
    for cells in rows.iter().skip(1) {
        grouper.add(&sheet::extract_row(cells));
        summary.rows_read += 1;
    }

    let groups = grouper.into_groups();
    summary.groups = groups.len();

    let main_folder = if dry_run {
        None
    } else {
        Some(drive.resolve_folder(MAIN_FOLDER_NAME, None)?)
    };
    let template_id = TemplateId::new(UNIT_SUMMARY_TEMPLATE);

    for group in &groups {
        let file_name = grouped_file_name(group);

        let Some(main_folder) = main_folder.as_ref() else {
            info!(
                folder = %format!(
                    "{MAIN_FOLDER_NAME}/{}/{}",
                    group.project, group.project_unit_no
                ),
                file = %file_name,
                items = group.items.len(),
                "dry-run, would generate"
            );
            continue;
        };

        let project_folder = drive.resolve_folder(&group.project, Some(main_folder))?;
        let unit_folder = drive.resolve_folder(&group.project_unit_no, Some(&project_folder))?;

        let doc_id = templates.copy(&template_id)?;
        let mut document = templates.open(&doc_id)?;
        bind_unit_header(&mut document, group);
        if !populate_item_table(&mut document, &group.items) {
            warn!(
                so = %group.so_number,
                "template has no item table, rows not populated"
            );
            summary.warnings.push(format!(
                "template has no item table for group {}",
                group.so_number
            ));
        }
        templates.save(&doc_id, &document)?;

        for existing in drive.find_files_by_name(&file_name, &unit_folder)? {
            drive.soft_delete(&existing)?;
            info!(file = %file_name, "replaced existing file");
            summary.files_replaced += 1;
        }

        let bytes = pdf::render(&document, &file_name)?;
        drive.store_pdf(&bytes, &file_name, &unit_folder)?;
        templates.delete(&doc_id)?;

        summary.files_written += 1;
        debug!(file = %file_name, items = group.items.len(), "generated unit receipt pdf");
    }

    Ok(())
}
