use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "receiptgen",
    version,
    about = "Batch delivery-receipt PDF generation from spreadsheet rows"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate one receipt PDF per unit of every line item (quantity explosion).
    PerItem(GenerateArgs),
    /// Generate one receipt PDF per sales-order/customer group with an item table.
    Grouped(GenerateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Source workbook (.xlsx/.xls/.xlsm/.ods) or CSV export.
    #[arg(long)]
    pub workbook: PathBuf,

    /// Worksheet to read rows from. Ignored for CSV sources.
    #[arg(long, default_value = "Data")]
    pub sheet: String,

    /// Directory holding the template documents (<template-id>.json).
    #[arg(long, default_value = "templates")]
    pub templates_dir: PathBuf,

    /// Root directory the generated folder tree is created under.
    #[arg(long, default_value = "out")]
    pub output_root: PathBuf,

    /// Log what would be generated without writing anything.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}
