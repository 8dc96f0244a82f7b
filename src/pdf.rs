use std::io::BufWriter;

use anyhow::{Result, anyhow};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use crate::template::{Block, TemplateDocument};

// printpdf measures in Mm(f32).
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;
const TOP_MM: f32 = PAGE_HEIGHT_MM - MARGIN_MM;
const LINE_STEP_MM: f32 = 6.0;
const PARAGRAPH_SIZE: f32 = 11.0;
const TABLE_SIZE: f32 = 8.0;

/// Renders a filled document to PDF bytes: paragraphs as text lines, table
/// rows as evenly spaced columns, top-down with page breaks on A4 portrait.
///
/// Built-in fonts are WinAnsi-encoded; Thai text needs an embedded TTF via
/// `add_external_font` to render its glyphs.
pub fn render(document: &TemplateDocument, title: &str) -> Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        title,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|err| anyhow!("failed to load builtin font: {err}"))?;

    let mut cursor = Cursor {
        layer: doc.get_page(page).get_layer(layer),
        y: TOP_MM,
    };

    for block in &document.blocks {
        match block {
            Block::Paragraph { text } => {
                cursor.advance_line(&doc);
                cursor
                    .layer
                    .use_text(text.clone(), PARAGRAPH_SIZE, Mm(MARGIN_MM), Mm(cursor.y), &font);
            }
            Block::Table { rows } => {
                render_table(&doc, &mut cursor, rows, &font);
            }
        }
    }

    let mut bytes = Vec::new();
    doc.save(&mut BufWriter::new(&mut bytes))
        .map_err(|err| anyhow!("failed to serialize pdf: {err}"))?;
    Ok(bytes)
}

struct Cursor {
    layer: PdfLayerReference,
    y: f32,
}

impl Cursor {
    /// Moves down one line, starting a fresh page when the bottom margin is
    /// reached.
    fn advance_line(&mut self, doc: &PdfDocumentReference) {
        self.y -= LINE_STEP_MM;
        if self.y < MARGIN_MM {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            self.layer = doc.get_page(page).get_layer(layer);
            self.y = TOP_MM;
        }
    }
}

fn render_table(
    doc: &PdfDocumentReference,
    cursor: &mut Cursor,
    rows: &[Vec<String>],
    font: &IndirectFontRef,
) {
    let usable = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;

    for row in rows {
        cursor.advance_line(doc);
        let columns = row.len().max(1);
        let step = usable / columns as f32;
        for (index, cell) in row.iter().enumerate() {
            cursor.layer.use_text(
                cell.clone(),
                TABLE_SIZE,
                Mm(MARGIN_MM + step * index as f32),
                Mm(cursor.y),
                font,
            );
        }
    }
    // Gap below the table.
    cursor.y -= LINE_STEP_MM / 2.0;
}
