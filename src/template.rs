use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::{ensure_directory, write_json_pretty};

/// Template used by the grouped (per-unit) pipeline. Carries two table
/// regions: unit details and the item table.
pub const UNIT_SUMMARY_TEMPLATE: &str = "receipt-unit-summary";

/// Static category-to-template table, case-sensitive exact match. Categories
/// absent from this table are skipped by the per-item pipeline.
const CATEGORY_TEMPLATES: &[(&str, &str)] = &[
    ("เครื่องทำน้ำอุ่น", "receipt-delivery"),
    ("เครื่องทำน้ำอุ่นพร้อมติดตั้ง", "receipt-delivery-install"),
    ("บริการติดตั้ง : เครื่องทำน้ำอุ่น", "receipt-install-service"),
    ("เครื่องปรับอากาศ", "receipt-delivery"),
    ("บริการติดตั้ง : เครื่องปรับอากาศ", "receipt-install-service"),
    ("โครงหลังคา-หน้าบ้าน", "receipt-delivery-install"),
    ("โครงหลังคา-หลังบ้าน", "receipt-delivery-install"),
    ("กระจกกั้นห้องอาบน้ำพร้อมติดตั้ง", "receipt-delivery-install"),
    ("ม่าน", "receipt-delivery-install"),
];

pub fn template_for_category(category: &str) -> Option<TemplateId> {
    CATEGORY_TEMPLATES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, id)| TemplateId::new(*id))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one staged working copy of a template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId(pub PathBuf);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// A merge document: ordered paragraph and table blocks. Placeholder tokens
/// may appear in any paragraph or table cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDocument {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph { text: String },
    Table { rows: Vec<Vec<String>> },
}

impl TemplateDocument {
    /// Replaces every occurrence of `token` across the whole document.
    /// Tokens with no replacement simply stay in place.
    pub fn replace_all(&mut self, token: &str, value: &str) {
        for block in &mut self.blocks {
            match block {
                Block::Paragraph { text } => {
                    if text.contains(token) {
                        *text = text.replace(token, value);
                    }
                }
                Block::Table { rows } => {
                    for row in rows {
                        for cell in row {
                            if cell.contains(token) {
                                *cell = cell.replace(token, value);
                            }
                        }
                    }
                }
            }
        }
    }

    pub fn table_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|block| matches!(block, Block::Table { .. }))
            .count()
    }

    /// Mutable access to the n-th table region (0-based), if present.
    pub fn table_mut(&mut self, index: usize) -> Option<&mut Vec<Vec<String>>> {
        self.blocks
            .iter_mut()
            .filter_map(|block| match block {
                Block::Table { rows } => Some(rows),
                Block::Paragraph { .. } => None,
            })
            .nth(index)
    }
}

/// Template host: named read-only templates, plus staged working copies that
/// get filled, rendered, and discarded.
pub trait TemplateStore {
    fn copy(&mut self, id: &TemplateId) -> Result<DocumentId>;
    fn open(&self, doc: &DocumentId) -> Result<TemplateDocument>;
    fn save(&mut self, doc: &DocumentId, document: &TemplateDocument) -> Result<()>;
    fn delete(&mut self, doc: &DocumentId) -> Result<()>;
}

/// Directory-backed store: templates live as `<id>.json` under the template
/// directory, working copies under a scratch directory.
pub struct DirTemplateStore {
    templates_dir: PathBuf,
    work_dir: PathBuf,
    seq: u64,
}

impl DirTemplateStore {
    pub fn new(templates_dir: &Path, work_dir: PathBuf) -> Self {
        Self {
            templates_dir: templates_dir.to_path_buf(),
            work_dir,
            seq: 0,
        }
    }

    fn template_path(&self, id: &TemplateId) -> PathBuf {
        self.templates_dir.join(format!("{}.json", id.as_str()))
    }
}

impl TemplateStore for DirTemplateStore {
    fn copy(&mut self, id: &TemplateId) -> Result<DocumentId> {
        let source = self.template_path(id);
        let raw = fs::read(&source)
            .with_context(|| format!("failed to read template: {}", source.display()))?;

        // Parse on copy so a malformed template fails before any file work.
        let _: TemplateDocument = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse template: {}", source.display()))?;

        ensure_directory(&self.work_dir)?;
        self.seq += 1;
        let staged = self
            .work_dir
            .join(format!("{}_{:04}.json", id.as_str(), self.seq));
        fs::write(&staged, &raw)
            .with_context(|| format!("failed to stage template copy: {}", staged.display()))?;

        Ok(DocumentId(staged))
    }

    fn open(&self, doc: &DocumentId) -> Result<TemplateDocument> {
        let raw = fs::read(&doc.0)
            .with_context(|| format!("failed to read document: {}", doc.0.display()))?;
        serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse document: {}", doc.0.display()))
    }

    fn save(&mut self, doc: &DocumentId, document: &TemplateDocument) -> Result<()> {
        write_json_pretty(&doc.0, document)
    }

    fn delete(&mut self, doc: &DocumentId) -> Result<()> {
        fs::remove_file(&doc.0)
            .with_context(|| format!("failed to delete document: {}", doc.0.display()))
    }
}
