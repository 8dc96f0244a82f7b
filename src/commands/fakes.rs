//! In-memory stand-ins for the host stores, used by the pipeline tests.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use anyhow::{Result, anyhow, bail};

use crate::drive::{Drive, FileId, FolderId};
use crate::sheet::col;
use crate::template::{Block, DocumentId, TemplateDocument, TemplateId, TemplateStore};

#[derive(Default)]
pub struct MemDrive {
    pub folders: Vec<PathBuf>,
    pub files: BTreeMap<PathBuf, Vec<u8>>,
    pub trashed: Vec<PathBuf>,
    pub write_order: Vec<PathBuf>,
}

impl Drive for MemDrive {
    fn resolve_folder(&mut self, name: &str, parent: Option<&FolderId>) -> Result<FolderId> {
        if name.trim().is_empty() {
            bail!("folder name cannot be empty");
        }
        let path = match parent {
            Some(parent) => parent.0.join(name),
            None => PathBuf::from(name),
        };
        if !self.folders.contains(&path) {
            self.folders.push(path.clone());
        }
        Ok(FolderId(path))
    }

    fn find_files_by_name(&self, name: &str, folder: &FolderId) -> Result<Vec<FileId>> {
        let path = folder.0.join(name);
        if self.files.contains_key(&path) {
            Ok(vec![FileId(path)])
        } else {
            Ok(Vec::new())
        }
    }

    fn soft_delete(&mut self, file: &FileId) -> Result<()> {
        self.files
            .remove(&file.0)
            .ok_or_else(|| anyhow!("no such file: {}", file.0.display()))?;
        self.trashed.push(file.0.clone());
        Ok(())
    }

    fn store_pdf(&mut self, bytes: &[u8], name: &str, folder: &FolderId) -> Result<FileId> {
        let path = folder.0.join(name);
        self.files.insert(path.clone(), bytes.to_vec());
        self.write_order.push(path.clone());
        Ok(FileId(path))
    }
}

#[derive(Default)]
pub struct MemTemplates {
    pub templates: HashMap<String, TemplateDocument>,
    pub staged: HashMap<PathBuf, TemplateDocument>,
    pub copies: usize,
    pub last_saved: Option<TemplateDocument>,
    seq: u64,
}

impl MemTemplates {
    pub fn insert(&mut self, id: &str, document: TemplateDocument) {
        self.templates.insert(id.to_owned(), document);
    }
}

impl TemplateStore for MemTemplates {
    fn copy(&mut self, id: &TemplateId) -> Result<DocumentId> {
        let document = self
            .templates
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| anyhow!("template not found: {id}"))?;
        self.copies += 1;
        self.seq += 1;
        let path = PathBuf::from(format!("work/{}_{:04}.json", id.as_str(), self.seq));
        self.staged.insert(path.clone(), document);
        Ok(DocumentId(path))
    }

    fn open(&self, doc: &DocumentId) -> Result<TemplateDocument> {
        self.staged
            .get(&doc.0)
            .cloned()
            .ok_or_else(|| anyhow!("no staged document: {doc}"))
    }

    fn save(&mut self, doc: &DocumentId, document: &TemplateDocument) -> Result<()> {
        self.staged.insert(doc.0.clone(), document.clone());
        self.last_saved = Some(document.clone());
        Ok(())
    }

    fn delete(&mut self, doc: &DocumentId) -> Result<()> {
        self.staged
            .remove(&doc.0)
            .ok_or_else(|| anyhow!("no staged document: {doc}"))?;
        Ok(())
    }
}

pub fn receipt_template() -> TemplateDocument {
    TemplateDocument {
        blocks: vec![Block::Paragraph {
            text: "ใบรับสินค้า {{CustomerName}} {{SO_No}} {{InstalledProduct}}".to_owned(),
        }],
    }
}

pub fn unit_summary_template() -> TemplateDocument {
    TemplateDocument {
        blocks: vec![
            Block::Paragraph {
                text: "ใบรับสินค้า {{CustomerName}} {{SO_No}}".to_owned(),
            },
            Block::Table {
                rows: vec![vec!["Unit".to_owned(), "{{UnitNo}}".to_owned()]],
            },
            Block::Table {
                rows: vec![vec![
                    "Product".to_owned(),
                    "Category".to_owned(),
                    "Qty".to_owned(),
                ]],
            },
        ],
    }
}

pub fn header_row() -> Vec<String> {
    vec!["header".to_owned(); 57]
}

#[allow(clippy::too_many_arguments)]
pub fn data_row(
    so: &str,
    customer: &str,
    project: &str,
    project_unit_no: &str,
    category: &str,
    product: &str,
    room: &str,
    point: &str,
    quantity: &str,
) -> Vec<String> {
    let mut cells = vec![String::new(); 57];
    cells[col::SO_NO] = so.to_owned();
    cells[col::CUSTOMER_NAME] = customer.to_owned();
    cells[col::PROJECT] = project.to_owned();
    cells[col::PROJECT_UNIT_NO] = project_unit_no.to_owned();
    cells[col::CATEGORY] = category.to_owned();
    cells[col::INSTALLED_PRODUCT] = product.to_owned();
    cells[col::INSTALLED_ROOM] = room.to_owned();
    cells[col::INSTALLED_POINT] = point.to_owned();
    cells[col::QUANTITY] = quantity.to_owned();
    cells[col::DELIVERY_DATE] = "2024-09-17".to_owned();
    cells
}
