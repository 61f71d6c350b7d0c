//! Catalog seeding from a flat CSV export, one reward rule per row.

mod parser;

use std::io::Read;
use std::path::Path;

use tracing::info;

use super::catalog::{CardId, CategoryId, SubCategoryId};
use super::memory::InMemoryCatalog;
use super::repository::{RepositoryError, RuleDraft, RuleRepository};

use parser::CatalogRecord;

#[derive(Debug)]
pub enum CatalogImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Catalog { line: u64, source: RepositoryError },
}

impl std::fmt::Display for CatalogImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogImportError::Io(err) => write!(f, "failed to read catalog seed: {}", err),
            CatalogImportError::Csv(err) => write!(f, "invalid catalog CSV data: {}", err),
            CatalogImportError::Catalog { line, source } => {
                write!(f, "catalog seed line {} rejected: {}", line, source)
            }
        }
    }
}

impl std::error::Error for CatalogImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogImportError::Io(err) => Some(err),
            CatalogImportError::Csv(err) => Some(err),
            CatalogImportError::Catalog { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for CatalogImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct CatalogImporter;

impl CatalogImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<InMemoryCatalog, CatalogImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<InMemoryCatalog, CatalogImportError> {
        let store = InMemoryCatalog::new();
        Self::load_into(&store, reader)?;
        Ok(store)
    }

    /// Append the rows of `reader` to an existing store, reusing banks, cards and categories
    /// that already exist under the same name. Returns the number of rules created.
    pub fn load_into<R: Read>(
        store: &InMemoryCatalog,
        reader: R,
    ) -> Result<usize, CatalogImportError> {
        let mut created = 0;
        for parsed in parser::parse_records(reader)? {
            let record = parsed.map_err(|(line, err)| CatalogImportError::Catalog {
                line,
                source: err.into(),
            })?;
            let line = record.line;
            apply_record(store, record)
                .map_err(|source| CatalogImportError::Catalog { line, source })?;
            created += 1;
        }

        info!(rules = created, "catalog seed imported");
        Ok(created)
    }
}

fn apply_record(store: &InMemoryCatalog, record: CatalogRecord) -> Result<(), RepositoryError> {
    let card_id = resolve_card(store, &record)?;
    let category_id = resolve_category(store, &record.category)?;
    let sub_category_id = match record.sub_category.as_deref() {
        Some(name) => Some(resolve_sub_category(store, &category_id, name)?),
        None => None,
    };

    store.create_rule(RuleDraft {
        credit_card_id: card_id,
        category_id,
        sub_category_id,
        transaction_type: record.transaction_type,
        reward_type: record.reward_type,
        reward_value: record.reward_value,
        monthly_cap: record.monthly_cap,
        minimum_spend: record.minimum_spend,
    })?;
    Ok(())
}

fn resolve_card(store: &InMemoryCatalog, record: &CatalogRecord) -> Result<CardId, RepositoryError> {
    let bank = match store.bank_named(&record.bank)? {
        Some(bank) => bank,
        None => store.add_bank(&record.bank, None)?,
    };
    let card = match store.card_named(&bank.id, &record.card)? {
        Some(card) => card,
        None => store.add_card(&bank.id, &record.card, record.annual_fee, None)?,
    };
    Ok(card.id)
}

fn resolve_category(store: &InMemoryCatalog, name: &str) -> Result<CategoryId, RepositoryError> {
    match store.category_named(name)? {
        Some(category) => Ok(category.id),
        None => Ok(store.add_category(name)?.id),
    }
}

fn resolve_sub_category(
    store: &InMemoryCatalog,
    category_id: &CategoryId,
    name: &str,
) -> Result<SubCategoryId, RepositoryError> {
    match store.sub_category_named(category_id, name)? {
        Some(sub_category) => Ok(sub_category.id),
        None => Ok(store.add_sub_category(category_id, name)?.id),
    }
}
