use std::io::Cursor;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use card_rewards::config::RewardsConfig;
use card_rewards::error::AppError;
use card_rewards::rewards::{
    CardId, CardRepository, CatalogImporter, CategoryId, InMemoryCatalog, RepositoryError,
    RewardsServiceError, SubCategoryId, TransactionType,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

/// Seed used when no catalog CSV is configured.
pub(crate) const SAMPLE_CATALOG: &str = include_str!("../../../data/sample_catalog.csv");

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn load_catalog(config: &RewardsConfig) -> Result<InMemoryCatalog, AppError> {
    let store = match &config.catalog_csv {
        Some(path) => {
            info!(path = %path.display(), "loading catalog seed");
            CatalogImporter::from_path(path)?
        }
        None => sample_catalog()?,
    };
    Ok(store)
}

pub(crate) fn sample_catalog() -> Result<InMemoryCatalog, AppError> {
    Ok(CatalogImporter::from_reader(Cursor::new(SAMPLE_CATALOG))?)
}

pub(crate) fn parse_transaction_type(raw: &str) -> Result<TransactionType, String> {
    raw.parse::<TransactionType>().map_err(|err| err.to_string())
}

fn not_found(entity: &'static str, name: &str) -> AppError {
    AppError::Rewards(RewardsServiceError::Repository(RepositoryError::not_found(
        entity, name,
    )))
}

pub(crate) fn resolve_category(
    store: &InMemoryCatalog,
    name: &str,
) -> Result<CategoryId, AppError> {
    store
        .category_named(name)
        .map_err(RewardsServiceError::from)?
        .map(|category| category.id)
        .ok_or_else(|| not_found("category", name))
}

pub(crate) fn resolve_sub_category(
    store: &InMemoryCatalog,
    category_id: &CategoryId,
    name: &str,
) -> Result<SubCategoryId, AppError> {
    store
        .sub_category_named(category_id, name)
        .map_err(RewardsServiceError::from)?
        .map(|sub_category| sub_category.id)
        .ok_or_else(|| not_found("sub-category", name))
}

/// Card names are only unique per bank; match case-insensitively across the whole catalog.
pub(crate) fn resolve_card(store: &InMemoryCatalog, name: &str) -> Result<CardId, AppError> {
    let wanted = name.trim();
    let cards = store.list_cards().map_err(RewardsServiceError::from)?;
    cards
        .into_iter()
        .find(|entry| entry.card.name.eq_ignore_ascii_case(wanted))
        .map(|entry| entry.card.id)
        .ok_or_else(|| not_found("credit card", name))
}
