use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::calculator::RewardError;
use super::catalog::{
    CardId, CatalogError, CategoryId, RuleId, SubCategoryId, TransactionType, UserId,
};
use super::matcher::RuleQuery;
use super::ranking::RankedResult;
use super::repository::{
    AuthorizedCaller, RepositoryError, RewardsRepository, Role, RuleDraft, RuleUpdate,
};
use super::service::{RewardsService, RewardsServiceError};
use super::views::RankedResultView;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Spend to evaluate, as posted by the calculator screen.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RewardQueryRequest {
    pub category_id: CategoryId,
    #[serde(default)]
    pub sub_category_id: Option<SubCategoryId>,
    #[serde(default)]
    pub transaction_type: Option<TransactionType>,
    pub amount: f64,
}

impl RewardQueryRequest {
    fn query(&self) -> RuleQuery {
        RuleQuery {
            category_id: self.category_id.clone(),
            sub_category_id: self.sub_category_id.clone(),
            transaction_type: self.transaction_type,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RankingResponse {
    pub calculated_at: DateTime<Utc>,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended: Option<RankedResultView>,
    pub results: Vec<RankedResultView>,
}

impl RankingResponse {
    fn new(amount: f64, results: &[RankedResult], currency: &str) -> Self {
        let results: Vec<RankedResultView> = results
            .iter()
            .map(|result| RankedResultView::from_result(result, currency))
            .collect();
        Self {
            calculated_at: Utc::now(),
            amount,
            recommended: results.first().cloned(),
            results,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub card_ids: Vec<CardId>,
}

/// Router builder exposing the rewards endpoints.
pub fn rewards_router<R>(service: Arc<RewardsService<R>>) -> Router
where
    R: RewardsRepository + 'static,
{
    Router::new()
        .route("/api/v1/rewards/best-card", post(best_card_handler::<R>))
        .route("/api/v1/rewards/rank", post(rank_handler::<R>))
        .route("/api/v1/rewards/compare", post(compare_handler::<R>))
        .route("/api/v1/categories", get(categories_handler::<R>))
        .route("/api/v1/cards/:card_id/rules", get(card_rules_handler::<R>))
        .route("/api/v1/me/cards", get(my_cards_handler::<R>))
        .route(
            "/api/v1/me/cards/:card_id",
            post(attach_card_handler::<R>).delete(detach_card_handler::<R>),
        )
        .route("/api/v1/rules", post(create_rule_handler::<R>))
        .route(
            "/api/v1/rules/:rule_id",
            put(update_rule_handler::<R>).delete(delete_rule_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn best_card_handler<R>(
    State(service): State<Arc<RewardsService<R>>>,
    headers: HeaderMap,
    Json(request): Json<RewardQueryRequest>,
) -> Response
where
    R: RewardsRepository + 'static,
{
    let caller = match caller_from_headers(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    match service.best_cards(&caller, &request.query(), request.amount) {
        Ok(results) => {
            let body = RankingResponse::new(request.amount, &results, service.currency_symbol());
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn rank_handler<R>(
    State(service): State<Arc<RewardsService<R>>>,
    Json(request): Json<RewardQueryRequest>,
) -> Response
where
    R: RewardsRepository + 'static,
{
    match service.rank_all(&request.query(), request.amount) {
        Ok(results) => {
            let body = RankingResponse::new(request.amount, &results, service.currency_symbol());
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn compare_handler<R>(
    State(service): State<Arc<RewardsService<R>>>,
    Json(request): Json<CompareRequest>,
) -> Response
where
    R: RewardsRepository + 'static,
{
    match service.compare(&request.card_ids) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn categories_handler<R>(State(service): State<Arc<RewardsService<R>>>) -> Response
where
    R: RewardsRepository + 'static,
{
    match service.categories() {
        Ok(categories) => (StatusCode::OK, Json(categories)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn card_rules_handler<R>(
    State(service): State<Arc<RewardsService<R>>>,
    Path(card_id): Path<String>,
) -> Response
where
    R: RewardsRepository + 'static,
{
    match service.card_rules(&CardId(card_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn my_cards_handler<R>(
    State(service): State<Arc<RewardsService<R>>>,
    headers: HeaderMap,
) -> Response
where
    R: RewardsRepository + 'static,
{
    let caller = match caller_from_headers(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    match service.cards_for(&caller) {
        Ok(cards) => (StatusCode::OK, Json(cards)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn attach_card_handler<R>(
    State(service): State<Arc<RewardsService<R>>>,
    headers: HeaderMap,
    Path(card_id): Path<String>,
) -> Response
where
    R: RewardsRepository + 'static,
{
    let caller = match caller_from_headers(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    match service.attach_card(&caller, &CardId(card_id.clone())) {
        Ok(()) => (StatusCode::CREATED, Json(json!({ "card_id": card_id }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn detach_card_handler<R>(
    State(service): State<Arc<RewardsService<R>>>,
    headers: HeaderMap,
    Path(card_id): Path<String>,
) -> Response
where
    R: RewardsRepository + 'static,
{
    let caller = match caller_from_headers(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    match service.detach_card(&caller, &CardId(card_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_rule_handler<R>(
    State(service): State<Arc<RewardsService<R>>>,
    headers: HeaderMap,
    Json(draft): Json<RuleDraft>,
) -> Response
where
    R: RewardsRepository + 'static,
{
    let caller = match caller_from_headers(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    match service.create_rule(&caller, draft) {
        Ok(rule) => (StatusCode::CREATED, Json(rule)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_rule_handler<R>(
    State(service): State<Arc<RewardsService<R>>>,
    headers: HeaderMap,
    Path(rule_id): Path<String>,
    Json(update): Json<RuleUpdate>,
) -> Response
where
    R: RewardsRepository + 'static,
{
    let caller = match caller_from_headers(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    match service.update_rule(&caller, &RuleId(rule_id), update) {
        Ok(rule) => (StatusCode::OK, Json(rule)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_rule_handler<R>(
    State(service): State<Arc<RewardsService<R>>>,
    headers: HeaderMap,
    Path(rule_id): Path<String>,
) -> Response
where
    R: RewardsRepository + 'static,
{
    let caller = match caller_from_headers(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    match service.delete_rule(&caller, &RuleId(rule_id)) {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(err) => error_response(err),
    }
}

/// Read the identity forwarded by the authenticating gateway.
pub(crate) fn caller_from_headers(headers: &HeaderMap) -> Result<AuthorizedCaller, Response> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            let payload = json!({ "error": "missing caller identity" });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        })?;

    let role = match headers.get(USER_ROLE_HEADER) {
        None => Role::User,
        Some(value) => value
            .to_str()
            .ok()
            .and_then(Role::parse)
            .ok_or_else(|| {
                let payload = json!({ "error": "unrecognised caller role" });
                (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
            })?,
    };

    Ok(AuthorizedCaller {
        user_id: UserId::new(user_id),
        role,
    })
}

pub(crate) fn error_response(err: RewardsServiceError) -> Response {
    let status = status_for(&err);
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}

/// HTTP status a rewards failure is reported with.
pub fn status_for(err: &RewardsServiceError) -> StatusCode {
    match err {
        RewardsServiceError::Reward(
            RewardError::InvalidAmount { .. } | RewardError::RewardOutOfRange { .. },
        )
        | RewardsServiceError::InvalidComparison(_) => StatusCode::BAD_REQUEST,
        RewardsServiceError::Forbidden => StatusCode::FORBIDDEN,
        RewardsServiceError::Repository(RepositoryError::NotFound { .. }) => StatusCode::NOT_FOUND,
        RewardsServiceError::Repository(RepositoryError::Catalog(CatalogError::Conflict {
            ..
        })) => StatusCode::CONFLICT,
        RewardsServiceError::Repository(RepositoryError::Catalog(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        RewardsServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
