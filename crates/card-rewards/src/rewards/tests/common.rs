use std::sync::Arc;

use axum::response::Response;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::rewards::catalog::{
    CardId, CardWithRules, Category, CategoryId, CategoryTree, RewardRule, RewardType, RuleId,
    SubCategory, SubCategoryId, TransactionType, UserId,
};
use crate::rewards::memory::InMemoryCatalog;
use crate::rewards::repository::{
    AuthorizedCaller, CardRepository, CategoryRepository, RepositoryError, RuleDraft,
    RuleRepository, RuleUpdate,
};
use crate::rewards::{rewards_router, RewardsService};

/// Seeded store plus the ids tests need to refer back to.
pub(super) struct Fixture {
    pub(super) store: Arc<InMemoryCatalog>,
    pub(super) dining: CategoryId,
    pub(super) restaurants: SubCategoryId,
    pub(super) travel: CategoryId,
    pub(super) airlines: SubCategoryId,
    pub(super) millennia: CardId,
    pub(super) regalia: CardId,
    pub(super) ace: CardId,
}

/// Three cards across two banks:
///
/// | card      | category            | channel | reward          | limits            |
/// |-----------|---------------------|---------|-----------------|-------------------|
/// | Millennia | Dining              | both    | 1% cashback     |                   |
/// | Millennia | Dining/Restaurants  | both    | 5% cashback     |                   |
/// | Regalia   | Dining              | both    | 2 points per 1  | min spend 1000    |
/// | Regalia   | Travel/Airlines     | both    | 4 miles per 1   | cap 5000          |
/// | Ace       | Dining              | online  | 4% cashback     |                   |
/// | Ace       | Travel              | both    | 2% cashback     |                   |
pub(super) fn fixture() -> Fixture {
    let store = Arc::new(InMemoryCatalog::new());
    let hdfc = store.add_bank("HDFC Bank", None).expect("bank");
    let axis = store.add_bank("Axis Bank", None).expect("bank");

    let millennia = store
        .add_card(&hdfc.id, "Millennia", Decimal::from(1000), None)
        .expect("card")
        .id;
    let regalia = store
        .add_card(&hdfc.id, "Regalia", Decimal::from(2500), None)
        .expect("card")
        .id;
    let ace = store
        .add_card(&axis.id, "Ace", Decimal::from(499), None)
        .expect("card")
        .id;

    let dining = store.add_category("Dining").expect("category").id;
    let restaurants = store
        .add_sub_category(&dining, "Restaurants")
        .expect("sub-category")
        .id;
    let travel = store.add_category("Travel").expect("category").id;
    let airlines = store
        .add_sub_category(&travel, "Airlines")
        .expect("sub-category")
        .id;

    let seed = [
        draft(&millennia, &dining, None, RewardType::Cashback, 1),
        draft(
            &millennia,
            &dining,
            Some(&restaurants),
            RewardType::Cashback,
            5,
        ),
        RuleDraft {
            minimum_spend: Some(Decimal::from(1000)),
            ..draft(&regalia, &dining, None, RewardType::Points, 2)
        },
        RuleDraft {
            monthly_cap: Some(Decimal::from(5000)),
            ..draft(&regalia, &travel, Some(&airlines), RewardType::Miles, 4)
        },
        RuleDraft {
            transaction_type: TransactionType::Online,
            ..draft(&ace, &dining, None, RewardType::Cashback, 4)
        },
        draft(&ace, &travel, None, RewardType::Cashback, 2),
    ];
    for rule in seed {
        store.create_rule(rule).expect("seed rule");
    }

    Fixture {
        store,
        dining,
        restaurants,
        travel,
        airlines,
        millennia,
        regalia,
        ace,
    }
}

pub(super) fn draft(
    card: &CardId,
    category: &CategoryId,
    sub_category: Option<&SubCategoryId>,
    reward_type: RewardType,
    value: i64,
) -> RuleDraft {
    RuleDraft {
        credit_card_id: card.clone(),
        category_id: category.clone(),
        sub_category_id: sub_category.cloned(),
        transaction_type: TransactionType::Both,
        reward_type,
        reward_value: Decimal::from(value),
        monthly_cap: None,
        minimum_spend: None,
    }
}

/// Free-standing rule for engine tests that do not need a store.
pub(super) fn rule(
    id: &str,
    category: &str,
    sub_category: Option<&str>,
    reward_type: RewardType,
    value: i64,
) -> RewardRule {
    RewardRule {
        id: RuleId::new(id),
        credit_card_id: CardId::new("card-test"),
        category_id: CategoryId::new(category),
        sub_category_id: sub_category.map(SubCategoryId::new),
        transaction_type: TransactionType::Both,
        reward_type,
        reward_value: Decimal::from(value),
        monthly_cap: None,
        minimum_spend: None,
    }
}

pub(super) fn service(fixture: &Fixture) -> RewardsService<InMemoryCatalog> {
    RewardsService::new(fixture.store.clone())
}

pub(super) fn router(fixture: &Fixture) -> axum::Router {
    rewards_router(Arc::new(service(fixture)))
}

pub(super) fn member() -> AuthorizedCaller {
    AuthorizedCaller::user(UserId::new("user-alice"))
}

pub(super) fn admin() -> AuthorizedCaller {
    AuthorizedCaller::admin(UserId::new("user-ops"))
}

pub(super) fn card_ids(results: &[crate::rewards::RankedResult]) -> Vec<CardId> {
    results.iter().map(|result| result.card_id.clone()).collect()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) struct UnavailableRepository;

fn offline() -> RepositoryError {
    RepositoryError::Unavailable("catalog offline".to_string())
}

impl RuleRepository for UnavailableRepository {
    fn find_rule(&self, _id: &RuleId) -> Result<Option<RewardRule>, RepositoryError> {
        Err(offline())
    }

    fn list_by_card(&self, _card_id: &CardId) -> Result<Vec<RewardRule>, RepositoryError> {
        Err(offline())
    }

    fn list_by_category(
        &self,
        _category_id: &CategoryId,
    ) -> Result<Vec<RewardRule>, RepositoryError> {
        Err(offline())
    }

    fn create_rule(&self, _draft: RuleDraft) -> Result<RewardRule, RepositoryError> {
        Err(offline())
    }

    fn update_rule(
        &self,
        _id: &RuleId,
        _update: RuleUpdate,
    ) -> Result<RewardRule, RepositoryError> {
        Err(offline())
    }

    fn delete_rule(&self, _id: &RuleId) -> Result<(), RepositoryError> {
        Err(offline())
    }
}

impl CardRepository for UnavailableRepository {
    fn find_card(&self, _id: &CardId) -> Result<Option<CardWithRules>, RepositoryError> {
        Err(offline())
    }

    fn list_cards(&self) -> Result<Vec<CardWithRules>, RepositoryError> {
        Err(offline())
    }

    fn list_accessible_to(
        &self,
        _user_id: &UserId,
    ) -> Result<Vec<CardWithRules>, RepositoryError> {
        Err(offline())
    }

    fn attach_card(&self, _user_id: &UserId, _card_id: &CardId) -> Result<(), RepositoryError> {
        Err(offline())
    }

    fn detach_card(&self, _user_id: &UserId, _card_id: &CardId) -> Result<(), RepositoryError> {
        Err(offline())
    }
}

impl CategoryRepository for UnavailableRepository {
    fn list_all(&self) -> Result<Vec<CategoryTree>, RepositoryError> {
        Err(offline())
    }

    fn find_category(&self, _id: &CategoryId) -> Result<Option<Category>, RepositoryError> {
        Err(offline())
    }

    fn find_sub_category(
        &self,
        _id: &SubCategoryId,
    ) -> Result<Option<SubCategory>, RepositoryError> {
        Err(offline())
    }
}
