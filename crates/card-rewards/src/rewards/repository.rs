use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::{
    CardId, CardWithRules, Category, CategoryId, CategoryTree, CatalogError, RewardRule,
    RewardType, RuleId, SubCategory, SubCategoryId, TransactionType, UserId,
};

/// Access level resolved by the upstream identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "USER" => Some(Self::User),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Identity that has already been authenticated before reaching the rewards layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedCaller {
    pub user_id: UserId,
    pub role: Role,
}

impl AuthorizedCaller {
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::User,
        }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Payload for creating a reward rule; the repository assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDraft {
    pub credit_card_id: CardId,
    pub category_id: CategoryId,
    #[serde(default)]
    pub sub_category_id: Option<SubCategoryId>,
    #[serde(default)]
    pub transaction_type: TransactionType,
    pub reward_type: RewardType,
    pub reward_value: Decimal,
    #[serde(default)]
    pub monthly_cap: Option<Decimal>,
    #[serde(default)]
    pub minimum_spend: Option<Decimal>,
}

impl RuleDraft {
    pub fn into_rule(self, id: RuleId) -> RewardRule {
        RewardRule {
            id,
            credit_card_id: self.credit_card_id,
            category_id: self.category_id,
            sub_category_id: self.sub_category_id,
            transaction_type: self.transaction_type,
            reward_type: self.reward_type,
            reward_value: self.reward_value,
            monthly_cap: self.monthly_cap,
            minimum_spend: self.minimum_spend,
        }
    }
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleUpdate {
    #[serde(default)]
    pub credit_card_id: Option<CardId>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub sub_category_id: Option<SubCategoryId>,
    #[serde(default)]
    pub transaction_type: Option<TransactionType>,
    #[serde(default)]
    pub reward_type: Option<RewardType>,
    #[serde(default)]
    pub reward_value: Option<Decimal>,
    #[serde(default)]
    pub monthly_cap: Option<Decimal>,
    #[serde(default)]
    pub minimum_spend: Option<Decimal>,
}

impl RuleUpdate {
    pub fn apply(self, mut rule: RewardRule) -> RewardRule {
        if let Some(card_id) = self.credit_card_id {
            rule.credit_card_id = card_id;
        }
        if let Some(category_id) = self.category_id {
            rule.category_id = category_id;
        }
        if let Some(sub_category_id) = self.sub_category_id {
            rule.sub_category_id = Some(sub_category_id);
        }
        if let Some(transaction_type) = self.transaction_type {
            rule.transaction_type = transaction_type;
        }
        if let Some(reward_type) = self.reward_type {
            rule.reward_type = reward_type;
        }
        if let Some(reward_value) = self.reward_value {
            rule.reward_value = reward_value;
        }
        if self.monthly_cap.is_some() {
            rule.monthly_cap = self.monthly_cap;
        }
        if self.minimum_spend.is_some() {
            rule.minimum_spend = self.minimum_spend;
        }
        rule
    }
}

pub trait RuleRepository: Send + Sync {
    fn find_rule(&self, id: &RuleId) -> Result<Option<RewardRule>, RepositoryError>;
    fn list_by_card(&self, card_id: &CardId) -> Result<Vec<RewardRule>, RepositoryError>;
    fn list_by_category(&self, category_id: &CategoryId)
        -> Result<Vec<RewardRule>, RepositoryError>;
    fn create_rule(&self, draft: RuleDraft) -> Result<RewardRule, RepositoryError>;
    fn update_rule(&self, id: &RuleId, update: RuleUpdate) -> Result<RewardRule, RepositoryError>;
    fn delete_rule(&self, id: &RuleId) -> Result<(), RepositoryError>;
}

/// Cards are always handed out already joined with their bank and rules.
pub trait CardRepository: Send + Sync {
    fn find_card(&self, id: &CardId) -> Result<Option<CardWithRules>, RepositoryError>;
    fn list_cards(&self) -> Result<Vec<CardWithRules>, RepositoryError>;
    fn list_accessible_to(&self, user_id: &UserId) -> Result<Vec<CardWithRules>, RepositoryError>;
    fn attach_card(&self, user_id: &UserId, card_id: &CardId) -> Result<(), RepositoryError>;
    fn detach_card(&self, user_id: &UserId, card_id: &CardId) -> Result<(), RepositoryError>;
}

pub trait CategoryRepository: Send + Sync {
    fn list_all(&self) -> Result<Vec<CategoryTree>, RepositoryError>;
    fn find_category(&self, id: &CategoryId) -> Result<Option<Category>, RepositoryError>;
    fn find_sub_category(
        &self,
        id: &SubCategoryId,
    ) -> Result<Option<SubCategory>, RepositoryError>;
}

/// Everything the rewards service needs from storage.
pub trait RewardsRepository: RuleRepository + CardRepository + CategoryRepository {}

impl<T> RewardsRepository for T where T: RuleRepository + CardRepository + CategoryRepository {}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
