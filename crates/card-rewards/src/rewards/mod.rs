//! Reward rule resolution: catalog model, rule matching, reward calculation, card ranking and
//! comparison, plus the repository, service and HTTP layers wrapped around them.

pub mod calculator;
pub mod catalog;
pub mod comparison;
pub mod import;
pub mod matcher;
pub mod memory;
pub mod ranking;
pub mod repository;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use calculator::{calculate, reward_for, Amount, RewardError, RewardOutcome};
pub use catalog::{
    Bank, BankId, CardId, CardWithRules, Catalog, CatalogError, Category, CategoryId,
    CategoryTree, CreditCard, RewardRule, RewardType, RuleId, SubCategory, SubCategoryId,
    TransactionType, UserId,
};
pub use comparison::{project, ComparisonMatrix};
pub use import::{CatalogImportError, CatalogImporter};
pub use matcher::{match_rule, RuleQuery};
pub use memory::InMemoryCatalog;
pub use ranking::{rank, recommend, RankedResult};
pub use repository::{
    AuthorizedCaller, CardRepository, CategoryRepository, RepositoryError, RewardsRepository,
    Role, RuleDraft, RuleRepository, RuleUpdate,
};
pub use router::{
    rewards_router, status_for, RewardQueryRequest, USER_ID_HEADER, USER_ROLE_HEADER,
};
pub use service::{RewardsService, RewardsServiceError};
pub use views::{
    format_rate, format_reward, CardRulesView, ComparisonView, RankedResultView, RuleView,
    DEFAULT_CURRENCY_SYMBOL,
};
