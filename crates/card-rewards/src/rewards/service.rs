use std::sync::Arc;

use tracing::{debug, info};

use super::calculator::{Amount, RewardError};
use super::catalog::{CardId, CardWithRules, Category, CategoryTree, RewardRule, RuleId};
use super::comparison::project;
use super::matcher::RuleQuery;
use super::ranking::{rank, RankedResult};
use super::repository::{
    AuthorizedCaller, RepositoryError, RewardsRepository, RuleDraft, RuleUpdate,
};
use super::views::{CardRulesView, ComparisonView, RuleView, DEFAULT_CURRENCY_SYMBOL};

pub const MIN_COMPARISON_CARDS: usize = 2;
pub const MAX_COMPARISON_CARDS: usize = 3;

/// Service composing the catalog repository with the matching and ranking engine.
pub struct RewardsService<R> {
    repository: Arc<R>,
    currency_symbol: String,
}

impl<R> RewardsService<R>
where
    R: RewardsRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }

    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    pub fn currency_symbol(&self) -> &str {
        &self.currency_symbol
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Rank the caller's own cards for a spend, best first.
    pub fn best_cards(
        &self,
        caller: &AuthorizedCaller,
        query: &RuleQuery,
        amount: f64,
    ) -> Result<Vec<RankedResult>, RewardsServiceError> {
        let amount = Amount::try_from(amount)?;
        self.ensure_category(query)?;
        let cards = self.repository.list_accessible_to(&caller.user_id)?;
        let results = rank(&cards, query, amount)?;

        info!(
            user_id = %caller.user_id,
            category_id = %query.category_id,
            candidates = cards.len(),
            earning = results.len(),
            "ranked cards for spend"
        );
        Ok(results)
    }

    /// Rank every card in the catalog for a spend, best first.
    pub fn rank_all(
        &self,
        query: &RuleQuery,
        amount: f64,
    ) -> Result<Vec<RankedResult>, RewardsServiceError> {
        let amount = Amount::try_from(amount)?;
        self.ensure_category(query)?;
        let cards = self.repository.list_cards()?;
        let results = rank(&cards, query, amount)?;
        debug!(
            category_id = %query.category_id,
            candidates = cards.len(),
            earning = results.len(),
            "ranked catalog for spend"
        );
        Ok(results)
    }

    /// Side-by-side comparison of two or three cards.
    pub fn compare(&self, card_ids: &[CardId]) -> Result<ComparisonView, RewardsServiceError> {
        let mut distinct: Vec<&CardId> = Vec::with_capacity(card_ids.len());
        for card_id in card_ids {
            if !distinct.contains(&card_id) {
                distinct.push(card_id);
            }
        }
        if !(MIN_COMPARISON_CARDS..=MAX_COMPARISON_CARDS).contains(&distinct.len()) {
            return Err(RewardsServiceError::InvalidComparison(distinct.len()));
        }

        let mut cards: Vec<CardWithRules> = Vec::with_capacity(distinct.len());
        for card_id in distinct {
            let card = self
                .repository
                .find_card(card_id)?
                .ok_or_else(|| RepositoryError::not_found("credit card", card_id))?;
            cards.push(card);
        }

        let matrix = project(&cards);
        let categories: Vec<Category> = self
            .repository
            .list_all()?
            .into_iter()
            .map(|tree| tree.category)
            .collect();

        debug!(
            cards = cards.len(),
            categories = matrix.categories.len(),
            "built comparison matrix"
        );
        Ok(ComparisonView::build(
            &matrix,
            &cards,
            &categories,
            &self.currency_symbol,
        ))
    }

    /// Card detail with every rule labelled by category and sub-category name.
    pub fn card_rules(&self, card_id: &CardId) -> Result<CardRulesView, RewardsServiceError> {
        let entry = self
            .repository
            .find_card(card_id)?
            .ok_or_else(|| RepositoryError::not_found("credit card", card_id))?;

        let mut rules = Vec::with_capacity(entry.rules.len());
        for rule in entry.rules {
            let category = self.repository.find_category(&rule.category_id)?;
            let sub_category = match &rule.sub_category_id {
                Some(id) => self.repository.find_sub_category(id)?,
                None => None,
            };
            rules.push(RuleView::build(
                rule,
                category.as_ref(),
                sub_category.as_ref(),
                &self.currency_symbol,
            ));
        }

        Ok(CardRulesView {
            card_id: entry.card.id,
            card_name: entry.card.name,
            bank_name: entry.bank.name,
            annual_fee: entry.card.annual_fee,
            rules,
        })
    }

    pub fn categories(&self) -> Result<Vec<CategoryTree>, RewardsServiceError> {
        Ok(self.repository.list_all()?)
    }

    pub fn create_rule(
        &self,
        caller: &AuthorizedCaller,
        draft: RuleDraft,
    ) -> Result<RewardRule, RewardsServiceError> {
        ensure_admin(caller)?;
        let rule = self.repository.create_rule(draft)?;
        info!(
            rule_id = %rule.id,
            card_id = %rule.credit_card_id,
            category_id = %rule.category_id,
            admin = %caller.user_id,
            "reward rule created"
        );
        Ok(rule)
    }

    pub fn update_rule(
        &self,
        caller: &AuthorizedCaller,
        rule_id: &RuleId,
        update: RuleUpdate,
    ) -> Result<RewardRule, RewardsServiceError> {
        ensure_admin(caller)?;
        let rule = self.repository.update_rule(rule_id, update)?;
        info!(rule_id = %rule.id, admin = %caller.user_id, "reward rule updated");
        Ok(rule)
    }

    pub fn delete_rule(
        &self,
        caller: &AuthorizedCaller,
        rule_id: &RuleId,
    ) -> Result<(), RewardsServiceError> {
        ensure_admin(caller)?;
        self.repository.delete_rule(rule_id)?;
        info!(rule_id = %rule_id, admin = %caller.user_id, "reward rule deleted");
        Ok(())
    }

    pub fn cards_for(
        &self,
        caller: &AuthorizedCaller,
    ) -> Result<Vec<CardWithRules>, RewardsServiceError> {
        Ok(self.repository.list_accessible_to(&caller.user_id)?)
    }

    pub fn attach_card(
        &self,
        caller: &AuthorizedCaller,
        card_id: &CardId,
    ) -> Result<(), RewardsServiceError> {
        self.repository.attach_card(&caller.user_id, card_id)?;
        info!(user_id = %caller.user_id, card_id = %card_id, "card attached to profile");
        Ok(())
    }

    pub fn detach_card(
        &self,
        caller: &AuthorizedCaller,
        card_id: &CardId,
    ) -> Result<(), RewardsServiceError> {
        self.repository.detach_card(&caller.user_id, card_id)?;
        info!(user_id = %caller.user_id, card_id = %card_id, "card removed from profile");
        Ok(())
    }

    fn ensure_category(&self, query: &RuleQuery) -> Result<(), RewardsServiceError> {
        if self.repository.find_category(&query.category_id)?.is_none() {
            return Err(RepositoryError::not_found("category", &query.category_id).into());
        }
        Ok(())
    }
}

fn ensure_admin(caller: &AuthorizedCaller) -> Result<(), RewardsServiceError> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(RewardsServiceError::Forbidden)
    }
}

/// Error raised by the rewards service.
#[derive(Debug, thiserror::Error)]
pub enum RewardsServiceError {
    #[error(transparent)]
    Reward(#[from] RewardError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("operation requires the administrator role")]
    Forbidden,
    #[error("comparison needs between 2 and 3 distinct cards, got {0}")]
    InvalidComparison(usize),
}
