use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use rust_decimal::Decimal;

use super::catalog::{
    Bank, BankId, CardId, CardWithRules, Catalog, CatalogError, Category, CategoryId,
    CategoryTree, CreditCard, RewardRule, RuleId, SubCategory, SubCategoryId, UserId,
};
use super::repository::{
    CardRepository, CategoryRepository, RepositoryError, RuleDraft, RuleRepository, RuleUpdate,
};

/// Mutex-guarded catalog implementing every repository trait, used by the CLI, the HTTP service
/// and tests.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    state: Mutex<CatalogState>,
}

#[derive(Debug, Default)]
struct CatalogState {
    catalog: Catalog,
    holdings: BTreeMap<UserId, Vec<CardId>>,
    sequence: u64,
}

impl CatalogState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.sequence += 1;
        format!("{prefix}-{:06}", self.sequence)
    }
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_catalog(catalog: Catalog) -> Self {
        Self {
            state: Mutex::new(CatalogState {
                catalog,
                ..CatalogState::default()
            }),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, CatalogState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("catalog lock poisoned".to_string()))
    }

    /// Clone of the current catalog contents.
    pub fn snapshot(&self) -> Result<Catalog, RepositoryError> {
        Ok(self.state()?.catalog.clone())
    }

    pub fn add_bank(&self, name: &str, logo: Option<String>) -> Result<Bank, RepositoryError> {
        let mut state = self.state()?;
        let bank = Bank {
            id: BankId(state.next_id("bank")),
            name: name.trim().to_string(),
            logo,
        };
        state.catalog.insert_bank(bank.clone())?;
        Ok(bank)
    }

    pub fn add_card(
        &self,
        bank_id: &BankId,
        name: &str,
        annual_fee: Decimal,
        image: Option<String>,
    ) -> Result<CreditCard, RepositoryError> {
        let mut state = self.state()?;
        let card = CreditCard {
            id: CardId(state.next_id("card")),
            name: name.trim().to_string(),
            bank_id: bank_id.clone(),
            image,
            annual_fee,
        };
        state.catalog.insert_card(card.clone())?;
        Ok(card)
    }

    pub fn add_category(&self, name: &str) -> Result<Category, RepositoryError> {
        let mut state = self.state()?;
        let category = Category {
            id: CategoryId(state.next_id("category")),
            name: name.trim().to_string(),
        };
        state.catalog.insert_category(category.clone())?;
        Ok(category)
    }

    pub fn add_sub_category(
        &self,
        category_id: &CategoryId,
        name: &str,
    ) -> Result<SubCategory, RepositoryError> {
        let mut state = self.state()?;
        let sub_category = SubCategory {
            id: SubCategoryId(state.next_id("subcategory")),
            name: name.trim().to_string(),
            category_id: category_id.clone(),
        };
        state.catalog.insert_sub_category(sub_category.clone())?;
        Ok(sub_category)
    }

    /// Delete a card along with its rules and every user's attachment to it.
    pub fn delete_card(&self, card_id: &CardId) -> Result<CreditCard, RepositoryError> {
        let mut state = self.state()?;
        let card = state
            .catalog
            .remove_card(card_id)
            .ok_or_else(|| RepositoryError::not_found("credit card", card_id))?;
        for cards in state.holdings.values_mut() {
            cards.retain(|held| held != card_id);
        }
        Ok(card)
    }

    pub fn bank_named(&self, name: &str) -> Result<Option<Bank>, RepositoryError> {
        Ok(self.state()?.catalog.bank_named(name.trim()).cloned())
    }

    pub fn card_named(
        &self,
        bank_id: &BankId,
        name: &str,
    ) -> Result<Option<CreditCard>, RepositoryError> {
        Ok(self
            .state()?
            .catalog
            .card_named(bank_id, name.trim())
            .cloned())
    }

    pub fn category_named(&self, name: &str) -> Result<Option<Category>, RepositoryError> {
        Ok(self.state()?.catalog.category_named(name.trim()).cloned())
    }

    pub fn sub_category_named(
        &self,
        category_id: &CategoryId,
        name: &str,
    ) -> Result<Option<SubCategory>, RepositoryError> {
        Ok(self
            .state()?
            .catalog
            .sub_category_named(category_id, name.trim())
            .cloned())
    }
}

impl RuleRepository for InMemoryCatalog {
    fn find_rule(&self, id: &RuleId) -> Result<Option<RewardRule>, RepositoryError> {
        Ok(self.state()?.catalog.rule(id).cloned())
    }

    fn list_by_card(&self, card_id: &CardId) -> Result<Vec<RewardRule>, RepositoryError> {
        let state = self.state()?;
        if state.catalog.card(card_id).is_none() {
            return Err(RepositoryError::not_found("credit card", card_id));
        }
        Ok(state.catalog.rules_for_card(card_id).cloned().collect())
    }

    fn list_by_category(
        &self,
        category_id: &CategoryId,
    ) -> Result<Vec<RewardRule>, RepositoryError> {
        let state = self.state()?;
        if state.catalog.category(category_id).is_none() {
            return Err(RepositoryError::not_found("category", category_id));
        }
        Ok(state.catalog.rules_for_category(category_id).cloned().collect())
    }

    fn create_rule(&self, draft: RuleDraft) -> Result<RewardRule, RepositoryError> {
        let mut state = self.state()?;
        let rule = draft.into_rule(RuleId(state.next_id("rule")));
        state.catalog.insert_rule(rule.clone())?;
        Ok(rule)
    }

    fn update_rule(&self, id: &RuleId, update: RuleUpdate) -> Result<RewardRule, RepositoryError> {
        let mut state = self.state()?;
        let existing = state
            .catalog
            .rule(id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("reward rule", id))?;
        let revised = update.apply(existing);
        if !state.catalog.replace_rule(revised.clone())? {
            return Err(RepositoryError::not_found("reward rule", id));
        }
        Ok(revised)
    }

    fn delete_rule(&self, id: &RuleId) -> Result<(), RepositoryError> {
        self.state()?
            .catalog
            .remove_rule(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found("reward rule", id))
    }
}

impl CardRepository for InMemoryCatalog {
    fn find_card(&self, id: &CardId) -> Result<Option<CardWithRules>, RepositoryError> {
        Ok(self.state()?.catalog.card_with_rules(id))
    }

    fn list_cards(&self) -> Result<Vec<CardWithRules>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .catalog
            .cards()
            .filter_map(|card| state.catalog.card_with_rules(&card.id))
            .collect())
    }

    fn list_accessible_to(&self, user_id: &UserId) -> Result<Vec<CardWithRules>, RepositoryError> {
        let state = self.state()?;
        let held = match state.holdings.get(user_id) {
            Some(held) => held,
            None => return Ok(Vec::new()),
        };
        Ok(held
            .iter()
            .filter_map(|card_id| state.catalog.card_with_rules(card_id))
            .collect())
    }

    fn attach_card(&self, user_id: &UserId, card_id: &CardId) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        if state.catalog.card(card_id).is_none() {
            return Err(RepositoryError::not_found("credit card", card_id));
        }
        let held = state.holdings.entry(user_id.clone()).or_default();
        if held.contains(card_id) {
            return Err(CatalogError::Conflict {
                entity: "card attachment",
                name: card_id.0.clone(),
            }
            .into());
        }
        held.push(card_id.clone());
        Ok(())
    }

    fn detach_card(&self, user_id: &UserId, card_id: &CardId) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let held = state
            .holdings
            .get_mut(user_id)
            .ok_or_else(|| RepositoryError::not_found("card attachment", card_id))?;
        let position = held
            .iter()
            .position(|held_id| held_id == card_id)
            .ok_or_else(|| RepositoryError::not_found("card attachment", card_id))?;
        held.remove(position);
        Ok(())
    }
}

impl CategoryRepository for InMemoryCatalog {
    fn list_all(&self) -> Result<Vec<CategoryTree>, RepositoryError> {
        Ok(self.state()?.catalog.category_trees())
    }

    fn find_category(&self, id: &CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self.state()?.catalog.category(id).cloned())
    }

    fn find_sub_category(
        &self,
        id: &SubCategoryId,
    ) -> Result<Option<SubCategory>, RepositoryError> {
        Ok(self.state()?.catalog.sub_category(id).cloned())
    }
}
