use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

identifier!(
    /// Identifier wrapper for issuing banks.
    BankId
);
identifier!(
    /// Identifier wrapper for credit card products.
    CardId
);
identifier!(
    /// Identifier wrapper for spend categories.
    CategoryId
);
identifier!(
    /// Identifier wrapper for spend sub-categories.
    SubCategoryId
);
identifier!(
    /// Identifier wrapper for reward rules.
    RuleId
);
identifier!(
    /// Identifier wrapper for end users holding cards.
    UserId
);

/// Payment channel a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Online,
    Offline,
    #[default]
    Both,
}

impl TransactionType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Online => "ONLINE",
            Self::Offline => "OFFLINE",
            Self::Both => "BOTH",
        }
    }

    /// Whether a rule typed `self` applies to a transaction typed `query`.
    pub fn accepts(self, query: TransactionType) -> bool {
        self == Self::Both || self == query
    }
}

impl FromStr for TransactionType {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ONLINE" => Ok(Self::Online),
            "OFFLINE" => Ok(Self::Offline),
            "BOTH" | "" => Ok(Self::Both),
            other => Err(CatalogError::InvalidValue {
                field: "transaction_type",
                reason: format!("unknown transaction type '{other}'"),
            }),
        }
    }
}

/// Unit a rule's reward value is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewardType {
    Cashback,
    Points,
    Miles,
}

impl RewardType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cashback => "CASHBACK",
            Self::Points => "POINTS",
            Self::Miles => "MILES",
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Self::Cashback => "cashback",
            Self::Points => "points",
            Self::Miles => "miles",
        }
    }
}

impl FromStr for RewardType {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CASHBACK" => Ok(Self::Cashback),
            "POINTS" => Ok(Self::Points),
            "MILES" => Ok(Self::Miles),
            other => Err(CatalogError::InvalidValue {
                field: "reward_type",
                reason: format!("unknown reward type '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub id: BankId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCard {
    pub id: CardId,
    pub name: String,
    pub bank_id: BankId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub annual_fee: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategory {
    pub id: SubCategoryId,
    pub name: String,
    pub category_id: CategoryId,
}

/// Category together with the sub-categories it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTree {
    #[serde(flatten)]
    pub category: Category,
    pub sub_categories: Vec<SubCategory>,
}

/// Per-card earning rule scoped to a category and optionally a sub-category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRule {
    pub id: RuleId,
    pub credit_card_id: CardId,
    pub category_id: CategoryId,
    #[serde(default)]
    pub sub_category_id: Option<SubCategoryId>,
    #[serde(default)]
    pub transaction_type: TransactionType,
    pub reward_type: RewardType,
    /// Percentage for cashback, earn rate per currency unit for points and miles.
    pub reward_value: Decimal,
    #[serde(default)]
    pub monthly_cap: Option<Decimal>,
    #[serde(default)]
    pub minimum_spend: Option<Decimal>,
}

/// A card resolved with its issuer and complete rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardWithRules {
    pub card: CreditCard,
    pub bank: Bank,
    pub rules: Vec<RewardRule>,
}

/// Structural violations raised while building or editing the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid reference on {entity}: {reason}")]
    InvalidReference {
        entity: &'static str,
        reason: String,
    },
    #[error("{entity} '{name}' already exists")]
    Conflict { entity: &'static str, name: String },
    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Validated, in-memory view over banks, cards, categories and rules.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    banks: BTreeMap<BankId, Bank>,
    cards: BTreeMap<CardId, CreditCard>,
    categories: BTreeMap<CategoryId, Category>,
    sub_categories: BTreeMap<SubCategoryId, SubCategory>,
    rules: Vec<RewardRule>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_bank(&mut self, bank: Bank) -> Result<(), CatalogError> {
        if self.banks.contains_key(&bank.id) {
            return Err(CatalogError::Conflict {
                entity: "bank",
                name: bank.id.0,
            });
        }
        if self.bank_named(&bank.name).is_some() {
            return Err(CatalogError::Conflict {
                entity: "bank",
                name: bank.name,
            });
        }
        self.banks.insert(bank.id.clone(), bank);
        Ok(())
    }

    pub fn insert_card(&mut self, card: CreditCard) -> Result<(), CatalogError> {
        if !self.banks.contains_key(&card.bank_id) {
            return Err(CatalogError::InvalidReference {
                entity: "credit card",
                reason: format!("bank '{}' does not exist", card.bank_id),
            });
        }
        ensure_non_negative("annual_fee", Some(card.annual_fee))?;
        if self.cards.contains_key(&card.id) || self.card_named(&card.bank_id, &card.name).is_some()
        {
            return Err(CatalogError::Conflict {
                entity: "credit card",
                name: card.name,
            });
        }
        self.cards.insert(card.id.clone(), card);
        Ok(())
    }

    pub fn insert_category(&mut self, category: Category) -> Result<(), CatalogError> {
        if self.categories.contains_key(&category.id) || self.category_named(&category.name).is_some()
        {
            return Err(CatalogError::Conflict {
                entity: "category",
                name: category.name,
            });
        }
        self.categories.insert(category.id.clone(), category);
        Ok(())
    }

    pub fn insert_sub_category(&mut self, sub_category: SubCategory) -> Result<(), CatalogError> {
        if !self.categories.contains_key(&sub_category.category_id) {
            return Err(CatalogError::InvalidReference {
                entity: "sub-category",
                reason: format!("category '{}' does not exist", sub_category.category_id),
            });
        }
        if self.sub_categories.contains_key(&sub_category.id)
            || self
                .sub_category_named(&sub_category.category_id, &sub_category.name)
                .is_some()
        {
            return Err(CatalogError::Conflict {
                entity: "sub-category",
                name: sub_category.name,
            });
        }
        self.sub_categories
            .insert(sub_category.id.clone(), sub_category);
        Ok(())
    }

    pub fn insert_rule(&mut self, rule: RewardRule) -> Result<(), CatalogError> {
        self.validate_rule(&rule)?;
        if self.rule(&rule.id).is_some() {
            return Err(CatalogError::Conflict {
                entity: "reward rule",
                name: rule.id.0,
            });
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Swap an existing rule for a revised copy, keeping its position. Returns `false` when the
    /// rule id is unknown.
    pub fn replace_rule(&mut self, rule: RewardRule) -> Result<bool, CatalogError> {
        self.validate_rule(&rule)?;
        match self.rules.iter_mut().find(|existing| existing.id == rule.id) {
            Some(slot) => {
                *slot = rule;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn remove_rule(&mut self, id: &RuleId) -> Option<RewardRule> {
        let position = self.rules.iter().position(|rule| &rule.id == id)?;
        Some(self.rules.remove(position))
    }

    /// Remove a card and every rule attached to it.
    pub fn remove_card(&mut self, id: &CardId) -> Option<CreditCard> {
        let card = self.cards.remove(id)?;
        self.rules.retain(|rule| &rule.credit_card_id != id);
        Some(card)
    }

    /// Referential checks applied to every rule write.
    pub fn validate_rule(&self, rule: &RewardRule) -> Result<(), CatalogError> {
        if !self.cards.contains_key(&rule.credit_card_id) {
            return Err(CatalogError::InvalidReference {
                entity: "reward rule",
                reason: format!("credit card '{}' does not exist", rule.credit_card_id),
            });
        }
        if !self.categories.contains_key(&rule.category_id) {
            return Err(CatalogError::InvalidReference {
                entity: "reward rule",
                reason: format!("category '{}' does not exist", rule.category_id),
            });
        }
        if let Some(sub_category_id) = &rule.sub_category_id {
            let sub_category = self.sub_categories.get(sub_category_id).ok_or_else(|| {
                CatalogError::InvalidReference {
                    entity: "reward rule",
                    reason: format!("sub-category '{sub_category_id}' does not exist"),
                }
            })?;
            if sub_category.category_id != rule.category_id {
                return Err(CatalogError::InvalidReference {
                    entity: "reward rule",
                    reason: format!(
                        "sub-category '{}' belongs to category '{}', not '{}'",
                        sub_category_id, sub_category.category_id, rule.category_id
                    ),
                });
            }
        }

        ensure_non_negative("reward_value", Some(rule.reward_value))?;
        ensure_non_negative("monthly_cap", rule.monthly_cap)?;
        ensure_non_negative("minimum_spend", rule.minimum_spend)?;
        Ok(())
    }

    pub fn bank(&self, id: &BankId) -> Option<&Bank> {
        self.banks.get(id)
    }

    pub fn card(&self, id: &CardId) -> Option<&CreditCard> {
        self.cards.get(id)
    }

    pub fn category(&self, id: &CategoryId) -> Option<&Category> {
        self.categories.get(id)
    }

    pub fn sub_category(&self, id: &SubCategoryId) -> Option<&SubCategory> {
        self.sub_categories.get(id)
    }

    pub fn rule(&self, id: &RuleId) -> Option<&RewardRule> {
        self.rules.iter().find(|rule| &rule.id == id)
    }

    pub fn bank_named(&self, name: &str) -> Option<&Bank> {
        self.banks.values().find(|bank| bank.name == name)
    }

    pub fn card_named(&self, bank_id: &BankId, name: &str) -> Option<&CreditCard> {
        self.cards
            .values()
            .find(|card| &card.bank_id == bank_id && card.name == name)
    }

    pub fn category_named(&self, name: &str) -> Option<&Category> {
        self.categories
            .values()
            .find(|category| category.name == name)
    }

    pub fn sub_category_named(
        &self,
        category_id: &CategoryId,
        name: &str,
    ) -> Option<&SubCategory> {
        self.sub_categories
            .values()
            .find(|sub| &sub.category_id == category_id && sub.name == name)
    }

    pub fn cards(&self) -> impl Iterator<Item = &CreditCard> {
        self.cards.values()
    }

    pub fn rules(&self) -> &[RewardRule] {
        &self.rules
    }

    pub fn rules_for_card<'a>(&'a self, id: &'a CardId) -> impl Iterator<Item = &'a RewardRule> {
        self.rules
            .iter()
            .filter(move |rule| &rule.credit_card_id == id)
    }

    pub fn rules_for_category<'a>(
        &'a self,
        id: &'a CategoryId,
    ) -> impl Iterator<Item = &'a RewardRule> {
        self.rules.iter().filter(move |rule| &rule.category_id == id)
    }

    pub fn category_trees(&self) -> Vec<CategoryTree> {
        self.categories
            .values()
            .map(|category| CategoryTree {
                category: category.clone(),
                sub_categories: self
                    .sub_categories
                    .values()
                    .filter(|sub| sub.category_id == category.id)
                    .cloned()
                    .collect(),
            })
            .collect()
    }

    /// Resolve a card into the canonical card/bank/rules shape consumed by the engine.
    pub fn card_with_rules(&self, id: &CardId) -> Option<CardWithRules> {
        let card = self.cards.get(id)?;
        let bank = self.banks.get(&card.bank_id)?;
        Some(CardWithRules {
            card: card.clone(),
            bank: bank.clone(),
            rules: self.rules_for_card(id).cloned().collect(),
        })
    }
}

fn ensure_non_negative(field: &'static str, value: Option<Decimal>) -> Result<(), CatalogError> {
    match value {
        Some(value) if value < Decimal::ZERO => {
            Err(CatalogError::InvalidValue {
                field,
                reason: format!("{value} must not be negative"),
            })
        }
        _ => Ok(()),
    }
}
