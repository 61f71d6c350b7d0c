use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::catalog::{
    CardId, CardWithRules, Category, CategoryId, RewardRule, RewardType, SubCategory,
    TransactionType,
};
use super::comparison::ComparisonMatrix;
use super::ranking::RankedResult;

pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";
pub const NOT_AVAILABLE: &str = "N/A";

/// Human readable earn rate, e.g. `5% cashback` or `2 points per ₹1`.
pub fn format_rate(reward_type: RewardType, value: Decimal, currency: &str) -> String {
    let value = value.normalize();
    match reward_type {
        RewardType::Cashback => format!("{value}% cashback"),
        RewardType::Points | RewardType::Miles => {
            format!("{value} {} per {currency}1", reward_type.unit())
        }
    }
}

/// Cashback renders as currency with two decimals; points and miles as a plain count.
pub fn format_reward(reward_type: RewardType, amount: Decimal, currency: &str) -> String {
    match reward_type {
        RewardType::Cashback => format!(
            "{currency}{:.2}",
            amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        ),
        RewardType::Points | RewardType::Miles => {
            format!("{} {}", amount.normalize(), reward_type.unit())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResultView {
    pub card_id: CardId,
    pub card_name: String,
    pub bank_name: String,
    pub reward_type: RewardType,
    pub reward_rate: Decimal,
    pub reward_amount: Decimal,
    pub rate_label: String,
    pub reward_label: String,
}

impl RankedResultView {
    pub fn from_result(result: &RankedResult, currency: &str) -> Self {
        Self {
            card_id: result.card_id.clone(),
            card_name: result.card_name.clone(),
            bank_name: result.bank_name.clone(),
            reward_type: result.reward_type,
            reward_rate: result.reward_rate,
            reward_amount: result.reward_amount,
            rate_label: format_rate(result.reward_type, result.reward_rate, currency),
            reward_label: format_reward(result.reward_type, result.reward_amount, currency),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonCardHeader {
    pub card_id: CardId,
    pub card_name: String,
    pub bank_name: String,
    pub annual_fee: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonCell {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_type: Option<RewardType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_cap: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_spend: Option<Decimal>,
}

impl ComparisonCell {
    fn from_rule(rule: Option<&RewardRule>, currency: &str) -> Self {
        match rule {
            Some(rule) => Self {
                label: format_rate(rule.reward_type, rule.reward_value, currency),
                reward_type: Some(rule.reward_type),
                monthly_cap: rule.monthly_cap,
                minimum_spend: rule.minimum_spend,
            },
            None => Self {
                label: NOT_AVAILABLE.to_string(),
                reward_type: None,
                monthly_cap: None,
                minimum_spend: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub category_id: CategoryId,
    pub category_name: String,
    pub cells: Vec<ComparisonCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonView {
    pub cards: Vec<ComparisonCardHeader>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonView {
    /// Decorate a matrix with card and category names. Categories missing from `categories`
    /// fall back to their id.
    pub fn build(
        matrix: &ComparisonMatrix,
        cards: &[CardWithRules],
        categories: &[Category],
        currency: &str,
    ) -> Self {
        let headers = cards
            .iter()
            .map(|entry| ComparisonCardHeader {
                card_id: entry.card.id.clone(),
                card_name: entry.card.name.clone(),
                bank_name: entry.bank.name.clone(),
                annual_fee: entry.card.annual_fee,
            })
            .collect();

        let rows = matrix
            .categories
            .iter()
            .map(|category_id| ComparisonRow {
                category_id: category_id.clone(),
                category_name: categories
                    .iter()
                    .find(|category| &category.id == category_id)
                    .map(|category| category.name.clone())
                    .unwrap_or_else(|| category_id.0.clone()),
                cells: matrix
                    .row(category_id)
                    .into_iter()
                    .map(|rule| ComparisonCell::from_rule(rule, currency))
                    .collect(),
            })
            .collect();

        Self {
            cards: headers,
            rows,
        }
    }
}

/// Rule listing entry for a card detail page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleView {
    #[serde(flatten)]
    pub rule: RewardRule,
    pub category_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_category_name: Option<String>,
    pub transaction_label: &'static str,
    pub rate_label: String,
}

impl RuleView {
    pub fn build(
        rule: RewardRule,
        category: Option<&Category>,
        sub_category: Option<&SubCategory>,
        currency: &str,
    ) -> Self {
        let transaction_label = match rule.transaction_type {
            TransactionType::Online => "Online",
            TransactionType::Offline => "In store",
            TransactionType::Both => "Online & in store",
        };
        Self {
            category_name: category
                .map(|category| category.name.clone())
                .unwrap_or_else(|| rule.category_id.0.clone()),
            sub_category_name: sub_category.map(|sub| sub.name.clone()),
            transaction_label,
            rate_label: format_rate(rule.reward_type, rule.reward_value, currency),
            rule,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardRulesView {
    pub card_id: CardId,
    pub card_name: String,
    pub bank_name: String,
    pub annual_fee: Decimal,
    pub rules: Vec<RuleView>,
}
