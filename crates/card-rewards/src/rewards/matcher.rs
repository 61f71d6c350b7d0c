use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::catalog::{CategoryId, RewardRule, SubCategoryId, TransactionType};

/// Spend description a card's rules are resolved against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleQuery {
    pub category_id: CategoryId,
    #[serde(default)]
    pub sub_category_id: Option<SubCategoryId>,
    /// Payment channel of the spend; `None` considers rules for every channel.
    #[serde(default)]
    pub transaction_type: Option<TransactionType>,
}

impl RuleQuery {
    pub fn category(category_id: CategoryId) -> Self {
        Self {
            category_id,
            sub_category_id: None,
            transaction_type: None,
        }
    }

    pub fn with_sub_category(mut self, sub_category_id: SubCategoryId) -> Self {
        self.sub_category_id = Some(sub_category_id);
        self
    }

    pub fn with_transaction_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = Some(transaction_type);
        self
    }
}

/// Pick the single rule that governs `query` from one card's rule set.
///
/// Rules scoped to the queried sub-category win over category-wide rules; a sub-category rule
/// never applies when the query names no sub-category (or a different one). A query without a
/// channel keeps every rule; a query with one keeps BOTH rules plus rules for that channel.
/// Within the winning scope the highest reward value wins, then the smallest rule id.
pub fn match_rule<'a>(rules: &'a [RewardRule], query: &RuleQuery) -> Option<&'a RewardRule> {
    let mut specific = Vec::new();
    let mut general = Vec::new();

    let candidates = rules
        .iter()
        .filter(|rule| rule.category_id == query.category_id)
        .filter(|rule| {
            query
                .transaction_type
                .map_or(true, |channel| rule.transaction_type.accepts(channel))
        });

    for rule in candidates {
        match (&rule.sub_category_id, &query.sub_category_id) {
            (None, _) => general.push(rule),
            (Some(scoped), Some(requested)) if scoped == requested => specific.push(rule),
            _ => {}
        }
    }

    most_favourable(specific).or_else(|| most_favourable(general))
}

/// Highest reward value first, smallest id on ties.
pub(crate) fn most_favourable<'a, I>(rules: I) -> Option<&'a RewardRule>
where
    I: IntoIterator<Item = &'a RewardRule>,
{
    rules.into_iter().min_by(|left, right| preference(left, right))
}

fn preference(left: &RewardRule, right: &RewardRule) -> Ordering {
    right
        .reward_value
        .cmp(&left.reward_value)
        .then_with(|| left.id.cmp(&right.id))
}
