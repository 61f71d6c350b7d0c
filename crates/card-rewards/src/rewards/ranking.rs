use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::calculator::{reward_for, Amount, RewardError};
use super::catalog::{CardId, CardWithRules, RewardType, RuleId};
use super::matcher::{match_rule, RuleQuery};

/// One card's standing for a ranked query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedResult {
    pub card_id: CardId,
    pub card_name: String,
    pub bank_name: String,
    pub rule_id: RuleId,
    pub reward_type: RewardType,
    pub reward_rate: Decimal,
    pub reward_amount: Decimal,
}

/// Rank cards by the reward each earns on `query`, best first.
///
/// Cards without a matching rule or whose minimum spend is not met earn nothing and are left out.
/// Equal rewards are ordered by card name. The amount is validated by [`Amount`] before any card
/// is evaluated; a reward outside the decimal range fails the whole ranking.
pub fn rank(
    cards: &[CardWithRules],
    query: &RuleQuery,
    amount: Amount,
) -> Result<Vec<RankedResult>, RewardError> {
    let mut results = Vec::with_capacity(cards.len());
    for entry in cards {
        let Some(rule) = match_rule(&entry.rules, query) else {
            continue;
        };
        let outcome = reward_for(Some(rule), amount)?;
        if !outcome.earns() {
            continue;
        }

        results.push(RankedResult {
            card_id: entry.card.id.clone(),
            card_name: entry.card.name.clone(),
            bank_name: entry.bank.name.clone(),
            rule_id: rule.id.clone(),
            reward_type: rule.reward_type,
            reward_rate: outcome.rate,
            reward_amount: outcome.reward_amount,
        });
    }

    results.sort_by(|left, right| {
        right
            .reward_amount
            .cmp(&left.reward_amount)
            .then_with(|| left.card_name.cmp(&right.card_name))
    });

    Ok(results)
}

/// Top-ranked card, if any card earns a reward.
pub fn recommend(results: &[RankedResult]) -> Option<&RankedResult> {
    results.first()
}
