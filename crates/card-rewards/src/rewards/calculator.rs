use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::{RewardRule, RewardType};

/// Validated, non-negative transaction amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, RewardError> {
        if value < Decimal::ZERO {
            return Err(RewardError::InvalidAmount {
                amount: value.to_string(),
            });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> Decimal {
        self.0
    }
}

impl TryFrom<f64> for Amount {
    type Error = RewardError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(RewardError::InvalidAmount {
                amount: value.to_string(),
            });
        }
        let decimal = Decimal::from_f64(value).ok_or_else(|| RewardError::InvalidAmount {
            amount: value.to_string(),
        })?;
        Self::new(decimal)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = RewardError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Result of applying one rule to one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardOutcome {
    pub rate: Decimal,
    pub reward_amount: Decimal,
    pub reward_type: Option<RewardType>,
}

impl RewardOutcome {
    pub fn none() -> Self {
        Self {
            rate: Decimal::ZERO,
            reward_amount: Decimal::ZERO,
            reward_type: None,
        }
    }

    pub fn earns(&self) -> bool {
        self.reward_amount > Decimal::ZERO
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RewardError {
    #[error("transaction amount must be a finite, non-negative number (got {amount})")]
    InvalidAmount { amount: String },
    #[error("reward for amount {amount} under rule '{rule_id}' exceeds the representable range")]
    RewardOutOfRange { amount: String, rule_id: String },
}

/// Validate `amount` and compute the reward `rule` earns on it.
pub fn calculate(rule: Option<&RewardRule>, amount: f64) -> Result<RewardOutcome, RewardError> {
    let amount = Amount::try_from(amount)?;
    reward_for(rule, amount)
}

/// Reward in the rule's native unit for an already validated amount.
///
/// Cashback values are percentages; points and miles values are earned per currency unit. A
/// monthly cap clamps this single transaction only. A reward too large to represent saturates
/// at the cap when there is one and is rejected otherwise.
pub fn reward_for(
    rule: Option<&RewardRule>,
    amount: Amount,
) -> Result<RewardOutcome, RewardError> {
    let Some(rule) = rule else {
        return Ok(RewardOutcome::none());
    };

    let amount = amount.value();
    if let Some(minimum) = rule.minimum_spend {
        if amount < minimum {
            return Ok(RewardOutcome {
                rate: rule.reward_value,
                reward_amount: Decimal::ZERO,
                reward_type: Some(rule.reward_type),
            });
        }
    }

    let raw = match rule.reward_type {
        RewardType::Cashback => amount
            .checked_mul(rule.reward_value)
            .and_then(|product| product.checked_div(Decimal::ONE_HUNDRED)),
        RewardType::Points | RewardType::Miles => amount.checked_mul(rule.reward_value),
    };

    let reward_amount = match (raw, rule.monthly_cap) {
        (Some(raw), Some(cap)) => raw.min(cap),
        (Some(raw), None) => raw,
        (None, Some(cap)) => cap,
        (None, None) => {
            return Err(RewardError::RewardOutOfRange {
                amount: amount.to_string(),
                rule_id: rule.id.to_string(),
            })
        }
    };

    Ok(RewardOutcome {
        rate: rule.reward_value,
        reward_amount,
        reward_type: Some(rule.reward_type),
    })
}
