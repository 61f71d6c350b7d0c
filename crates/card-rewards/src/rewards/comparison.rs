use std::collections::HashMap;

use serde::Serialize;

use super::catalog::{CardId, CardWithRules, CategoryId, RewardRule};
use super::matcher::most_favourable;

/// Category-by-card grid of the strongest rule each card offers per category.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComparisonMatrix {
    pub categories: Vec<CategoryId>,
    pub cards: Vec<CardId>,
    #[serde(skip)]
    cells: HashMap<(CategoryId, CardId), RewardRule>,
}

impl ComparisonMatrix {
    /// `None` renders as "N/A": the card has no rule at all for the category.
    pub fn cell(&self, category_id: &CategoryId, card_id: &CardId) -> Option<&RewardRule> {
        self.cells.get(&(category_id.clone(), card_id.clone()))
    }

    pub fn row(&self, category_id: &CategoryId) -> Vec<Option<&RewardRule>> {
        self.cards
            .iter()
            .map(|card_id| self.cell(category_id, card_id))
            .collect()
    }
}

/// Project the selected cards into a comparison matrix.
///
/// Categories appear in the order they are first referenced across the cards' rules. Each cell
/// holds the best category-wide rule, or the best sub-category rule when the card has no
/// category-wide rule for that category. Transaction type is not considered.
pub fn project(cards: &[CardWithRules]) -> ComparisonMatrix {
    let mut categories: Vec<CategoryId> = Vec::new();
    for rule in cards.iter().flat_map(|entry| entry.rules.iter()) {
        if !categories.contains(&rule.category_id) {
            categories.push(rule.category_id.clone());
        }
    }

    let mut cells = HashMap::new();
    for category_id in &categories {
        for entry in cards {
            if let Some(rule) = best_for_category(&entry.rules, category_id) {
                cells.insert((category_id.clone(), entry.card.id.clone()), rule.clone());
            }
        }
    }

    ComparisonMatrix {
        categories,
        cards: cards.iter().map(|entry| entry.card.id.clone()).collect(),
        cells,
    }
}

fn best_for_category<'a>(
    rules: &'a [RewardRule],
    category_id: &CategoryId,
) -> Option<&'a RewardRule> {
    let in_category: Vec<&RewardRule> = rules
        .iter()
        .filter(|rule| &rule.category_id == category_id)
        .collect();

    most_favourable(
        in_category
            .iter()
            .copied()
            .filter(|rule| rule.sub_category_id.is_none()),
    )
    .or_else(|| most_favourable(in_category.iter().copied()))
}
