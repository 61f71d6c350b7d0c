use rust_decimal::Decimal;

use super::common::*;
use crate::rewards::calculator::{Amount, RewardError};
use crate::rewards::catalog::{
    Bank, BankId, CardId, CardWithRules, CreditCard, RewardType, TransactionType,
};
use crate::rewards::comparison::project;
use crate::rewards::matcher::RuleQuery;
use crate::rewards::ranking::{rank, recommend};
use crate::rewards::service::RewardsServiceError;
use crate::rewards::CategoryId;

fn card(id: &str, name: &str, rules: Vec<crate::rewards::RewardRule>) -> CardWithRules {
    CardWithRules {
        card: CreditCard {
            id: CardId::new(id),
            name: name.to_string(),
            bank_id: BankId::new("bank-1"),
            image: None,
            annual_fee: Decimal::ZERO,
        },
        bank: Bank {
            id: BankId::new("bank-1"),
            name: "Test Bank".to_string(),
            logo: None,
        },
        rules,
    }
}

#[test]
fn cards_that_earn_nothing_are_left_out() {
    let unmatched = card(
        "card-travel",
        "Voyager",
        vec![rule("rule-1", "travel", None, RewardType::Miles, 3)],
    );
    let mut gated_rule = rule("rule-2", "dining", None, RewardType::Cashback, 10);
    gated_rule.minimum_spend = Some(Decimal::from(5000));
    let gated = card("card-gated", "Premier", vec![gated_rule]);
    let matching = card(
        "card-dining",
        "Foodie",
        vec![rule("rule-3", "dining", None, RewardType::Cashback, 2)],
    );

    let results = rank(
        &[unmatched, gated, matching],
        &RuleQuery::category(CategoryId::new("dining")),
        Amount::new(Decimal::from(1000)).expect("amount"),
    )
    .expect("ranking");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].card_id, CardId::new("card-dining"));
    assert_eq!(results[0].reward_amount, Decimal::from(20));
}

#[test]
fn equal_rewards_are_ordered_by_card_name() {
    let cards = [
        card(
            "card-z",
            "Zenith",
            vec![rule("rule-z", "dining", None, RewardType::Cashback, 2)],
        ),
        card(
            "card-a",
            "Aurora",
            vec![rule("rule-a", "dining", None, RewardType::Cashback, 2)],
        ),
        card(
            "card-m",
            "Meridian",
            vec![rule("rule-m", "dining", None, RewardType::Cashback, 3)],
        ),
    ];

    let results = rank(
        &cards,
        &RuleQuery::category(CategoryId::new("dining")),
        Amount::new(Decimal::from(100)).expect("amount"),
    )
    .expect("ranking");

    let names: Vec<&str> = results.iter().map(|result| result.card_name.as_str()).collect();
    assert_eq!(names, ["Meridian", "Aurora", "Zenith"]);
    assert_eq!(
        recommend(&results).map(|result| result.card_name.as_str()),
        Some("Meridian")
    );
}

#[test]
fn ranks_catalog_by_reward_amount() {
    let fixture = fixture();
    let service = service(&fixture);

    let restaurants = RuleQuery::category(fixture.dining.clone())
        .with_sub_category(fixture.restaurants.clone());
    let results = service.rank_all(&restaurants, 2000.0).expect("ranking");
    assert_eq!(
        card_ids(&results),
        [
            fixture.regalia.clone(),
            fixture.millennia.clone(),
            fixture.ace.clone()
        ]
    );
    assert_eq!(results[0].reward_amount, Decimal::from(4000));
    assert_eq!(results[1].reward_amount, Decimal::from(100));
    assert_eq!(results[2].reward_amount, Decimal::from(80));

    let online = RuleQuery::category(fixture.dining.clone())
        .with_transaction_type(TransactionType::Online);
    let results = service.rank_all(&online, 2000.0).expect("ranking");
    assert_eq!(
        card_ids(&results),
        [
            fixture.regalia.clone(),
            fixture.ace.clone(),
            fixture.millennia.clone()
        ]
    );
}

#[test]
fn small_spend_drops_cards_with_unmet_minimum() {
    let fixture = fixture();
    let results = service(&fixture)
        .rank_all(&RuleQuery::category(fixture.dining.clone()), 500.0)
        .expect("ranking");

    assert_eq!(
        card_ids(&results),
        [fixture.ace.clone(), fixture.millennia.clone()]
    );
    assert_eq!(results[0].reward_amount, Decimal::from(20));
    assert_eq!(results[1].reward_amount, Decimal::from(5));
}

#[test]
fn monthly_cap_limits_the_ranked_reward() {
    let fixture = fixture();
    let airlines = RuleQuery::category(fixture.travel.clone())
        .with_sub_category(fixture.airlines.clone());

    let results = service(&fixture)
        .rank_all(&airlines, 2000.0)
        .expect("ranking");

    assert_eq!(
        card_ids(&results),
        [fixture.regalia.clone(), fixture.ace.clone()]
    );
    assert_eq!(results[0].reward_type, RewardType::Miles);
    assert_eq!(results[0].reward_amount, Decimal::from(5000));
    assert_eq!(results[1].reward_amount, Decimal::from(40));
}

#[test]
fn negative_amount_never_produces_results() {
    let fixture = fixture();
    let service = service(&fixture);
    let query = RuleQuery::category(fixture.dining.clone());

    assert!(matches!(
        service.rank_all(&query, -5.0),
        Err(RewardsServiceError::Reward(RewardError::InvalidAmount { .. }))
    ));
    assert!(matches!(
        service.rank_all(&query, f64::NAN),
        Err(RewardsServiceError::Reward(RewardError::InvalidAmount { .. }))
    ));
}

#[test]
fn oversized_amount_fails_the_ranking_without_panicking() {
    let fixture = fixture();
    let result = service(&fixture).rank_all(&RuleQuery::category(fixture.dining.clone()), 5e28);

    assert!(matches!(
        result,
        Err(RewardsServiceError::Reward(RewardError::RewardOutOfRange { .. }))
    ));
}

#[test]
fn zero_amount_earns_nothing_anywhere() {
    let fixture = fixture();
    let results = service(&fixture)
        .rank_all(&RuleQuery::category(fixture.dining.clone()), 0.0)
        .expect("zero is a valid amount");
    assert!(results.is_empty());
}

#[test]
fn projection_prefers_category_wide_rules() {
    let general_and_specific = card(
        "card-1",
        "Everyday",
        vec![
            rule("rule-1", "dining", Some("restaurants"), RewardType::Cashback, 10),
            rule("rule-2", "dining", None, RewardType::Cashback, 1),
        ],
    );
    let specific_only = card(
        "card-2",
        "Gourmet",
        vec![
            rule("rule-3", "dining", Some("cafes"), RewardType::Cashback, 3),
            rule("rule-4", "dining", Some("restaurants"), RewardType::Cashback, 6),
            rule("rule-5", "travel", None, RewardType::Miles, 2),
        ],
    );

    let matrix = project(&[general_and_specific, specific_only]);
    let dining = CategoryId::new("dining");
    let travel = CategoryId::new("travel");

    assert_eq!(matrix.categories, [dining.clone(), travel.clone()]);
    assert_eq!(
        matrix
            .cell(&dining, &CardId::new("card-1"))
            .map(|rule| rule.reward_value),
        Some(Decimal::from(1))
    );
    assert_eq!(
        matrix
            .cell(&dining, &CardId::new("card-2"))
            .map(|rule| rule.reward_value),
        Some(Decimal::from(6))
    );
    assert!(matrix.cell(&travel, &CardId::new("card-1")).is_none());
    assert_eq!(matrix.row(&travel).len(), 2);
}
