use std::path::PathBuf;
use std::sync::Arc;

use crate::infra::{
    load_catalog, parse_transaction_type, resolve_card, resolve_category, resolve_sub_category,
    sample_catalog,
};
use card_rewards::config::RewardsConfig;
use card_rewards::error::AppError;
use card_rewards::rewards::{
    AuthorizedCaller, ComparisonView, InMemoryCatalog, RankedResultView, RewardType,
    RewardsService, RuleDraft, RuleQuery, TransactionType, UserId, DEFAULT_CURRENCY_SYMBOL,
};
use clap::Args;
use rust_decimal::Decimal;

#[derive(Args, Debug)]
pub(crate) struct CalculateArgs {
    /// Catalog CSV to load (defaults to the bundled sample catalog)
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Spend category name, e.g. "Dining"
    #[arg(long)]
    pub(crate) category: String,
    /// Optional sub-category name, e.g. "Restaurants"
    #[arg(long)]
    pub(crate) sub_category: Option<String>,
    /// ONLINE, OFFLINE or BOTH; omit to consider every channel
    #[arg(long, value_parser = parse_transaction_type)]
    pub(crate) transaction_type: Option<TransactionType>,
    /// Purchase amount
    #[arg(long)]
    pub(crate) amount: f64,
    /// Currency symbol used in the output
    #[arg(long, default_value = DEFAULT_CURRENCY_SYMBOL)]
    pub(crate) currency: String,
}

#[derive(Args, Debug)]
pub(crate) struct CompareArgs {
    /// Catalog CSV to load (defaults to the bundled sample catalog)
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Card name; pass two or three times
    #[arg(long = "card", required = true)]
    pub(crate) cards: Vec<String>,
    /// Currency symbol used in the output
    #[arg(long, default_value = DEFAULT_CURRENCY_SYMBOL)]
    pub(crate) currency: String,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Purchase amount used for every demo scenario
    #[arg(long, default_value_t = 2000.0)]
    pub(crate) amount: f64,
}

fn open_service(
    catalog: Option<PathBuf>,
    currency: String,
) -> Result<(Arc<InMemoryCatalog>, RewardsService<InMemoryCatalog>), AppError> {
    let config = RewardsConfig {
        catalog_csv: catalog,
        currency_symbol: currency,
    };
    let store = Arc::new(load_catalog(&config)?);
    let service = RewardsService::new(store.clone()).with_currency_symbol(config.currency_symbol);
    Ok((store, service))
}

pub(crate) fn run_calculate(args: CalculateArgs) -> Result<(), AppError> {
    let CalculateArgs {
        catalog,
        category,
        sub_category,
        transaction_type,
        amount,
        currency,
    } = args;

    let (store, service) = open_service(catalog, currency)?;
    let category_id = resolve_category(&store, &category)?;
    let mut query = RuleQuery::category(category_id.clone());
    if let Some(channel) = transaction_type {
        query = query.with_transaction_type(channel);
    }
    if let Some(name) = &sub_category {
        query = query.with_sub_category(resolve_sub_category(&store, &category_id, name)?);
    }

    let results = service.rank_all(&query, amount)?;
    let views: Vec<RankedResultView> = results
        .iter()
        .map(|result| RankedResultView::from_result(result, service.currency_symbol()))
        .collect();

    let scope = match &sub_category {
        Some(name) => format!("{category} / {name}"),
        None => category.clone(),
    };
    println!(
        "Best cards for {}{:.2} on {} ({})",
        service.currency_symbol(),
        amount,
        scope,
        transaction_type.map_or("any channel", TransactionType::label)
    );
    render_ranking(&views);
    Ok(())
}

pub(crate) fn run_compare(args: CompareArgs) -> Result<(), AppError> {
    let CompareArgs {
        catalog,
        cards,
        currency,
    } = args;

    let (store, service) = open_service(catalog, currency)?;
    let card_ids = cards
        .iter()
        .map(|name| resolve_card(&store, name))
        .collect::<Result<Vec<_>, _>>()?;

    let view = service.compare(&card_ids)?;
    render_comparison(&view);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let store = Arc::new(sample_catalog()?);
    let service = RewardsService::new(store.clone());
    let member = AuthorizedCaller::user(UserId::new("demo-member"));
    let admin = AuthorizedCaller::admin(UserId::new("demo-admin"));

    println!("Card rewards demo");
    let wallet = ["Millennia", "Ace", "Atlas"];
    for name in wallet {
        service.attach_card(&member, &resolve_card(&store, name)?)?;
    }
    println!("Wallet: {}", wallet.join(", "));

    let dining = resolve_category(&store, "Dining")?;
    let restaurants = resolve_sub_category(&store, &dining, "Restaurants")?;
    let groceries = resolve_category(&store, "Groceries")?;
    let scenarios = [
        (
            "Dinner at a restaurant",
            RuleQuery::category(dining.clone()).with_sub_category(restaurants),
        ),
        (
            "Food delivery ordered online",
            RuleQuery::category(dining).with_transaction_type(TransactionType::Online),
        ),
        (
            "Weekly groceries",
            RuleQuery::category(groceries.clone()),
        ),
    ];

    for (label, query) in &scenarios {
        let results = service.best_cards(&member, query, args.amount)?;
        let views: Vec<RankedResultView> = results
            .iter()
            .map(|result| RankedResultView::from_result(result, service.currency_symbol()))
            .collect();
        println!(
            "\n{} ({}{:.2})",
            label,
            service.currency_symbol(),
            args.amount
        );
        render_ranking(&views);
    }

    let millennia = resolve_card(&store, "Millennia")?;
    let promotion = service.create_rule(
        &admin,
        RuleDraft {
            credit_card_id: millennia,
            category_id: groceries.clone(),
            sub_category_id: None,
            transaction_type: TransactionType::Both,
            reward_type: RewardType::Cashback,
            reward_value: Decimal::from(3),
            monthly_cap: Some(Decimal::from(250)),
            minimum_spend: None,
        },
    )?;
    println!(
        "\nAdmin added a {}% groceries promotion to Millennia ({})",
        promotion.reward_value, promotion.id
    );
    let results = service.best_cards(&member, &RuleQuery::category(groceries), args.amount)?;
    let views: Vec<RankedResultView> = results
        .iter()
        .map(|result| RankedResultView::from_result(result, service.currency_symbol()))
        .collect();
    render_ranking(&views);

    let card_ids = wallet
        .iter()
        .map(|name| resolve_card(&store, name))
        .collect::<Result<Vec<_>, _>>()?;
    println!("\nSide-by-side comparison");
    render_comparison(&service.compare(&card_ids)?);
    Ok(())
}

fn render_ranking(views: &[RankedResultView]) {
    if views.is_empty() {
        println!("  No card earns a reward on this purchase.");
        return;
    }

    for (position, view) in views.iter().enumerate() {
        let marker = if position == 0 { "*" } else { " " };
        println!(
            "{} {}. {} ({}) - {} at {}",
            marker,
            position + 1,
            view.card_name,
            view.bank_name,
            view.reward_label,
            view.rate_label
        );
    }
}

fn render_comparison(view: &ComparisonView) {
    const CATEGORY_WIDTH: usize = 16;
    const CELL_WIDTH: usize = 24;

    print!("{:<CATEGORY_WIDTH$}", "Category");
    for card in &view.cards {
        print!("{:<CELL_WIDTH$}", format!("{} ({})", card.card_name, card.bank_name));
    }
    println!();

    print!("{:<CATEGORY_WIDTH$}", "Annual fee");
    for card in &view.cards {
        print!("{:<CELL_WIDTH$}", card.annual_fee.normalize().to_string());
    }
    println!();

    for row in &view.rows {
        print!("{:<CATEGORY_WIDTH$}", row.category_name);
        for cell in &row.cells {
            print!("{:<CELL_WIDTH$}", cell.label);
        }
        println!();
    }
}
