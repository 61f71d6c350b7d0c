use std::io::Read;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use crate::rewards::catalog::{CatalogError, RewardType, TransactionType};

#[derive(Debug)]
pub(crate) struct CatalogRecord {
    pub(crate) line: u64,
    pub(crate) bank: String,
    pub(crate) card: String,
    pub(crate) annual_fee: Decimal,
    pub(crate) category: String,
    pub(crate) sub_category: Option<String>,
    pub(crate) transaction_type: TransactionType,
    pub(crate) reward_type: RewardType,
    pub(crate) reward_value: Decimal,
    pub(crate) monthly_cap: Option<Decimal>,
    pub(crate) minimum_spend: Option<Decimal>,
}

/// Rows that fail to deserialize surface as csv errors; rows whose cells fail to parse come
/// back as the catalog error for the offending field, tagged with their line.
pub(crate) fn parse_records<R: Read>(
    reader: R,
) -> Result<Vec<Result<CatalogRecord, (u64, CatalogError)>>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for (index, record) in csv_reader.deserialize::<CatalogRow>().enumerate() {
        let row = record?;
        // header is line 1
        let line = index as u64 + 2;
        records.push(row.into_record(line).map_err(|err| (line, err)));
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(rename = "Bank")]
    bank: String,
    #[serde(rename = "Card")]
    card: String,
    #[serde(rename = "Annual Fee", default, deserialize_with = "empty_string_as_none")]
    annual_fee: Option<String>,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Sub Category", default, deserialize_with = "empty_string_as_none")]
    sub_category: Option<String>,
    #[serde(
        rename = "Transaction Type",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    transaction_type: Option<String>,
    #[serde(rename = "Reward Type")]
    reward_type: String,
    #[serde(rename = "Reward Value")]
    reward_value: String,
    #[serde(rename = "Monthly Cap", default, deserialize_with = "empty_string_as_none")]
    monthly_cap: Option<String>,
    #[serde(
        rename = "Minimum Spend",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    minimum_spend: Option<String>,
}

impl CatalogRow {
    fn into_record(self, line: u64) -> Result<CatalogRecord, CatalogError> {
        let transaction_type = match self.transaction_type.as_deref() {
            Some(value) => value.parse()?,
            None => TransactionType::Both,
        };

        Ok(CatalogRecord {
            line,
            annual_fee: parse_optional_decimal("annual_fee", self.annual_fee.as_deref())?
                .unwrap_or(Decimal::ZERO),
            transaction_type,
            reward_type: self.reward_type.parse()?,
            reward_value: parse_decimal("reward_value", &self.reward_value)?,
            monthly_cap: parse_optional_decimal("monthly_cap", self.monthly_cap.as_deref())?,
            minimum_spend: parse_optional_decimal("minimum_spend", self.minimum_spend.as_deref())?,
            bank: required_name("bank", self.bank)?,
            card: required_name("card", self.card)?,
            category: required_name("category", self.category)?,
            sub_category: self.sub_category,
        })
    }
}

fn required_name(field: &'static str, value: String) -> Result<String, CatalogError> {
    if value.trim().is_empty() {
        return Err(CatalogError::InvalidValue {
            field,
            reason: "name must not be blank".to_string(),
        });
    }
    Ok(value)
}

fn parse_decimal(field: &'static str, value: &str) -> Result<Decimal, CatalogError> {
    Decimal::from_str(value.trim()).map_err(|err| CatalogError::InvalidValue {
        field,
        reason: format!("'{value}' is not a number: {err}"),
    })
}

fn parse_optional_decimal(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<Decimal>, CatalogError> {
    value.map(|value| parse_decimal(field, value)).transpose()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
