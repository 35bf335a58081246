//! Feature encoding for classifier inference.
//!
//! Turns one [`TransactionRecord`] into the numeric row the trained model
//! expects. Categorical selections are normalized to the training-time
//! convention, expanded to one-hot indicator columns, and the named result
//! is projected onto the schema's column order. Getting the alignment wrong
//! does not crash anything, it silently feeds the model a scrambled row, so
//! the expansion and the projection stay separately testable.

use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::schema::FeatureSchema;
use crate::types::TransactionRecord;

/// Country catalog: display name and the code used in training columns.
pub const COUNTRIES: [(&str, &str); 10] = [
    ("Germany", "DE"),
    ("Spain", "ES"),
    ("France", "FR"),
    ("United Kingdom", "GB"),
    ("Italy", "IT"),
    ("Netherlands", "NL"),
    ("Poland", "PL"),
    ("Romania", "RO"),
    ("Turkey", "TR"),
    ("United States", "US"),
];

/// Sales channels as offered by the form.
pub const CHANNELS: [&str; 2] = ["App", "Web"];

/// Merchant categories as offered by the form.
pub const MERCHANT_CATEGORIES: [&str; 5] =
    ["Electronics", "Fashion", "Gaming", "Grocery", "Travel"];

/// Yes/No options as offered by the form, in display order.
pub const FLAG_VALUES: [&str; 2] = ["No", "Yes"];

/// Country display names in form order.
pub fn country_options() -> Vec<&'static str> {
    COUNTRIES.iter().map(|(name, _)| *name).collect()
}

/// A numeric row whose values follow one schema's column order exactly.
///
/// Only constructible through [`FeatureEncoder::align`], so a row always
/// has as many values as the schema it was projected against has columns.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    values: Vec<f32>,
}

impl AlignedRow {
    /// Row values in schema order.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Encoder that transforms submissions into model input rows.
///
/// Mirrors the preprocessing the training pipeline applied: the same country
/// codes, the same lower-case category tokens, one indicator column per
/// category with no reference level dropped.
pub struct FeatureEncoder;

impl FeatureEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encode a submission against `schema`.
    ///
    /// Returns [`ValidationError`] when any categorical value falls outside
    /// the known catalogs; the classifier never sees such a row.
    pub fn encode(
        &self,
        record: &TransactionRecord,
        schema: &FeatureSchema,
    ) -> Result<AlignedRow, ValidationError> {
        let named = self.expand(record)?;
        Ok(self.align(&named, schema))
    }

    /// Normalize and one-hot expand a submission into a name-keyed row.
    ///
    /// Every known indicator column is present: the selected category
    /// carries 1.0 and each alternative carries an explicit 0.0, so the
    /// result covers the full column universe regardless of the input.
    pub fn expand(
        &self,
        record: &TransactionRecord,
    ) -> Result<BTreeMap<String, f32>, ValidationError> {
        let country = country_code(&record.country, "country")?;
        let bin_country = country_code(&record.bin_country, "bin_country")?;
        let channel = category_token(&record.channel, &CHANNELS)
            .ok_or_else(|| ValidationError::UnknownChannel {
                value: record.channel.clone(),
            })?;
        let merchant = category_token(&record.merchant_category, &MERCHANT_CATEGORIES)
            .ok_or_else(|| ValidationError::UnknownMerchantCategory {
                value: record.merchant_category.clone(),
            })?;

        let mut row = BTreeMap::new();
        row.insert(
            "account_age_days".to_string(),
            record.account_age_days as f32,
        );
        row.insert(
            "total_transactions_user".to_string(),
            record.total_transactions_user as f32,
        );
        row.insert("avg_amount_user".to_string(), record.avg_amount_user as f32);
        row.insert("amount".to_string(), record.amount as f32);
        row.insert(
            "promo_used".to_string(),
            flag_value(&record.promo_used, "promo_used")?,
        );
        row.insert(
            "avs_match".to_string(),
            flag_value(&record.avs_match, "avs_match")?,
        );
        row.insert(
            "cvv_result".to_string(),
            flag_value(&record.cvv_result, "cvv_result")?,
        );
        row.insert(
            "three_ds_flag".to_string(),
            flag_value(&record.three_ds_flag, "three_ds_flag")?,
        );
        row.insert(
            "shipping_distance_km".to_string(),
            record.shipping_distance_km as f32,
        );

        for (_, code) in COUNTRIES {
            row.insert(format!("country_{code}"), indicator(code == country));
            row.insert(format!("bin_country_{code}"), indicator(code == bin_country));
        }
        for name in CHANNELS {
            let token = name.to_ascii_lowercase();
            row.insert(format!("channel_{token}"), indicator(token == channel));
        }
        for name in MERCHANT_CATEGORIES {
            let token = name.to_ascii_lowercase();
            row.insert(
                format!("merchant_category_{token}"),
                indicator(token == merchant),
            );
        }

        Ok(row)
    }

    /// Project a named row onto `schema`.
    ///
    /// Schema columns absent from the row become 0.0, row entries absent
    /// from the schema are dropped, and the output order is exactly the
    /// schema's. The schema is authoritative; the row's own ordering never
    /// leaks through.
    pub fn align(&self, named: &BTreeMap<String, f32>, schema: &FeatureSchema) -> AlignedRow {
        let values = schema
            .columns()
            .iter()
            .map(|column| named.get(column).copied().unwrap_or(0.0))
            .collect();
        AlignedRow { values }
    }
}

impl Default for FeatureEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a country selection to its training-time code. Accepts the
/// display name or the code itself, case-insensitively.
fn country_code(value: &str, field: &'static str) -> Result<&'static str, ValidationError> {
    COUNTRIES
        .iter()
        .find(|(name, code)| value.eq_ignore_ascii_case(name) || value.eq_ignore_ascii_case(code))
        .map(|(_, code)| *code)
        .ok_or_else(|| ValidationError::UnknownCountry {
            field,
            value: value.to_string(),
        })
}

/// Resolve a category selection to its lower-case training-time token.
fn category_token(value: &str, catalog: &[&'static str]) -> Option<String> {
    catalog
        .iter()
        .find(|name| value.eq_ignore_ascii_case(name))
        .map(|name| name.to_ascii_lowercase())
}

fn flag_value(value: &str, field: &'static str) -> Result<f32, ValidationError> {
    if value.eq_ignore_ascii_case("Yes") {
        Ok(1.0)
    } else if value.eq_ignore_ascii_case("No") {
        Ok(0.0)
    } else {
        Err(ValidationError::InvalidFlag {
            field,
            value: value.to_string(),
        })
    }
}

fn indicator(selected: bool) -> f32 {
    if selected {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The schema fixture shipped with the service, in training order.
    fn training_schema() -> FeatureSchema {
        let columns: Vec<String> =
            serde_json::from_str(include_str!("../artifacts/columns.json")).unwrap();
        FeatureSchema::from_columns(columns).unwrap()
    }

    fn value_of(row: &AlignedRow, schema: &FeatureSchema, column: &str) -> f32 {
        row.values()[schema.position(column).unwrap_or_else(|| panic!("no column {column}"))]
    }

    #[test]
    fn test_default_submission_row() {
        let schema = training_schema();
        let encoder = FeatureEncoder::new();
        let row = encoder
            .encode(&TransactionRecord::sample(), &schema)
            .unwrap();

        assert_eq!(row.len(), schema.len());

        assert_eq!(value_of(&row, &schema, "account_age_days"), 365.0);
        assert_eq!(value_of(&row, &schema, "total_transactions_user"), 50.0);
        assert_eq!(value_of(&row, &schema, "avg_amount_user"), 200.0);
        assert_eq!(value_of(&row, &schema, "amount"), 100.0);
        assert_eq!(value_of(&row, &schema, "shipping_distance_km"), 10.0);
        assert_eq!(value_of(&row, &schema, "promo_used"), 0.0);
        assert_eq!(value_of(&row, &schema, "avs_match"), 1.0);
        assert_eq!(value_of(&row, &schema, "cvv_result"), 1.0);
        assert_eq!(value_of(&row, &schema, "three_ds_flag"), 1.0);

        assert_eq!(value_of(&row, &schema, "country_DE"), 1.0);
        assert_eq!(value_of(&row, &schema, "country_TR"), 0.0);
        assert_eq!(value_of(&row, &schema, "bin_country_DE"), 1.0);
        assert_eq!(value_of(&row, &schema, "channel_web"), 1.0);
        assert_eq!(value_of(&row, &schema, "channel_app"), 0.0);
        assert_eq!(value_of(&row, &schema, "merchant_category_electronics"), 1.0);
        assert_eq!(value_of(&row, &schema, "merchant_category_travel"), 0.0);
    }

    #[test]
    fn test_changed_selection_flips_indicators() {
        let schema = training_schema();
        let encoder = FeatureEncoder::new();

        let mut record = TransactionRecord::sample();
        record.country = "Turkey".to_string();
        let row = encoder.encode(&record, &schema).unwrap();

        assert_eq!(value_of(&row, &schema, "country_TR"), 1.0);
        assert_eq!(value_of(&row, &schema, "country_DE"), 0.0);
        // bin_country is untouched by the country change.
        assert_eq!(value_of(&row, &schema, "bin_country_DE"), 1.0);
        assert_eq!(value_of(&row, &schema, "bin_country_TR"), 0.0);
    }

    #[test]
    fn test_one_hot_blocks_sum_to_one() {
        let schema = training_schema();
        let encoder = FeatureEncoder::new();

        for (name, code) in COUNTRIES {
            let mut record = TransactionRecord::sample();
            record.country = name.to_string();
            let row = encoder.encode(&record, &schema).unwrap();

            let block: f32 = schema
                .columns()
                .iter()
                .zip(row.values())
                .filter(|(column, _)| column.starts_with("country_"))
                .map(|(_, value)| *value)
                .sum();
            assert_eq!(block, 1.0, "country block for {name}");
            assert_eq!(value_of(&row, &schema, &format!("country_{code}")), 1.0);
        }

        for name in MERCHANT_CATEGORIES {
            let mut record = TransactionRecord::sample();
            record.merchant_category = name.to_string();
            let row = encoder.encode(&record, &schema).unwrap();

            let block: f32 = schema
                .columns()
                .iter()
                .zip(row.values())
                .filter(|(column, _)| column.starts_with("merchant_category_"))
                .map(|(_, value)| *value)
                .sum();
            assert_eq!(block, 1.0, "merchant block for {name}");
        }
    }

    #[test]
    fn test_expand_covers_full_column_universe() {
        let encoder = FeatureEncoder::new();
        let named = encoder.expand(&TransactionRecord::sample()).unwrap();

        // 9 numerics + 10 country + 10 bin_country + 2 channel + 5 merchant.
        assert_eq!(named.len(), 36);
        assert_eq!(named.get("country_NL"), Some(&0.0));
        assert_eq!(named.get("bin_country_US"), Some(&0.0));
        assert_eq!(named.get("channel_app"), Some(&0.0));
    }

    #[test]
    fn test_unknown_country_rejected() {
        let encoder = FeatureEncoder::new();
        let mut record = TransactionRecord::sample();
        record.country = "Atlantis".to_string();

        let result = encoder.expand(&record);
        assert_eq!(
            result,
            Err(ValidationError::UnknownCountry {
                field: "country",
                value: "Atlantis".to_string(),
            })
        );
    }

    #[test]
    fn test_unknown_merchant_category_rejected() {
        let encoder = FeatureEncoder::new();
        let mut record = TransactionRecord::sample();
        record.merchant_category = "Jewelry".to_string();

        let result = encoder.expand(&record);
        assert_eq!(
            result,
            Err(ValidationError::UnknownMerchantCategory {
                value: "Jewelry".to_string(),
            })
        );
    }

    #[test]
    fn test_unknown_channel_and_flag_rejected() {
        let encoder = FeatureEncoder::new();

        let mut record = TransactionRecord::sample();
        record.channel = "Phone".to_string();
        assert_eq!(
            encoder.expand(&record),
            Err(ValidationError::UnknownChannel {
                value: "Phone".to_string(),
            })
        );

        let mut record = TransactionRecord::sample();
        record.cvv_result = "Maybe".to_string();
        assert_eq!(
            encoder.expand(&record),
            Err(ValidationError::InvalidFlag {
                field: "cvv_result",
                value: "Maybe".to_string(),
            })
        );
    }

    #[test]
    fn test_case_insensitive_normalization() {
        let schema = training_schema();
        let encoder = FeatureEncoder::new();

        let mut record = TransactionRecord::sample();
        record.country = "germany".to_string();
        record.bin_country = "tr".to_string();
        record.channel = "WEB".to_string();
        record.merchant_category = "GAMING".to_string();
        record.promo_used = "yes".to_string();
        let row = encoder.encode(&record, &schema).unwrap();

        assert_eq!(value_of(&row, &schema, "country_DE"), 1.0);
        assert_eq!(value_of(&row, &schema, "bin_country_TR"), 1.0);
        assert_eq!(value_of(&row, &schema, "channel_web"), 1.0);
        assert_eq!(value_of(&row, &schema, "merchant_category_gaming"), 1.0);
        assert_eq!(value_of(&row, &schema, "promo_used"), 1.0);
    }

    #[test]
    fn test_schema_order_is_authoritative() {
        let schema = training_schema();
        let mut reversed_columns: Vec<String> = schema.columns().to_vec();
        reversed_columns.reverse();
        let reversed = FeatureSchema::from_columns(reversed_columns).unwrap();

        let encoder = FeatureEncoder::new();
        let record = TransactionRecord::sample();
        let row = encoder.encode(&record, &schema).unwrap();
        let reversed_row = encoder.encode(&record, &reversed).unwrap();

        // Same values, repositioned wherever the schema puts the column.
        for column in schema.columns() {
            assert_eq!(
                value_of(&row, &schema, column),
                value_of(&reversed_row, &reversed, column),
                "column {column}"
            );
        }
        assert_ne!(row.values(), reversed_row.values());
    }

    #[test]
    fn test_unproducible_schema_column_padded_with_zero() {
        let mut columns: Vec<String> = training_schema().columns().to_vec();
        columns.push("country_XX".to_string());
        let schema = FeatureSchema::from_columns(columns).unwrap();

        let encoder = FeatureEncoder::new();
        let row = encoder
            .encode(&TransactionRecord::sample(), &schema)
            .unwrap();

        assert_eq!(row.len(), 37);
        assert_eq!(value_of(&row, &schema, "country_XX"), 0.0);
    }

    #[test]
    fn test_columns_outside_schema_dropped() {
        let schema =
            FeatureSchema::from_columns(vec!["amount".to_string(), "country_DE".to_string()])
                .unwrap();

        let encoder = FeatureEncoder::new();
        let row = encoder
            .encode(&TransactionRecord::sample(), &schema)
            .unwrap();

        assert_eq!(row.values(), &[100.0, 1.0]);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let schema = training_schema();
        let encoder = FeatureEncoder::new();
        let record = TransactionRecord::sample();

        let first = encoder.encode(&record, &schema).unwrap();
        let second = encoder.encode(&record, &schema).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_catalog_sizes() {
        assert_eq!(COUNTRIES.len(), 10);
        assert_eq!(CHANNELS.len(), 2);
        assert_eq!(MERCHANT_CATEGORIES.len(), 5);
        assert_eq!(country_options().len(), 10);
    }
}
