//! Offline Scoring Tool
//!
//! Loads the configured artifacts directly (no HTTP server) and scores a
//! handful of generated submissions, printing one line per record. Useful
//! for smoke-testing new model/schema artifact pairs.
//!
//! Usage: score-sample [count] [fraud_rate]

use anyhow::Result;
use fraud_scoring::config::AppConfig;
use fraud_scoring::encoder::{FeatureEncoder, CHANNELS, COUNTRIES, MERCHANT_CATEGORIES};
use fraud_scoring::model::inference::InferenceEngine;
use fraud_scoring::schema::FeatureSchema;
use fraud_scoring::types::TransactionRecord;
use rand::Rng;
use tracing::info;

/// Submission generator in the shape the form would post.
struct RecordGenerator {
    rng: rand::rngs::ThreadRng,
}

impl RecordGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Generate an established account buying close to its usual amount.
    fn generate_legitimate(&mut self) -> TransactionRecord {
        let country = self.random_country();
        let avg_amount = self.rng.gen_range(40.0..400.0);

        TransactionRecord {
            account_age_days: self.rng.gen_range(180..2000),
            total_transactions_user: self.rng.gen_range(20..400),
            avg_amount_user: avg_amount,
            amount: avg_amount * self.rng.gen_range(0.6..1.4),
            country: country.to_string(),
            bin_country: country.to_string(),
            channel: self.random_choice(&CHANNELS).to_string(),
            merchant_category: self.random_choice(&MERCHANT_CATEGORIES).to_string(),
            promo_used: self.flag(0.2),
            avs_match: "Yes".to_string(),
            cvv_result: "Yes".to_string(),
            three_ds_flag: self.flag(0.8),
            shipping_distance_km: self.rng.gen_range(1.0..60.0),
        }
    }

    /// Generate a suspicious submission: fresh account, mismatched BIN
    /// country, amount far above the user's average, failed checks.
    fn generate_suspicious(&mut self) -> TransactionRecord {
        TransactionRecord {
            account_age_days: self.rng.gen_range(0..30),
            total_transactions_user: self.rng.gen_range(0..5),
            avg_amount_user: self.rng.gen_range(20.0..80.0),
            amount: self.rng.gen_range(900.0..5000.0),
            country: "Germany".to_string(),
            bin_country: "United States".to_string(),
            channel: "Web".to_string(),
            merchant_category: "Electronics".to_string(),
            promo_used: "Yes".to_string(),
            avs_match: "No".to_string(),
            cvv_result: "No".to_string(),
            three_ds_flag: "No".to_string(),
            shipping_distance_km: self.rng.gen_range(500.0..4000.0),
        }
    }

    fn flag(&mut self, yes_probability: f64) -> String {
        if self.rng.gen_bool(yes_probability) {
            "Yes".to_string()
        } else {
            "No".to_string()
        }
    }

    fn random_country(&mut self) -> &'static str {
        COUNTRIES[self.rng.gen_range(0..COUNTRIES.len())].0
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fraud_scoring=warn")),
        )
        .init();

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let count: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(10);
    let fraud_rate: f64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(0.3);

    let config = AppConfig::load()?;
    let schema = FeatureSchema::load(&config.artifacts.columns_path)?;
    let engine = InferenceEngine::new(&config, &schema)?;
    let encoder = FeatureEncoder::new();

    info!(
        model = %engine.model_name(),
        columns = schema.len(),
        count = count,
        "Scoring generated submissions"
    );

    let mut generator = RecordGenerator::new();
    let mut rng = rand::thread_rng();
    let mut fraud_count = 0;

    for i in 0..count {
        let record = if rng.gen_bool(fraud_rate) {
            generator.generate_suspicious()
        } else {
            generator.generate_legitimate()
        };

        let row = encoder.encode(&record, &schema)?;
        let prediction = engine.predict(&row)?;
        if prediction.verdict.is_fraud() {
            fraud_count += 1;
        }

        println!(
            "{:>3}. {:<11} {:>8.2} via {:<3} from {:<14} -> {}",
            i + 1,
            record.merchant_category,
            record.amount,
            record.channel,
            record.country,
            prediction.summary()
        );
    }

    println!(
        "\nScored {} submissions, {} flagged as fraudulent",
        count, fraud_count
    );

    Ok(())
}
