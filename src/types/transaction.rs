//! Transaction submission as collected by the form.

use serde::{Deserialize, Serialize};

/// One transaction submission, exactly as the form posts it.
///
/// Categorical fields carry the display values the form selects offer
/// (`"Germany"`, `"Web"`, `"Yes"`); the encoder normalizes them to the
/// training-time convention and rejects anything outside the catalogs.
/// A record lives for one scoring round trip and is then discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Age of the customer account in days.
    pub account_age_days: u32,
    /// Lifetime transaction count for the user.
    pub total_transactions_user: u32,
    /// The user's average transaction amount.
    pub avg_amount_user: f64,
    /// Amount of the transaction being scored.
    pub amount: f64,
    /// Customer country, as a catalog display name or its code.
    pub country: String,
    /// Country of the card's bank identification number.
    pub bin_country: String,
    /// Sales channel, `App` or `Web`.
    pub channel: String,
    /// Merchant category from the fixed catalog.
    pub merchant_category: String,
    /// Whether a promotion code was used (`Yes`/`No`).
    pub promo_used: String,
    /// Address verification match (`Yes`/`No`).
    pub avs_match: String,
    /// CVV check result (`Yes`/`No`).
    pub cvv_result: String,
    /// Whether 3-D Secure authentication completed (`Yes`/`No`).
    pub three_ds_flag: String,
    /// Shipping distance in kilometres.
    pub shipping_distance_km: f64,
}

impl TransactionRecord {
    /// A typical legitimate submission with all security checks passing.
    pub fn sample() -> Self {
        Self {
            account_age_days: 365,
            total_transactions_user: 50,
            avg_amount_user: 200.0,
            amount: 100.0,
            country: "Germany".to_string(),
            bin_country: "Germany".to_string(),
            channel: "Web".to_string(),
            merchant_category: "Electronics".to_string(),
            promo_used: "No".to_string(),
            avs_match: "Yes".to_string(),
            cvv_result: "Yes".to_string(),
            three_ds_flag: "Yes".to_string(),
            shipping_distance_km: 10.0,
        }
    }
}
