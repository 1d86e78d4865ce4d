//! Locally persisted collection records.

use super::mapping::clean_artist_name;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Goldmine-style grading used for both media and sleeve.
///
/// Reads both our labels and the Discogs spelling of near mint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Default)]
pub enum Condition {
    #[serde(rename = "Mint (M)")]
    Mint,
    #[default]
    #[serde(rename = "Near Mint (NM)")]
    NearMint,
    #[serde(rename = "Very Good Plus (VG+)")]
    VeryGoodPlus,
    #[serde(rename = "Very Good (VG)")]
    VeryGood,
    #[serde(rename = "Good Plus (G+)")]
    GoodPlus,
    #[serde(rename = "Good (G)")]
    Good,
    #[serde(rename = "Fair (F)")]
    Fair,
    #[serde(rename = "Poor (P)")]
    Poor,
}

impl Condition {
    pub const ALL: [Condition; 8] = [
        Condition::Mint,
        Condition::NearMint,
        Condition::VeryGoodPlus,
        Condition::VeryGood,
        Condition::GoodPlus,
        Condition::Good,
        Condition::Fair,
        Condition::Poor,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Condition::Mint => "Mint (M)",
            Condition::NearMint => "Near Mint (NM)",
            Condition::VeryGoodPlus => "Very Good Plus (VG+)",
            Condition::VeryGood => "Very Good (VG)",
            Condition::GoodPlus => "Good Plus (G+)",
            Condition::Good => "Good (G)",
            Condition::Fair => "Fair (F)",
            Condition::Poor => "Poor (P)",
        }
    }

    /// Parse a Discogs condition label. Discogs spells near mint as
    /// "Near Mint (NM or M-)".
    pub fn from_discogs(label: &str) -> Option<Self> {
        if label == "Near Mint (NM or M-)" {
            return Some(Condition::NearMint);
        }
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Condition::from_discogs(&label)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown condition {:?}", label)))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Credited artist on a release.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// A record in the local collection snapshot.
///
/// Fields fall in three groups:
/// - identifying metadata and price data, refreshed from Discogs on sync;
/// - user-owned fields (conditions, purchase info, storage, tags, notes),
///   never written by sync once the record exists;
/// - `gain_loss` / `gain_loss_percentage`, derived from the other two groups.
///
/// Keys this struct does not know about are kept in `extra` and written back
/// unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discogs_release_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discogs_master_id: Option<u64>,

    // Identifying metadata
    pub artist: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artists: Vec<Artist>,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub catalog_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub release_year: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub format: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub styles: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cover_image_url: String,

    // User-owned
    #[serde(default, deserialize_with = "null_as_default")]
    pub sleeve_condition: Condition,
    #[serde(default, deserialize_with = "null_as_default")]
    pub media_condition: Condition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub press_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_variant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub purchase_date: String,
    #[serde(default = "default_currency")]
    pub purchase_currency: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub storage_location: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,

    // Market data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_lowest_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_median_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_highest_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_for_sale: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_price_update: Option<String>,

    // Performance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain_loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain_loss_percentage: Option<f64>,

    // Bookkeeping
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_with_discogs: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

pub const DEFAULT_CURRENCY: &str = "USD";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// Hand-edited snapshots sometimes carry `null` where a value is expected.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Gain/loss of `estimated_value` over `purchase_price`.
///
/// Both values must be present. The percentage is `None` for a zero
/// purchase price.
pub fn compute_gain_loss(
    purchase_price: Option<f64>,
    estimated_value: Option<f64>,
) -> (Option<f64>, Option<f64>) {
    match (purchase_price, estimated_value) {
        (Some(paid), Some(value)) => {
            let gain_loss = value - paid;
            let percentage = (paid != 0.0).then(|| gain_loss / paid * 100.0);
            (Some(gain_loss), percentage)
        }
        _ => (None, None),
    }
}

impl CollectionRecord {
    /// A record with no Discogs link, as a user would create by hand.
    pub fn local(id: impl Into<String>, artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            discogs_release_id: None,
            discogs_master_id: None,
            artist: artist.into(),
            artists: Vec::new(),
            title: title.into(),
            label: String::new(),
            catalog_number: String::new(),
            release_year: 0,
            country: String::new(),
            format: Vec::new(),
            genres: Vec::new(),
            styles: Vec::new(),
            cover_image_url: String::new(),
            sleeve_condition: Condition::default(),
            media_condition: Condition::default(),
            press_number: None,
            color_variant: None,
            weight: None,
            purchase_price: None,
            purchase_date: String::new(),
            purchase_currency: default_currency(),
            storage_location: String::new(),
            tags: Vec::new(),
            notes: String::new(),
            current_lowest_price: None,
            current_median_price: None,
            current_highest_price: None,
            num_for_sale: None,
            suggested_price: None,
            last_price_update: None,
            estimated_value: None,
            gain_loss: None,
            gain_loss_percentage: None,
            created_at: String::new(),
            updated_at: String::new(),
            last_synced_with_discogs: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Recompute `gain_loss` and `gain_loss_percentage` from the current
    /// purchase price and estimated value.
    pub fn recompute_gain_loss(&mut self) {
        let (gain_loss, percentage) = compute_gain_loss(self.purchase_price, self.estimated_value);
        self.gain_loss = gain_loss;
        self.gain_loss_percentage = percentage;
    }

    /// "Artist - Title" without the Discogs disambiguation suffix, used in
    /// logs and progress output.
    pub fn display_label(&self) -> String {
        format!("{} - {}", clean_artist_name(&self.artist), self.title)
    }
}
