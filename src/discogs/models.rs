//! Models for the Discogs API responses.
//!
//! These types match the JSON structure returned by `api.discogs.com`. Only
//! the fields the sync pipeline reads are modelled; everything else is
//! ignored during deserialization.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Users and folders
// =============================================================================

/// Public profile of a Discogs user.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DiscogsUser {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub num_collection: u64,
    #[serde(default)]
    pub num_wantlist: u64,
}

/// A collection folder. Folder 0 is the implicit "All" folder.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct CollectionFolder {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub count: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FoldersResponse {
    #[serde(default)]
    pub folders: Vec<CollectionFolder>,
}

/// Estimated value of a whole collection, as formatted strings ("$1,234.56").
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CollectionValue {
    #[serde(default)]
    pub minimum: String,
    #[serde(default)]
    pub median: String,
    #[serde(default)]
    pub maximum: String,
}

// =============================================================================
// Collection listing
// =============================================================================

/// Pagination envelope shared by every paginated endpoint.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Pagination {
    pub page: u32,
    pub pages: u32,
    pub per_page: u32,
    pub items: u64,
}

impl Pagination {
    pub fn has_more(&self) -> bool {
        self.page < self.pages
    }
}

/// One page of a collection folder listing.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CollectionPage {
    pub pagination: Pagination,
    #[serde(default)]
    pub releases: Vec<CollectionItem>,
}

/// Folder membership of a release, with the abbreviated release data.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CollectionItem {
    pub id: u64,
    #[serde(default)]
    pub instance_id: u64,
    #[serde(default)]
    pub folder_id: u64,
    #[serde(default)]
    pub date_added: Option<String>,
    pub basic_information: BasicInformation,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BasicInformation {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub year: u32,
    #[serde(default)]
    pub artists: Vec<ReleaseArtist>,
    #[serde(default)]
    pub cover_image: String,
}

impl CollectionItem {
    pub fn release_id(&self) -> u64 {
        self.basic_information.id
    }

    /// Name of the first credited artist, used for log lines and progress labels.
    pub fn primary_artist_name(&self) -> &str {
        self.basic_information
            .artists
            .first()
            .map(|a| a.name.as_str())
            .unwrap_or("Unknown")
    }
}

// =============================================================================
// Release and master detail
// =============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ReleaseArtist {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ReleaseLabel {
    pub name: String,
    #[serde(default)]
    pub catno: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ReleaseFormat {
    pub name: String,
    #[serde(default)]
    pub qty: Option<String>,
    #[serde(default)]
    pub descriptions: Option<Vec<String>>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ReleaseImage {
    #[serde(rename = "type")]
    pub image_type: String,
    pub uri: String,
}

/// Full release detail from `/releases/{id}`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Release {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub master_id: Option<u64>,
    #[serde(default)]
    pub year: u32,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub artists: Vec<ReleaseArtist>,
    #[serde(default)]
    pub labels: Vec<ReleaseLabel>,
    #[serde(default)]
    pub formats: Vec<ReleaseFormat>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub images: Vec<ReleaseImage>,
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Master release detail from `/masters/{id}`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MasterRelease {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub main_release: u64,
    #[serde(default)]
    pub most_recent_release: u64,
    #[serde(default)]
    pub year: u32,
    #[serde(default)]
    pub artists: Vec<ReleaseArtist>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub num_for_sale: u64,
    #[serde(default)]
    pub lowest_price: Option<f64>,
}

// =============================================================================
// Marketplace
// =============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Price {
    pub value: f64,
    pub currency: String,
}

/// Marketplace statistics from `/marketplace/stats/{id}`.
///
/// `lowest_price` is `null` when nothing is currently for sale.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct MarketplaceStats {
    #[serde(default)]
    pub lowest_price: Option<Price>,
    #[serde(default)]
    pub num_for_sale: Option<u64>,
    #[serde(default)]
    pub blocked_from_sale: bool,
}

/// Price suggestions keyed by condition label, e.g. `"Near Mint (NM or M-)"`.
pub type PriceSuggestions = BTreeMap<String, Price>;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MarketplaceListing {
    pub id: u64,
    #[serde(default)]
    pub status: String,
    pub price: Price,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub sleeve_condition: String,
    #[serde(default)]
    pub ships_from: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ListingsResponse {
    #[serde(default)]
    pub listings: Vec<MarketplaceListing>,
}
