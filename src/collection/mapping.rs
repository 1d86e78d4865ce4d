//! Conversion from Discogs payloads to collection records.

use super::models::{Artist, CollectionRecord, Condition, DEFAULT_CURRENCY};
use crate::discogs::{CollectionItem, MarketplaceStats, Release};
use lazy_static::lazy_static;
use regex::Regex;

const FALLBACK_ARTIST: &str = "Unknown Artist";
const FALLBACK_FORMAT: &str = "LP";

lazy_static! {
    static ref DISAMBIGUATION_SUFFIX: Regex = Regex::new(r"\s+\(\d+\)$").unwrap();
}

/// Strip the numeric suffix Discogs uses to tell apart artists sharing a
/// name: `"Haim (2)"` becomes `"Haim"`.
pub fn clean_artist_name(name: &str) -> String {
    DISAMBIGUATION_SUFFIX.replace(name, "").trim().to_string()
}

/// The identifying fields of a record that Discogs owns.
#[derive(Clone, Debug, PartialEq)]
pub struct ReleaseMetadata {
    pub discogs_master_id: Option<u64>,
    pub artist: String,
    pub artists: Vec<Artist>,
    pub title: String,
    pub label: String,
    pub catalog_number: String,
    pub release_year: u32,
    pub country: String,
    pub format: Vec<String>,
    pub genres: Vec<String>,
    pub styles: Vec<String>,
    pub cover_image_url: String,
}

impl ReleaseMetadata {
    pub fn from_release(release: &Release) -> Self {
        let artist = release
            .artists
            .first()
            .map(|a| a.name.clone())
            .unwrap_or_else(|| FALLBACK_ARTIST.to_string());

        let artists = release
            .artists
            .iter()
            .map(|a| Artist {
                id: a.id,
                name: a.name.clone(),
                role: a.role.clone().filter(|r| !r.is_empty()),
            })
            .collect();

        let first_label = release.labels.first();

        let format = match release.formats.first() {
            Some(f) => match &f.descriptions {
                Some(descriptions) if !descriptions.is_empty() => descriptions.clone(),
                _ => vec![f.name.clone()],
            },
            None => vec![FALLBACK_FORMAT.to_string()],
        };

        let cover_image_url = release
            .images
            .iter()
            .find(|img| img.image_type == "primary")
            .or_else(|| release.images.first())
            .map(|img| img.uri.clone())
            .or_else(|| release.thumb.clone())
            .unwrap_or_default();

        Self {
            discogs_master_id: release.master_id.filter(|id| *id != 0),
            artist,
            artists,
            title: release.title.clone(),
            label: first_label.map(|l| l.name.clone()).unwrap_or_default(),
            catalog_number: first_label.map(|l| l.catno.clone()).unwrap_or_default(),
            release_year: release.year,
            country: release.country.clone().unwrap_or_default(),
            format,
            genres: release.genres.clone(),
            styles: release.styles.clone(),
            cover_image_url,
        }
    }

    pub fn from_record(record: &CollectionRecord) -> Self {
        Self {
            discogs_master_id: record.discogs_master_id,
            artist: record.artist.clone(),
            artists: record.artists.clone(),
            title: record.title.clone(),
            label: record.label.clone(),
            catalog_number: record.catalog_number.clone(),
            release_year: record.release_year,
            country: record.country.clone(),
            format: record.format.clone(),
            genres: record.genres.clone(),
            styles: record.styles.clone(),
            cover_image_url: record.cover_image_url.clone(),
        }
    }

    /// Overwrite the record's identifying fields. Returns whether anything
    /// changed.
    pub fn apply_to(self, record: &mut CollectionRecord) -> bool {
        if ReleaseMetadata::from_record(record) == self {
            return false;
        }
        record.discogs_master_id = self.discogs_master_id;
        record.artist = self.artist;
        record.artists = self.artists;
        record.title = self.title;
        record.label = self.label;
        record.catalog_number = self.catalog_number;
        record.release_year = self.release_year;
        record.country = self.country;
        record.format = self.format;
        record.genres = self.genres;
        record.styles = self.styles;
        record.cover_image_url = self.cover_image_url;
        true
    }
}

/// Current market value of a release.
///
/// The marketplace lowest asking price is the single source of truth for
/// `estimated_value`; `suggested_price` and `current_lowest_price` mirror it.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceUpdate {
    pub value: f64,
    pub num_for_sale: Option<u64>,
}

impl PriceUpdate {
    /// `None` when nothing is listed, so there is no price to take.
    pub fn from_stats(stats: &MarketplaceStats) -> Option<Self> {
        let lowest = stats.lowest_price.as_ref()?;
        Some(Self {
            value: lowest.value,
            num_for_sale: stats.num_for_sale,
        })
    }

    /// Write the price fields and recompute gain/loss. `last_price_update`
    /// moves to `now` only when a price field actually changed.
    pub fn apply_to(&self, record: &mut CollectionRecord, now: &str) -> bool {
        let unchanged = record.estimated_value == Some(self.value)
            && record.suggested_price == Some(self.value)
            && record.current_lowest_price == Some(self.value)
            && record.num_for_sale == self.num_for_sale;

        if !unchanged {
            record.estimated_value = Some(self.value);
            record.suggested_price = Some(self.value);
            record.current_lowest_price = Some(self.value);
            record.num_for_sale = self.num_for_sale;
            record.last_price_update = Some(now.to_string());
        }

        let before = (record.gain_loss, record.gain_loss_percentage);
        record.recompute_gain_loss();
        let derived_changed = before != (record.gain_loss, record.gain_loss_percentage);

        !unchanged || derived_changed
    }
}

/// Build a brand new record for a release seen for the first time.
pub fn new_record(
    id: String,
    release: &Release,
    item: Option<&CollectionItem>,
    price: Option<&PriceUpdate>,
    now: &str,
) -> CollectionRecord {
    let mut record = CollectionRecord::local(id, "", "");
    record.discogs_release_id = Some(release.id);
    ReleaseMetadata::from_release(release).apply_to(&mut record);

    record.sleeve_condition = Condition::NearMint;
    record.media_condition = Condition::NearMint;
    record.purchase_date = item
        .and_then(|i| i.date_added.clone())
        .unwrap_or_else(|| now.to_string());
    record.purchase_currency = DEFAULT_CURRENCY.to_string();
    record.notes = release.notes.clone().unwrap_or_default();

    if let Some(price) = price {
        price.apply_to(&mut record, now);
    }

    record.created_at = now.to_string();
    record.updated_at = now.to_string();
    record.last_synced_with_discogs = Some(now.to_string());
    record
}
