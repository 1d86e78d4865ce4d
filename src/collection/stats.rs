//! Summary figures over a collection snapshot.

use super::mapping::clean_artist_name;
use super::models::CollectionRecord;
use std::collections::HashSet;

/// A record singled out by the summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub id: String,
    pub label: String,
    pub amount: f64,
}

impl Highlight {
    fn of(record: &CollectionRecord, amount: f64) -> Self {
        Self {
            id: record.id.clone(),
            label: record.display_label(),
            amount,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionSummary {
    pub total_records: usize,
    pub with_price: usize,
    pub with_cover_art: usize,
    pub distinct_genres: usize,
    pub distinct_labels: usize,
    pub distinct_artists: usize,

    pub total_estimated_value: f64,
    pub average_estimated_value: Option<f64>,
    pub highest_valued: Option<Highlight>,

    /// Sums over records that have both a purchase price and an estimated value.
    pub total_invested: f64,
    pub invested_current_value: f64,
    pub total_gain_loss: f64,
    pub total_gain_loss_percentage: Option<f64>,

    pub biggest_gainer: Option<Highlight>,
    pub biggest_loser: Option<Highlight>,
}

impl CollectionSummary {
    pub fn compute(records: &[CollectionRecord]) -> Self {
        let mut summary = CollectionSummary {
            total_records: records.len(),
            ..Default::default()
        };

        let mut genres = HashSet::new();
        let mut labels = HashSet::new();
        let mut artists = HashSet::new();

        for record in records {
            if !record.cover_image_url.is_empty() {
                summary.with_cover_art += 1;
            }
            genres.extend(record.genres.iter().map(String::as_str));
            if !record.label.is_empty() {
                labels.insert(record.label.as_str());
            }
            artists.insert(clean_artist_name(&record.artist));

            let Some(value) = record.estimated_value else {
                continue;
            };
            summary.with_price += 1;
            summary.total_estimated_value += value;
            if summary
                .highest_valued
                .as_ref()
                .map_or(true, |h| value > h.amount)
            {
                summary.highest_valued = Some(Highlight::of(record, value));
            }

            let Some(paid) = record.purchase_price else {
                continue;
            };
            summary.total_invested += paid;
            summary.invested_current_value += value;

            let gain = value - paid;
            if gain > 0.0 && summary.biggest_gainer.as_ref().map_or(true, |h| gain > h.amount) {
                summary.biggest_gainer = Some(Highlight::of(record, gain));
            }
            if gain < 0.0 && summary.biggest_loser.as_ref().map_or(true, |h| gain < h.amount) {
                summary.biggest_loser = Some(Highlight::of(record, gain));
            }
        }

        summary.distinct_genres = genres.len();
        summary.distinct_labels = labels.len();
        summary.distinct_artists = artists.len();

        if summary.with_price > 0 {
            summary.average_estimated_value =
                Some(summary.total_estimated_value / summary.with_price as f64);
        }
        summary.total_gain_loss = summary.invested_current_value - summary.total_invested;
        if summary.total_invested > 0.0 {
            summary.total_gain_loss_percentage =
                Some(summary.total_gain_loss / summary.total_invested * 100.0);
        }

        summary
    }
}
