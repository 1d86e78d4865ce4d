//! Test data served by the mock Discogs API

use super::constants::*;
use std::collections::HashMap;
use vinyl_sync::discogs::{
    BasicInformation, CollectionFolder, CollectionItem, DiscogsUser, MarketplaceListing,
    MarketplaceStats, MasterRelease, Price, PriceSuggestions, Release, ReleaseArtist,
    ReleaseFormat, ReleaseImage, ReleaseLabel,
};

/// Everything the mock server knows about.
pub struct MockCatalog {
    pub user: DiscogsUser,
    pub folders: Vec<CollectionFolder>,
    pub releases: HashMap<u64, Release>,
    pub stats: HashMap<u64, MarketplaceStats>,
    pub masters: HashMap<u64, MasterRelease>,
    pub suggestions: HashMap<u64, PriceSuggestions>,
    /// Open marketplace listings by release id.
    pub listings: HashMap<u64, Vec<MarketplaceListing>>,
    /// Release ids in the "All" folder, most recently added first.
    pub collection: Vec<u64>,
}

impl MockCatalog {
    pub fn collection_item(&self, release_id: u64, folder_id: u64) -> Option<CollectionItem> {
        let release = self.releases.get(&release_id)?;
        Some(CollectionItem {
            id: release.id,
            instance_id: release.id * 10,
            folder_id,
            date_added: Some(format!("2024-0{}-01T10:00:00-08:00", release.id % 9 + 1)),
            basic_information: BasicInformation {
                id: release.id,
                title: release.title.clone(),
                year: release.year,
                artists: release.artists.clone(),
                cover_image: release
                    .images
                    .first()
                    .map(|i| i.uri.clone())
                    .unwrap_or_default(),
            },
        })
    }

    pub fn folder_contents(&self, folder_id: u64) -> Vec<u64> {
        match folder_id {
            ALL_FOLDER_ID => self.collection.clone(),
            SINGLES_FOLDER_ID => vec![RELEASE_CAN_ID],
            _ => Vec::new(),
        }
    }
}

fn release(
    id: u64,
    artist: &str,
    title: &str,
    year: u32,
    label: &str,
    catno: &str,
    genre: &str,
) -> Release {
    Release {
        id,
        title: title.to_string(),
        master_id: Some(id + 50_000),
        year,
        country: Some("Germany".to_string()),
        artists: vec![ReleaseArtist {
            id: id + 100,
            name: artist.to_string(),
            role: None,
        }],
        labels: vec![ReleaseLabel {
            name: label.to_string(),
            catno: catno.to_string(),
        }],
        formats: vec![ReleaseFormat {
            name: "Vinyl".to_string(),
            qty: Some("1".to_string()),
            descriptions: Some(vec!["LP".to_string(), "Album".to_string()]),
            text: None,
        }],
        genres: vec![genre.to_string()],
        styles: vec!["Krautrock".to_string()],
        images: vec![ReleaseImage {
            image_type: "primary".to_string(),
            uri: format!("https://img.discogs.test/{}.jpg", id),
        }],
        thumb: None,
        notes: None,
    }
}

fn usd(value: f64) -> Price {
    Price {
        value,
        currency: "USD".to_string(),
    }
}

fn listed(value: f64, num_for_sale: u64) -> MarketplaceStats {
    MarketplaceStats {
        lowest_price: Some(usd(value)),
        num_for_sale: Some(num_for_sale),
        blocked_from_sale: false,
    }
}

fn listing(id: u64, value: f64, condition: &str) -> MarketplaceListing {
    MarketplaceListing {
        id,
        status: "For Sale".to_string(),
        price: usd(value),
        condition: condition.to_string(),
        sleeve_condition: "Very Good Plus (VG+)".to_string(),
        ships_from: "Germany".to_string(),
    }
}

/// Five releases in the "All" folder, four of them with marketplace data.
pub fn create_mock_catalog() -> MockCatalog {
    let mut haim = release(
        RELEASE_HAIM_ID,
        "Haim (2)",
        "Days Are Gone",
        2013,
        "Polydor",
        "3752803",
        "Rock",
    );
    haim.country = Some("UK".to_string());
    haim.styles = vec!["Indie Rock".to_string()];

    let releases = vec![
        release(RELEASE_NEU_ID, "Neu!", "Neu! 75", 1975, "Brain", "brain 1062", "Electronic"),
        haim,
        release(RELEASE_CAN_ID, "Can", "Tago Mago", 1971, "United Artists", "UAS 29 211", "Rock"),
        release(RELEASE_HARMONIA_ID, "Harmonia", "Deluxe", 1975, "Brain", "brain 1073", "Electronic"),
        release(RELEASE_CLUSTER_ID, "Cluster", "Zuckerzeit", 1974, "Brain", "brain 1065", "Electronic"),
    ];
    let collection = releases.iter().map(|r| r.id).collect::<Vec<_>>();

    let mut stats = HashMap::new();
    stats.insert(RELEASE_NEU_ID, listed(NEU_LOWEST_PRICE, 12));
    stats.insert(RELEASE_HAIM_ID, listed(HAIM_LOWEST_PRICE, 40));
    stats.insert(RELEASE_HARMONIA_ID, listed(HARMONIA_LOWEST_PRICE, 3));
    stats.insert(
        RELEASE_CLUSTER_ID,
        MarketplaceStats {
            lowest_price: None,
            num_for_sale: Some(0),
            blocked_from_sale: false,
        },
    );

    let neu = &releases[0];
    let mut masters = HashMap::new();
    masters.insert(
        MASTER_NEU_ID,
        MasterRelease {
            id: MASTER_NEU_ID,
            title: neu.title.clone(),
            main_release: RELEASE_NEU_ID,
            most_recent_release: RELEASE_NEU_ID,
            year: neu.year,
            artists: neu.artists.clone(),
            genres: neu.genres.clone(),
            styles: neu.styles.clone(),
            num_for_sale: 12,
            lowest_price: Some(NEU_LOWEST_PRICE),
        },
    );

    let mut suggestions = HashMap::new();
    suggestions.insert(
        RELEASE_NEU_ID,
        PriceSuggestions::from([
            ("Near Mint (NM or M-)".to_string(), usd(NEU_SUGGESTED_NM_PRICE)),
            ("Very Good Plus (VG+)".to_string(), usd(38.0)),
        ]),
    );

    let mut listings = HashMap::new();
    listings.insert(
        RELEASE_NEU_ID,
        vec![
            listing(700_001, NEU_LOWEST_PRICE, "Very Good Plus (VG+)"),
            listing(700_002, 58.0, "Near Mint (NM or M-)"),
        ],
    );

    MockCatalog {
        user: DiscogsUser {
            id: 42,
            username: TEST_USER.to_string(),
            name: "Test Collector".to_string(),
            num_collection: collection.len() as u64,
            num_wantlist: 3,
        },
        folders: vec![
            CollectionFolder {
                id: ALL_FOLDER_ID,
                name: "All".to_string(),
                count: collection.len() as u64,
            },
            CollectionFolder {
                id: SINGLES_FOLDER_ID,
                name: "Favourites".to_string(),
                count: 1,
            },
        ],
        releases: releases.into_iter().map(|r| (r.id, r)).collect(),
        stats,
        masters,
        suggestions,
        listings,
        collection,
    }
}
