//! Place search payload, as returned by TomTom and served from `/travel/search`.

use serde::{Deserialize, Serialize};

/// Search response; only the fields the clients use are kept.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResults {
    pub results: Vec<Place>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Place {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub score: f64,
    pub address: Address,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub freeform_address: String,
    pub country: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}
