//! Scene catalog access
//!
//! A `Catalog` answers spatio-temporal searches with STAC items. The
//! production implementation talks to a STAC API over HTTP; tests plug in
//! their own.

mod item;
mod query;
mod signing;
mod stac_client;

pub use item::{Asset, CatalogItem, ItemProperties};
pub use query::{DateRange, SearchBody, SearchQuery};
pub use signing::{append_token, needs_signature, AssetSigner, NoopSigner, PlanetaryComputerSigner, PLANETARY_COMPUTER_TOKEN_URL};
pub use stac_client::{Link, PageRequest, SearchPage, StacClient};

use crate::errors::ScoutResult;

/// Source of candidate scenes
pub trait Catalog {
    /// All items matching the query, in catalog order
    fn search(&self, query: &SearchQuery) -> ScoutResult<Vec<CatalogItem>>;
}
