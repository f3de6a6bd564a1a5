//! Client for the search endpoint of the French national address API
//! (`https://api-adresse.data.gouv.fr/search/`).
//!
//! Options are validated before anything is sent, encoded into a request URL in a fixed
//! order, and the response is decoded into a GeoJSON feature collection.
//!
//! ```no_run
//! use adresse::{Client, SearchOptions, SearchType};
//!
//! let client = Client::new();
//! let options = SearchOptions::new().limit(2).search_type(SearchType::Street);
//! let results = client.search("8 bd du port", Some(&options))?;
//! for result in &results.features {
//!     println!("{result}");
//! }
//! # Ok::<(), adresse::SearchError>(())
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod options;
pub mod query;
pub mod search;

pub use client::{Client, HttpClient, HttpResponse, UreqClient};
pub use error::{ErrorKind, Result, SearchError};
pub use options::{SearchOptions, SearchType, ALLOWED_KEYS};
pub use query::{search_url, SearchQuery, SEARCH_URL};
pub use search::{Geometry, SearchResult, SearchResultProperties, SearchResults};
