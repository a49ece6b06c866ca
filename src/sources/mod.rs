//! Per-source fetch + decode adapters

pub mod ecdc;
pub mod open_covid;
pub mod rest_countries;

pub use ecdc::{decode_feed, EcdcSource, LocationFilter, TimeSeriesRecord};
pub use open_covid::{CategoriesRecord, OpenCovidForecastRecord, OpenCovidRecord, OpenCovidSource};
pub use rest_countries::RestCountriesClient;
