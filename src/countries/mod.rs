//! Country reference data and location resolution

pub mod aliases;
pub mod model;
pub mod resolver;

pub use aliases::{canonical_name, COUNTRY_ALIASES};
pub use model::CountryMetadata;
pub use resolver::{resolve_country, CountryResolver};
