/// Source name constants used in logs, metrics and error messages

pub const ECDC_SOURCE: &str = "ecdc";
pub const OPEN_COVID_SOURCE: &str = "open_covid";
pub const OPEN_COVID_CATEGORIES_SOURCE: &str = "open_covid_categories";
pub const REST_COUNTRIES_SOURCE: &str = "rest_countries";

// Default endpoints
pub const DEFAULT_FEED_URL: &str = "https://covid.ourworldindata.org/data/ecdc/full_data.csv";
/// Base of the Open COVID-19 data files (`data.json`, `data_categories.csv`, ...)
pub const DEFAULT_OPEN_COVID_URL: &str = "https://open-covid-19.github.io/data";
pub const DEFAULT_COUNTRIES_URL: &str = "https://restcountries.eu/rest/v2";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("covid_pipeline/", env!("CARGO_PKG_VERSION"));

/// Aggregate row name in the ECDC feed that is not a country
pub const WORLD_AGGREGATE: &str = "World";
