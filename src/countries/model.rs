use serde::{Deserialize, Serialize};

/// Reference data for one country, read-only once loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RestCountryRecord", into = "RestCountryRecord")]
pub struct CountryMetadata {
    pub name: String,
    pub native_name: String,
    pub alpha2_code: String,
    pub population: Option<u64>,
    /// Area in km²
    pub area: Option<f64>,
    pub flag: String,
    pub region: String,
    pub subregion: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Wire shape of the reference feed (`latlng` is a two element array that
/// can be empty for some territories). Used in both directions so printed
/// records read back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestCountryRecord {
    name: String,
    #[serde(default)]
    native_name: String,
    #[serde(default)]
    alpha2_code: String,
    #[serde(default)]
    population: Option<u64>,
    #[serde(default)]
    area: Option<f64>,
    #[serde(default)]
    flag: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    subregion: String,
    #[serde(default)]
    latlng: Vec<f64>,
}

impl From<RestCountryRecord> for CountryMetadata {
    fn from(raw: RestCountryRecord) -> Self {
        Self {
            name: raw.name,
            native_name: raw.native_name,
            alpha2_code: raw.alpha2_code,
            population: raw.population,
            area: raw.area,
            flag: raw.flag,
            region: raw.region,
            subregion: raw.subregion,
            latitude: raw.latlng.first().copied(),
            longitude: raw.latlng.get(1).copied(),
        }
    }
}

impl From<CountryMetadata> for RestCountryRecord {
    fn from(country: CountryMetadata) -> Self {
        let latlng = match (country.latitude, country.longitude) {
            (Some(lat), Some(lng)) => vec![lat, lng],
            (Some(lat), None) => vec![lat],
            _ => Vec::new(),
        };
        Self {
            name: country.name,
            native_name: country.native_name,
            alpha2_code: country.alpha2_code,
            population: country.population,
            area: country.area,
            flag: country.flag,
            region: country.region,
            subregion: country.subregion,
            latlng,
        }
    }
}

impl CountryMetadata {
    /// Minimal record, handy for building reference sets by hand
    pub fn new(name: impl Into<String>, population: Option<u64>, area: Option<f64>) -> Self {
        Self {
            name: name.into(),
            native_name: String::new(),
            alpha2_code: String::new(),
            population,
            area,
            flag: String::new(),
            region: String::new(),
            subregion: String::new(),
            latitude: None,
            longitude: None,
        }
    }

    pub fn with_native_name(mut self, native_name: impl Into<String>) -> Self {
        self.native_name = native_name.into();
        self
    }

    pub fn with_code(mut self, alpha2_code: impl Into<String>) -> Self {
        self.alpha2_code = alpha2_code.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_reference_record() {
        let value = json!({
            "name": "Portugal",
            "nativeName": "Portugal",
            "alpha2Code": "PT",
            "population": 10374822,
            "area": 92090.0,
            "flag": "https://restcountries.eu/data/prt.svg",
            "region": "Europe",
            "subregion": "Southern Europe",
            "latlng": [39.5, -8.0],
            "capital": "Lisbon"
        });

        let country: CountryMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(country.alpha2_code, "PT");
        assert_eq!(country.population, Some(10374822));
        assert_eq!(country.area, Some(92090.0));
        assert_eq!(country.latitude, Some(39.5));
        assert_eq!(country.longitude, Some(-8.0));
        assert_eq!(country.subregion, "Southern Europe");
    }

    #[test]
    fn test_deserialize_missing_area_and_latlng() {
        let value = json!({
            "name": "Kosovo",
            "nativeName": "Republika e Kosovës",
            "population": 1733842,
            "area": null,
            "latlng": []
        });

        let country: CountryMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(country.area, None);
        assert_eq!(country.latitude, None);
        assert_eq!(country.longitude, None);
        assert_eq!(country.alpha2_code, "");
    }

    #[test]
    fn test_serialized_form_reads_back() {
        let mut country = CountryMetadata::new("Portugal", Some(10_000_000), Some(92_000.0))
            .with_native_name("Portugal")
            .with_code("PT");
        country.latitude = Some(39.5);
        country.longitude = Some(-8.0);

        let value = serde_json::to_value(&country).unwrap();
        assert_eq!(value["alpha2Code"], "PT");
        assert_eq!(value["latlng"], json!([39.5, -8.0]));

        let back: CountryMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(back, country);
    }
}
