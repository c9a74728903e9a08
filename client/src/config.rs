use serde::{Deserialize, Serialize};

/// Where account data comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Snapshots read from, and instructions submitted to, a ledger.
    #[default]
    Ledger,
    /// Seeded in-process sample portfolio; no ledger needed.
    Mock,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub data_source: DataSource,
    /// Keep fetched snapshots for `cached_*` reads.
    pub cache_snapshots: bool,
    /// Fixed clock for the mock source. Unset means the sample's own reference time.
    pub mock_clock: Option<i64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            data_source: DataSource::Ledger,
            cache_snapshots: true,
            mock_clock: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::de::value::{Error, MapDeserializer};
    use serde::de::IntoDeserializer;

    use super::*;

    fn from_pairs(pairs: Vec<(&str, &str)>) -> Result<ClientConfig, Error> {
        ClientConfig::deserialize(MapDeserializer::<_, Error>::new(pairs.into_iter()))
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config = from_pairs(vec![("data_source", "mock")]).unwrap();
        assert_eq!(config.data_source, DataSource::Mock);
        assert!(config.cache_snapshots);
        assert_eq!(config.mock_clock, None);

        assert_eq!(from_pairs(vec![]).unwrap(), ClientConfig::default());
    }

    #[test]
    fn sources_use_snake_case_names() {
        let source =
            DataSource::deserialize(IntoDeserializer::<Error>::into_deserializer("ledger"));
        assert_eq!(source.unwrap(), DataSource::Ledger);
        assert!(from_pairs(vec![("data_source", "rpc")]).is_err());
    }
}
