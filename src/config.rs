use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Run configuration. The original scripts hard-coded their file paths at the
/// bottom of each module; here every input and output is an explicit parameter.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub inputs: InputConfig,
    pub outputs: OutputConfig,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
}

#[derive(Debug, Deserialize)]
pub struct InputConfig {
    /// HTML snapshot of the land/maritime borders table.
    pub borders_html: PathBuf,
    /// Tab-delimited geonames-style country info file.
    pub countryinfo: PathBuf,
    /// CSV mapping ISO codes to average latitude/longitude.
    pub coordinates_csv: PathBuf,
    /// OAG flight-route spreadsheet.
    pub flights_xlsx: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    pub adjacency_json: PathBuf,
    pub adjacency_csv: PathBuf,
    pub adjacency_module: PathBuf,
    pub travel_module: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct GeocoderConfig {
    pub timeout_seconds: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self { timeout_seconds: 10 }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let text = r#"
            [inputs]
            borders_html = "data/adjacency/wiki.html"
            countryinfo = "data/countryinfo/countryinfo.txt"
            coordinates_csv = "data/countryinfo/iso_3166_coordinates.csv"
            flights_xlsx = "data/oag/OAGinExcel.xlsx"

            [outputs]
            adjacency_json = "output/adjacent_countries.json"
            adjacency_csv = "output/adjacent_countries.csv"
            adjacency_module = "output/adjacent-data.js"
            travel_module = "output/flight-data.js"

            [geocoder]
            timeout_seconds = 5
        "#;
        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.inputs.borders_html.to_str().unwrap(), "data/adjacency/wiki.html");
        assert_eq!(config.outputs.travel_module.to_str().unwrap(), "output/flight-data.js");
        assert_eq!(config.geocoder.timeout_seconds, 5);
    }

    #[test]
    fn geocoder_section_is_optional() {
        let text = r#"
            [inputs]
            borders_html = "a.html"
            countryinfo = "b.txt"
            coordinates_csv = "c.csv"
            flights_xlsx = "d.xlsx"

            [outputs]
            adjacency_json = "out.json"
            adjacency_csv = "out.csv"
            adjacency_module = "out.js"
            travel_module = "travel.js"
        "#;
        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.geocoder.timeout_seconds, 10);
    }
}
