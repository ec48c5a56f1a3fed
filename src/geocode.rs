use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::time::Duration;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

/// Looks up country coordinates from the Nominatim geocoding service. The
/// request carries an explicit timeout; failures are non-fatal to any
/// pipeline run, this is a standalone utility.
pub struct Geocoder {
    client: reqwest::blocking::Client,
}

impl Geocoder {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("country_pipeline/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Returns (latitude, longitude) for a country name.
    pub fn country_coordinates(&self, country_name: &str) -> Result<(f64, f64)> {
        let places: Vec<Place> = self
            .client
            .get(NOMINATIM_URL)
            .query(&[("q", country_name), ("format", "json"), ("limit", "1")])
            .send()?
            .error_for_status()?
            .json()?;

        let place = places
            .first()
            .ok_or_else(|| PipelineError::Geocode(country_name.to_string()))?;

        let latitude = place
            .lat
            .parse::<f64>()
            .map_err(|_| PipelineError::Geocode(country_name.to_string()))?;
        let longitude = place
            .lon
            .parse::<f64>()
            .map_err(|_| PipelineError::Geocode(country_name.to_string()))?;

        Ok((latitude, longitude))
    }
}
