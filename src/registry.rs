use crate::error::{PipelineError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Which ISO-3166 identifier variant a lookup should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKey {
    Numeric,
    Alpha2,
    Alpha3,
}

/// One entry of the authoritative country table.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalCountry {
    pub name: String,
    /// Zero-padded 3-digit ISO numeric code, e.g. "036".
    pub numeric_code: String,
    pub alpha2: String,
    pub alpha3: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub population: Option<u64>,
}

impl CanonicalCountry {
    pub fn code(&self, key: CodeKey) -> &str {
        match key {
            CodeKey::Numeric => &self.numeric_code,
            CodeKey::Alpha2 => &self.alpha2,
            CodeKey::Alpha3 => &self.alpha3,
        }
    }
}

/// Authoritative country list, loaded once at startup and immutable for the run.
pub struct CountryRegistry {
    countries: Vec<CanonicalCountry>,
    by_alpha2: HashMap<String, usize>,
}

impl CountryRegistry {
    /// Loads the tab-delimited geonames-style country info file. The header
    /// line is prefixed `#ISO` (the leading `#` belongs to the first column
    /// name), other `#` lines are comments, blank lines are ignored.
    pub fn load(countryinfo_path: &Path) -> Result<Self> {
        let text = fs::read_to_string(countryinfo_path)?;
        let countries = parse_countryinfo(&text)?;
        info!("Loaded {} canonical countries", countries.len());
        Ok(Self::from_countries(countries))
    }

    /// Loads the country info file and joins average coordinates from the
    /// ISO-3166 lat/long CSV by alpha-3 code. Countries absent from the CSV
    /// keep `None` coordinates.
    pub fn load_with_coordinates(countryinfo_path: &Path, coordinates_csv: &Path) -> Result<Self> {
        let mut registry = Self::load(countryinfo_path)?;
        let file = fs::File::open(coordinates_csv)?;
        registry.join_coordinates(file)?;
        Ok(registry)
    }

    fn from_countries(countries: Vec<CanonicalCountry>) -> Self {
        let by_alpha2 = countries
            .iter()
            .enumerate()
            .map(|(i, c)| (c.alpha2.clone(), i))
            .collect();
        Self { countries, by_alpha2 }
    }

    fn join_coordinates<R: Read>(&mut self, reader: R) -> Result<()> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let column = |name: &str| -> Result<usize> {
            headers.iter().position(|h| h == name).ok_or_else(|| {
                PipelineError::MalformedInput(format!(
                    "coordinates CSV is missing the '{}' column",
                    name
                ))
            })
        };
        let alpha3_col = column("Alpha-3 code")?;
        let lat_col = column("Latitude (average)")?;
        let lon_col = column("Longitude (average)")?;

        let mut coords: HashMap<String, (f64, f64)> = HashMap::new();
        for record in rdr.records() {
            let record = record?;
            let alpha3 = match record.get(alpha3_col) {
                Some(code) if !code.is_empty() => code.to_string(),
                _ => continue,
            };
            let lat = record.get(lat_col).and_then(|v| v.parse::<f64>().ok());
            let lon = record.get(lon_col).and_then(|v| v.parse::<f64>().ok());
            if let (Some(lat), Some(lon)) = (lat, lon) {
                coords.insert(alpha3, (lat, lon));
            }
        }

        for country in &mut self.countries {
            match coords.get(&country.alpha3) {
                Some(&(lat, lon)) => {
                    country.latitude = Some(lat);
                    country.longitude = Some(lon);
                }
                None => warn!("No coordinates found for {}", country.name),
            }
        }
        Ok(())
    }

    /// Exact-string match on display name, no normalization. When the table
    /// holds duplicate names the first entry in file order wins.
    pub fn lookup_by_name(&self, name: &str) -> Option<&CanonicalCountry> {
        self.countries.iter().find(|c| c.name == name)
    }

    pub fn get_by_alpha2(&self, alpha2: &str) -> Option<&CanonicalCountry> {
        self.by_alpha2.get(alpha2).map(|&i| &self.countries[i])
    }

    pub fn countries(&self) -> &[CanonicalCountry] {
        &self.countries
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

fn parse_countryinfo(text: &str) -> Result<Vec<CanonicalCountry>> {
    let mut headings: Option<Vec<String>> = None;
    let mut countries = Vec::new();

    for line in text.lines() {
        if line.starts_with("#ISO") {
            let mut tokens: Vec<String> = line.split('\t').map(str::to_string).collect();
            // The `#` prefix belongs to the first column name only
            tokens[0] = tokens[0][1..].to_string();
            headings = Some(tokens);
        } else if line.starts_with('#') || line.trim().is_empty() {
            continue;
        } else {
            let headings = headings.as_ref().ok_or_else(|| {
                PipelineError::MalformedInput(
                    "country info data line appeared before the #ISO header".to_string(),
                )
            })?;
            let fields: HashMap<&str, &str> = headings
                .iter()
                .map(String::as_str)
                .zip(line.split('\t'))
                .collect();

            let (Some(&alpha2), Some(&alpha3), Some(&numeric), Some(&name)) = (
                fields.get("ISO"),
                fields.get("ISO3"),
                fields.get("ISO-Numeric"),
                fields.get("Country"),
            ) else {
                warn!("Country info line missing identifying columns, skipping: {}", line);
                continue;
            };

            let numeric_code = match numeric.trim().parse::<u32>() {
                Ok(n) => format!("{:03}", n),
                Err(_) => {
                    warn!("Unparseable ISO numeric code '{}' for {}, skipping", numeric, name);
                    continue;
                }
            };

            let population = match fields.get("Population") {
                Some(raw) if !raw.trim().is_empty() => match raw.trim().parse::<u64>() {
                    Ok(p) => Some(p),
                    Err(_) => {
                        warn!("Unparseable population '{}' for {}", raw, name);
                        None
                    }
                },
                _ => None,
            };

            countries.push(CanonicalCountry {
                name: name.to_string(),
                numeric_code,
                alpha2: alpha2.to_string(),
                alpha3: alpha3.to_string(),
                latitude: None,
                longitude: None,
                population,
            });
        }
    }

    Ok(countries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNTRYINFO: &str = "\
# Comment line describing the file\n\
#ISO\tISO3\tISO-Numeric\tCountry\tCapital\tPopulation\n\
\n\
AU\tAUS\t036\tAustralia\tCanberra\t21515754\n\
CZ\tCZE\t203\tCzechia\tPrague\t10476000\n\
FR\tFRA\t250\tFrance\tParis\t64768389\n";

    fn registry() -> CountryRegistry {
        CountryRegistry::from_countries(parse_countryinfo(COUNTRYINFO).unwrap())
    }

    #[test]
    fn parses_header_and_data_lines() {
        let registry = registry();
        assert_eq!(registry.len(), 3);

        let australia = registry.lookup_by_name("Australia").unwrap();
        assert_eq!(australia.numeric_code, "036");
        assert_eq!(australia.alpha2, "AU");
        assert_eq!(australia.alpha3, "AUS");
        assert_eq!(australia.population, Some(21515754));
    }

    #[test]
    fn zero_pads_numeric_codes() {
        let text = "#ISO\tISO3\tISO-Numeric\tCountry\nAU\tAUS\t36\tAustralia\n";
        let countries = parse_countryinfo(text).unwrap();
        assert_eq!(countries[0].numeric_code, "036");
    }

    #[test]
    fn unknown_name_is_not_found() {
        assert!(registry().lookup_by_name("Atlantis").is_none());
    }

    #[test]
    fn data_line_before_header_is_an_error() {
        let text = "AU\tAUS\t036\tAustralia\n";
        assert!(parse_countryinfo(text).is_err());
    }

    #[test]
    fn joins_coordinates_by_alpha3() {
        let mut registry = registry();
        let csv = "\
Country,Alpha-2 code,Alpha-3 code,Numeric code,Latitude (average),Longitude (average)\n\
Australia,AU,AUS,36,-27,133\n\
France,FR,FRA,250,46,2\n";
        registry.join_coordinates(csv.as_bytes()).unwrap();

        let australia = registry.lookup_by_name("Australia").unwrap();
        assert_eq!(australia.latitude, Some(-27.0));
        assert_eq!(australia.longitude, Some(133.0));

        // Czechia is absent from the CSV and keeps None coordinates
        let czechia = registry.lookup_by_name("Czechia").unwrap();
        assert!(czechia.latitude.is_none());
    }

    #[test]
    fn lookup_by_alpha2() {
        let registry = registry();
        assert_eq!(registry.get_by_alpha2("FR").unwrap().alpha3, "FRA");
        assert!(registry.get_by_alpha2("XX").is_none());
    }
}
