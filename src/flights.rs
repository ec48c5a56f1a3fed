use crate::error::{PipelineError, Result};
use crate::matrix::TravelMatrix;
use calamine::{open_workbook, Data, Reader, Xlsx};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// One route record from the OAG spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightRoute {
    pub origin: String,
    pub destination: String,
    pub volume: f64,
}

/// The OAG data uses non-standard codes for Russian regions.
fn normalize_code(code: &str) -> &str {
    if code == "R1" || code == "R2" {
        "RU"
    } else {
        code
    }
}

fn cell_str(cell: &Data) -> Option<&str> {
    match cell {
        Data::String(s) if !s.trim().is_empty() => Some(s.trim()),
        _ => None,
    }
}

fn cell_f64(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reads the flight-route spreadsheet: row 1 is the header; per data row,
/// column 2 holds the origin code, column 4 the destination code and column 6
/// the route volume. Malformed rows are skipped with a warning.
pub fn load_flight_matrix(path: &Path) -> Result<(TravelMatrix, Vec<String>)> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook.worksheet_range_at(0).ok_or_else(|| {
        PipelineError::MalformedInput("flight spreadsheet has no worksheets".to_string())
    })??;

    let mut routes = Vec::new();
    for (row_index, row) in range.rows().enumerate() {
        if row_index == 0 {
            continue;
        }
        let origin = row.get(1).and_then(cell_str);
        let destination = row.get(3).and_then(cell_str);
        let volume = row.get(5).and_then(cell_f64);
        match (origin, destination, volume) {
            (Some(origin), Some(destination), Some(volume)) => routes.push(FlightRoute {
                origin: origin.to_string(),
                destination: destination.to_string(),
                volume,
            }),
            _ => warn!("Malformed flight row {}, skipping", row_index + 1),
        }
    }

    info!("Read {} flight routes", routes.len());
    Ok(build_travel_matrix(&routes))
}

/// Accumulates directed route volumes into a matrix indexed by the unique,
/// sorted alpha-2 codes appearing in the routes. Returns the matrix together
/// with the alpha-2 code for each index.
pub fn build_travel_matrix(routes: &[FlightRoute]) -> (TravelMatrix, Vec<String>) {
    let mut alpha2_from_index: Vec<String> = routes
        .iter()
        .flat_map(|r| {
            [
                normalize_code(&r.origin).to_string(),
                normalize_code(&r.destination).to_string(),
            ]
        })
        .collect();
    alpha2_from_index.sort();
    alpha2_from_index.dedup();

    let index_of: HashMap<&str, usize> = alpha2_from_index
        .iter()
        .enumerate()
        .map(|(i, code)| (code.as_str(), i))
        .collect();

    let mut matrix = TravelMatrix::zeros(alpha2_from_index.len());
    for route in routes {
        let origin = index_of[normalize_code(&route.origin)];
        let destination = index_of[normalize_code(&route.destination)];
        matrix.add(origin, destination, route.volume);
    }

    (matrix, alpha2_from_index)
}
