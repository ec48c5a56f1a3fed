use nalgebra::DMatrix;
use std::collections::BTreeSet;
use tracing::warn;

/// A border-table entry after name resolution: canonical codes only, with
/// duplicate neighbors collapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAdjacencyEntry {
    pub country: String,
    pub neighbors: BTreeSet<String>,
}

/// Builds the 0/1 adjacency grid over a fixed code ordering. Cell (i, j) is 1
/// iff `ordering[j]` is a resolved neighbor of `ordering[i]`. No synthetic
/// symmetrization: extraction gaps in the source leave the matrix asymmetric.
/// Codes without a resolved entry get an all-zero row.
pub fn adjacency_matrix(entries: &[ResolvedAdjacencyEntry], ordering: &[&str]) -> Vec<Vec<u8>> {
    let n = ordering.len();
    let mut rows = Vec::with_capacity(n);

    for code in ordering {
        match entries.iter().find(|e| e.country == *code) {
            Some(entry) => {
                let row = ordering
                    .iter()
                    .map(|other| u8::from(entry.neighbors.contains(*other)))
                    .collect();
                rows.push(row);
            }
            None => {
                warn!("{} missing from resolved adjacency data, writing zero row", code);
                rows.push(vec![0; n]);
            }
        }
    }

    rows
}

/// Accumulated route volumes over a fixed country index: a directed
/// origin→destination matrix until `symmetrize` is applied.
#[derive(Debug, Clone)]
pub struct TravelMatrix {
    m: DMatrix<f64>,
}

impl TravelMatrix {
    pub fn zeros(n: usize) -> Self {
        Self {
            m: DMatrix::zeros(n, n),
        }
    }

    pub fn n(&self) -> usize {
        self.m.nrows()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.m[(i, j)]
    }

    pub fn add(&mut self, origin: usize, destination: usize, volume: f64) {
        self.m[(origin, destination)] += volume;
    }

    /// Forces symmetry by averaging each (i, j)/(j, i) pair in place.
    /// Idempotent: a second application leaves the matrix unchanged.
    pub fn symmetrize(&mut self) {
        let n = self.n();
        for i in 0..n {
            for j in (i + 1)..n {
                let v = 0.5 * (self.m[(i, j)] + self.m[(j, i)]);
                self.m[(i, j)] = v;
                self.m[(j, i)] = v;
            }
        }
    }

    /// Per-country centrality from the dominant eigenpair of the symmetrized
    /// matrix: `eigenvector[i] * eigenvalue`, truncated to an integer. The
    /// eigenvector's sign is fixed so its component sum is non-negative,
    /// which keeps scores deterministic across backends.
    pub fn centrality(&self) -> Vec<i64> {
        let n = self.n();
        if n == 0 {
            return Vec::new();
        }

        let eigen = self.m.clone().symmetric_eigen();
        let dominant = (0..n)
            .max_by(|&a, &b| {
                eigen.eigenvalues[a]
                    .abs()
                    .total_cmp(&eigen.eigenvalues[b].abs())
            })
            .unwrap_or(0);

        let value = eigen.eigenvalues[dominant];
        let vector = eigen.eigenvectors.column(dominant);
        let sign = if vector.sum() < 0.0 { -1.0 } else { 1.0 };

        vector.iter().map(|&x| (x * sign * value) as i64).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(country: &str, neighbors: &[&str]) -> ResolvedAdjacencyEntry {
        ResolvedAdjacencyEntry {
            country: country.to_string(),
            neighbors: neighbors.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn adjacency_cells_follow_the_ordering() {
        let entries = vec![entry("AUT", &["DEU", "CHE"]), entry("DEU", &["AUT"])];
        let ordering = ["AUT", "CHE", "DEU"];
        let matrix = adjacency_matrix(&entries, &ordering);

        assert_eq!(matrix[0], vec![0, 1, 1]);
        assert_eq!(matrix[2], vec![1, 0, 0]);
    }

    #[test]
    fn missing_country_gets_zero_row() {
        let entries = vec![entry("AUT", &["DEU"])];
        let ordering = ["AUT", "CHE", "DEU"];
        let matrix = adjacency_matrix(&entries, &ordering);
        assert_eq!(matrix[1], vec![0, 0, 0]);
    }

    #[test]
    fn adjacency_is_not_synthetically_symmetrized() {
        // DEU lists AUT but AUT's row was lost during extraction
        let entries = vec![entry("DEU", &["AUT"]), entry("AUT", &[])];
        let ordering = ["AUT", "DEU"];
        let matrix = adjacency_matrix(&entries, &ordering);
        assert_eq!(matrix[0][1], 0);
        assert_eq!(matrix[1][0], 1);
    }

    #[test]
    fn symmetrize_averages_pairs() {
        let mut matrix = TravelMatrix::zeros(2);
        matrix.add(0, 1, 10.0);
        matrix.add(1, 0, 4.0);
        matrix.symmetrize();
        assert_eq!(matrix.get(0, 1), 7.0);
        assert_eq!(matrix.get(1, 0), 7.0);
    }

    #[test]
    fn symmetrized_matrix_is_exactly_symmetric() {
        let mut matrix = TravelMatrix::zeros(3);
        matrix.add(0, 1, 3.0);
        matrix.add(1, 2, 5.0);
        matrix.add(2, 0, 8.0);
        matrix.symmetrize();
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
            }
        }
    }

    #[test]
    fn symmetrize_is_idempotent() {
        let mut matrix = TravelMatrix::zeros(3);
        matrix.add(0, 1, 3.0);
        matrix.add(1, 2, 5.0);
        matrix.add(2, 0, 8.0);
        matrix.symmetrize();
        let once = matrix.clone();
        matrix.symmetrize();
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(matrix.get(i, j), once.get(i, j));
            }
        }
    }

    #[test]
    fn accumulates_repeated_routes() {
        let mut matrix = TravelMatrix::zeros(2);
        matrix.add(0, 1, 2.5);
        matrix.add(0, 1, 2.5);
        assert_eq!(matrix.get(0, 1), 5.0);
    }

    #[test]
    fn centrality_uses_the_dominant_eigenpair() {
        // [[2, 1], [1, 2]] has eigenvalues 3 and 1; the dominant eigenvector
        // is (1/sqrt(2), 1/sqrt(2)), so both scores truncate to 2
        let mut matrix = TravelMatrix::zeros(2);
        matrix.add(0, 0, 2.0);
        matrix.add(1, 1, 2.0);
        matrix.add(0, 1, 1.0);
        matrix.add(1, 0, 1.0);
        assert_eq!(matrix.centrality(), vec![2, 2]);
    }

    #[test]
    fn centrality_of_empty_matrix_is_empty() {
        assert!(TravelMatrix::zeros(0).centrality().is_empty());
    }
}
