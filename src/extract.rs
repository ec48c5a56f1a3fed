use crate::error::{PipelineError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

static RE_CITATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d+\]").unwrap());
static RE_PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.+\)").unwrap());

/// One border-table row before name resolution: the raw country name and its
/// neighbor names in source order, duplicates preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAdjacencyEntry {
    pub country: String,
    pub neighbors: Vec<String>,
}

/// Normalizes scraped text: non-breaking spaces become regular spaces and
/// whitespace runs collapse to a single space, so names reassembled from
/// several inline nodes compare equal to the canonical spelling.
pub fn clean(s: &str) -> String {
    s.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reads an element's text together with any following sibling text until a
/// `<br>` separator. Names in the border table often span several inline
/// nodes (a link followed by plain text), and this reconstructs them.
fn text_until_break(element: ElementRef) -> String {
    let mut text: String = element.text().collect();

    for sibling in element.next_siblings() {
        if let Some(sibling_el) = ElementRef::wrap(sibling) {
            if sibling_el.value().name() == "br" {
                break;
            }
            let sibling_text: String = sibling_el.text().collect();
            if !sibling_text.is_empty() {
                text.push(' ');
                text.push_str(&sibling_text);
            }
        } else if let Some(text_node) = sibling.value().as_text() {
            let sibling_text: &str = text_node;
            if !sibling_text.is_empty() {
                text.push(' ');
                text.push_str(sibling_text);
            }
        }
    }

    clean(&text)
}

/// Extracts (country, neighbors) pairs from the first `<table>` of the
/// borders document. Each row's first cell carries the country name in a
/// bold marker; the fifth cell lists neighbors as `<span>` markers annotated
/// with `(L)` for land borders and `(M)` for maritime-only borders.
/// Maritime-only neighbors are dropped; rows without the expected structure
/// fail individually, not the whole run.
pub fn extract_neighbors(html: &str) -> Result<Vec<RawAdjacencyEntry>> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table").unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("td").unwrap();
    let bold_selector = Selector::parse("b").unwrap();
    let span_selector = Selector::parse("span").unwrap();

    let table = document.select(&table_selector).next().ok_or_else(|| {
        PipelineError::MalformedInput("no <table> found in borders document".to_string())
    })?;

    let mut entries = Vec::new();

    for row in table.select(&row_selector) {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        if cells.is_empty() {
            // Header rows hold <th> cells only
            continue;
        }

        let Some(bold) = cells[0].select(&bold_selector).next() else {
            warn!("Border row without a bold country marker, skipping");
            continue;
        };
        if cells.len() < 5 {
            warn!("Border row with fewer than five cells, skipping");
            continue;
        }

        let country = text_until_break(bold);
        let country = RE_PARENTHETICAL.replace_all(&country, "");
        let country = RE_CITATION.replace_all(&country, "");
        let country = clean(&country);

        let mut neighbors = Vec::new();
        for span in cells[4].select(&span_selector) {
            let marker_text: String = span.text().collect();
            // An unstripped citation marker means a partial parse of the cell
            if RE_CITATION.is_match(&marker_text) {
                continue;
            }

            let name = text_until_break(span);
            let name = RE_CITATION.replace_all(&name, "");

            // (M) marks a maritime-only border
            if name.contains("(M)") {
                continue;
            }

            // (L) marks a land border; absence means both land and maritime
            let name = clean(&name.replace("(L)", ""));
            if !name.is_empty() {
                neighbors.push(name);
            }
        }

        entries.push(RawAdjacencyEntry { country, neighbors });
    }

    info!("Extracted {} border entries", entries.len());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BORDERS_HTML: &str = r#"
    <html><body>
    <table>
      <tr><th>Country</th><th>Length</th><th>Count</th><th>Unique</th><th>Neighbours</th></tr>
      <tr>
        <td><b>Germany</b>[3]</td>
        <td>3,714</td>
        <td>9</td>
        <td>9</td>
        <td>
          <span><a>Austria</a></span> (L)<br>
          <span><a>France</a></span>[12] (L)<br>
          <span><a>United</a></span> Kingdom (M)<br>
          <span><a>Poland</a></span><br>
        </td>
      </tr>
      <tr>
        <td><b>Australia</b> (mainland)</td>
        <td>0</td>
        <td>0</td>
        <td>0</td>
        <td>
          <span><a>East</a></span> Timor (M)<br>
        </td>
      </tr>
      <tr>
        <td>no bold marker here</td>
        <td></td><td></td><td></td><td></td>
      </tr>
    </table>
    </body></html>
    "#;

    #[test]
    fn extracts_rows_in_source_order() {
        let entries = extract_neighbors(BORDERS_HTML).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].country, "Germany");
        assert_eq!(entries[1].country, "Australia");
    }

    #[test]
    fn strips_land_marker_and_drops_maritime_neighbors() {
        let entries = extract_neighbors(BORDERS_HTML).unwrap();
        let germany = &entries[0];
        // "United Kingdom (M)" is maritime-only and dropped; "(L)" is stripped
        assert_eq!(germany.neighbors, vec!["Austria", "France", "Poland"]);
    }

    #[test]
    fn strips_citation_markers_from_reconstructed_names() {
        let entries = extract_neighbors(BORDERS_HTML).unwrap();
        // "France[12] (L)" must clean to "France"
        assert!(entries[0].neighbors.contains(&"France".to_string()));
    }

    #[test]
    fn strips_parentheticals_from_country_names() {
        let entries = extract_neighbors(BORDERS_HTML).unwrap();
        assert_eq!(entries[1].country, "Australia");
        // Its only neighbor was maritime
        assert!(entries[1].neighbors.is_empty());
    }

    #[test]
    fn row_without_bold_marker_fails_alone() {
        // The third row has no <b> element and is skipped; the run succeeds
        let entries = extract_neighbors(BORDERS_HTML).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn skips_spans_with_unstripped_citations() {
        let html = r#"
        <table><tr>
          <td><b>Norway</b></td><td></td><td></td><td></td>
          <td><span>[44]</span><br><span><a>Sweden</a></span> (L)<br></td>
        </tr></table>
        "#;
        let entries = extract_neighbors(html).unwrap();
        assert_eq!(entries[0].neighbors, vec!["Sweden"]);
    }

    #[test]
    fn reconstructs_names_spanning_inline_nodes() {
        let html = r#"
        <table><tr>
          <td><b>France</b></td><td></td><td></td><td></td>
          <td><span><a>United</a></span> Kingdom<br></td>
        </tr></table>
        "#;
        let entries = extract_neighbors(html).unwrap();
        assert_eq!(entries[0].neighbors, vec!["United Kingdom"]);
    }

    #[test]
    fn normalizes_non_breaking_spaces() {
        assert_eq!(clean("New\u{a0}Zealand "), "New Zealand");
    }

    #[test]
    fn missing_table_is_fatal() {
        assert!(extract_neighbors("<html><body><p>no table</p></body></html>").is_err());
    }
}
