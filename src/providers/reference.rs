use derive_more::Deref;
use itertools::Itertools;
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use crate::config::ReferenceSettings;
use crate::errors::{Result, TrackerError};

/// Returned whenever no unambiguous description can be found.
pub const NO_FEATURES: &str = "No features";

const LINEAGE_COLUMN: &str = "Pango lineage";
const FEATURES_COLUMN: &str = "Genetic features";

static LINEAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w.]+").expect("valid lineage pattern"));
static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("valid table selector"));
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("valid row selector"));
static CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, td").expect("valid cell selector"));

/// Describes the genetic features of a variant.
///
/// Lookups never fail; they fall back to [`NO_FEATURES`].
pub trait FeatureLookup {
    fn lookup(&self, variant: &str) -> String;
}

/// One classification table reduced to lineage and features columns.
#[derive(Debug, Clone, Default, PartialEq, Deref)]
pub struct FeatureTable(Vec<(String, String)>);

impl FeatureTable {
    /// Features of `variant` if exactly one row carries that lineage.
    pub fn find(&self, variant: &str) -> Option<&str> {
        self.iter()
            .filter(|(lineage, _)| lineage == variant)
            .exactly_one()
            .ok()
            .map(|(_, features)| features.as_str())
    }

    /// Reads a table whose header is its first row containing the lineage column.
    fn from_element(table: ElementRef) -> Result<Self> {
        let mut rows = table.select(&ROW).map(|row| {
            row.select(&CELL)
                .map(|cell| normalize_text(&cell.text().collect::<String>()))
                .collect::<Vec<String>>()
        });

        let header = rows
            .find(|cells| cells.iter().any(|cell| cell == LINEAGE_COLUMN))
            .ok_or_else(|| TrackerError::reference_lookup("Table has no lineage header"))?;
        let column = |name: &str| {
            header
                .iter()
                .position(|cell| cell == name)
                .ok_or_else(|| TrackerError::reference_lookup(format!("Table has no {name:?} column")))
        };
        let lineage_idx = column(LINEAGE_COLUMN)?;
        let features_idx = column(FEATURES_COLUMN)?;

        let rows = rows
            .filter_map(|cells| {
                let lineage = LINEAGE.find(cells.get(lineage_idx)?)?.as_str().to_string();
                let features = cells.get(features_idx)?.clone();
                Some((lineage, features))
            })
            .collect();
        Ok(Self(rows))
    }
}

/// Collapses whitespace runs, non-breaking spaces included, into single spaces.
fn normalize_text(text: &str) -> String {
    text.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Parses the variants of interest and variants under monitoring tables, in
/// that order, from the reference page.
pub fn parse_tables(html: &str) -> Result<(FeatureTable, FeatureTable)> {
    let document = Html::parse_document(html);
    let mut tables = document.select(&TABLE);
    let voi = tables
        .next()
        .ok_or_else(|| TrackerError::reference_lookup("Page has no VOI table"))
        .and_then(FeatureTable::from_element)?;
    let vum = match tables.next() {
        Some(table) => FeatureTable::from_element(table)?,
        None => {
            log::warn!("Page has no VUM table");
            FeatureTable::default()
        }
    };
    Ok((voi, vum))
}

/// Searches VOI first, then VUM.
pub fn features_from_html(html: &str, variant: &str) -> Result<Option<String>> {
    let (voi, vum) = parse_tables(html)?;
    log::debug!("Parsed {} VOI and {} VUM rows", voi.len(), vum.len());
    Ok(voi
        .find(variant)
        .or_else(|| vum.find(variant))
        .map(str::to_string))
}

/// Supplies the HTML of the reference page.
pub trait ReferencePage {
    fn fetch(&self) -> Result<String>;
}

/// The WHO variant tracking page over HTTP.
#[derive(Debug)]
pub struct WhoPage {
    client: Client,
    url: String,
}

impl WhoPage {
    pub fn new(settings: &ReferenceSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&settings.user_agent).map_err(|err| {
                TrackerError::reference_lookup_caused("Invalid user agent", err)
            })?,
        );
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout())
            .build()
            .map_err(|err| {
                TrackerError::reference_lookup_caused("Unable to build reference client", err)
            })?;
        Ok(Self {
            client,
            url: settings.url.clone(),
        })
    }
}

impl ReferencePage for WhoPage {
    fn fetch(&self) -> Result<String> {
        self.client
            .get(&self.url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(|err| {
                TrackerError::reference_lookup_caused(format!("Request to {} failed", self.url), err)
            })
    }
}

/// Looks variants up in the VOI and VUM tables of a reference page.
#[derive(Debug)]
pub struct WhoFeatureLookup<P = WhoPage> {
    page: P,
}

impl WhoFeatureLookup {
    pub fn new(settings: &ReferenceSettings) -> Result<Self> {
        Ok(Self::from_page(WhoPage::new(settings)?))
    }
}

impl<P: ReferencePage> WhoFeatureLookup<P> {
    pub fn from_page(page: P) -> Self {
        Self { page }
    }
}

impl<P: ReferencePage> FeatureLookup for WhoFeatureLookup<P> {
    fn lookup(&self, variant: &str) -> String {
        match self
            .page
            .fetch()
            .and_then(|html| features_from_html(&html, variant))
        {
            Ok(Some(features)) => features,
            Ok(None) => {
                log::info!("No unambiguous reference entry for {variant}");
                NO_FEATURES.to_string()
            }
            Err(err) => {
                log::warn!("Feature lookup for {variant} failed: {err}");
                NO_FEATURES.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><body>
<h2>Currently circulating variants of interest (VOIs)</h2>
<table>
  <tr><td>Pango lineage</td><td>Nextstrain clade</td><td>Genetic features</td><td>Earliest documented samples</td></tr>
  <tr><td>JN.1 #</td><td>24A</td><td>BA.2.86&nbsp;+ S:L455S</td><td>25-08-2023</td></tr>
</table>
<h2>Currently circulating variants under monitoring (VUMs)</h2>
<table>
  <thead><tr><th>Pango lineage</th><th>Genetic features</th></tr></thead>
  <tbody>
  <tr><td>KP.2</td><td>JN.1 + S:R346T,
        S:F456L, S:V1104L</td></tr>
  <tr><td>KP.3 *</td><td>JN.1 + S:F456L, S:Q493E</td></tr>
  <tr><td>JN.1.18</td><td>JN.1 + S:R346T</td></tr>
  <tr><td>XBB.1.5</td><td>first</td></tr>
  <tr><td>XBB.1.5</td><td>second</td></tr>
  </tbody>
</table>
</body></html>"#;

    struct Fixture(&'static str);

    impl ReferencePage for Fixture {
        fn fetch(&self) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Offline;

    impl ReferencePage for Offline {
        fn fetch(&self) -> Result<String> {
            Err(TrackerError::reference_lookup("connection reset"))
        }
    }

    fn lookup(html: &'static str, variant: &str) -> String {
        WhoFeatureLookup::from_page(Fixture(html)).lookup(variant)
    }

    #[test]
    fn voi_match_with_normalized_spaces() {
        assert_eq!(
            features_from_html(PAGE, "JN.1").unwrap().as_deref(),
            Some("BA.2.86 + S:L455S")
        );
    }

    #[test]
    fn vum_is_searched_after_voi() {
        assert_eq!(
            features_from_html(PAGE, "KP.2").unwrap().as_deref(),
            Some("JN.1 + S:R346T, S:F456L, S:V1104L")
        );
        assert_eq!(
            features_from_html(PAGE, "KP.3").unwrap().as_deref(),
            Some("JN.1 + S:F456L, S:Q493E")
        );
    }

    #[test]
    fn lineage_match_is_exact() {
        assert_eq!(
            features_from_html(PAGE, "JN.1.18").unwrap().as_deref(),
            Some("JN.1 + S:R346T")
        );
        assert_eq!(features_from_html(PAGE, "jn.1").unwrap(), None);
        assert_eq!(features_from_html(PAGE, "JN").unwrap(), None);
    }

    #[test]
    fn lookup_returns_page_features() {
        assert_eq!(lookup(PAGE, "JN.1"), "BA.2.86 + S:L455S");
        assert_eq!(lookup(PAGE, "KP.3"), "JN.1 + S:F456L, S:Q493E");
    }

    #[test]
    fn ambiguous_or_absent_is_sentinel() {
        assert_eq!(lookup(PAGE, "XBB.1.5"), NO_FEATURES);
        assert_eq!(lookup(PAGE, "BA.2.86"), NO_FEATURES);
    }

    #[test]
    fn page_without_tables_is_sentinel() {
        assert!(features_from_html("<html><p>maintenance</p></html>", "JN.1").is_err());
        assert_eq!(lookup("<html><p>maintenance</p></html>", "JN.1"), NO_FEATURES);
    }

    #[test]
    fn fetch_failure_is_sentinel() {
        assert_eq!(WhoFeatureLookup::from_page(Offline).lookup("JN.1"), NO_FEATURES);
    }

    #[test]
    fn table_without_features_column_is_error() {
        let html = "<table><tr><td>Pango lineage</td><td>Clade</td></tr><tr><td>JN.1</td><td>24A</td></tr></table>";
        assert!(matches!(
            features_from_html(html, "JN.1"),
            Err(TrackerError::ReferenceLookup { .. })
        ));
    }

    #[test]
    fn table_sizes() {
        let (voi, vum) = parse_tables(PAGE).unwrap();
        assert_eq!(voi.len(), 1);
        assert_eq!(vum.len(), 5);
    }

    #[test]
    fn unreachable_site_is_sentinel() {
        let settings = ReferenceSettings {
            url: "http://127.0.0.1:9/variants".to_string(),
            timeout_secs: 1,
            ..ReferenceSettings::default()
        };
        let lookup = WhoFeatureLookup::new(&settings).unwrap();
        assert_eq!(lookup.lookup("JN.1"), NO_FEATURES);
    }
}
