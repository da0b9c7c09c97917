use std::sync::Mutex;

use assert_matches::assert_matches;

use sky_catalog_fetch::domain::BoundingBox;
use sky_catalog_fetch::error::CatalogError;
use sky_catalog_fetch::query::{QueryClient, Table, sql_catalog, sql_for};

#[derive(Default)]
struct MockQuery {
    sql: Mutex<Vec<String>>,
    response: String,
}

impl QueryClient for MockQuery {
    fn query_csv(&self, sql: &str) -> Result<String, CatalogError> {
        self.sql.lock().unwrap().push(sql.to_string());
        Ok(self.response.clone())
    }
}

#[test]
fn sql_template_uses_box_bounds() {
    let bbox = BoundingBox {
        ra_min: 149.5,
        ra_max: 150.5,
        dec_min: 1.5,
        dec_max: 2.5,
    };
    assert_eq!(
        sql_for("ra, dec, type", &bbox),
        "SELECT ra, dec, type FROM ls_dr9.tractor WHERE ra>149.5 AND ra<150.5 AND dec>1.5 AND dec<2.5"
    );
    assert!(sql_for("  ", &bbox).starts_with("SELECT ra, dec FROM"));
}

#[test]
fn catalog_loaded_in_memory() {
    let client = MockQuery {
        response: "ra,dec\n150.001,2.002\n149.99,1.995\n".to_string(),
        ..Default::default()
    };

    let table = sql_catalog(&client, 150.0, 2.0, None, "ra, dec").unwrap();

    assert_eq!(table.columns, vec!["ra", "dec"]);
    assert_eq!(table.len(), 2);
    assert_eq!(table.column("dec").unwrap(), vec!["2.002", "1.995"]);
    let sent = client.sql.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("ra>149.985"));
}

#[test]
fn header_only_result_is_empty_table() {
    let table = Table::parse_csv("ra,dec\n").unwrap();
    assert!(table.is_empty());
    assert!(table.column("flux_g").is_none());
}

#[test]
fn empty_response_is_error() {
    assert_matches!(Table::parse_csv(""), Err(CatalogError::QueryParse(_)));
}
