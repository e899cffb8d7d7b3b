//! Symbol validation against the exchange's instrument catalog.

use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, info};

use super::provider::{DataError, SymbolCatalog};
use crate::domain::SymbolSet;

/// One entry of the `/instrument` response. Every other field is ignored.
#[derive(Debug, Deserialize)]
struct Instrument {
    symbol: String,
}

/// Extract the symbols from one page of the instrument endpoint.
pub fn parse_instrument_page(body: &[u8]) -> Result<Vec<String>, DataError> {
    let instruments: Vec<Instrument> = serde_json::from_slice(body)
        .map_err(|e| DataError::Catalog(format!("failed to parse instrument list: {e}")))?;
    Ok(instruments.into_iter().map(|i| i.symbol).collect())
}

/// Fail unless every requested symbol exists in the catalog.
///
/// The error lists exactly the unknown symbols.
pub fn validate_symbols(catalog: &dyn SymbolCatalog, symbols: &SymbolSet) -> Result<(), DataError> {
    let valid: HashSet<String> = catalog.list_valid_symbols()?;
    debug!(catalog_size = valid.len(), "instrument catalog loaded");

    let missing = symbols.missing_from(&valid);
    if !missing.is_empty() {
        return Err(DataError::InvalidSymbols { symbols: missing });
    }

    info!(count = symbols.len(), "all requested symbols are listed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedCatalog(Vec<&'static str>);

    impl SymbolCatalog for FixedCatalog {
        fn list_valid_symbols(&self) -> Result<HashSet<String>, DataError> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    #[test]
    fn parses_instrument_objects() {
        let body = br#"[
            {"symbol": "XBTUSD", "rootSymbol": "XBT", "state": "Open"},
            {"symbol": ".BXBT", "typ": "MRCXXX"}
        ]"#;
        assert_eq!(parse_instrument_page(body).unwrap(), vec!["XBTUSD", ".BXBT"]);
    }

    #[test]
    fn rejects_unexpected_shape() {
        let err = parse_instrument_page(br#"{"error": {"message": "rate limited"}}"#).unwrap_err();
        assert!(matches!(err, DataError::Catalog(_)));
    }

    #[test]
    fn accepts_known_symbols() {
        let catalog = FixedCatalog(vec!["XBTUSD", "ETHUSD", "XRPUSD"]);
        let symbols = SymbolSet::new(["XBTUSD", "ETHUSD"]).unwrap();
        assert!(validate_symbols(&catalog, &symbols).is_ok());
    }

    #[test]
    fn reports_exactly_the_unknown_symbols() {
        let catalog = FixedCatalog(vec!["XBTUSD", "ETHUSD"]);
        let symbols = SymbolSet::new(["XBTUSD", "FAKE123", "NOPE"]).unwrap();
        match validate_symbols(&catalog, &symbols) {
            Err(DataError::InvalidSymbols { symbols }) => {
                assert_eq!(symbols, vec!["FAKE123".to_string(), "NOPE".to_string()]);
            }
            other => panic!("expected InvalidSymbols, got {other:?}"),
        }
    }
}
