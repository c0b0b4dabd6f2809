use crate::BridgeError;
use crate::bridge::origin::normalize_origin;

#[test]
fn given_wildcard_when_normalizing_then_passes_through() {
    assert_eq!(normalize_origin("*").expect("wildcard is valid"), "*");
}

/// **VALUE**: Verifies page URLs collapse to the origin the peer reports, so
/// configuring `https://host.example.com/deck/` still matches inbound traffic.
#[test]
fn given_page_url_when_normalizing_then_keeps_scheme_host_and_port() {
    // GIVEN/WHEN: URLs with paths, queries and ports
    let plain = normalize_origin("https://host.example.com/deck/?page=2").expect("valid URL");
    let default_port = normalize_origin("https://host.example.com:443").expect("valid URL");
    let custom_port = normalize_origin("http://localhost:8080/index.html").expect("valid URL");

    // THEN: Only the origin remains, default ports dropped
    assert_eq!(plain, "https://host.example.com");
    assert_eq!(default_port, "https://host.example.com");
    assert_eq!(custom_port, "http://localhost:8080");
}

#[test]
fn given_unparsable_origin_when_normalizing_then_returns_invalid_origin() {
    let result = normalize_origin("not a url");

    assert!(matches!(result, Err(BridgeError::InvalidOrigin { .. })));
}

#[test]
fn given_opaque_origin_when_normalizing_then_returns_invalid_origin() {
    let result = normalize_origin("data:text/plain,hello");

    assert!(matches!(result, Err(BridgeError::InvalidOrigin { .. })));
}
