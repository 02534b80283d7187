use manelito_engine::{decode_html, DecodeError};
use pretty_assertions::assert_eq;

#[test]
fn decode_respects_charset_header() {
    let bytes = b"caf\xe9"; // iso-8859-1
    let decoded = decode_html(bytes, Some("text/html; charset=ISO-8859-1")).unwrap();
    assert_eq!(decoded.html, "café");
    assert!(
        decoded.encoding_label.eq_ignore_ascii_case("ISO-8859-1")
            || decoded.encoding_label.eq_ignore_ascii_case("windows-1252")
    );
}

#[test]
fn decode_handles_utf8_bom() {
    let bytes = b"\xEF\xBB\xBFhello";
    let decoded = decode_html(bytes, Some("text/html; charset=ISO-8859-1")).unwrap();
    assert_eq!(decoded.html, "hello");
    assert_eq!(decoded.encoding_label, "UTF-8");
}

#[test]
fn meta_charset_applies_without_header_charset() {
    let bytes = b"<html><head><meta charset=\"windows-1252\"></head><body>na\xefve</body></html>";
    let decoded = decode_html(bytes, Some("text/html")).unwrap();
    assert!(decoded.html.contains("naïve"));
    assert_eq!(decoded.encoding_label, "windows-1252");
}

#[test]
fn plain_utf8_is_detected() {
    let decoded = decode_html("<p>über</p>".as_bytes(), None).unwrap();
    assert_eq!(decoded.html, "<p>über</p>");
}

#[test]
fn invalid_bytes_for_declared_charset_fail() {
    let err = decode_html(b"<p>\xff\xfe\xfd</p>", Some("text/html; charset=utf-8")).unwrap_err();
    assert!(matches!(err, DecodeError::DecodeFailure { .. }));
}
