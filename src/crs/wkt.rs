//! WKT inspection helpers
//!
//! Full WKT parsing is out of scope. These helpers only pull out the pieces
//! needed to resolve a WKT string against the catalog: the top-level authority
//! identifier and the CRS name.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // The top-level ID/AUTHORITY is the last element before the outermost
    // closing bracket, optionally followed by a WKT2 REMARK
    static ref TOP_LEVEL_AUTHORITY: Regex = Regex::new(
        r#"\b(?:ID|AUTHORITY)\[\s*"([^"]+)"\s*,\s*"?([0-9A-Za-z_.]+)"?\s*(?:,[^\[\]]*)?\]\s*(?:,\s*REMARK\[\s*"(?:[^"]|"")*"\s*\]\s*)?\]\s*$"#
    ).expect("authority pattern is valid");

    static ref CRS_NAME: Regex = Regex::new(r#"^\s*[A-Za-z0-9_]+\[\s*"([^"]*)""#)
        .expect("name pattern is valid");
}

/// Extract the top-level authority of a WKT string as "AUTH:CODE"
///
/// # Arguments
/// * `wkt` - WKT1 or WKT2 text
///
/// # Returns
/// The authority id in upper case, or None when the CRS carries no authority
pub fn top_level_authority(wkt: &str) -> Option<String> {
    TOP_LEVEL_AUTHORITY
        .captures(wkt.trim())
        .map(|caps| format!("{}:{}", caps[1].to_uppercase(), &caps[2]))
}

/// Extract the name of the outermost WKT element
pub fn crs_name(wkt: &str) -> Option<String> {
    CRS_NAME
        .captures(wkt)
        .map(|caps| caps[1].to_string())
        .filter(|name| !name.is_empty())
}

/// Quick check whether a string looks like WKT rather than a PROJ string or id
pub fn looks_like_wkt(text: &str) -> bool {
    let text = text.trim_start();
    text.contains('[') && text.chars().next().map_or(false, |c| c.is_ascii_alphabetic())
}
