//! Request-body parsing for admin endpoints
//!
//! Admin front-ends post either a flat JSON object or an URL-encoded form.
//! The parsers here accept both and produce a key/value map:
//!
//! - a body that is valid JSON is read as an object;
//! - anything else is split on `&` into `key=value` pairs with percent and
//!   `+` decoding. A pair without `=` gets an empty value.
//!
//! The string-map variants turn non-string JSON values into their JSON text
//! and `null` into an empty string. The `_any` variants keep JSON values as
//! they are.

use kamkit_core::{Error, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use url::form_urlencoded;

const UNPARSEABLE: &str = "unable to parse body. is it nil?";

fn json_object(body: &[u8]) -> Option<Result<Map<String, Value>>> {
    let value: Value = serde_json::from_slice(body).ok()?;
    Some(match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidBody(format!(
            "expected a JSON object, got {}",
            type_name(&other)
        ))),
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn as_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn form_pairs(body: &[u8]) -> impl Iterator<Item = (String, String)> + '_ {
    form_urlencoded::parse(body).map(|(k, v)| (k.into_owned(), v.into_owned()))
}

fn looks_like_form(body: &[u8]) -> bool {
    body.contains(&b'&')
}

/// Parse a JSON or URL-encoded body into a string map
///
/// Never fails: a JSON document that is not an object yields an empty map.
/// When a form repeats a key the last value wins.
///
/// ```rust
/// use kamkit_web::body::parse_body;
///
/// let form = parse_body(b"user=alice&note=hello+world%21");
/// assert_eq!(form["note"], "hello world!");
///
/// let json = parse_body(br#"{"user":"bob","ext":1001}"#);
/// assert_eq!(json["ext"], "1001");
/// ```
pub fn parse_body(body: &[u8]) -> HashMap<String, String> {
    match json_object(body) {
        Some(Ok(map)) => map.into_iter().map(|(k, v)| (k, as_text(v))).collect(),
        Some(Err(_)) => HashMap::new(),
        None => form_pairs(body).collect(),
    }
}

/// Like [`parse_body`] but rejects bodies that are neither JSON nor a form
///
/// A body counts as a form only when it contains `&`. A JSON document that
/// is not an object is rejected too.
pub fn parse_body_strict(body: &[u8]) -> Result<HashMap<String, String>> {
    match json_object(body) {
        Some(map) => Ok(map?.into_iter().map(|(k, v)| (k, as_text(v))).collect()),
        None if looks_like_form(body) => Ok(form_pairs(body).collect()),
        None => Err(Error::InvalidBody(UNPARSEABLE.to_string())),
    }
}

/// Like [`parse_body_strict`] but keeps JSON values untouched
///
/// Form values become JSON strings.
pub fn parse_body_any(body: &[u8]) -> Result<Map<String, Value>> {
    match json_object(body) {
        Some(map) => map,
        None if looks_like_form(body) => Ok(form_pairs(body)
            .map(|(k, v)| (k, Value::String(v)))
            .collect()),
        None => Err(Error::InvalidBody(UNPARSEABLE.to_string())),
    }
}

fn missing_report<'a>(missing: impl Iterator<Item = &'a str>) -> Result<()> {
    let report: String = missing.map(|key| format!("{} is missing. ", key)).collect();
    if report.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingFields(report))
    }
}

/// Fail with every required key that is absent or empty
///
/// ```rust
/// use kamkit_core::Error;
/// use kamkit_web::body::{check_fields, parse_body};
///
/// let fields = parse_body(b"user=alice&pass=");
/// assert_eq!(
///     check_fields(&fields, &["user", "pass", "ext"]),
///     Err(Error::MissingFields("pass is missing. ext is missing. ".to_string()))
/// );
/// ```
pub fn check_fields(fields: &HashMap<String, String>, required: &[&str]) -> Result<()> {
    missing_report(
        required
            .iter()
            .copied()
            .filter(|key| fields.get(*key).map_or(true, |v| v.is_empty())),
    )
}

/// [`check_fields`] for JSON maps; `null` and `""` count as missing
pub fn check_fields_any(fields: &Map<String, Value>, required: &[&str]) -> Result<()> {
    missing_report(required.iter().copied().filter(|key| {
        match fields.get(*key) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        }
    }))
}

/// Strict parse followed by [`check_fields`]
pub fn parse_body_fields(body: &[u8], required: &[&str]) -> Result<HashMap<String, String>> {
    let fields = parse_body_strict(body)?;
    check_fields(&fields, required)?;
    Ok(fields)
}

/// Strict parse followed by [`check_fields_any`]
pub fn parse_body_fields_any(body: &[u8], required: &[&str]) -> Result<Map<String, Value>> {
    let fields = parse_body_any(body)?;
    check_fields_any(&fields, required)?;
    Ok(fields)
}

/// Merge an URL-encoded form body with the query string
///
/// Body values come before query values and the first value seen for a key
/// wins.
pub fn parse_form(query: Option<&str>, body: &[u8]) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    let query_pairs = query.map(|q| form_pairs(q.as_bytes()).collect::<Vec<_>>());

    for (key, value) in form_pairs(body).chain(query_pairs.into_iter().flatten()) {
        fields.entry(key).or_insert(value);
    }
    fields
}

/// [`parse_form`] followed by [`check_fields`]
pub fn parse_form_fields(
    query: Option<&str>,
    body: &[u8],
    required: &[&str],
) -> Result<HashMap<String, String>> {
    let fields = parse_form(query, body);
    check_fields(&fields, required)?;
    Ok(fields)
}

/// Copy of `fields` with every key lower-cased
pub fn lower_keys(fields: &HashMap<String, String>) -> HashMap<String, String> {
    fields
        .iter()
        .map(|(k, v)| (k.to_lowercase(), v.clone()))
        .collect()
}

/// Last ten characters of `text`, or all of it when shorter
///
/// Used to normalise phone numbers to their national part.
pub fn last_ten(text: &str) -> &str {
    match text.char_indices().rev().nth(9) {
        Some((start, _)) => &text[start..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_form_body() {
        let fields = parse_body(b"user=alice&ext=1001&note=a%20b+c");
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["user"], "alice");
        assert_eq!(fields["note"], "a b c");
    }

    #[test]
    fn test_parse_json_body() {
        let fields = parse_body(br#"{"user":"alice","active":true,"gone":null}"#);
        assert_eq!(fields["user"], "alice");
        assert_eq!(fields["active"], "true");
        assert_eq!(fields["gone"], "");
    }

    #[test]
    fn test_parse_body_edge_cases() {
        assert!(parse_body(b"").is_empty());
        assert!(parse_body(b"[1,2]").is_empty());

        let fields = parse_body(b"flag&user=bob");
        assert_eq!(fields["flag"], "");
        assert_eq!(fields["user"], "bob");

        let fields = parse_body(b"bad=%zz");
        assert_eq!(fields["bad"], "%zz");

        let fields = parse_body(b"k=1&k=2");
        assert_eq!(fields["k"], "2");
    }

    #[test]
    fn test_strict_rejects_unstructured_body() {
        assert_eq!(
            parse_body_strict(b""),
            Err(Error::InvalidBody("unable to parse body. is it nil?".to_string()))
        );
        assert!(matches!(parse_body_strict(b"user=alice"), Err(Error::InvalidBody(_))));
        assert!(matches!(parse_body_strict(b"\"text\""), Err(Error::InvalidBody(_))));
        assert_eq!(parse_body_strict(b"a=1&b=2").unwrap().len(), 2);
    }

    #[test]
    fn test_parse_body_any_keeps_types() {
        let fields = parse_body_any(br#"{"ext":1001,"tags":["a"]}"#).unwrap();
        assert_eq!(fields["ext"], json!(1001));
        assert_eq!(fields["tags"], json!(["a"]));

        let fields = parse_body_any(b"ext=1001&x=").unwrap();
        assert_eq!(fields["ext"], json!("1001"));
    }

    #[test]
    fn test_check_fields_reports_all_missing() {
        let fields = parse_body(b"user=alice&pass=");
        assert!(check_fields(&fields, &["user"]).is_ok());
        assert_eq!(
            check_fields(&fields, &["pass", "user", "ext"]),
            Err(Error::MissingFields("pass is missing. ext is missing. ".to_string()))
        );
    }

    #[test]
    fn test_check_fields_any() {
        let fields = parse_body_any(br#"{"a":0,"b":"","c":null,"d":false}"#).unwrap();
        assert_eq!(
            check_fields_any(&fields, &["a", "b", "c", "d", "e"]),
            Err(Error::MissingFields("b is missing. c is missing. e is missing. ".to_string()))
        );
    }

    #[test]
    fn test_parse_body_fields() {
        let fields =
            parse_body_fields(br#"{"user":"alice","pass":"x"}"#, &["user", "pass"]).unwrap();
        assert_eq!(fields["pass"], "x");

        let err = parse_body_fields(b"user=alice&other=1", &["pass"]).unwrap_err();
        assert_eq!(err, Error::MissingFields("pass is missing. ".to_string()));

        assert!(parse_body_fields_any(br#"{"ext":1}"#, &["ext"]).is_ok());
        assert!(parse_body_fields_any(b"", &["ext"]).is_err());
    }

    #[test]
    fn test_parse_form_merges_query() {
        let fields = parse_form(Some("page=2&user=query"), b"user=body&x=1");
        assert_eq!(fields["user"], "body");
        assert_eq!(fields["page"], "2");
        assert_eq!(fields["x"], "1");

        let fields = parse_form(None, b"single=1");
        assert_eq!(fields["single"], "1");

        assert!(parse_form_fields(Some("a=1"), b"", &["a", "b"]).is_err());
    }

    #[test]
    fn test_lower_keys() {
        let mut fields = HashMap::new();
        fields.insert("User".to_string(), "Alice".to_string());
        let lowered = lower_keys(&fields);
        assert_eq!(lowered["user"], "Alice");
        assert!(!lowered.contains_key("User"));
    }

    #[test]
    fn test_last_ten() {
        assert_eq!(last_ten("+15551234567"), "5551234567");
        assert_eq!(last_ten("5551234567"), "5551234567");
        assert_eq!(last_ten("1234"), "1234");
        assert_eq!(last_ten(""), "");
        assert_eq!(last_ten("ñ0123456789"), "0123456789");
    }
}
