//! Response extractors for the Kamailio control API
//!
//! Each extractor takes a raw response body, runs it through
//! [`codec::validate_response`] itself, and then walks the parsed tree to
//! build a smaller document for admin front-ends. Nothing here mutates the
//! source document.
//!
//! # Missing Data
//!
//! The walks are forgiving about shape: a field that is absent from a record
//! is left out of the projected record, and a missing container contributes
//! no records. Only an invalid body, a server error envelope or an
//! unparseable `Last-Modified` value produce an error.
//!
//! # Output
//!
//! Extractors return `serde_json::Value`; use [`codec::to_pretty_text`] for
//! the tab-indented text form.

use chrono::{DateTime, Utc};
use kamkit_core::{codec, Error, Result};
use serde_json::{json, Map, Value};

/// Children of `value[key]` when it is an array, nothing otherwise
fn items<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

/// Follow `path` one object key at a time
fn at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |node, key| node.get(*key))
}

/// Copy `source[path]` into `target[name]` when it exists
fn pick(target: &mut Map<String, Value>, name: &str, source: &Value, path: &[&str]) {
    if let Some(found) = at(source, path) {
        target.insert(name.to_string(), found.clone());
    }
}

/// Every `Info` object of every AoR of every domain in a `ul.dump` result
///
/// A `ul.lookup` result carries a single AoR at the top level instead of the
/// domain tree; it is yielded as the only entry.
fn aor_infos(document: &Value) -> Vec<&Value> {
    let Some(result) = document.get("result") else {
        return Vec::new();
    };

    if result.get("Domains").is_some() {
        items(result, "Domains")
            .filter_map(|domain| domain.get("Domain"))
            .flat_map(|domain| items(domain, "AoRs"))
            .filter_map(|aor| aor.get("Info"))
            .collect()
    } else if result.get("AoR").is_some() {
        vec![result]
    } else {
        Vec::new()
    }
}

fn contacts(info: &Value) -> impl Iterator<Item = &Value> {
    items(info, "Contacts").filter_map(|c| c.get("Contact"))
}

fn htable_slots(document: &Value) -> impl Iterator<Item = &Value> {
    items(document, "result").flat_map(|entry| items(entry, "slot"))
}

fn slot_projection(body: &str, fields: &[&str]) -> Result<Value> {
    let document = codec::validate_response(body)?;
    let records = htable_slots(&document)
        .map(|slot| {
            let mut record = Map::new();
            for field in fields {
                pick(&mut record, field, slot, &[field]);
            }
            Value::Object(record)
        })
        .collect();
    Ok(Value::Array(records))
}

/// Flatten an `htable.dump` result into `[{name, value}, ...]`
///
/// ```rust
/// use kamkit_client::extract;
/// use serde_json::json;
///
/// let body = r#"{"result":[{"entry":0,"size":2,"slot":[
///     {"name":"a","value":"1","type":"str"},
///     {"name":"b","value":"2","type":"str"}]}]}"#;
///
/// let pairs = extract::htable_name_values(body).unwrap();
/// assert_eq!(pairs, json!([{"name":"a","value":"1"},{"name":"b","value":"2"}]));
/// ```
pub fn htable_name_values(body: &str) -> Result<Value> {
    slot_projection(body, &["name", "value"])
}

/// Flatten an `htable.dump` result into `[{name}, ...]`
pub fn htable_names(body: &str) -> Result<Value> {
    slot_projection(body, &["name"])
}

/// Flatten an `htable.dump` result into `[{value}, ...]`
pub fn htable_values(body: &str) -> Result<Value> {
    slot_projection(body, &["value"])
}

/// Project an `htable.get` result to `{value}`, or `{}` when the key is unset
pub fn htable_value_single(body: &str) -> Result<Value> {
    let document = codec::validate_response(body)?;
    let mut record = Map::new();
    pick(&mut record, "value", &document, &["result", "item", "value"]);
    Ok(Value::Object(record))
}

/// One record per contact binding of a registration dump or lookup
///
/// Records carry `aor`, `address`, `expires`, `user-agent` and a
/// human-readable `last-modified` (see [`format_last_modified`]).
pub fn aor_contacts(body: &str) -> Result<Value> {
    let document = codec::validate_response(body)?;
    let mut records = Vec::new();

    for info in aor_infos(&document) {
        for contact in contacts(info) {
            let mut record = Map::new();
            pick(&mut record, "aor", info, &["AoR"]);
            pick(&mut record, "address", contact, &["Address"]);
            pick(&mut record, "expires", contact, &["Expires"]);
            pick(&mut record, "user-agent", contact, &["User-Agent"]);
            if let Some(raw) = contact.get("Last-Modified") {
                record.insert(
                    "last-modified".to_string(),
                    Value::String(format_last_modified_value(raw)?),
                );
            }
            records.push(Value::Object(record));
        }
    }

    Ok(Value::Array(records))
}

/// Every registered AoR across all domains
pub fn registered_aors(body: &str) -> Result<Value> {
    let document = codec::validate_response(body)?;
    let aors = aor_infos(&document)
        .into_iter()
        .filter_map(|info| info.get("AoR").cloned())
        .collect();
    Ok(Value::Array(aors))
}

/// Every AoR with its contact list copied verbatim: `[{AoR, Contacts}, ...]`
pub fn full_contact_info(body: &str) -> Result<Value> {
    let document = codec::validate_response(body)?;
    let records = aor_infos(&document)
        .into_iter()
        .map(|info| {
            let mut record = Map::new();
            pick(&mut record, "AoR", info, &["AoR"]);
            pick(&mut record, "Contacts", info, &["Contacts"]);
            Value::Object(record)
        })
        .collect();
    Ok(Value::Array(records))
}

/// Every AoR with a compact contact summary
///
/// Shape: `[{aor, details: [{address, ua, expires, last-modified}]}]`, with
/// `last-modified` left exactly as the server sent it.
pub fn registrations_simple(body: &str) -> Result<Value> {
    let document = codec::validate_response(body)?;
    let records = aor_infos(&document)
        .into_iter()
        .map(|info| {
            let details: Vec<Value> = contacts(info)
                .map(|contact| {
                    let mut detail = Map::new();
                    pick(&mut detail, "address", contact, &["Address"]);
                    pick(&mut detail, "ua", contact, &["User-Agent"]);
                    pick(&mut detail, "expires", contact, &["Expires"]);
                    pick(&mut detail, "last-modified", contact, &["Last-Modified"]);
                    Value::Object(detail)
                })
                .collect();

            let mut record = Map::new();
            pick(&mut record, "aor", info, &["AoR"]);
            record.insert("details".to_string(), Value::Array(details));
            Value::Object(record)
        })
        .collect();
    Ok(Value::Array(records))
}

/// Registered record count per domain: `[{Total_Registered}, ...]`
pub fn registrations_total(body: &str) -> Result<Value> {
    let document = codec::validate_response(body)?;
    let totals = document
        .get("result")
        .map(|result| items(result, "Domains").collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
        .filter_map(|domain| domain.get("Domain"))
        .map(|domain| {
            let mut record = Map::new();
            pick(&mut record, "Total_Registered", domain, &["Stats", "Records"]);
            Value::Object(record)
        })
        .collect();
    Ok(Value::Array(totals))
}

fn dispatcher_sets(document: &Value) -> Vec<&Value> {
    document
        .get("result")
        .map(|result| items(result, "RECORDS").filter_map(|r| r.get("SET")).collect())
        .unwrap_or_default()
}

/// Every destination URI of every dispatcher set: `{nodes: [uri, ...]}`
pub fn dispatcher_nodes(body: &str) -> Result<Value> {
    let document = codec::validate_response(body)?;
    let nodes: Vec<Value> = dispatcher_sets(&document)
        .into_iter()
        .flat_map(|set| items(set, "TARGETS"))
        .filter_map(|target| at(target, &["DEST", "URI"]))
        .filter(|uri| uri.is_string())
        .cloned()
        .collect();
    Ok(json!({ "nodes": nodes }))
}

/// Dispatcher sets with their targets
///
/// Shape: `[{id, nodes: [{uri, flags, priority, latency}]}]` where
/// `latency` is the average latency the server tracks for the target.
pub fn dispatcher_groups(body: &str) -> Result<Value> {
    let document = codec::validate_response(body)?;
    let groups = dispatcher_sets(&document)
        .into_iter()
        .map(|set| {
            let nodes: Vec<Value> = items(set, "TARGETS")
                .filter_map(|target| target.get("DEST"))
                .map(|dest| {
                    let mut node = Map::new();
                    pick(&mut node, "uri", dest, &["URI"]);
                    pick(&mut node, "flags", dest, &["FLAGS"]);
                    pick(&mut node, "priority", dest, &["PRIORITY"]);
                    pick(&mut node, "latency", dest, &["LATENCY", "AVG"]);
                    Value::Object(node)
                })
                .collect();

            let mut group = Map::new();
            pick(&mut group, "id", set, &["ID"]);
            group.insert("nodes".to_string(), Value::Array(nodes));
            Value::Object(group)
        })
        .collect();
    Ok(Value::Array(groups))
}

/// `result.uptime` of a `core.uptime` response, `null` when absent
pub fn uptime(body: &str) -> Result<Value> {
    let document = codec::validate_response(body)?;
    Ok(at(&document, &["result", "uptime"]).cloned().unwrap_or(Value::Null))
}

/// `result` of a `core.version` response, `null` when absent
pub fn version(body: &str) -> Result<Value> {
    let document = codec::validate_response(body)?;
    Ok(document.get("result").cloned().unwrap_or(Value::Null))
}

/// Format a floating-point Unix epoch as `YYYY-MM-DD HH:MM:SS +0000 UTC`
///
/// The server reports `Last-Modified` in scientific notation. The value is
/// rounded to the nearest second.
///
/// ```rust
/// use kamkit_client::extract::format_last_modified;
///
/// assert_eq!(
///     format_last_modified("1.673900000e+09").unwrap(),
///     "2023-01-16 20:13:20 +0000 UTC"
/// );
/// assert!(format_last_modified("yesterday").is_err());
/// ```
pub fn format_last_modified(text: &str) -> Result<String> {
    let seconds: f64 = text
        .trim()
        .parse()
        .map_err(|_| Error::Format(format!("invalid last-modified value {:?}", text)))?;
    format_epoch(seconds)
}

fn format_last_modified_value(raw: &Value) -> Result<String> {
    match raw {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::Format(format!("invalid last-modified value {}", n)))
            .and_then(format_epoch),
        Value::String(s) => format_last_modified(s),
        other => Err(Error::Format(format!("invalid last-modified value {}", other))),
    }
}

fn format_epoch(seconds: f64) -> Result<String> {
    let rounded = seconds.round();
    if !rounded.is_finite() || rounded < 0.0 || rounded > i64::MAX as f64 {
        return Err(Error::Format(format!("last-modified out of range: {}", seconds)));
    }

    let instant = DateTime::<Utc>::from_timestamp(rounded as i64, 0)
        .ok_or_else(|| Error::Format(format!("last-modified out of range: {}", seconds)))?;
    Ok(instant.format("%Y-%m-%d %H:%M:%S %z %Z").to_string())
}
