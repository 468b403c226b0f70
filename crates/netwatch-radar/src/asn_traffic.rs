//! Best-effort per-ASN traffic shares.
//!
//! The upstream endpoint family for this has no stable contract; the
//! client walks a list of known URL variants and parses whichever one
//! answers. Total failure is not an error: the caller publishes an
//! absent sample and the chart is simply omitted.

use crate::client::RadarClient;
use crate::Result;
use netwatch_core::config::curation;
use netwatch_core::types::{asn_number, AsnTraffic, AsnTrafficTier};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

/// Known endpoint variants, tried in order.
const ENDPOINT_VARIANTS: &[&str] = &[
    "/radar/netflows/top/ases",
    "/radar/http/top/ases",
    "/radar/http/top?dimension=asn",
    "/radar/http/summary?dimension=asn",
    "/radar/http/summary/asn",
    "/radar/netflows/top/asn",
    "/radar/netflows/summary?dimension=asn",
    "/radar/http/top/asn",
];

/// Result fields that may hold the item array.
const ITEM_KEYS: &[&str] = &["top_0", "summary", "top"];

/// Maximum entries in the published sample.
const TOP_N: usize = 10;

/// One parsed upstream row before filtering.
#[derive(Debug, PartialEq)]
struct RawItem {
    number: String,
    name: Option<String>,
    value: f64,
}

pub(crate) async fn fetch(client: &RadarClient, monitored: &[String]) -> Result<Vec<AsnTraffic>> {
    let location = client.location_query();
    for (i, variant) in ENDPOINT_VARIANTS.iter().enumerate() {
        let separator = if variant.contains('?') { '&' } else { '?' };
        let path = format!("{variant}{separator}location={location}&dateRange=1d&format=json");

        match client.get_result(&path).await {
            Ok(result) => {
                let items = parse_items(&result);
                if items.is_empty() {
                    debug!(variant = i + 1, "ASN endpoint variant returned no items");
                    continue;
                }
                return Ok(rank(items, monitored));
            }
            Err(e) => {
                debug!(variant = i + 1, error = %e, "ASN endpoint variant failed");
            }
        }
    }

    // Every variant failed; the sample is permitted to be absent.
    Ok(Vec::new())
}

/// Extract `(asn, name, value)` rows from whichever result field holds them.
fn parse_items(result: &Value) -> Vec<RawItem> {
    let Some(map) = result.as_object() else {
        return Vec::new();
    };

    for key in ITEM_KEYS {
        if let Some(rows) = map.get(*key).and_then(Value::as_array) {
            let items: Vec<RawItem> = rows.iter().filter_map(parse_item).collect();
            if !items.is_empty() {
                return items;
            }
        }
    }
    Vec::new()
}

fn parse_item(row: &Value) -> Option<RawItem> {
    let map = row.as_object()?;

    // The /top/ases family uses clientASN/clientASName; older shapes use asn.
    let asn_value = map.get("clientASN").or_else(|| map.get("asn"))?;
    let number = match asn_value {
        Value::Number(n) => format!("{}", n.as_f64()? as u64),
        Value::String(s) => asn_number(s).to_string(),
        _ => return None,
    };

    let value = match map.get("value")? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.parse().ok()?,
        _ => return None,
    };

    let name = map
        .get("clientASName")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from);

    Some(RawItem { number, name, value })
}

/// Filter to the monitored set, compute shares, rank, cap at the top 10.
fn rank(items: Vec<RawItem>, monitored: &[String]) -> Vec<AsnTraffic> {
    let monitored_numbers: BTreeSet<&str> = monitored.iter().map(|a| asn_number(a)).collect();
    let total: f64 = items.iter().map(|i| i.value).sum();

    let mut out: Vec<AsnTraffic> = items
        .into_iter()
        .filter(|item| monitored_numbers.contains(item.number.as_str()))
        .map(|item| {
            let asn = format!("AS{}", item.number);
            let share_percent = if total > 0.0 {
                item.value / total * 100.0
            } else {
                0.0
            };
            let name = item
                .name
                .or_else(|| curation::asn_name(&asn).map(String::from))
                .unwrap_or_else(|| asn.clone());
            AsnTraffic {
                asn,
                name,
                volume: item.value,
                share_percent,
                tier: AsnTrafficTier::classify(share_percent),
            }
        })
        .collect();

    out.sort_by(|a, b| b.volume.total_cmp(&a.volume));
    out.truncate(TOP_N);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_client_asn_rows() {
        let result = json!({
            "top_0": [
                { "clientASN": 44244, "clientASName": "Irancell", "value": "40" },
                { "clientASN": "AS13335", "value": 60.0 }
            ]
        });
        let items = parse_items(&result);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].number, "44244");
        assert_eq!(items[0].name.as_deref(), Some("Irancell"));
        assert_eq!(items[1].number, "13335");
        assert_eq!(items[1].value, 60.0);
    }

    #[test]
    fn falls_back_to_summary_and_top_fields() {
        let result = json!({ "summary": [ { "asn": 13335, "value": 1.0 } ] });
        assert_eq!(parse_items(&result).len(), 1);

        let result = json!({ "top": [ { "asn": "AS13335", "value": 2.5 } ] });
        assert_eq!(parse_items(&result)[0].value, 2.5);
    }

    #[test]
    fn unparseable_rows_are_skipped() {
        let result = json!({
            "top_0": [
                { "value": 1.0 },
                { "clientASN": 13335, "value": "not-a-number" },
                { "clientASN": 13335, "value": 5.0 }
            ]
        });
        let items = parse_items(&result);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].value, 5.0);
    }

    #[test]
    fn rank_filters_computes_share_and_sorts() {
        let items = vec![
            RawItem { number: "13335".into(), name: None, value: 25.0 },
            RawItem { number: "99999".into(), name: None, value: 50.0 },
            RawItem { number: "44244".into(), name: Some("Irancell".into()), value: 25.0 },
        ];
        let monitored = vec![String::from("AS13335"), String::from("AS44244")];
        let ranked = rank(items, &monitored);

        assert_eq!(ranked.len(), 2);
        // Unmonitored ASN excluded but still in the share denominator.
        assert!((ranked[0].share_percent - 25.0).abs() < f64::EPSILON);
        assert_eq!(ranked[0].name, "Irancell");
        // Curation supplies the missing name.
        assert_eq!(ranked[1].asn, "AS13335");
        assert_eq!(ranked[1].name, "Cloudflare (Main)");
        assert_eq!(ranked[0].tier, AsnTrafficTier::High);
    }

    #[test]
    fn rank_caps_at_ten() {
        let items: Vec<RawItem> = (0..15)
            .map(|i| RawItem {
                number: format!("{}", 1000 + i),
                name: None,
                value: f64::from(i),
            })
            .collect();
        let monitored: Vec<String> = (0..15).map(|i| format!("AS{}", 1000 + i)).collect();
        let ranked = rank(items, &monitored);
        assert_eq!(ranked.len(), 10);
        // Highest volume first.
        assert_eq!(ranked[0].volume, 14.0);
    }
}
