//! Text composition for outbound status messages.

use chrono::{DateTime, Utc};
use netwatch_core::types::{AsnTraffic, DnsRecord, ResolverKind, Snapshot, TrafficSample, TrafficStatus};
use std::collections::BTreeMap;

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

/// Cities listed before any others, most significant first.
const CITY_ORDER: &[&str] = &[
    "Tehran",
    "Esfahan",
    "Isfahan",
    "Shiraz",
    "Mashhad",
    "Tabriz",
    "Ahvaz",
    "Hamedan",
    "Babol",
    "Ardabil",
    "West Azerbaijan",
    "Bushehr",
    "Fars",
    "Gilan",
    "Golestan",
    "Kerman",
    "Lorestan",
    "Markazi",
    "Mazandaran",
    "Qazvin",
    "Semnan",
    "South Khorasan",
    "Yazd",
    "Zanjan",
    "England",
    "Madrid",
    "Spain",
    "Other",
];

/// Header segment: title and snapshot timestamp.
#[must_use]
pub fn header_section(snapshot: &Snapshot) -> String {
    format!(
        "\u{1f4ca} *NetWatch Monitoring Status*\n\u{23f0} Last Update: `{}`\n",
        snapshot.taken_at.format("%Y-%m-%d %H:%M:%S")
    )
}

/// ASN connectivity segment: connected entries first, then by canonical
/// ASN string; last-seen timestamp or "Never".
#[must_use]
pub fn asn_section(snapshot: &Snapshot) -> String {
    let mut entries: Vec<_> = snapshot.asns.values().collect();
    entries.sort_by(|a, b| {
        b.connected
            .cmp(&a.connected)
            .then_with(|| a.asn.cmp(&b.asn))
    });

    let mut out = String::new();
    out.push_str("\u{1f310} *ASN Connectivity*\n");
    out.push_str(RULE);
    out.push('\n');

    for entry in &entries {
        let icon = if entry.connected { "\u{1f7e2}" } else { "\u{1f534}" };
        let last_seen = entry
            .last_seen
            .map_or_else(|| String::from("Never"), |t| t.format("%H:%M:%S").to_string());
        let display = match &entry.name {
            Some(name) => format!("{} - {}", entry.asn, name),
            None => entry.asn.clone(),
        };
        out.push_str(&format!(
            "{icon} `{display}`\n   \u{2514}\u{2500} Last seen: {last_seen}\n"
        ));
    }

    out.push_str(&format!(
        "\n\u{1f4c8} *Summary:* {}/{} Connected\n",
        snapshot.connected_count(),
        snapshot.asns.len()
    ));
    out
}

/// DNS segment: grouped by city, authoritative before recursive, alive
/// entries first within each bucket.
#[must_use]
pub fn dns_section(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    out.push_str("\u{1f50d} *DNS Servers Status*\n");
    out.push_str(RULE);
    out.push_str("\n\n");

    // city -> authoritative? -> records
    let mut buckets: BTreeMap<String, BTreeMap<bool, Vec<&DnsRecord>>> = BTreeMap::new();
    for record in snapshot.dns.values() {
        let city = parse_city(&record.name);
        let authoritative = record.kind == ResolverKind::Authoritative;
        buckets
            .entry(city)
            .or_default()
            .entry(!authoritative)
            .or_default()
            .push(record);
    }

    let mut remaining = buckets;
    for city in CITY_ORDER {
        if let Some(types) = remaining.remove(*city) {
            write_city(&mut out, city, types);
        }
    }
    for (city, types) in remaining {
        write_city(&mut out, &city, types);
    }

    out.push('\n');
    out.push_str(RULE);
    out.push_str(&format!(
        "\n\u{1f4c8} *Summary:* {}/{} Alive\n",
        snapshot.alive_count(),
        snapshot.dns.len()
    ));
    out
}

fn write_city(out: &mut String, city: &str, types: BTreeMap<bool, Vec<&DnsRecord>>) {
    out.push_str(&format!("\u{1f3d9}\u{fe0f}  *{city}*\n"));

    // `false` sorts before `true`: authoritative first.
    for (recursive, mut records) in types {
        let (emoji, label) = if recursive {
            ("\u{1f504}", "Recursive")
        } else {
            ("\u{1f4e1}", "Authoritative")
        };
        out.push_str(&format!("   {emoji} *{label} DNS*\n"));

        records.sort_by(|a, b| b.alive.cmp(&a.alive).then_with(|| a.name.cmp(&b.name)));

        for record in records {
            let icon = if record.alive { "\u{1f7e2}" } else { "\u{1f534}" };
            let display = strip_city(&record.name, city);
            out.push_str(&format!(
                "      {icon} *{display}*\n         \u{2514}\u{2500} `{}` - {}ms\n",
                record.address,
                record.response_time.as_millis()
            ));
            if !record.alive && !record.last_error.is_empty() {
                out.push_str(&format!(
                    "         \u{2514}\u{2500} \u{26a0}\u{fe0f} {}\n",
                    record.last_error
                ));
            }
        }
        out.push('\n');
    }
}

/// Extract the city from a parenthesized display-name suffix, stripping
/// qualifiers after ` - ` or `,`. Defaults to "Other".
#[must_use]
pub fn parse_city(name: &str) -> String {
    let Some(start) = name.rfind('(') else {
        return String::from("Other");
    };
    let Some(end) = name.rfind(')') else {
        return String::from("Other");
    };
    if end <= start {
        return String::from("Other");
    }

    let mut city = &name[start + 1..end];
    if let Some(idx) = city.find(" - ") {
        city = &city[..idx];
    }
    if let Some(idx) = city.find(',') {
        city = &city[..idx];
    }
    let city = city.trim();
    if city.is_empty() {
        String::from("Other")
    } else {
        city.to_string()
    }
}

/// Drop a `(City...)` suffix from a display name when the city is
/// already the section heading.
fn strip_city(name: &str, city: &str) -> String {
    let marker = format!("({city}");
    if let Some(start) = name.find(&marker) {
        if let Some(len) = name[start..].find(')') {
            let mut cleaned = String::with_capacity(name.len());
            cleaned.push_str(&name[..start]);
            cleaned.push_str(&name[start + len + 1..]);
            return cleaned.trim().to_string();
        }
    }
    name.to_string()
}

/// Caption for the country traffic chart.
#[must_use]
pub fn traffic_caption(sample: &TrafficSample, now: DateTime<Utc>) -> String {
    let ago = humanize_since(now.signed_duration_since(sample.fetched_at));
    let mut caption = format!(
        "{} *Traffic Level:* {:.1}%\n\u{1f4c8} *Change:* {:+.1}%\n\u{1f4ca} *Status:* {}\n\u{23f1} *Updated:* {} ago",
        sample.status.emoji(),
        sample.current_level,
        sample.change_percent,
        sample.status.label(),
        ago
    );
    if matches!(sample.status, TrafficStatus::Shutdown | TrafficStatus::Throttled) {
        caption.push_str("\n\n\u{26a0}\u{fe0f} *MAJOR DISRUPTION DETECTED*");
    }
    caption
}

/// Caption for the per-ASN traffic chart: top five with shares, plus a
/// count of the rest.
#[must_use]
pub fn asn_traffic_caption(entries: &[AsnTraffic]) -> String {
    let mut caption = format!(
        "\u{1f4ca} *Top {} ASNs by Traffic*\n\n",
        entries.len()
    );
    for entry in entries.iter().take(5) {
        caption.push_str(&format!(
            "{} *{}*\n   \u{2514}\u{2500} {:.2}% of total traffic\n",
            entry.tier.emoji(),
            entry.name,
            entry.share_percent
        ));
    }
    if entries.len() > 5 {
        caption.push_str(&format!(
            "\n... and {} more ASNs (see chart)",
            entries.len() - 5
        ));
    }
    caption
}

fn humanize_since(elapsed: chrono::Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    if secs < 60 {
        format!("{secs} secs")
    } else if secs < 3600 {
        format!("{} mins", secs / 60)
    } else if secs < 86_400 {
        format!("{} hours", secs / 3600)
    } else {
        format!("{} days", secs / 86_400)
    }
}
