//! Curated default monitoring targets.
//!
//! The ASN and resolver lists are human-maintained: they cover the
//! backbone, the mobile operators, the large ISPs and cloud providers,
//! plus the global CDNs whose reachability tracks the country's external
//! connectivity. Some addresses appear under more than one display name
//! on purpose (same IP, different role label); the monitoring pipeline
//! keys on `(address, name)` to preserve that.

use super::DnsServerEntry;
use crate::types::ResolverKind;

/// Curated ASNs with display names, canonical `ASnnnn` form.
const CURATED_ASNS: &[(&str, &str)] = &[
    // Backbone and infrastructure
    ("AS12880", "TIC (tic.ir)"),
    ("AS49666", "TIC (Telecommunication Infrastructure Company)"),
    ("AS58224", "TCI (Iran Telecommunication Company)"),
    // Mobile operators
    ("AS197207", "MCCI (Hamrah-e Avval)"),
    ("AS44244", "Irancell (MTN Irancell)"),
    ("AS57218", "Rightel"),
    ("AS62140", "Rightel Data Center"),
    // Large ISPs
    ("AS31549", "Shatel (Aria Shatel)"),
    ("AS43754", "Asiatech"),
    ("AS51433", "Asiatech (Additional)"),
    ("AS50810", "Mobinnet"),
    ("AS56402", "HiWEB"),
    ("AS16322", "Parsan Lin"),
    ("AS58901", "ParsOnline"),
    ("AS39501", "Sabanet/NGS"),
    ("AS25184", "Afranet"),
    ("AS24631", "Fanap Telecom"),
    ("AS52049", "IranianNet"),
    ("AS49100", "Pishgaman"),
    ("AS206065", "Pasargad Arian"),
    ("AS44400", "Parsian"),
    ("AS50530", "Shabdiz Telecom"),
    // Cloud and CDN
    ("AS202468", "Arvan Cloud (Abrarvan)"),
    ("AS42337", "Respina Networks"),
    ("AS202319", "Hezardastan Cloud"),
    ("AS59441", "Hostiran"),
    ("AS8868", "IRCDN"),
    // Global CDN (external reachability reference points)
    ("AS13335", "Cloudflare (Main)"),
    ("AS14789", "Cloudflare (Secondary)"),
    ("AS202623", "Cloudflare (Core)"),
    ("AS132892", "Cloudflare (Additional)"),
    // Hosting and datacenters
    ("AS25124", "Datak"),
    ("AS205647", "Pardis Fanvari"),
    ("AS49981", "Mabna (Satcomco)"),
    ("AS60631", "ParsPack"),
    ("AS61173", "IranServer"),
    ("AS57067", "Iranian Data Center"),
    // Municipal, academic
    ("AS56461", "Isfahan Municipality"),
    ("AS6736", "IPM (Institute for Research in Fundamental Sciences)"),
    ("AS25306", "IsIran"),
    // Cross-border registrations operating with in-country networks
    ("AS199739", "Earthlink Telecommunications Iraq"),
    ("AS50710", "Earthlink Telecommunication Iraq"),
    ("AS59692", "IQWeb FZ-LLC"),
    ("AS57568", "ArvanCloud Global"),
    ("AS198398", "Symphony Solutions FZ-LLC"),
    ("AS41152", "Ertebatat Fara Gostar Shargh"),
];

/// The curated subscription set.
#[must_use]
pub fn default_asns() -> Vec<String> {
    CURATED_ASNS.iter().map(|(asn, _)| (*asn).to_string()).collect()
}

/// Display name for a canonical ASN string, if curated.
#[must_use]
pub fn asn_name(asn: &str) -> Option<&'static str> {
    CURATED_ASNS
        .iter()
        .find(|(candidate, _)| *candidate == asn)
        .map(|(_, name)| *name)
}

/// Curated resolvers: `(address, display name, kind)`.
const CURATED_DNS: &[(&str, &str, ResolverKind)] = &[
    // .ir ccTLD authoritative set
    ("193.189.123.2", "NIC.ir DNS (a.nic.ir)", ResolverKind::Authoritative),
    ("193.189.122.83", "NIC.ir DNS (b.nic.ir)", ResolverKind::Authoritative),
    ("45.93.171.206", "NIC.ir DNS (c.nic.ir)", ResolverKind::Authoritative),
    ("194.225.70.83", "NIC.ir DNS (d.nic.ir)", ResolverKind::Authoritative),
    ("193.0.9.85", "NIC.ir DNS (ir.cctld.authdns.ripe.net)", ResolverKind::Authoritative),
    // Mobile operator nameservers
    ("92.42.51.209", "Irancell DNS (ns1.mtnirancell.ir)", ResolverKind::Authoritative),
    ("92.42.50.209", "Irancell DNS (ns2.mtnirancell.ir)", ResolverKind::Authoritative),
    ("5.106.4.129", "MCCI DNS (ns1.mci.ir)", ResolverKind::Authoritative),
    ("5.106.4.130", "MCCI DNS (ns2.mci.ir)", ResolverKind::Authoritative),
    ("185.24.139.91", "Rightel DNS (ns1.rightel.ir)", ResolverKind::Authoritative),
    ("185.24.139.71", "Rightel DNS (ns2.rightel.ir)", ResolverKind::Authoritative),
    // ISP nameservers
    ("194.225.62.1", "TCI DNS (ns1.tci.ir)", ResolverKind::Authoritative),
    ("194.225.62.2", "TCI DNS (ns2.tci.ir)", ResolverKind::Authoritative),
    ("178.131.80.1", "Shatel DNS (ns1.shatel.ir)", ResolverKind::Authoritative),
    ("178.131.80.2", "Shatel DNS (ns2.shatel.ir)", ResolverKind::Authoritative),
    ("185.98.113.141", "Asiatech DNS (ns1.asiatech.ir)", ResolverKind::Authoritative),
    ("185.98.113.142", "Asiatech DNS (ns2.asiatech.ir)", ResolverKind::Authoritative),
    ("185.51.200.1", "HiWEB DNS (ns1.hiweb.ir)", ResolverKind::Authoritative),
    ("178.22.122.100", "Mobinnet DNS (ns1.mobinnet.ir)", ResolverKind::Authoritative),
    ("5.202.129.29", "Pishgaman DNS (ns1.pishgaman.net)", ResolverKind::Authoritative),
    ("5.202.129.30", "Pishgaman DNS (ns2.pishgaman.net)", ResolverKind::Authoritative),
    // Cloud and CDN nameservers; Fanap fronts the same Arvan anycast pair
    ("185.143.232.253", "Fanap DNS (k.ns.arvancdn.ir)", ResolverKind::Authoritative),
    ("185.143.235.253", "Fanap DNS (y.ns.arvancdn.ir)", ResolverKind::Authoritative),
    ("185.143.232.253", "Arvan Cloud DNS (ns1.arvancdn.ir)", ResolverKind::Authoritative),
    ("185.143.235.253", "Arvan Cloud DNS (ns2.arvancdn.ir)", ResolverKind::Authoritative),
    ("194.34.163.53", "Hezardastan Cloud DNS (ns.sotoon53.com)", ResolverKind::Authoritative),
    ("37.27.81.177", "Hostiran DNS (ns1.hostiran.net)", ResolverKind::Authoritative),
    ("81.91.129.230", "Datak DNS (ns1.datak.ir)", ResolverKind::Authoritative),
    ("81.91.129.229", "Datak DNS (ns2.datak.ir)", ResolverKind::Authoritative),
    // Tehran recursives
    ("217.218.127.104", "DCI LCT EMAM DNS (Tehran)", ResolverKind::Recursive),
    ("217.218.127.105", "DCI LCT EMAM DNS (Tehran)", ResolverKind::Recursive),
    ("217.218.127.127", "TCI Recursive DNS (Tehran - Primary)", ResolverKind::Recursive),
    ("217.218.155.155", "TCI Recursive DNS (Tehran - Secondary)", ResolverKind::Recursive),
    ("80.191.233.17", "TCI Recursive DNS (Tehran)", ResolverKind::Recursive),
    ("2.188.21.130", "ITC Recursive DNS (Tehran)", ResolverKind::Recursive),
    ("85.15.1.10", "Shatel Recursive DNS (Tehran - Primary)", ResolverKind::Recursive),
    ("85.15.1.12", "Shatel Recursive DNS (Tehran - Secondary)", ResolverKind::Recursive),
    ("194.225.150.10", "Asiatech Recursive DNS (Tehran - Primary)", ResolverKind::Recursive),
    ("185.98.113.113", "Asiatech Recursive DNS (Tehran)", ResolverKind::Recursive),
    ("91.99.101.12", "ParsOnline Recursive DNS (Tehran)", ResolverKind::Recursive),
    ("185.51.200.10", "Sefroyek Recursive DNS (Tehran)", ResolverKind::Recursive),
    ("31.24.234.34", "Tehran Municipality Recursive DNS (Primary)", ResolverKind::Recursive),
    ("94.139.190.190", "DATAK Recursive DNS (Tehran)", ResolverKind::Recursive),
    ("5.202.100.100", "Pishgaman Recursive DNS (Tehran)", ResolverKind::Recursive),
    ("188.158.158.158", "Parvaresh Dadeha Recursive DNS (Tehran)", ResolverKind::Recursive),
    ("2.188.166.22", "Respina Recursive DNS (Tehran)", ResolverKind::Recursive),
    ("2.189.44.44", "TIC Recursive DNS (Tehran)", ResolverKind::Recursive),
    ("185.231.182.126", "Noyan Abr Arvan Recursive DNS (Tehran)", ResolverKind::Recursive),
    ("194.225.125.12", "IPM Recursive DNS (Tehran)", ResolverKind::Recursive),
    // Regional recursives
    ("217.219.0.104", "DCI Recursive DNS (Esfahan)", ResolverKind::Recursive),
    ("217.219.96.104", "DCI Recursive DNS (Shiraz)", ResolverKind::Recursive),
    ("217.219.250.200", "TCI Recursive DNS (Fars - Shiraz)", ResolverKind::Recursive),
    ("185.64.179.89", "Shiraz University Recursive DNS", ResolverKind::Recursive),
    ("217.219.64.104", "DCI Recursive DNS (Mashhad)", ResolverKind::Recursive),
    ("185.23.131.73", "Razavi Recursive DNS (Mashhad)", ResolverKind::Recursive),
    ("217.219.128.104", "DCI Recursive DNS (Tabriz)", ResolverKind::Recursive),
    ("217.219.132.88", "TCI Recursive DNS (Tabriz)", ResolverKind::Recursive),
    ("217.219.224.104", "DCI Recursive DNS (Ahvaz)", ResolverKind::Recursive),
    ("217.219.192.104", "DCI Recursive DNS (Hamedan)", ResolverKind::Recursive),
    ("89.144.144.144", "ANDISHE SABZ KHAZAR Recursive DNS (Gilan)", ResolverKind::Recursive),
    ("5.200.200.200", "TCI Recursive DNS (Golestan)", ResolverKind::Recursive),
    ("78.39.101.186", "TCI Recursive DNS (Kerman)", ResolverKind::Recursive),
    ("31.47.37.35", "Afranet Recursive DNS (Mazandaran)", ResolverKind::Recursive),
    ("85.185.157.2", "TCI Recursive DNS (Yazd)", ResolverKind::Recursive),
    // Public anti-sanction resolvers; Shecan shares ISP infrastructure
    ("178.22.122.100", "Shecan DNS (Primary)", ResolverKind::Recursive),
    ("185.51.200.2", "Shecan DNS (Secondary)", ResolverKind::Recursive),
    ("78.157.42.100", "Electro DNS (Primary)", ResolverKind::Recursive),
    ("78.157.42.101", "Electro DNS (Secondary)", ResolverKind::Recursive),
    // Out-of-country vantage
    ("212.80.20.243", "TCI Recursive DNS (Madrid, Spain)", ResolverKind::Recursive),
    ("212.80.20.244", "TCI Recursive DNS (Madrid, Spain)", ResolverKind::Recursive),
];

/// The curated resolver list.
#[must_use]
pub fn default_dns_servers() -> Vec<DnsServerEntry> {
    CURATED_DNS
        .iter()
        .map(|(address, name, kind)| DnsServerEntry::new(address, name, *kind))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn asns_are_canonical_and_unique() {
        let asns = default_asns();
        let unique: BTreeSet<_> = asns.iter().collect();
        assert_eq!(unique.len(), asns.len());
        for asn in &asns {
            assert!(asn.starts_with("AS"), "{asn} not canonical");
            assert!(asn[2..].chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn name_lookup() {
        assert_eq!(asn_name("AS13335"), Some("Cloudflare (Main)"));
        assert_eq!(asn_name("AS99999"), None);
    }

    #[test]
    fn dns_keys_are_unique_but_addresses_repeat() {
        let servers = default_dns_servers();
        let keys: BTreeSet<_> = servers
            .iter()
            .map(|s| (s.address.clone(), s.name.clone()))
            .collect();
        assert_eq!(keys.len(), servers.len(), "duplicate (address, name) pair");

        // The curation intentionally repeats addresses under different names.
        let addresses: BTreeSet<_> = servers.iter().map(|s| s.address.clone()).collect();
        assert!(addresses.len() < servers.len());
    }
}
