//! Single-resolver probe: one question, bounded retries, classification.

use chrono::Utc;
use hickory_client::client::Client;
use hickory_proto::op::{Query, ResponseCode};
use hickory_proto::rr::{Name, RecordType};
use hickory_proto::runtime::TokioRuntimeProvider;
use hickory_proto::udp::UdpClientStream;
use hickory_proto::xfer::{DnsHandle, DnsRequestOptions, DnsResponse, FirstAnswer};
use hickory_proto::{ProtoError, ProtoErrorKind};
use netwatch_core::types::DnsRecord;
use netwatch_core::DnsServerEntry;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};
use tracing::debug;

/// Stable question asked of every resolver.
pub const TEST_DOMAIN: &str = "leader.ir.";

/// Initial attempt plus two retries.
const MAX_ATTEMPTS: u32 = 3;

/// Backoff doubles from here between attempts: 100ms, 200ms.
const BASE_BACKOFF: Duration = Duration::from_millis(100);

/// Probe one resolver and classify the outcome.
///
/// Any response, including an error rcode, means the server is online
/// and ends the retry loop. Network-level failures (timeout, refused
/// connection, unreachable host) are retried with exponential backoff;
/// protocol-level failures are not.
pub(crate) async fn probe_server(entry: DnsServerEntry, timeout: Duration) -> DnsRecord {
    let start = Instant::now();
    let mut record = DnsRecord::new(&entry.address, &entry.name, entry.kind);

    let Some(addr) = server_addr(&entry.address) else {
        record.last_check = Some(Utc::now());
        record.last_error = format!("Error: invalid address {:?}", entry.address);
        return record;
    };

    let recursion_desired = entry.kind.recursion_desired();
    let mut outcome: Result<DnsResponse, ProtoError> =
        Err(ProtoError::from(ProtoErrorKind::Timeout));

    let mut attempt = 0;
    loop {
        if attempt > 0 {
            tokio::time::sleep(BASE_BACKOFF * (1 << (attempt - 1))).await;
        }

        match exchange(addr, recursion_desired, timeout).await {
            Ok(response) => {
                outcome = Ok(response);
                break;
            }
            Err(e) => {
                let transient = is_network_error(&e);
                outcome = Err(e);
                attempt += 1;
                if !transient || attempt >= MAX_ATTEMPTS {
                    break;
                }
                debug!(
                    server = %entry.address,
                    name = %entry.name,
                    attempt,
                    "retrying probe after transient network error"
                );
            }
        }
    }

    record.response_time = start.elapsed();
    record.last_check = Some(Utc::now());

    match outcome {
        Ok(response) => {
            // The server answered; rcodes other than success are a note,
            // not a liveness failure.
            record.alive = true;
            let rcode = response.response_code();
            if rcode != ResponseCode::NoError {
                record.last_error = format!("DNS response: {rcode:?}");
            }
        }
        Err(e) if is_network_error(&e) => {
            record.alive = false;
            record.last_error = format!("Network error: {e}");
        }
        Err(e) => {
            record.alive = false;
            record.last_error = format!("Error: {e}");
        }
    }

    record
}

/// One UDP exchange against a specific server with a hard deadline.
async fn exchange(
    addr: SocketAddr,
    recursion_desired: bool,
    deadline: Duration,
) -> Result<DnsResponse, ProtoError> {
    let stream = UdpClientStream::builder(addr, TokioRuntimeProvider::default())
        .with_timeout(Some(deadline))
        .build();
    let (mut client, background) = Client::connect(stream).await?;
    let background = tokio::spawn(background);

    let name = Name::from_ascii(TEST_DOMAIN)?;
    let query = Query::query(name, RecordType::A);
    let mut options = DnsRequestOptions::default();
    options.recursion_desired = recursion_desired;

    let result = tokio::time::timeout(deadline, client.lookup(query, options).first_answer()).await;
    background.abort();

    match result {
        Ok(inner) => inner,
        Err(_) => Err(ProtoError::from(ProtoErrorKind::Timeout)),
    }
}

/// Curation lists bare IPs; port 53 is implied. An explicit
/// `host:port` form is accepted too.
fn server_addr(address: &str) -> Option<SocketAddr> {
    if let Ok(addr) = address.parse::<SocketAddr>() {
        return Some(addr);
    }
    address
        .parse::<IpAddr>()
        .ok()
        .map(|ip| SocketAddr::new(ip, 53))
}

/// Whether an error is network-level (server truly unreachable) rather
/// than a protocol failure.
pub(crate) fn is_network_error(error: &ProtoError) -> bool {
    if matches!(error.kind(), ProtoErrorKind::Io(_) | ProtoErrorKind::Timeout) {
        return true;
    }
    let text = error.to_string().to_lowercase();
    NETWORK_ERROR_PATTERNS.iter().any(|p| text.contains(p))
}

const NETWORK_ERROR_PATTERNS: &[&str] = &[
    "timeout",
    "timed out",
    "connection refused",
    "connection reset",
    "no such host",
    "unreachable",
    "broken pipe",
];

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::op::{Message, MessageType, OpCode};
    use netwatch_core::types::ResolverKind;

    #[test]
    fn network_error_taxonomy() {
        assert!(is_network_error(&ProtoError::from(ProtoErrorKind::Timeout)));
        assert!(is_network_error(&ProtoError::from(String::from(
            "connection refused by peer"
        ))));
        assert!(is_network_error(&ProtoError::from(String::from(
            "host unreachable"
        ))));
        assert!(!is_network_error(&ProtoError::from(String::from(
            "label bytes exceed maximum length"
        ))));
    }

    #[test]
    fn bare_ip_gets_port_53() {
        assert_eq!(
            server_addr("1.1.1.1"),
            Some("1.1.1.1:53".parse().unwrap())
        );
        assert_eq!(
            server_addr("127.0.0.1:5353"),
            Some("127.0.0.1:5353".parse().unwrap())
        );
        assert!(server_addr("not-an-ip").is_none());
    }

    #[tokio::test]
    async fn invalid_address_is_dead_without_network_io() {
        let entry = DnsServerEntry::new("bogus", "Broken", ResolverKind::Recursive);
        let record = probe_server(entry, Duration::from_secs(8)).await;
        assert!(!record.alive);
        assert!(record.last_error.contains("invalid address"));
        assert!(record.last_check.is_some());
    }

    /// Minimal UDP responder answering every query with a fixed rcode.
    async fn spawn_responder(rcode: ResponseCode) -> SocketAddr {
        let socket = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        tokio::spawn(async move {
            let mut buf = [0u8; 1024];
            while let Ok((len, peer)) = socket.recv_from(&mut buf).await {
                let Ok(request) = Message::from_vec(&buf[..len]) else {
                    continue;
                };
                let mut response = Message::new();
                response
                    .set_id(request.id())
                    .set_message_type(MessageType::Response)
                    .set_op_code(OpCode::Query)
                    .set_response_code(rcode);
                for query in request.queries() {
                    response.add_query(query.clone());
                }
                if let Ok(bytes) = response.to_vec() {
                    let _ = socket.send_to(&bytes, peer).await;
                }
            }
        });
        addr
    }

    #[tokio::test]
    async fn clean_answer_is_alive_without_error() {
        let addr = spawn_responder(ResponseCode::NoError).await;
        let entry = DnsServerEntry::new(&addr.to_string(), "Local", ResolverKind::Recursive);
        let record = probe_server(entry, Duration::from_secs(8)).await;

        assert!(record.alive);
        assert!(record.last_error.is_empty());
        assert!(record.last_check.is_some());
        assert!(record.response_time < Duration::from_secs(8));
    }

    #[tokio::test]
    async fn refused_answer_is_alive_with_rcode_note() {
        let addr = spawn_responder(ResponseCode::Refused).await;
        let entry = DnsServerEntry::new(&addr.to_string(), "Grumpy", ResolverKind::Authoritative);
        let record = probe_server(entry, Duration::from_secs(8)).await;

        assert!(record.alive, "a response with an error rcode is still alive");
        assert!(record.last_error.contains("Refused"), "{}", record.last_error);
    }

    #[tokio::test]
    async fn nxdomain_answer_is_alive_with_rcode_note() {
        let addr = spawn_responder(ResponseCode::NXDomain).await;
        let entry = DnsServerEntry::new(&addr.to_string(), "Empty", ResolverKind::Recursive);
        let record = probe_server(entry, Duration::from_secs(8)).await;

        assert!(record.alive);
        assert!(record.last_error.contains("NXDomain"));
    }
}
