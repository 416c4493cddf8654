use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use surge_ping::{Client, Config, ICMP, IcmpPacket, PingIdentifier, PingSequence};

/// Result of a single probe. Probing never fails with an error: anything
/// that prevents a reply is reported as `Lost`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reply(Duration),
    Lost,
}

/// Performs one latency measurement against a target.
#[async_trait]
pub trait Prober: Send + Sync + 'static {
    async fn probe(&self, target: &str, packet_size: usize, timeout: Duration) -> ProbeOutcome;
}

/// Reduces a target to the characters a DNS name can hold. Targets are often
/// pasted as `host:port`, and an echo request has no port, so anything after
/// the first colon is dropped. IP literals never get here.
fn sanitize_hostname(target: &str) -> Option<String> {
    let host = target.split_once(':').map_or(target, |(host, _)| host);
    let sanitized: String = host
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '-'))
        .collect();

    (!sanitized.is_empty()).then_some(sanitized)
}

/// ICMP echo prober backed by surge-ping. Sends one echo request per probe.
#[derive(Debug, Default, Clone, Copy)]
pub struct IcmpProber;

impl IcmpProber {
    pub fn new() -> Self {
        Self
    }

    /// Resolve hostname to IP address
    async fn resolve_target(target: &str) -> Option<IpAddr> {
        if let Ok(ip) = target.parse::<IpAddr>() {
            return Some(ip);
        }

        let sanitized = sanitize_hostname(target)?;

        match tokio::net::lookup_host(&format!("{sanitized}:0")).await {
            Ok(mut addrs) => addrs.next().map(|addr| addr.ip()),
            Err(e) => {
                debug!("Failed to resolve {}: {}", target, e);
                None
            }
        }
    }

    async fn echo(target_ip: IpAddr, packet_size: usize, timeout: Duration) -> ProbeOutcome {
        let config = match target_ip {
            IpAddr::V4(_) => Config::default(),
            IpAddr::V6(_) => Config::builder().kind(ICMP::V6).build(),
        };
        let client = match Client::new(&config) {
            Ok(client) => client,
            Err(e) => {
                debug!("Failed to create ICMP client for {}: {}", target_ip, e);
                return ProbeOutcome::Lost;
            }
        };

        let mut pinger = client.pinger(target_ip, PingIdentifier(rand::random())).await;
        pinger.timeout(timeout);

        let payload = vec![0u8; packet_size];
        match pinger.ping(PingSequence(0), &payload).await {
            Ok((IcmpPacket::V4(_), rtt)) | Ok((IcmpPacket::V6(_), rtt)) => ProbeOutcome::Reply(rtt),
            Err(e) => {
                debug!("Ping to {} failed: {}", target_ip, e);
                ProbeOutcome::Lost
            }
        }
    }
}

#[async_trait]
impl Prober for IcmpProber {
    async fn probe(&self, target: &str, packet_size: usize, timeout: Duration) -> ProbeOutcome {
        let Some(target_ip) = Self::resolve_target(target).await else {
            return ProbeOutcome::Lost;
        };

        let outcome = Self::echo(target_ip, packet_size, timeout).await;
        debug!("Probe {} ({}): {:?}", target, target_ip, outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_sanitize_hostname_strips_port_and_junk() {
        assert_eq!(sanitize_hostname("example.com:8080"), Some("example.com".to_string()));
        assert_eq!(sanitize_hostname("exa mple;.com"), Some("example.com".to_string()));
        assert_eq!(sanitize_hostname("my-host.local"), Some("my-host.local".to_string()));
        assert_eq!(sanitize_hostname(";;"), None);
        assert_eq!(sanitize_hostname(""), None);
    }

    #[tokio::test]
    async fn test_resolve_target_ip_literals() {
        assert_eq!(
            IcmpProber::resolve_target("127.0.0.1").await,
            Some(IpAddr::V4(Ipv4Addr::LOCALHOST))
        );
        assert_eq!(
            IcmpProber::resolve_target("::1").await,
            Some(IpAddr::V6(Ipv6Addr::LOCALHOST))
        );
    }

    #[tokio::test]
    async fn test_unresolvable_target_is_lost() {
        let outcome = IcmpProber::new()
            .probe("!!!", 56, Duration::from_millis(100))
            .await;
        assert_eq!(outcome, ProbeOutcome::Lost);
    }
}
