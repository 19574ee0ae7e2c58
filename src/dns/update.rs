//! RFC 2136 dynamic-update client speaking to authoritative nameservers.
//!
//! Updates are TSIG-signed with the zone's shared key; queries go directly to
//! the zone's nameserver so the answer reflects the authoritative state
//! rather than whatever a caching resolver last saw. hickory's sync client
//! does blocking UDP I/O, so every call is moved onto the blocking pool with
//! a bounded connection timeout.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hickory_client::client::{Client, SyncClient};
use hickory_client::op::ResponseCode;
use hickory_client::rr::rdata::tsig::TsigAlgorithm;
use hickory_client::rr::{DNSClass, Name, RData, Record, RecordType};
use hickory_client::udp::UdpClientConnection;
use hickory_proto::rr::dnssec::tsig::TSigner;
use hickory_proto::xfer::DnsResponse;
use tracing::debug;

use super::{DnsError, DnsUpdater, RecordKind, ZoneEndpoint};

const DNS_PORT: u16 = 53;
const TSIG_FUDGE_SECS: u16 = 300;

#[derive(Debug, Clone)]
pub struct Rfc2136Client {
    timeout: Duration,
    record_ttl: u32,
}

impl Rfc2136Client {
    pub fn new(timeout: Duration, record_ttl: u32) -> Self {
        Self {
            timeout,
            record_ttl,
        }
    }

    fn nameserver_addr(zone: &ZoneEndpoint) -> SocketAddr {
        SocketAddr::new(zone.nameserver_ip, DNS_PORT)
    }

    /// Parse a name into absolute (root-terminated) form.
    fn absolute_name(name: &str) -> Result<Name, DnsError> {
        Name::from_str(&format!("{}.", name.trim_end_matches('.')))
            .map_err(|_| DnsError::InvalidName(name.to_string()))
    }

    /// Build the TSIG signer for a zone. The key name is the zone origin
    /// itself, matching how the zones' nameservers are provisioned.
    fn tsig_signer(zone: &ZoneEndpoint) -> Result<TSigner, DnsError> {
        let key_bytes = BASE64
            .decode(&zone.update_key)
            .map_err(|e| DnsError::InvalidKey(e.to_string()))?;

        let algorithm = match zone.algorithm {
            super::UpdateAlgorithm::HmacSha512 => TsigAlgorithm::HmacSha512,
        };

        TSigner::new(
            key_bytes,
            algorithm,
            Self::absolute_name(&zone.origin)?,
            TSIG_FUDGE_SECS,
        )
        .map_err(|e| DnsError::InvalidKey(e.to_string()))
    }

    fn signed_client(
        &self,
        zone: &ZoneEndpoint,
    ) -> Result<SyncClient<UdpClientConnection>, DnsError> {
        let conn = UdpClientConnection::with_timeout(Self::nameserver_addr(zone), self.timeout)
            .map_err(|e| DnsError::Transport(e.to_string()))?;
        Ok(SyncClient::with_tsigner(conn, Self::tsig_signer(zone)?))
    }

    fn plain_client(
        &self,
        zone: &ZoneEndpoint,
    ) -> Result<SyncClient<UdpClientConnection>, DnsError> {
        let conn = UdpClientConnection::with_timeout(Self::nameserver_addr(zone), self.timeout)
            .map_err(|e| DnsError::Transport(e.to_string()))?;
        Ok(SyncClient::new(conn))
    }

    /// Accept NOERROR, and NXDOMAIN for removal operations: deleting under a
    /// name that does not exist leaves the zone in the desired state.
    fn check_update_response(response: &DnsResponse, allow_nxdomain: bool) -> Result<(), DnsError> {
        match response.response_code() {
            ResponseCode::NoError => Ok(()),
            ResponseCode::NXDomain if allow_nxdomain => Ok(()),
            code => Err(DnsError::Rejected(format!("{code:?}"))),
        }
    }
}

#[async_trait]
impl DnsUpdater for Rfc2136Client {
    async fn query_current_address(
        &self,
        fqdn: &str,
        kind: RecordKind,
        zone: &ZoneEndpoint,
    ) -> Result<Option<IpAddr>, DnsError> {
        let client = self.plain_client(zone)?;
        let name = Self::absolute_name(fqdn)?;
        let record_type = match kind {
            RecordKind::A => RecordType::A,
            RecordKind::Aaaa => RecordType::AAAA,
        };

        let fqdn = fqdn.to_string();
        let result = tokio::task::spawn_blocking(move || {
            client.query(&name, DNSClass::IN, record_type)
        })
        .await
        .map_err(|e| DnsError::Transport(e.to_string()))?;

        // NXDOMAIN, empty answers, unreachable server and timeout all mean
        // the same thing to callers: no published address.
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                debug!(%fqdn, "authoritative query failed: {e}");
                return Ok(None);
            }
        };
        if response.response_code() != ResponseCode::NoError {
            return Ok(None);
        }

        let addr = response.answers().iter().find_map(|record| {
            match (kind, record.data()) {
                (RecordKind::A, Some(RData::A(a))) => Some(IpAddr::V4(a.0)),
                (RecordKind::Aaaa, Some(RData::AAAA(a))) => Some(IpAddr::V6(a.0)),
                _ => None,
            }
        });
        Ok(addr)
    }

    async fn apply_update(
        &self,
        fqdn: &str,
        addr: IpAddr,
        zone: &ZoneEndpoint,
    ) -> Result<(), DnsError> {
        let client = self.signed_client(zone)?;
        let origin = Self::absolute_name(&zone.origin)?;
        let name = Self::absolute_name(fqdn)?;
        let record_type = match RecordKind::for_address(addr) {
            RecordKind::A => RecordType::A,
            RecordKind::Aaaa => RecordType::AAAA,
        };

        let rdata = match addr {
            IpAddr::V4(v4) => RData::A(v4.into()),
            IpAddr::V6(v6) => RData::AAAA(v6.into()),
        };
        let mut record = Record::from_rdata(name.clone(), self.record_ttl, rdata);
        record.set_dns_class(DNSClass::IN);

        debug!(fqdn, %addr, zone = %zone.origin, "applying dns update");
        tokio::task::spawn_blocking(move || {
            // Add-or-replace: drop the existing rrset of this type, then
            // append the new record. Both steps are no-ops when the zone is
            // already in the requested state, so re-applying the same
            // address leaves a single record behind.
            let cleared = client
                .delete_rrset(Record::with(name.clone(), record_type, 0), origin.clone())
                .map_err(|e| DnsError::Transport(e.to_string()))?;
            Self::check_update_response(&cleared, true)?;

            let appended = client
                .append(record, origin, false)
                .map_err(|e| DnsError::Transport(e.to_string()))?;
            Self::check_update_response(&appended, false)
        })
        .await
        .map_err(|e| DnsError::Transport(e.to_string()))?
    }

    async fn delete_record(&self, fqdn: &str, zone: &ZoneEndpoint) -> Result<(), DnsError> {
        let client = self.signed_client(zone)?;
        let origin = Self::absolute_name(&zone.origin)?;
        let name = Self::absolute_name(fqdn)?;

        debug!(fqdn, zone = %zone.origin, "deleting dns records");
        tokio::task::spawn_blocking(move || {
            let response = client
                .delete_all(name, origin, DNSClass::IN)
                .map_err(|e| DnsError::Transport(e.to_string()))?;
            Self::check_update_response(&response, true)
        })
        .await
        .map_err(|e| DnsError::Transport(e.to_string()))?
    }
}
