//! Types shared between the lifecycle layer and the RFC 2136 client.

pub mod update;

use std::net::IpAddr;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DnsError {
    #[error("invalid dns name '{0}'")]
    InvalidName(String),

    #[error("invalid tsig key: {0}")]
    InvalidKey(String),

    #[error("nameserver transport failure: {0}")]
    Transport(String),

    #[error("update rejected by nameserver: {0}")]
    Rejected(String),
}

/// Address record types a host can publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    A,
    Aaaa,
}

impl RecordKind {
    pub fn for_address(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => RecordKind::A,
            IpAddr::V6(_) => RecordKind::Aaaa,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::A => "A",
            RecordKind::Aaaa => "AAAA",
        }
    }
}

/// MAC algorithm used to sign dynamic updates for a zone.
///
/// Exactly one value is supported today; the stored name keeps room for more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAlgorithm {
    HmacSha512,
}

impl UpdateAlgorithm {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "HMAC_SHA512" => Some(UpdateAlgorithm::HmacSha512),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UpdateAlgorithm::HmacSha512 => "HMAC_SHA512",
        }
    }
}

/// Everything the update client needs to talk to one zone's authoritative
/// nameserver. Derived from a stored domain row; the TSIG key never leaves
/// this struct except as signing input.
#[derive(Debug, Clone)]
pub struct ZoneEndpoint {
    /// Zone origin without trailing dot, e.g. `example.org`.
    pub origin: String,
    pub nameserver_ip: IpAddr,
    /// Base64-encoded TSIG key bytes.
    pub update_key: String,
    pub algorithm: UpdateAlgorithm,
}

/// Seam between host lifecycle handling and the wire protocol. The
/// production implementation is [`update::Rfc2136Client`]; tests substitute
/// an in-memory recorder.
#[async_trait]
pub trait DnsUpdater: Send + Sync {
    /// Ask the zone's authoritative nameserver for the currently published
    /// address of `fqdn`. "No such name", "no answer of this type",
    /// unreachable nameserver and timeout are all `Ok(None)`: an unknown
    /// address is a normal state, not a fault.
    async fn query_current_address(
        &self,
        fqdn: &str,
        kind: RecordKind,
        zone: &ZoneEndpoint,
    ) -> Result<Option<IpAddr>, DnsError>;

    /// Publish `addr` for `fqdn` with add-or-replace semantics: any existing
    /// record of the same type is removed in the same signed transaction.
    /// Applying the same address twice is a no-op the second time.
    async fn apply_update(
        &self,
        fqdn: &str,
        addr: IpAddr,
        zone: &ZoneEndpoint,
    ) -> Result<(), DnsError>;

    /// Remove all records for `fqdn` from the zone. Deleting a name that has
    /// no records succeeds.
    async fn delete_record(&self, fqdn: &str, zone: &ZoneEndpoint) -> Result<(), DnsError>;
}

impl From<DnsError> for crate::error::AppError {
    fn from(err: DnsError) -> Self {
        crate::error::AppError::DnsTransport(err.to_string())
    }
}
