//! Shared fixtures: in-memory database pools and an in-memory stand-in for
//! the RFC 2136 client that records every transaction.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use perch::db::user_repo::{self, User};
use perch::db::Db;
use perch::dns::{DnsError, DnsUpdater, RecordKind, ZoneEndpoint};
use perch::lifecycle::{self, DomainRequest};

pub const TEST_UPDATE_KEY: &str = "bm90YXJlYWxrZXk=";

/// Fresh migrated in-memory database. A single connection keeps every query
/// on the same memory store.
pub async fn test_db() -> Db {
    let pool: SqlitePool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    perch::db::MIGRATOR.run(&pool).await.expect("migrations");
    pool
}

pub async fn test_user(db: &Db, username: &str) -> User {
    user_repo::insert(db, username, "test-password-hash")
        .await
        .expect("insert user");
    user_repo::find_by_username(db, username)
        .await
        .expect("query user")
        .expect("user exists")
}

/// Register `example.org` as an everyone-claimable zone.
pub async fn seed_domain(db: &Db, owner: &User, name: &str) {
    lifecycle::create_domain(
        db,
        owner,
        &DomainRequest {
            name: name.to_string(),
            nameserver_ip: "127.0.0.1".to_string(),
            update_key: TEST_UPDATE_KEY.to_string(),
            update_algorithm: "HMAC_SHA512".to_string(),
            available_for_everyone: true,
        },
    )
    .await
    .expect("seed domain");
}

/// Records applied updates per `(fqdn, record type)` and can be switched
/// into a failing mode to simulate an unreachable nameserver.
#[derive(Default)]
pub struct MockDns {
    records: Mutex<HashMap<(String, &'static str), Vec<IpAddr>>>,
    fail: AtomicBool,
}

impl MockDns {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Published addresses for a name and type, in application order.
    pub fn published(&self, fqdn: &str, kind: RecordKind) -> Vec<IpAddr> {
        self.records
            .lock()
            .unwrap()
            .get(&(fqdn.to_string(), kind.as_str()))
            .cloned()
            .unwrap_or_default()
    }

    fn check_reachable(&self) -> Result<(), DnsError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(DnsError::Transport("nameserver unreachable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DnsUpdater for MockDns {
    async fn query_current_address(
        &self,
        fqdn: &str,
        kind: RecordKind,
        _zone: &ZoneEndpoint,
    ) -> Result<Option<IpAddr>, DnsError> {
        // Transport failures downgrade to "address unknown" on the query path.
        if self.check_reachable().is_err() {
            return Ok(None);
        }
        Ok(self.published(fqdn, kind).first().copied())
    }

    async fn apply_update(
        &self,
        fqdn: &str,
        addr: IpAddr,
        _zone: &ZoneEndpoint,
    ) -> Result<(), DnsError> {
        self.check_reachable()?;
        let kind = RecordKind::for_address(addr);
        let mut records = self.records.lock().unwrap();
        // Add-or-replace, mirroring the real client's delete-then-append.
        let slot = records.entry((fqdn.to_string(), kind.as_str())).or_default();
        slot.clear();
        slot.push(addr);
        Ok(())
    }

    async fn delete_record(&self, fqdn: &str, _zone: &ZoneEndpoint) -> Result<(), DnsError> {
        self.check_reachable()?;
        self.records
            .lock()
            .unwrap()
            .retain(|(name, _), _| name != fqdn);
        Ok(())
    }
}
