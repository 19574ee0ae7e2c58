//! End-to-end host lifecycle tests against an in-memory database and a
//! recording DNS double.

mod common;

use std::net::IpAddr;

use common::{MockDns, seed_domain, test_db, test_user};
use perch::dns::RecordKind;
use perch::error::AppError;
use perch::lifecycle::{self, ClaimRequest};
use perch::secrets;

fn claim_req(subdomain: &str, domain: &str) -> ClaimRequest {
    ClaimRequest {
        subdomain: subdomain.to_string(),
        domain_name: domain.to_string(),
        comment: None,
    }
}

#[tokio::test]
async fn claim_resolves_by_fqdn() {
    let db = test_db().await;
    let user = test_user(&db, "alice").await;
    seed_domain(&db, &user, "example.org").await;

    let claimed = lifecycle::claim_host(&db, &user, &claim_req("my-host", "example.org"))
        .await
        .unwrap();
    assert!(secrets::verify_secret(
        &claimed.host.update_secret_hash,
        &claimed.secret
    ));
    assert!(claimed.host.last_update_at.is_none());

    let (host, domain) = lifecycle::resolve_fqdn(&db, "my-host.example.org")
        .await
        .unwrap()
        .expect("host resolvable");
    assert_eq!(host.id, claimed.host.id);
    assert_eq!(domain.name, "example.org");

    // No dot can never name a host.
    assert!(lifecycle::resolve_fqdn(&db, "noDotsHere").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_claim_is_a_conflict() {
    let db = test_db().await;
    let alice = test_user(&db, "alice").await;
    let bob = test_user(&db, "bob").await;
    seed_domain(&db, &alice, "example.org").await;

    lifecycle::claim_host(&db, &alice, &claim_req("my-host", "example.org"))
        .await
        .unwrap();

    let err = lifecycle::claim_host(&db, &bob, &claim_req("my-host", "example.org"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");

    // Same label under a different zone is fine.
    seed_domain(&db, &alice, "example.net").await;
    lifecycle::claim_host(&db, &bob, &claim_req("my-host", "example.net"))
        .await
        .unwrap();
}

#[tokio::test]
async fn claim_validates_label_and_domain() {
    let db = test_db().await;
    let user = test_user(&db, "alice").await;
    seed_domain(&db, &user, "example.org").await;

    let err = lifecycle::claim_host(&db, &user, &claim_req("Bad.Label", "example.org"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = lifecycle::claim_host(&db, &user, &claim_req("my-host", "unknown.example"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn restricted_domain_rejects_other_users() {
    let db = test_db().await;
    let owner = test_user(&db, "owner").await;
    let other = test_user(&db, "other").await;

    lifecycle::create_domain(
        &db,
        &owner,
        &perch::lifecycle::DomainRequest {
            name: "private.example".to_string(),
            nameserver_ip: "127.0.0.1".to_string(),
            update_key: common::TEST_UPDATE_KEY.to_string(),
            update_algorithm: "HMAC_SHA512".to_string(),
            available_for_everyone: false,
        },
    )
    .await
    .unwrap();

    let err = lifecycle::claim_host(&db, &other, &claim_req("my-host", "private.example"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // The owner can still claim under their own restricted zone.
    lifecycle::claim_host(&db, &owner, &claim_req("my-host", "private.example"))
        .await
        .unwrap();
}

#[tokio::test]
async fn accepted_update_publishes_and_touches_host() {
    let db = test_db().await;
    let dns = MockDns::default();
    let user = test_user(&db, "alice").await;
    seed_domain(&db, &user, "example.org").await;

    let claimed = lifecycle::claim_host(&db, &user, &claim_req("my-host", "example.org"))
        .await
        .unwrap();
    let addr: IpAddr = "198.51.100.7".parse().unwrap();

    lifecycle::submit_address_update(&db, &dns, "my-host.example.org", &claimed.secret, addr)
        .await
        .unwrap();

    assert_eq!(
        dns.published("my-host.example.org", RecordKind::A),
        vec![addr]
    );

    let (host, domain) = lifecycle::resolve_fqdn(&db, "my-host.example.org")
        .await
        .unwrap()
        .unwrap();
    assert!(host.last_update_at.is_some());

    let (v4, v6) = lifecycle::current_addresses(&dns, &host, &domain)
        .await
        .unwrap();
    assert_eq!(v4, Some(addr));
    assert_eq!(v6, None);
}

#[tokio::test]
async fn update_rejects_bad_secret_and_unknown_names_alike() {
    let db = test_db().await;
    let dns = MockDns::default();
    let user = test_user(&db, "alice").await;
    seed_domain(&db, &user, "example.org").await;
    lifecycle::claim_host(&db, &user, &claim_req("my-host", "example.org"))
        .await
        .unwrap();

    let addr: IpAddr = "198.51.100.7".parse().unwrap();

    let err =
        lifecycle::submit_address_update(&db, &dns, "my-host.example.org", "wrong-secret", addr)
            .await
            .unwrap_err();
    assert!(matches!(err, AppError::Authentication));

    let err =
        lifecycle::submit_address_update(&db, &dns, "ghost.example.org", "whatever", addr)
            .await
            .unwrap_err();
    assert!(matches!(err, AppError::Authentication));

    assert!(dns.published("my-host.example.org", RecordKind::A).is_empty());
}

#[tokio::test]
async fn reapplying_the_same_address_leaves_one_record() {
    let db = test_db().await;
    let dns = MockDns::default();
    let user = test_user(&db, "alice").await;
    seed_domain(&db, &user, "example.org").await;
    let claimed = lifecycle::claim_host(&db, &user, &claim_req("my-host", "example.org"))
        .await
        .unwrap();

    let addr: IpAddr = "203.0.113.5".parse().unwrap();
    for _ in 0..2 {
        lifecycle::submit_address_update(&db, &dns, "my-host.example.org", &claimed.secret, addr)
            .await
            .unwrap();
        assert_eq!(
            dns.published("my-host.example.org", RecordKind::A),
            vec![addr]
        );
    }

    // A new address replaces rather than accumulates.
    let new_addr: IpAddr = "203.0.113.6".parse().unwrap();
    lifecycle::submit_address_update(&db, &dns, "my-host.example.org", &claimed.secret, new_addr)
        .await
        .unwrap();
    assert_eq!(
        dns.published("my-host.example.org", RecordKind::A),
        vec![new_addr]
    );
}

#[tokio::test]
async fn transport_failure_on_update_is_surfaced_and_nothing_is_recorded() {
    let db = test_db().await;
    let dns = MockDns::default();
    let user = test_user(&db, "alice").await;
    seed_domain(&db, &user, "example.org").await;
    let claimed = lifecycle::claim_host(&db, &user, &claim_req("my-host", "example.org"))
        .await
        .unwrap();

    dns.set_failing(true);
    let err = lifecycle::submit_address_update(
        &db,
        &dns,
        "my-host.example.org",
        &claimed.secret,
        "198.51.100.7".parse().unwrap(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::DnsTransport(_)));

    let (host, _) = lifecycle::resolve_fqdn(&db, "my-host.example.org")
        .await
        .unwrap()
        .unwrap();
    assert!(host.last_update_at.is_none());
}

#[tokio::test]
async fn deletion_cascades_to_dns() {
    let db = test_db().await;
    let dns = MockDns::default();
    let user = test_user(&db, "alice").await;
    seed_domain(&db, &user, "example.org").await;
    let claimed = lifecycle::claim_host(&db, &user, &claim_req("my-host", "example.org"))
        .await
        .unwrap();
    lifecycle::submit_address_update(
        &db,
        &dns,
        "my-host.example.org",
        &claimed.secret,
        "198.51.100.7".parse().unwrap(),
    )
    .await
    .unwrap();

    lifecycle::delete_host(&db, &dns, claimed.host.id, &user)
        .await
        .unwrap();

    assert!(lifecycle::resolve_fqdn(&db, "my-host.example.org")
        .await
        .unwrap()
        .is_none());
    assert!(dns.published("my-host.example.org", RecordKind::A).is_empty());
}

#[tokio::test]
async fn deletion_survives_dns_transport_failure() {
    let db = test_db().await;
    let dns = MockDns::default();
    let user = test_user(&db, "alice").await;
    seed_domain(&db, &user, "example.org").await;
    let claimed = lifecycle::claim_host(&db, &user, &claim_req("my-host", "example.org"))
        .await
        .unwrap();
    lifecycle::submit_address_update(
        &db,
        &dns,
        "my-host.example.org",
        &claimed.secret,
        "198.51.100.7".parse().unwrap(),
    )
    .await
    .unwrap();

    // Nameserver down: the registry row still goes away.
    dns.set_failing(true);
    lifecycle::delete_host(&db, &dns, claimed.host.id, &user)
        .await
        .unwrap();

    assert!(lifecycle::resolve_fqdn(&db, "my-host.example.org")
        .await
        .unwrap()
        .is_none());

    // The residual record is the accepted trade-off.
    dns.set_failing(false);
    assert_eq!(
        dns.published("my-host.example.org", RecordKind::A).len(),
        1
    );
}

#[tokio::test]
async fn deletion_requires_ownership() {
    let db = test_db().await;
    let dns = MockDns::default();
    let alice = test_user(&db, "alice").await;
    let bob = test_user(&db, "bob").await;
    seed_domain(&db, &alice, "example.org").await;
    let claimed = lifecycle::claim_host(&db, &alice, &claim_req("my-host", "example.org"))
        .await
        .unwrap();

    let err = lifecycle::delete_host(&db, &dns, claimed.host.id, &bob)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    assert!(lifecycle::resolve_fqdn(&db, "my-host.example.org")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn regenerated_secret_replaces_the_old_one() {
    let db = test_db().await;
    let dns = MockDns::default();
    let user = test_user(&db, "alice").await;
    seed_domain(&db, &user, "example.org").await;
    let claimed = lifecycle::claim_host(&db, &user, &claim_req("my-host", "example.org"))
        .await
        .unwrap();

    let new_secret = lifecycle::regenerate_secret(&db, claimed.host.id, &user)
        .await
        .unwrap();
    assert_ne!(new_secret, claimed.secret);

    let addr: IpAddr = "198.51.100.7".parse().unwrap();
    let err = lifecycle::submit_address_update(
        &db,
        &dns,
        "my-host.example.org",
        &claimed.secret,
        addr,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Authentication));

    lifecycle::submit_address_update(&db, &dns, "my-host.example.org", &new_secret, addr)
        .await
        .unwrap();
}

#[tokio::test]
async fn duplicate_domain_name_is_a_conflict() {
    let db = test_db().await;
    let user = test_user(&db, "alice").await;
    seed_domain(&db, &user, "example.org").await;

    let err = lifecycle::create_domain(
        &db,
        &user,
        &perch::lifecycle::DomainRequest {
            name: "example.org".to_string(),
            nameserver_ip: "127.0.0.2".to_string(),
            update_key: common::TEST_UPDATE_KEY.to_string(),
            update_algorithm: "HMAC_SHA512".to_string(),
            available_for_everyone: true,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn domain_creation_validates_inputs() {
    let db = test_db().await;
    let user = test_user(&db, "alice").await;

    let base = |key: &str, ip: &str, alg: &str| perch::lifecycle::DomainRequest {
        name: "example.org".to_string(),
        nameserver_ip: ip.to_string(),
        update_key: key.to_string(),
        update_algorithm: alg.to_string(),
        available_for_everyone: true,
    };

    for req in [
        base("not base64!!", "127.0.0.1", "HMAC_SHA512"),
        base(common::TEST_UPDATE_KEY, "not-an-ip", "HMAC_SHA512"),
        base(common::TEST_UPDATE_KEY, "127.0.0.1", "HMAC_MD5"),
    ] {
        let err = lifecycle::create_domain(&db, &user, &req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
    }
}
