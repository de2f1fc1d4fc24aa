//! Token lifecycle across separate issuing and verifying services

use chrono::Duration;
use service_token::{
    CachingTokenService, Clock, ManualClock, ServiceIdentity, TokenError, TokenService, ValidServiceSet,
};
use std::sync::Arc;

fn service(name: &str, secret: &str, allowed: &[&str], clock: &ManualClock) -> TokenService {
    TokenService::with_clock(
        ServiceIdentity::new(name, secret, Duration::minutes(60)),
        ValidServiceSet::new(allowed.iter().copied()),
        Arc::new(clock.clone()),
    )
}

#[test]
fn test_token_active_until_window_ends() {
    let clock = ManualClock::starting_now();
    let issuer = service("billing", "s1", &[], &clock);
    let verifier = service("ledger", "s1", &["billing"], &clock);
    let issued_at = clock.now();

    let token = issuer.issue().unwrap();

    for offset in [Duration::zero(), Duration::minutes(59), Duration::seconds(3599)] {
        clock.set(issued_at + offset);
        let claims = verifier.verify(token.as_str()).unwrap();
        assert!(verifier.is_authorized(&claims));
        assert!(!claims.is_expired_at(clock.now()), "expired at +{offset}");
    }

    for offset in [Duration::minutes(60), Duration::minutes(61)] {
        clock.set(issued_at + offset);
        let claims = verifier.verify(token.as_str()).unwrap();
        assert!(claims.is_expired_at(clock.now()), "still active at +{offset}");
    }
}

#[test]
fn test_allow_list_membership() {
    let clock = ManualClock::starting_now();
    let token = service("A", "s1", &[], &clock).issue().unwrap();

    let only_b = service("v", "s1", &["B"], &clock);
    let only_a = service("v", "s1", &["A"], &clock);
    let both = service("v", "s1", &["A", "B"], &clock);

    assert!(!only_b.is_authorized(&only_b.verify(token.as_str()).unwrap()));
    assert!(only_a.is_authorized(&only_a.verify(token.as_str()).unwrap()));
    assert!(both.is_authorized(&both.verify(token.as_str()).unwrap()));
}

#[test]
fn test_secret_mismatch_never_verifies() {
    let clock = ManualClock::starting_now();
    let token = service("billing", "k1", &[], &clock).issue().unwrap();
    let verifier = service("ledger", "k2", &["billing"], &clock);

    assert_eq!(
        verifier.verify(token.as_str()),
        Err(TokenError::InvalidSignature)
    );
}

#[test]
fn test_cached_token_verifies_remotely() {
    let clock = ManualClock::starting_now();
    let cache = CachingTokenService::new(Arc::new(service("billing", "s1", &[], &clock)));
    let verifier = service("ledger", "s1", &["billing"], &clock);

    let first = cache.get_or_refresh().unwrap();
    let again = cache.get_or_refresh().unwrap();
    assert_eq!(first, again);

    let claims = verifier.verify(again.as_str()).unwrap();
    assert_eq!(claims.service_name, "billing");

    clock.advance(Duration::minutes(59) + Duration::seconds(1));
    let refreshed = cache.get_or_refresh().unwrap();
    assert!(refreshed.exp() > first.exp());
    assert!(verifier.verify(refreshed.as_str()).is_ok());
}
