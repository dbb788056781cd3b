use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;
use std::thread;

use rampart::address::SourceAddr;
use rampart::config::Rampart;
use rampart::cookie::{CookieChecker, CookieMaker, MacVerdict};
use rampart::ratelimiter::{RateLimitVerdict, RateLimiter};
use rampart_util::time::ManualClock;

const SHARED_SECRET: [u8; 32] = [0x24; 32];
const THREADS: u8 = 8;

fn addr(host: u8) -> SourceAddr {
    SocketAddrV4::new(Ipv4Addr::new(203, 0, 113, host), 51820).into()
}

#[test]
fn checker_is_shared_across_threads() {
    let clock = Arc::new(ManualClock::default());
    let checker = Arc::new(CookieChecker::with_config(&Rampart::default(), clock.clone()).unwrap());
    checker.update_keys(Some(&SHARED_SECRET));

    let handles: Vec<_> = (0..THREADS)
        .map(|host| {
            let checker = checker.clone();
            let clock = clock.clone();
            thread::spawn(move || {
                let maker =
                    CookieMaker::with_config(&SHARED_SECRET, &Default::default(), clock).unwrap();
                let src = addr(host);
                let msg = [host; 64];

                let macs = maker.compute_macs(&msg);
                assert_eq!(
                    checker.validate_macs(&msg, &macs.mac1, &macs.mac2, true, &src),
                    MacVerdict::NeedsCookie
                );
                let reply = checker
                    .create_cookie_reply_payload(&macs.mac1, &src)
                    .unwrap();
                maker
                    .consume_cookie_reply(&reply.nonce, &reply.ciphertext)
                    .unwrap();

                // Each source spends its own budget of five
                let mut verdicts = Vec::new();
                for _ in 0..6 {
                    let macs = maker.compute_macs(&msg);
                    verdicts.push(checker.validate_macs(&msg, &macs.mac1, &macs.mac2, true, &src));
                }
                verdicts
            })
        })
        .collect();

    for handle in handles {
        let verdicts = handle.join().unwrap();
        assert_eq!(&verdicts[..5], &[MacVerdict::Ok; 5]);
        assert_eq!(verdicts[5], MacVerdict::RateLimited);
    }
    assert_eq!(checker.rate_limiter().len(), THREADS as usize);
}

#[test]
fn concurrent_cookies_agree_on_one_secret() {
    let checker = Arc::new(CookieChecker::new());
    let src = addr(1);

    let cookies: Vec<_> = (0..THREADS)
        .map(|_| {
            let checker = checker.clone();
            thread::spawn(move || checker.make_cookie(&src))
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|h| h.join().unwrap())
        .collect();

    // Only one thread rotated the secret in
    assert!(cookies.iter().all(|c| *c == cookies[0]));
}

#[test]
fn rate_limiter_budget_is_not_overspent_under_contention() {
    let clock = Arc::new(ManualClock::default());
    let limiter = Arc::new(RateLimiter::with_config(&Default::default(), clock).unwrap());
    let src = addr(7);

    let allowed: usize = (0..THREADS)
        .map(|_| {
            let limiter = limiter.clone();
            thread::spawn(move || {
                (0..100)
                    .filter(|_| limiter.allow(&src) == RateLimitVerdict::Allowed)
                    .count()
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|h| h.join().unwrap())
        .sum();

    assert_eq!(allowed, 5);
}

#[test]
fn rekey_is_atomic_for_readers() {
    let checker = Arc::new(CookieChecker::new());
    checker.update_keys(Some(&SHARED_SECRET));
    let maker = CookieMaker::new(&SHARED_SECRET);
    let other = CookieMaker::new(&[0x25; 32]);
    let src = addr(9);

    let ours = maker.compute_macs(b"msg");
    let theirs = other.compute_macs(b"msg");

    let rekeyer = {
        let checker = checker.clone();
        thread::spawn(move || {
            for i in 0..1000 {
                let key = if i % 2 == 0 { [0x25; 32] } else { SHARED_SECRET };
                checker.update_keys(Some(&key));
            }
        })
    };

    // Every check sees one complete key set or the other
    for _ in 0..1000 {
        let a = checker.validate_macs(b"msg", &ours.mac1, &ours.mac2, false, &src);
        let b = checker.validate_macs(b"msg", &theirs.mac1, &theirs.mac2, false, &src);
        assert!(a == MacVerdict::Ok || a == MacVerdict::Invalid);
        assert!(b == MacVerdict::Ok || b == MacVerdict::Invalid);
    }
    rekeyer.join().unwrap();

    assert_eq!(
        checker.validate_macs(b"msg", &ours.mac1, &ours.mac2, false, &src),
        MacVerdict::Ok
    );
}
