#![no_main]
extern crate arbitrary;
extern crate rampart;

use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;

use libfuzzer_sys::fuzz_target;

use rampart::config::RateLimiterConfig;
use rampart::ratelimiter::RateLimiter;
use rampart_util::time::ManualClock;

#[derive(arbitrary::Arbitrary, Debug)]
pub enum Op {
    Allow { host: u8 },
    Advance { millis: u16 },
    GarbageCollect,
    Flush,
}

fuzz_target!(|ops: Vec<Op>| {
    let cfg = RateLimiterConfig {
        table_size: 4,
        max_entries_multiplier: 2,
        ..Default::default()
    };
    let clock = Arc::new(ManualClock::default());
    let limiter = RateLimiter::with_config(&cfg, clock.clone()).unwrap();

    for op in ops {
        match op {
            Op::Allow { host } => {
                let addr = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, host), 1).into();
                let _ = limiter.allow(&addr);
            }
            Op::Advance { millis } => clock.advance(Duration::from_millis(millis.into())),
            Op::GarbageCollect => limiter.garbage_collect(true),
            Op::Flush => limiter.flush(),
        }
        assert!(limiter.len() <= limiter.max_entries());
    }
});
