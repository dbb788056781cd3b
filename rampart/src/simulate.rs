//! In-process simulation of a responder under attack
//!
//! Runs one [CookieMaker] and one [CookieChecker] against each other on a
//! [ManualClock], so the outcome is deterministic apart from the randomly chosen keys:
//!
//! 1. a legitimate initiator completes the cookie challenge while the responder is under load
//! 2. a spoofed flood is challenged without creating state, then hits the rate limiter table
//!    directly to show that its size stays bounded
//! 3. the legitimate initiator exhausts its burst budget and is rate limited

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddrV4, SocketAddrV6};
use std::sync::Arc;

use anyhow::{ensure, Context};
use log::info;

use rampart_util::rand::random_bytes;
use rampart_util::time::ManualClock;

use crate::address::SourceAddr;
use crate::config::Rampart;
use crate::cookie::{CookieChecker, CookieMaker, MacVerdict};
use crate::keys::SharedSecret;
use crate::msgs::{split_trailer, MAC_TRAILER_LEN};
use crate::ratelimiter::RateLimitVerdict;

/// Length of the simulated handshake messages, trailer included
const MESSAGE_LEN: usize = 116 + MAC_TRAILER_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationParams {
    /// Number of distinct spoofed source addresses
    pub spoofed: usize,
    /// Number of back to back messages sent by the legitimate initiator
    pub burst: usize,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            spoofed: 100_000,
            burst: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationReport {
    pub first_attempt: MacVerdict,
    pub after_cookie: MacVerdict,
    pub spoofed_challenged: usize,
    pub spoofed_allowed: usize,
    pub spoofed_denied: usize,
    pub table_len: usize,
    pub max_entries: usize,
    pub burst_ok: usize,
    pub burst_rate_limited: usize,
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "legitimate initiator")?;
        writeln!(f, "  first attempt under load: {:?}", self.first_attempt)?;
        writeln!(f, "  retry with cookie:        {:?}", self.after_cookie)?;
        writeln!(f, "spoofed flood")?;
        writeln!(f, "  challenged:               {}", self.spoofed_challenged)?;
        writeln!(f, "  admitted to the table:    {}", self.spoofed_allowed)?;
        writeln!(f, "  denied by the table:      {}", self.spoofed_denied)?;
        writeln!(
            f,
            "  table size:               {} of at most {}",
            self.table_len, self.max_entries
        )?;
        writeln!(f, "burst from the legitimate initiator")?;
        writeln!(f, "  accepted:                 {}", self.burst_ok)?;
        write!(f, "  rate limited:             {}", self.burst_rate_limited)
    }
}

/// A distinct address for every `i`, each in its own /64
fn spoofed_addr(i: usize) -> SourceAddr {
    let i = i as u64;
    let mut octets = [0u8; 16];
    octets[..2].copy_from_slice(&[0x20, 0x01]);
    octets[2..8].copy_from_slice(&i.to_be_bytes()[2..]);
    octets[15] = 1;
    SocketAddrV6::new(Ipv6Addr::from(octets), 443, 0, 0).into()
}

pub fn simulate(cfg: &Rampart, params: &SimulationParams) -> anyhow::Result<SimulationReport> {
    let clock = Arc::new(ManualClock::default());
    let shared_secret: SharedSecret = random_bytes();

    let maker = CookieMaker::with_config(&shared_secret, &cfg.cookie, clock.clone())
        .context("invalid cookie configuration")?;
    let checker = CookieChecker::with_config(cfg, clock.clone())?;
    checker.update_keys(Some(&shared_secret));

    let initiator: SourceAddr = SocketAddrV4::new(Ipv4Addr::new(192, 0, 2, 1), 51820).into();
    let mut msg = [0x5au8; MESSAGE_LEN];

    info!("legitimate initiator {initiator} connects while under load");
    maker.seal(&mut msg)?;
    let first_attempt = checker.check_seal(&msg, true, &initiator)?;
    if first_attempt == MacVerdict::NeedsCookie {
        let (_, trailer) = split_trailer(&msg)?;
        let reply = checker.create_cookie_reply_payload(&trailer.mac1, &initiator)?;
        maker.consume_cookie_reply_payload(&reply.to_bytes())?;
    }
    maker.seal(&mut msg)?;
    let after_cookie = checker.check_seal(&msg, true, &initiator)?;
    ensure!(
        after_cookie == MacVerdict::Ok,
        "legitimate initiator was not admitted after the cookie challenge: {after_cookie:?}"
    );

    info!("{} spoofed sources flood the responder", params.spoofed);
    let mut spoofed_msg = [0xa5u8; MESSAGE_LEN];
    let mut spoofed_challenged = 0;
    let mut spoofed_allowed = 0;
    let mut spoofed_denied = 0;
    for i in 0..params.spoofed {
        let addr = spoofed_addr(i);
        // Spoofers know the mac1 key but can never see the cookie reply
        maker.seal(&mut spoofed_msg)?;
        if checker.check_seal(&spoofed_msg, true, &addr)? == MacVerdict::NeedsCookie {
            spoofed_challenged += 1;
        }
        // Worst case: every spoofed packet reaches the rate limiter anyway
        match checker.rate_limiter().allow(&addr) {
            RateLimitVerdict::Allowed => spoofed_allowed += 1,
            RateLimitVerdict::Denied => spoofed_denied += 1,
        }
    }
    let table_len = checker.rate_limiter().len();

    info!("legitimate initiator sends a burst of {}", params.burst);
    // The flood replaced the outstanding mac1, but not the cookie
    let mut burst_ok = 0;
    let mut burst_rate_limited = 0;
    for _ in 0..params.burst {
        maker.seal(&mut msg)?;
        match checker.check_seal(&msg, true, &initiator)? {
            MacVerdict::Ok => burst_ok += 1,
            MacVerdict::RateLimited => burst_rate_limited += 1,
            other => log::warn!("unexpected verdict for the legitimate initiator: {other:?}"),
        }
    }

    Ok(SimulationReport {
        first_attempt,
        after_cookie,
        spoofed_challenged,
        spoofed_allowed,
        spoofed_denied,
        table_len,
        max_entries: checker.rate_limiter().max_entries(),
        burst_ok,
        burst_rate_limited,
    })
}
