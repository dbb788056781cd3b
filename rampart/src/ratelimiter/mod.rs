//! Per source address token bucket rate limiting
//!
//! Every source address owns a bucket of tokens, one token per nanosecond of accrued budget.
//! Tokens accrue with time up to a maximum; each admitted initiation spends a fixed cost.
//!
//! The table has a fixed number of buckets and a hard cap on the number of entries, so memory
//! stays bounded no matter how many distinct addresses an attacker spoofs. Idle entries are
//! garbage collected lazily when an unknown address is seen. All operations take one table-wide
//! lock.
//!
//! ```
//! use std::net::SocketAddr;
//! use rampart::ratelimiter::{RateLimitVerdict, RateLimiter};
//!
//! let limiter = RateLimiter::new();
//! let addr: SocketAddr = "198.51.100.3:9".parse()?;
//!
//! // The default budget allows a burst of five initiations
//! for _ in 0..5 {
//!     assert_eq!(limiter.allow(&addr.into()), RateLimitVerdict::Allowed);
//! }
//! assert_eq!(limiter.allow(&addr.into()), RateLimitVerdict::Denied);
//! # Ok::<(), std::net::AddrParseError>(())
//! ```

mod pool;

use std::fmt;

use parking_lot::Mutex;

use rampart_ciphers::keyed_hash::mac;
use rampart_util::rand::random_bytes;
use rampart_util::time::{Clock, Timebase, Timestamp};

use crate::address::{AddrKey, SourceAddr};
use crate::config::RateLimiterConfig;

use pool::{Entry, EntryIdx, EntryPool};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitVerdict {
    Allowed,
    Denied,
}

/// Rate limiter parameters in nanoseconds and tokens
#[derive(Debug, Clone, Copy)]
struct Params {
    element_timeout: u64,
    token_max: u64,
    initiation_cost: u64,
    table_size: usize,
    max_entries: usize,
    ipv6_prefix_bytes: usize,
}

impl From<&RateLimiterConfig> for Params {
    fn from(cfg: &RateLimiterConfig) -> Self {
        Self {
            element_timeout: cfg.element_timeout_ns(),
            token_max: cfg.token_max_ns,
            initiation_cost: cfg.initiation_cost_ns,
            table_size: cfg.table_size,
            max_entries: cfg.max_entries(),
            ipv6_prefix_bytes: cfg.ipv6_prefix_bytes,
        }
    }
}

#[derive(Debug)]
struct Table {
    /// Head of each bucket's list of entries
    buckets: Vec<Option<EntryIdx>>,
    pool: EntryPool,
    last_gc: Timestamp,
}

impl Table {
    fn find(&self, slot: usize, key: &AddrKey) -> Option<EntryIdx> {
        let mut cur = *self.buckets.get(slot)?;
        while let Some(idx) = cur {
            let entry = self.pool.get(idx)?;
            if entry.key.ct_eq(key) {
                return Some(idx);
            }
            cur = entry.next;
        }
        None
    }

    fn insert(&mut self, slot: usize, mut entry: Entry) -> Option<EntryIdx> {
        let head = self.buckets.get_mut(slot)?;
        entry.next = *head;
        let idx = self.pool.alloc(entry)?;
        *head = Some(idx);
        Some(idx)
    }

    fn flush(&mut self) {
        self.buckets.fill(None);
        self.pool.clear();
    }

    /// Removes every entry last updated before `cutoff`; returns the number removed
    fn sweep(&mut self, cutoff: Timestamp) -> usize {
        let mut removed = 0;
        for bucket in 0..self.buckets.len() {
            let mut prev: Option<EntryIdx> = None;
            let mut cur = self.buckets[bucket];
            while let Some(idx) = cur {
                let Some(entry) = self.pool.get(idx) else {
                    break;
                };
                let next = entry.next;

                if entry.last_update < cutoff {
                    self.pool.free(idx);
                    match prev.and_then(|p| self.pool.get_mut(p)) {
                        Some(prev_entry) => prev_entry.next = next,
                        None => self.buckets[bucket] = next,
                    }
                    removed += 1;
                } else {
                    prev = Some(idx);
                }
                cur = next;
            }
        }
        removed
    }
}

pub struct RateLimiter<C: Clock = Timebase> {
    table: Mutex<Table>,
    /// Keys the hash mapping addresses to buckets, fixed for the lifetime of the table
    salt: [u8; 32],
    params: Params,
    clock: C,
}

impl RateLimiter<Timebase> {
    /// Creates a rate limiter with the default configuration on the system clock
    pub fn new() -> Self {
        Self::build(&RateLimiterConfig::default(), Timebase::default())
    }
}

impl Default for RateLimiter<Timebase> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> RateLimiter<C> {
    pub fn with_config(cfg: &RateLimiterConfig, clock: C) -> anyhow::Result<Self> {
        cfg.validate()?;
        Ok(Self::build(cfg, clock))
    }

    fn build(cfg: &RateLimiterConfig, clock: C) -> Self {
        let params = Params::from(cfg);
        let table = Table {
            buckets: vec![None; params.table_size],
            pool: EntryPool::new(params.max_entries),
            last_gc: clock.now(),
        };
        Self {
            table: Mutex::new(table),
            salt: random_bytes(),
            params,
            clock,
        }
    }

    /// Decides whether a handshake initiation from `addr` may be processed
    ///
    /// Unknown addresses start with a full bucket minus the cost of this initiation. Unsupported
    /// address families are always denied, and so are new addresses once the table is full.
    pub fn allow(&self, addr: &SourceAddr) -> RateLimitVerdict {
        let Some(key) = AddrKey::new(addr, self.params.ipv6_prefix_bytes) else {
            log::debug!("rate limiter: denying {addr}");
            return RateLimitVerdict::Denied;
        };
        let slot = self.slot_of(&key);

        let mut table = self.table.lock();
        let now = self.clock.now();

        if let Some(idx) = table.find(slot, &key) {
            return match table.pool.get_mut(idx) {
                Some(entry) => self.spend(entry, now, addr),
                None => RateLimitVerdict::Denied,
            };
        }

        self.collect_garbage(&mut table, now);

        if table.pool.len() >= self.params.max_entries {
            log::debug!("rate limiter: table full, denying new address {addr}");
            return RateLimitVerdict::Denied;
        }

        let entry = Entry {
            key,
            tokens: self.params.token_max - self.params.initiation_cost,
            last_update: now,
            next: None,
        };
        match table.insert(slot, entry) {
            Some(_) => RateLimitVerdict::Allowed,
            None => {
                log::debug!("rate limiter: entry pool exhausted, denying new address {addr}");
                RateLimitVerdict::Denied
            }
        }
    }

    fn spend(&self, entry: &mut Entry, now: Timestamp, addr: &SourceAddr) -> RateLimitVerdict {
        let elapsed = now.saturating_nanos_since(entry.last_update);
        let tokens = entry
            .tokens
            .saturating_add(elapsed)
            .min(self.params.token_max);
        entry.last_update = now;

        if tokens >= self.params.initiation_cost {
            entry.tokens = tokens - self.params.initiation_cost;
            RateLimitVerdict::Allowed
        } else {
            entry.tokens = tokens;
            log::debug!("rate limiter: {addr} exhausted its budget");
            RateLimitVerdict::Denied
        }
    }

    /// Runs at most once per element timeout, and only while the table holds entries
    fn collect_garbage(&self, table: &mut Table, now: Timestamp) {
        let timeout = self.params.element_timeout;
        if table.pool.len() == 0 || now.saturating_nanos_since(table.last_gc) <= timeout {
            return;
        }

        let cutoff = Timestamp::from_nanos(now.as_nanos().saturating_sub(timeout));
        let removed = table.sweep(cutoff);
        table.last_gc = now;
        log::trace!(
            "rate limiter: garbage collected {removed} idle entries, {} remain",
            table.pool.len()
        );
    }

    /// Garbage collects idle entries; `force` drops every entry regardless of age
    pub fn garbage_collect(&self, force: bool) {
        let mut table = self.table.lock();
        if force {
            table.flush();
            log::trace!("rate limiter: flushed");
        } else {
            let now = self.clock.now();
            self.collect_garbage(&mut table, now);
        }
    }

    /// Forgets every address
    pub fn flush(&self) {
        self.garbage_collect(true);
    }

    /// Number of addresses currently tracked
    pub fn len(&self) -> usize {
        self.table.lock().pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The most addresses this table will ever track at once
    pub fn max_entries(&self) -> usize {
        self.params.max_entries
    }

    fn slot_of(&self, key: &AddrKey) -> usize {
        let digest = mac(&self.salt, &[&[key.family() as u8], key.bytes()]);
        let mut word = [0u8; 8];
        word.copy_from_slice(&digest[..8]);
        // Table sizes are validated to fit into 32 bits
        (u64::from_le_bytes(word) % self.params.table_size as u64) as usize
    }

    /// Tokens currently held by the bucket of `addr`, without refilling it
    #[cfg(test)]
    pub(crate) fn tokens(&self, addr: &SourceAddr) -> Option<u64> {
        let key = AddrKey::new(addr, self.params.ipv6_prefix_bytes)?;
        let slot = self.slot_of(&key);
        let table = self.table.lock();
        let idx = table.find(slot, &key)?;
        table.pool.get(idx).map(|e| e.tokens)
    }
}

impl<C: Clock> fmt::Debug for RateLimiter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("params", &self.params)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr, SocketAddrV4, SocketAddrV6};
    use std::sync::Arc;
    use std::time::Duration;

    use rampart_util::time::ManualClock;

    use crate::constants::{INITIATION_COST, TOKEN_MAX};

    fn v4(a: u8, b: u8, c: u8, d: u8) -> SourceAddr {
        SocketAddrV4::new(Ipv4Addr::new(a, b, c, d), 51820).into()
    }

    fn v6(s: &str) -> SourceAddr {
        SocketAddrV6::new(s.parse::<Ipv6Addr>().unwrap(), 51820, 0, 0).into()
    }

    fn limiter(cfg: RateLimiterConfig) -> (RateLimiter<Arc<ManualClock>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let limiter = RateLimiter::with_config(&cfg, clock.clone()).unwrap();
        (limiter, clock)
    }

    fn small_table() -> RateLimiterConfig {
        RateLimiterConfig {
            table_size: 4,
            max_entries_multiplier: 2,
            ..RateLimiterConfig::default()
        }
    }

    #[test]
    fn new_address_starts_with_full_bucket_minus_cost() {
        let (limiter, _) = limiter(RateLimiterConfig::default());
        let addr = v4(192, 0, 2, 1);
        assert_eq!(limiter.allow(&addr), RateLimitVerdict::Allowed);
        let cfg = RateLimiterConfig::default();
        assert_eq!(
            limiter.tokens(&addr),
            Some(cfg.token_max_ns - cfg.initiation_cost_ns)
        );
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn tokens_refill_with_time_up_to_the_maximum() {
        let (limiter, clock) = limiter(RateLimiterConfig::default());
        let addr = v4(192, 0, 2, 1);
        let cost = INITIATION_COST;

        for _ in 0..5 {
            assert_eq!(limiter.allow(&addr), RateLimitVerdict::Allowed);
        }
        assert_eq!(limiter.allow(&addr), RateLimitVerdict::Denied);
        assert_eq!(limiter.tokens(&addr), Some(0));

        clock.advance(Duration::from_nanos(cost - 1));
        assert_eq!(limiter.allow(&addr), RateLimitVerdict::Denied);
        // A denied attempt keeps the refill it accrued
        assert_eq!(limiter.tokens(&addr), Some(cost - 1));

        clock.advance(Duration::from_nanos(1));
        assert_eq!(limiter.allow(&addr), RateLimitVerdict::Allowed);

        // Long idle periods never accrue more than the maximum
        clock.advance(Duration::from_millis(900));
        assert_eq!(limiter.allow(&addr), RateLimitVerdict::Allowed);
        assert_eq!(limiter.tokens(&addr), Some(TOKEN_MAX - cost));
    }

    #[test]
    fn denies_unsupported_address_families() {
        let (limiter, _) = limiter(RateLimiterConfig::default());
        assert_eq!(
            limiter.allow(&SourceAddr::Unsupported),
            RateLimitVerdict::Denied
        );
        assert!(limiter.is_empty());
    }

    #[test]
    fn ipv6_hosts_in_one_prefix_share_a_bucket() {
        let (limiter, _) = limiter(RateLimiterConfig::default());
        let a = v6("2001:db8:0:1::1");
        let b = v6("2001:db8:0:1::2");
        let other = v6("2001:db8:0:2::1");

        assert_eq!(limiter.allow(&a), RateLimitVerdict::Allowed);
        assert_eq!(limiter.allow(&b), RateLimitVerdict::Allowed);
        assert_eq!(limiter.allow(&other), RateLimitVerdict::Allowed);
        assert_eq!(limiter.len(), 2);
        assert_eq!(limiter.tokens(&a), limiter.tokens(&b));
    }

    #[test]
    fn table_is_bounded_by_the_hard_cap() {
        let (limiter, _) = limiter(small_table());
        assert_eq!(limiter.max_entries(), 8);

        let mut allowed = 0;
        for i in 0..=255u8 {
            if limiter.allow(&v4(10, 0, 1, i)) == RateLimitVerdict::Allowed {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 8);
        assert_eq!(limiter.len(), 8);

        // Known addresses keep being served while the table is full
        assert_eq!(limiter.allow(&v4(10, 0, 1, 0)), RateLimitVerdict::Allowed);
    }

    #[test]
    fn idle_entries_are_collected_on_the_next_unknown_address() {
        let (limiter, clock) = limiter(small_table());
        for i in 0..8u8 {
            limiter.allow(&v4(10, 0, 2, i));
        }
        assert_eq!(limiter.allow(&v4(10, 0, 3, 0)), RateLimitVerdict::Denied);

        // Within the timeout nothing is collected
        clock.advance(Duration::from_millis(1000));
        assert_eq!(limiter.allow(&v4(10, 0, 3, 0)), RateLimitVerdict::Denied);
        assert_eq!(limiter.len(), 8);

        // Keep one entry alive
        clock.advance(Duration::from_millis(500));
        assert_eq!(limiter.allow(&v4(10, 0, 2, 7)), RateLimitVerdict::Allowed);
        clock.advance(Duration::from_millis(600));

        assert_eq!(limiter.allow(&v4(10, 0, 3, 0)), RateLimitVerdict::Allowed);
        assert_eq!(limiter.len(), 2);
        assert!(limiter.tokens(&v4(10, 0, 2, 7)).is_some());
        assert!(limiter.tokens(&v4(10, 0, 2, 0)).is_none());
    }

    #[test]
    fn garbage_collection_respects_its_interval() {
        let (limiter, clock) = limiter(RateLimiterConfig::default());
        limiter.allow(&v4(10, 0, 0, 1));

        clock.advance(Duration::from_secs(2));
        limiter.garbage_collect(false);
        assert!(limiter.is_empty());

        // The last run was just now; a fresh idle entry survives until the interval passes
        limiter.allow(&v4(10, 0, 0, 2));
        clock.advance(Duration::from_millis(1000));
        limiter.garbage_collect(false);
        assert_eq!(limiter.len(), 1);

        clock.advance(Duration::from_millis(1));
        limiter.garbage_collect(false);
        assert!(limiter.is_empty());
    }

    #[test]
    fn flush_forgets_everything() {
        let (limiter, _) = limiter(RateLimiterConfig::default());
        for i in 0..100u8 {
            limiter.allow(&v4(10, 1, 0, i));
        }
        assert_eq!(limiter.len(), 100);
        limiter.flush();
        assert!(limiter.is_empty());
        assert_eq!(limiter.tokens(&v4(10, 1, 0, 1)), None);
        assert_eq!(limiter.allow(&v4(10, 1, 0, 1)), RateLimitVerdict::Allowed);
    }

    #[test]
    fn removal_keeps_bucket_chains_intact() {
        // A single bucket forces every address onto one chain
        let cfg = RateLimiterConfig {
            table_size: 1,
            max_entries_multiplier: 16,
            ..RateLimiterConfig::default()
        };
        let (limiter, clock) = limiter(cfg);
        for i in 0..6u8 {
            limiter.allow(&v4(10, 2, 0, i));
        }

        clock.advance(Duration::from_millis(1500));
        // Refresh every other entry, spread over the chain
        for i in (0..6u8).step_by(2) {
            limiter.allow(&v4(10, 2, 0, i));
        }
        clock.advance(Duration::from_millis(600));
        limiter.garbage_collect(false);

        assert_eq!(limiter.len(), 3);
        for i in 0..6u8 {
            assert_eq!(limiter.tokens(&v4(10, 2, 0, i)).is_some(), i % 2 == 0);
        }
    }

    #[test]
    fn rejects_invalid_configuration() {
        let cfg = RateLimiterConfig {
            initiation_cost_ns: 0,
            ..RateLimiterConfig::default()
        };
        assert!(RateLimiter::with_config(&cfg, Timebase::default()).is_err());
    }
}
