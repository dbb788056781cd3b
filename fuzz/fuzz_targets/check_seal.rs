#![no_main]
extern crate rampart;

use std::net::{Ipv4Addr, SocketAddrV4};

use libfuzzer_sys::fuzz_target;

use rampart::cookie::CookieChecker;

fuzz_target!(|rx_buf: &[u8]| {
    let checker = CookieChecker::new();
    checker.update_keys(Some(&[0; 32]));
    let addr = SocketAddrV4::new(Ipv4Addr::LOCALHOST, 51820).into();

    // We expect errors while fuzzing therefore we do not check the result.
    let _ = checker.check_seal(rx_buf, false, &addr);
    let _ = checker.check_seal(rx_buf, true, &addr);
});
