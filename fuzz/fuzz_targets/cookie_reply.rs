#![no_main]
extern crate rampart;

use libfuzzer_sys::fuzz_target;

use rampart::cookie::CookieMaker;

fuzz_target!(|payload: &[u8]| {
    let maker = CookieMaker::new(&[0; 32]);
    let _ = maker.compute_macs(b"initiation");

    // Forgeries must never yield a cookie
    assert!(maker.consume_cookie_reply_payload(payload).is_err());
    assert!(!maker.has_usable_cookie());
});
