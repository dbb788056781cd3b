//! memcmp

/// Compares two slices of memory content and returns whether they are equal.
///
/// Used wherever a received MAC, a decrypted cookie or a stored address is matched against a
/// locally computed value.
///
/// ## Leaks
/// If the two slices have differents lengths, the function will return immediately. This
/// effectively leaks the information whether the slices have equal length or not. This is widely
/// considered safe.
///
/// The execution time of the function grows approx. linear with the length of the input. This is
/// considered safe.
///
/// ## Examples
///
/// ```rust
/// use rampart_constant_time::memcmp;
/// let mac1 = [0x4d; 16];
/// let mut forged = mac1;
/// forged[15] ^= 1;
/// assert!(memcmp(&mac1, &mac1));
/// assert!(!memcmp(&mac1, &forged));
/// assert!(!memcmp(&mac1, &mac1[..15]));
/// ```
#[inline]
pub fn memcmp(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && unsafe { memsec::memeq(a.as_ptr(), b.as_ptr(), a.len()) }
}
