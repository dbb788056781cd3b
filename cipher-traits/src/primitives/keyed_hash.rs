/// Models a keyed hash function using an associated function (i.e. without `&self` receiver).
///
/// The input is given as a list of chunks which are hashed as if they were concatenated;
/// this lets callers authenticate `message || mac1` without copying the message.
pub trait KeyedHash<const KEY_LEN: usize, const HASH_LEN: usize> {
    /// The error type used to signal what went wrong.
    ///
    /// Implementations whose key size is fixed by the type use [`core::convert::Infallible`].
    type Error;

    /// Performs a keyed hash using `key` over the concatenation of `data` and writes the
    /// output to `out`
    fn keyed_hash(
        key: &[u8; KEY_LEN],
        data: &[&[u8]],
        out: &mut [u8; HASH_LEN],
    ) -> Result<(), Self::Error>;
}

/// Models an unkeyed hash function.
pub trait Hash<const HASH_LEN: usize> {
    /// Hashes the concatenation of `data` and writes the output to `out`
    fn hash(data: &[&[u8]], out: &mut [u8; HASH_LEN]);
}
