criterion::criterion_main!(keyed_hash::benches, aead::benches);

fn benchid(base: KvPairs, last: KvPairs) -> String {
    format!("{base},{last}")
}

#[derive(Clone, Copy, Debug)]
struct KvPair<'a>(&'a str, &'a str);

impl std::fmt::Display for KvPair<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{k}={v}", k = self.0, v = self.1)
    }
}

#[derive(Clone, Copy, Debug)]
struct KvPairs<'a>(&'a [KvPair<'a>]);

impl std::fmt::Display for KvPairs<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut delim = "";
        for pair in self.0 {
            write!(f, "{delim}{pair}")?;
            delim = ",";
        }
        Ok(())
    }
}

mod aead {
    criterion::criterion_group!(benches, bench_xchachapoly_rustcrypto);

    use criterion::Criterion;
    use rampart_cipher_traits::Aead;
    use rampart_ciphers::xaead::{KEY_LEN, NONCE_LEN, TAG_LEN};

    // The only payload this crate ever seals is a cookie
    const DATA_LEN: usize = 16;

    fn bench_xchachapoly_rustcrypto(c: &mut Criterion) {
        use crate::{benchid, KvPair, KvPairs};

        let scheme = rampart_ciphers::XAead::default();

        let base = [
            KvPair("primitive", "aead"),
            KvPair("algorithm", "xchacha20poly1305"),
            KvPair("implementation", "rustcrypto"),
            KvPair("length", "16byte"),
        ];
        let aead_benchid = |op| benchid(KvPairs(&base), KvPairs(&[KvPair("operation", op)]));

        let key = [12; KEY_LEN];
        let nonce = [23; NONCE_LEN];
        let ad = [45u8; 16];
        let ptxt = [34u8; DATA_LEN];

        c.bench_function(&aead_benchid("encrypt"), |bench| {
            let mut ctxt = [0; DATA_LEN + TAG_LEN];

            bench.iter(|| {
                scheme.encrypt(&mut ctxt, &key, &nonce, &ad, &ptxt).unwrap();
            });
        });

        c.bench_function(&aead_benchid("decrypt"), |bench| {
            let mut ctxt = [0; DATA_LEN + TAG_LEN];
            let mut ptxt_out = [0u8; DATA_LEN];

            scheme.encrypt(&mut ctxt, &key, &nonce, &ad, &ptxt).unwrap();

            bench.iter(|| {
                scheme
                    .decrypt(&mut ptxt_out, &key, &nonce, &ad, &ctxt)
                    .unwrap()
            })
        });
    }
}

mod keyed_hash {
    criterion::criterion_group!(benches, bench_blake2s_mac, bench_blake2s_hash);

    use criterion::Criterion;
    use rampart_ciphers::{hash::hash, keyed_hash::mac};

    fn lengths() -> [(&'static str, usize); 3] {
        [("32byte", 32), ("148byte", 148), ("1024byte", 1024)]
    }

    fn bench_blake2s_mac(c: &mut Criterion) {
        use crate::{benchid, KvPair, KvPairs};

        let key = [12u8; 32];
        let base = [
            KvPair("primitive", "keyedhash"),
            KvPair("algorithm", "blake2s"),
            KvPair("implementation", "rustcrypto"),
            KvPair("operation", "mac"),
        ];

        for (name, len) in lengths() {
            let bytes = vec![34u8; len];
            let id = benchid(KvPairs(&base), KvPairs(&[KvPair("length", name)]));
            c.bench_function(&id, |bench| bench.iter(|| mac(&key, &[&bytes])));
        }
    }

    fn bench_blake2s_hash(c: &mut Criterion) {
        use crate::{benchid, KvPair, KvPairs};

        let base = [
            KvPair("primitive", "hash"),
            KvPair("algorithm", "blake2s"),
            KvPair("implementation", "rustcrypto"),
            KvPair("operation", "hash"),
        ];

        for (name, len) in lengths() {
            let bytes = vec![34u8; len];
            let id = benchid(KvPairs(&base), KvPairs(&[KvPair("length", name)]));
            c.bench_function(&id, |bench| bench.iter(|| hash(&[&bytes])));
        }
    }
}
