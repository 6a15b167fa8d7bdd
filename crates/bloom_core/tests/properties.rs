use bloom_core::{expand, BloomFilter, Xxh3Hasher};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_keys(rng: &mut StdRng, n: usize) -> Vec<u64> {
    (0..n).map(|_| rng.random::<u64>()).collect()
}

#[test]
fn no_false_negatives() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut f = BloomFilter::with_error_rate(2_000, 0.01).unwrap();
    let keys = random_keys(&mut rng, 2_000);
    for (i, k) in keys.iter().enumerate() {
        f.insert(&k.to_le_bytes());
        assert!(f.query(&k.to_le_bytes()));
        if i % 100 == 0 {
            assert!(keys[..=i].iter().all(|k| f.query(&k.to_le_bytes())));
        }
    }
    assert!(keys.iter().all(|k| f.query(&k.to_le_bytes())));
}

#[test]
fn expansion_is_deterministic() {
    let a: Vec<u64> = expand(&Xxh3Hasher, b"same key", 9, 123_457).collect();
    for _ in 0..10 {
        assert_eq!(expand(&Xxh3Hasher, b"same key", 9, 123_457).collect::<Vec<_>>(), a);
    }
}

#[test]
fn sizing_matches_policies() {
    let t = BloomFilter::with_error_rate_and_k(1_000, 0.01, 5).unwrap();
    assert_eq!(t.bits_per_element(), 10);
    assert_eq!(t.n_bits(), 10_000);

    let o = BloomFilter::with_error_rate(1_000, 0.01).unwrap();
    assert_eq!(o.bits_per_element(), 10);
    assert_eq!(o.k(), 7);
    assert_eq!(o.n_bits(), 10_000);

    let e = BloomFilter::with_bits(1_000, 12, 3).unwrap();
    assert_eq!(e.n_bits(), 12_000);
    assert!(e.error_rate().is_nan());
}

#[test]
fn false_positive_rate_within_bound() {
    let capacity = 10_000u64;
    let mut rng = StdRng::seed_from_u64(0xB100_F1);
    for mut f in [
        BloomFilter::with_error_rate(capacity, 0.01).unwrap(),
        BloomFilter::with_error_rate_and_k(capacity, 0.01, 5).unwrap(),
    ] {
        let inserted: Vec<u64> = random_keys(&mut rng, capacity as usize);
        for k in &inserted {
            f.insert(&k.to_le_bytes());
        }
        // Probes are tagged so they can never collide with inserted keys.
        let probes = 100_000u64;
        let hits = (0..probes)
            .filter(|i| f.query(format!("probe-{i}").as_str()))
            .count();
        let rate = hits as f64 / probes as f64;
        assert!(rate <= 0.0175, "false positive rate {rate} too high");
        assert!(f.fill_ratio() > 0.3 && f.fill_ratio() < 0.7);
    }
}
