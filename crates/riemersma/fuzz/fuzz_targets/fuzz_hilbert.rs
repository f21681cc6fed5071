#![no_main]

use libfuzzer_sys::fuzz_target;
use riemersma::HilbertPoints;

fuzz_target!(|level: u8| {
    let level = (level % 9) as u32;
    let side = 1i64 << level;
    let mut seen = vec![false; (side * side) as usize];

    for (x, y) in HilbertPoints::new(level) {
        assert!((0..side).contains(&x) && (0..side).contains(&y));
        let i = (y * side + x) as usize;
        assert!(!seen[i], "cell visited twice");
        seen[i] = true;
    }
    assert!(seen.iter().all(|&v| v));
});
