use crate::config::Number;
use wide::f32x8;

const LANES: usize = 8;

/// Squared Euclidean distance between two vectors of equal length using SIMD operations.
/// Callers validate the lengths; a shorter `b` only contributes its overlapping prefix.
pub fn squared_euclidean_distance_simd(a: &[Number], b: &[Number]) -> Number {
    debug_assert_eq!(a.len(), b.len());

    let len = a.len().min(b.len());
    let simd_len = len - (len % LANES);
    let mut acc = f32x8::splat(0.0);

    // SIMD loop
    for i in (0..simd_len).step_by(LANES) {
        let va = f32x8::new([
            a[i],
            a[i + 1],
            a[i + 2],
            a[i + 3],
            a[i + 4],
            a[i + 5],
            a[i + 6],
            a[i + 7],
        ]);
        let vb = f32x8::new([
            b[i],
            b[i + 1],
            b[i + 2],
            b[i + 3],
            b[i + 4],
            b[i + 5],
            b[i + 6],
            b[i + 7],
        ]);
        let diff = va - vb;
        acc += diff * diff;
    }

    let mut distance = acc.reduce_add();

    // Handle remaining elements
    for i in simd_len..len {
        let diff = a[i] - b[i];
        distance += diff * diff;
    }

    distance
}
