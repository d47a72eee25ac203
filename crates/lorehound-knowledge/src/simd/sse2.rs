//! x86 SSE2 SIMD intrinsics for dot product.
//!
//! SSE2 is baseline on every x86_64 CPU, so this path needs no runtime
//! feature check. Processes 4 floats per iteration (128-bit vectors).

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

/// SSE2-accelerated dot product (4 floats per iteration).
#[cfg(target_arch = "x86_64")]
pub fn dot_product_sse2(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let n = a.len();

    unsafe {
        let mut sum_vec = _mm_setzero_ps();
        let chunks = n / 4;

        for i in 0..chunks {
            let offset = i * 4;
            let va = _mm_loadu_ps(a.as_ptr().add(offset));
            let vb = _mm_loadu_ps(b.as_ptr().add(offset));
            sum_vec = _mm_add_ps(sum_vec, _mm_mul_ps(va, vb));
        }

        // Horizontal sum of 4 lanes
        let hi64 = _mm_movehl_ps(sum_vec, sum_vec);
        let sum64 = _mm_add_ps(sum_vec, hi64);
        let hi32 = _mm_shuffle_ps(sum64, sum64, 1);
        let total = _mm_add_ss(sum64, hi32);
        let mut sum = _mm_cvtss_f32(total);

        // Tail
        for i in (chunks * 4)..n {
            sum += a[i] * b[i];
        }

        sum
    }
}

/// Scalar fallback for non-x86_64.
#[cfg(not(target_arch = "x86_64"))]
pub fn dot_product_sse2(a: &[f32], b: &[f32]) -> f32 {
    super::dot_product_scalar(a, b)
}
