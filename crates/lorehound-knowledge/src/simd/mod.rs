//! SIMD acceleration module.
//!
//! Platform-specific SIMD intrinsics for the dot products behind cosine
//! similarity. The instruction set is probed once at backend selection time;
//! scoring then dispatches on the probed level without re-checking.
//!
//! Supported architectures:
//! - ARM64 (aarch64): NEON — 128-bit vectors (Raspberry Pi 4/5, Apple Silicon)
//! - x86_64 + SSE2: 128-bit vectors (all x86_64 CPUs)
//! - x86_64 + AVX2: 256-bit vectors (Intel Haswell+, AMD Zen+)

pub mod avx2;
pub mod neon;
pub mod sse2;

/// Instruction set chosen by the runtime probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdIsa {
    Avx2,
    Sse2,
    Neon,
}

impl std::fmt::Display for SimdIsa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimdIsa::Avx2 => write!(f, "avx2"),
            SimdIsa::Sse2 => write!(f, "sse2"),
            SimdIsa::Neon => write!(f, "neon"),
        }
    }
}

/// Probe the CPU for the best available SIMD level.
///
/// Returns `None` when no supported instruction set exists; callers fall
/// back to scalar code.
pub fn detect() -> Option<SimdIsa> {
    #[cfg(target_arch = "x86_64")]
    {
        if std::arch::is_x86_feature_detected!("avx2")
            && std::arch::is_x86_feature_detected!("fma")
        {
            return Some(SimdIsa::Avx2);
        }
        // SSE2 is baseline on x86_64
        Some(SimdIsa::Sse2)
    }

    #[cfg(target_arch = "aarch64")]
    {
        // NEON is baseline on aarch64
        Some(SimdIsa::Neon)
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        None
    }
}

/// Dot product dispatched on the probed instruction set.
///
/// `isa` must come from [`detect`] on this machine.
pub fn dot_product(isa: SimdIsa, a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    match isa {
        SimdIsa::Avx2 => avx2::dot_product_avx2(a, b),
        SimdIsa::Sse2 => sse2::dot_product_sse2(a, b),
        SimdIsa::Neon => neon::dot_product_neon(a, b),
    }
}

/// Scalar dot product — the fallback and the correctness oracle.
pub fn dot_product_scalar(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_product_simd() {
        let a = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let b = vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        if let Some(isa) = detect() {
            let result = dot_product(isa, &a, &b);
            assert!((result - 36.0).abs() < 1e-4, "got {result}");
        }
        let scalar = dot_product_scalar(&a, &b);
        assert!((scalar - 36.0).abs() < 1e-4, "got {scalar}");
    }

    #[test]
    fn test_simd_matches_scalar() {
        let a: Vec<f32> = (1..=37).map(|x| x as f32 * 0.25).collect();
        let b: Vec<f32> = (1..=37).map(|x| (38 - x) as f32 * 0.5).collect();
        let expected = dot_product_scalar(&a, &b);
        if let Some(isa) = detect() {
            let result = dot_product(isa, &a, &b);
            assert!(
                (result - expected).abs() < expected.abs() * 1e-5 + 1e-4,
                "got {result}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_empty_vectors() {
        assert_eq!(dot_product_scalar(&[], &[]), 0.0);
        if let Some(isa) = detect() {
            assert_eq!(dot_product(isa, &[], &[]), 0.0);
        }
    }
}
