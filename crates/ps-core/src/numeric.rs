use crate::{CoreError, CoreResult};

/// Floating point type used throughout the plant.
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> CoreResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Normalize a volume offered to or requested from a device.
///
/// Negative and non-finite volumes carry no fluid and become 0.
pub fn sanitize_volume(volume: Real) -> Real {
    if volume.is_finite() && volume > 0.0 {
        volume
    } else {
        0.0
    }
}

/// Amount a holder of `available` can actually give when asked for `requested`.
pub fn available_volume(available: Real, requested: Real) -> Real {
    sanitize_volume(available).min(sanitize_volume(requested))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn sanitize_rejects_negative_and_nan() {
        assert_eq!(sanitize_volume(-3.0), 0.0);
        assert_eq!(sanitize_volume(Real::NAN), 0.0);
        assert_eq!(sanitize_volume(Real::INFINITY), 0.0);
        assert_eq!(sanitize_volume(2.5), 2.5);
    }

    #[test]
    fn available_is_capped_by_stock() {
        assert_eq!(available_volume(10.0, 3.0), 3.0);
        assert_eq!(available_volume(2.0, 3.0), 2.0);
        assert_eq!(available_volume(0.0, 3.0), 0.0);
        assert_eq!(available_volume(-1.0, 3.0), 0.0);
    }

    proptest! {
        #[test]
        fn available_never_exceeds_either_side(a in -1e6f64..1e6, r in -1e6f64..1e6) {
            let v = available_volume(a, r);
            prop_assert!(v >= 0.0);
            prop_assert!(v <= a.max(0.0));
            prop_assert!(v <= r.max(0.0));
        }
    }
}
