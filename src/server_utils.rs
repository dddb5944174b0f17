use crate::constants::{MAX_CLIENT_DIMENSION, MIN_CLIENT_DIMENSION};

/// Clamps a client-requested dimension, falling back to `default` when absent.
pub fn normalize_dimension(value: Option<i64>, default: usize) -> usize {
    match value {
        None => default,
        Some(raw) => raw.clamp(MIN_CLIENT_DIMENSION as i64, MAX_CLIENT_DIMENSION as i64) as usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_dimension_clamps_range() {
        assert_eq!(normalize_dimension(None, 4), 4);
        assert_eq!(normalize_dimension(Some(-3), 4), 2);
        assert_eq!(normalize_dimension(Some(0), 4), 2);
        assert_eq!(normalize_dimension(Some(5), 4), 5);
        assert_eq!(normalize_dimension(Some(999), 4), 8);
    }
}
