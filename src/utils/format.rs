//! Formatting utilities for display values.

/// Convert a 0.0..=1.0 ratio to a rounded integer percentage.
pub fn ratio_to_percent_u8(ratio: f64) -> u8 {
    (ratio * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_to_percent_u8() {
        assert_eq!(ratio_to_percent_u8(0.75), 75);
        assert_eq!(ratio_to_percent_u8(1.0), 100);
        assert_eq!(ratio_to_percent_u8(0.0), 0);
        assert_eq!(ratio_to_percent_u8(1.0 / 3.0), 33);
    }
}
