//! Edge width scaling.

/// Narrowest edge width.
pub const MIN_WIDTH: f64 = 1.0;
/// Widest edge width.
pub const MAX_WIDTH: f64 = 8.0;

/// Linear map from call counts to edge widths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain_max: f64,
}

impl LinearScale {
    /// Scale with domain `[0, max_call_count]`. A zero maximum uses 1 instead.
    pub fn for_max(max_call_count: u64) -> Self {
        let domain_max = if max_call_count == 0 {
            1.0
        } else {
            max_call_count as f64
        };
        Self { domain_max }
    }

    /// Width for `call_count`, in `[MIN_WIDTH, MAX_WIDTH]` for counts inside the domain.
    pub fn width(&self, call_count: u64) -> f64 {
        let t = call_count as f64 / self.domain_max;
        MIN_WIDTH + t * (MAX_WIDTH - MIN_WIDTH)
    }

    pub fn stroke(&self, call_count: u64) -> StrokeWeight {
        StrokeWeight::from_width(self.width(call_count))
    }
}

/// Terminal rendition of an edge width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StrokeWeight {
    Thin,
    Normal,
    Heavy,
}

impl StrokeWeight {
    pub fn from_width(width: f64) -> Self {
        if width < 3.0 {
            StrokeWeight::Thin
        } else if width < 6.0 {
            StrokeWeight::Normal
        } else {
            StrokeWeight::Heavy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_endpoints() {
        let scale = LinearScale::for_max(200);
        assert_eq!(scale.width(0), MIN_WIDTH);
        assert_eq!(scale.width(200), MAX_WIDTH);
        assert!((scale.width(100) - 4.5).abs() < 1e-9);
        assert_eq!(scale.stroke(0), StrokeWeight::Thin);
        assert_eq!(scale.stroke(100), StrokeWeight::Normal);
        assert_eq!(scale.stroke(200), StrokeWeight::Heavy);
    }

    #[test]
    fn test_zero_max_defaults_domain_to_one() {
        let scale = LinearScale::for_max(0);
        assert_eq!(scale.width(0), MIN_WIDTH);
        assert_eq!(scale.width(1), MAX_WIDTH);
    }
}
