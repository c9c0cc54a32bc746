//! Floating point rendering with 15 significant digits

/// Significant digits kept when rendering floats.
const PRECISION: i32 = 15;

/// Render a float like C's `%.15g`.
///
/// Uses scientific notation when the decimal exponent is below -4 or at least
/// 15, fixed notation otherwise, and strips trailing zeros in both cases.
/// Non-finite values render as `NaN`, `+Inf` and `-Inf`.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }

    let sci = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return sci;
    };

    if exp < -4 || exp >= PRECISION {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    } else {
        let decimals = (PRECISION - 1 - exp) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

/// Round a float to 15 significant digits.
pub fn round_significant(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format_float(value).parse().unwrap_or(value)
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_notation() {
        assert_eq!(format_float(0.1 + 0.2), "0.3");
        assert_eq!(format_float(3.0), "3");
        assert_eq!(format_float(-2.5), "-2.5");
        assert_eq!(format_float(0.0), "0");
        assert_eq!(format_float(123456789012345.0), "123456789012345");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(1.0 / 3.0), "0.333333333333333");
    }

    #[test]
    fn test_scientific_notation() {
        assert_eq!(format_float(1e15), "1e+15");
        assert_eq!(format_float(0.00001), "1e-05");
        assert_eq!(format_float(-1.5e-7), "-1.5e-07");
        assert_eq!(format_float(6.02214076e23), "6.02214076e+23");
        assert_eq!(format_float(1e100), "1e+100");
    }

    #[test]
    fn test_non_finite() {
        assert_eq!(format_float(f64::NAN), "NaN");
        assert_eq!(format_float(f64::INFINITY), "+Inf");
        assert_eq!(format_float(f64::NEG_INFINITY), "-Inf");
    }

    #[test]
    fn test_round_significant() {
        assert_eq!(round_significant(0.1 + 0.2), 0.3);
        assert_eq!(round_significant(42.0), 42.0);
        assert!(round_significant(f64::NAN).is_nan());
    }
}
