use std::sync::LazyLock;

use regex::Regex;

// An optional `RTW:` tag, the number, then an optional `kg` suffix. Only the
// number is captured.
static WEIGHT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:RTW:)?([0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:\s*kg)?").unwrap()
});

/// Pull the weight out of a scale message such as `RTW:0.650 kg`, `1.282KG`
/// or `0.200`.
///
/// The first numeric token in `message` wins. Text without any digit, and a
/// token that somehow fails to parse as a finite number, both yield `None`.
pub fn extract_weight(message: &str) -> Option<f64> {
    let captures = WEIGHT_PATTERN.captures(message)?;
    captures
        .get(1)?
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|w| w.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_message() {
        assert_eq!(extract_weight("RTW:0.650 kg"), Some(0.650));
        assert_eq!(extract_weight("rtw:12.5KG"), Some(12.5));
    }

    #[test]
    fn suffixed_message() {
        assert_eq!(extract_weight("1.282KG"), Some(1.282));
        assert_eq!(extract_weight("3 kg"), Some(3.0));
    }

    #[test]
    fn bare_number() {
        assert_eq!(extract_weight("0.200"), Some(0.200));
        assert_eq!(extract_weight("42"), Some(42.0));
        assert_eq!(extract_weight(".5"), Some(0.5));
        assert_eq!(extract_weight("7."), Some(7.0));
    }

    #[test]
    fn number_inside_noise() {
        assert_eq!(extract_weight("ST,GS, 0.415 kg"), Some(0.415));
    }

    #[test]
    fn at_most_one_decimal_point() {
        assert_eq!(extract_weight("1.2.3"), Some(1.2));
    }

    #[test]
    fn no_digits() {
        assert_eq!(extract_weight("ERROR"), None);
        assert_eq!(extract_weight(""), None);
        assert_eq!(extract_weight("RTW: kg"), None);
    }

    #[test]
    fn lone_dots_are_not_numbers() {
        assert_eq!(extract_weight("."), None);
        assert_eq!(extract_weight("RTW:... kg"), None);
    }

    #[test]
    fn overflowing_number_is_absent() {
        let huge = "9".repeat(400);
        assert_eq!(extract_weight(&huge), None);
        assert_eq!(extract_weight(&format!("RTW:{} kg", huge)), None);
    }

    #[test]
    fn non_ascii_digits_are_ignored() {
        assert_eq!(extract_weight("٣٤"), None);
    }
}
