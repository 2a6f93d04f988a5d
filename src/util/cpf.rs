/// Strips punctuation from a CPF, keeping only its digits.
pub fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Validates length and both check digits. Sequences of one repeated digit
/// pass the arithmetic but are not issued, so they are rejected too.
pub fn is_valid(raw: &str) -> bool {
    let digits: Vec<u32> = digits(raw).chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 11 || digits.iter().all(|&d| d == digits[0]) {
        return false;
    }

    check_digit(&digits[..9]) == digits[9] && check_digit(&digits[..10]) == digits[10]
}

fn check_digit(prefix: &[u32]) -> u32 {
    let weight_start = prefix.len() as u32 + 1;
    let sum: u32 = prefix
        .iter()
        .enumerate()
        .map(|(i, d)| d * (weight_start - i as u32))
        .sum();
    match sum % 11 {
        0 | 1 => 0,
        r => 11 - r,
    }
}

/// Formats eleven digits as `000.000.000-00`; anything else is returned as is.
pub fn format(raw: &str) -> String {
    let d = digits(raw);
    if d.len() != 11 {
        return raw.to_string();
    }
    format!("{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_numbers_with_or_without_mask() {
        assert!(is_valid("529.982.247-25"));
        assert!(is_valid("52998224725"));
        assert!(is_valid("111.444.777-35"));
    }

    #[test]
    fn rejects_bad_check_digits_and_lengths() {
        assert!(!is_valid("529.982.247-24"));
        assert!(!is_valid("5299822472"));
        assert!(!is_valid(""));
    }

    #[test]
    fn rejects_repeated_digits() {
        assert!(!is_valid("111.111.111-11"));
        assert!(!is_valid("00000000000"));
    }

    #[test]
    fn formats_digits() {
        assert_eq!(format("52998224725"), "529.982.247-25");
        assert_eq!(format("123"), "123");
    }
}
