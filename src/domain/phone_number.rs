use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    // `+`, a non-zero country code digit, 8 to 15 digits in total.
    static ref INTERNATIONAL_PHONE_REGEX: Regex =
        Regex::new(r"^\+[1-9][0-9]{7,14}$").expect("phone number pattern is valid");
}

/// A phone number in international format, e.g. `+919876543210`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(s: &str) -> Result<PhoneNumber, String> {
        let candidate = s.trim();
        if INTERNATIONAL_PHONE_REGEX.is_match(candidate) {
            Ok(Self(candidate.to_string()))
        } else {
            Err(
                "Invalid phone number format. Please use international format (e.g., +919876543210)."
                    .to_string(),
            )
        }
    }

    /// The number without the leading `+`, as used in wa.me links.
    pub fn digits(&self) -> &str {
        self.0.trim_start_matches('+')
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use fake::faker::number::en::NumberWithFormat;
    use fake::Fake;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::domain::PhoneNumber;

    fn number_with_digits(rng: &mut StdRng, total_digits: usize) -> String {
        let format = format!("^{}", "#".repeat(total_digits - 1));
        NumberWithFormat(&format).fake_with_rng(rng)
    }

    #[derive(Debug, Clone)]
    struct ValidPhoneFixture(pub String);

    impl Arbitrary for ValidPhoneFixture {
        fn arbitrary(g: &mut Gen) -> Self {
            let mut rng = StdRng::seed_from_u64(u64::arbitrary(g));
            let total_digits: usize = (8..=15).fake_with_rng(&mut rng);
            Self(format!("+{}", number_with_digits(&mut rng, total_digits)))
        }
    }

    #[derive(Debug, Clone)]
    struct MalformedPhoneFixture(pub String);

    impl Arbitrary for MalformedPhoneFixture {
        fn arbitrary(g: &mut Gen) -> Self {
            let mut rng = StdRng::seed_from_u64(u64::arbitrary(g));
            let variant: u8 = (0..4).fake_with_rng(&mut rng);
            let phone = match variant {
                // missing plus
                0 => {
                    let total_digits: usize = (8..=15).fake_with_rng(&mut rng);
                    number_with_digits(&mut rng, total_digits)
                }
                // too short
                1 => {
                    let total_digits: usize = (1..=7).fake_with_rng(&mut rng);
                    format!("+{}", number_with_digits(&mut rng, total_digits))
                }
                // too long
                2 => {
                    let total_digits: usize = (16..=20).fake_with_rng(&mut rng);
                    format!("+{}", number_with_digits(&mut rng, total_digits))
                }
                // leading zero country code
                _ => {
                    let total_digits: usize = (7..=14).fake_with_rng(&mut rng);
                    format!("+0{}", number_with_digits(&mut rng, total_digits))
                }
            };
            Self(phone)
        }
    }

    #[quickcheck]
    fn valid_phone_numbers_are_parsed_successfully(valid_phone: ValidPhoneFixture) -> bool {
        PhoneNumber::parse(&valid_phone.0).is_ok()
    }

    #[quickcheck]
    fn malformed_phone_numbers_are_rejected(malformed_phone: MalformedPhoneFixture) -> bool {
        PhoneNumber::parse(&malformed_phone.0).is_err()
    }

    #[test]
    fn test_phone_number_examples() {
        assert!(PhoneNumber::parse("+919876543210").is_ok());
        assert!(PhoneNumber::parse(" +14155550123 ").is_ok());
        assert!(PhoneNumber::parse("919876543210").is_err());
        assert!(PhoneNumber::parse("+91 98765 43210").is_err());
        assert!(PhoneNumber::parse("+91-9876543210").is_err());
        assert!(PhoneNumber::parse("").is_err());
        assert!(PhoneNumber::parse("+").is_err());
    }

    #[test]
    fn test_phone_number_digits() {
        let phone = PhoneNumber::parse("+919876543210").unwrap();
        assert_eq!(phone.digits(), "919876543210");
        assert_eq!(phone.as_ref(), "+919876543210");
    }
}
