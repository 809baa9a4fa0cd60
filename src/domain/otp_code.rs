use secrecy::{ExposeSecret, SecretString};

use crate::constants::OTP_CODE_LENGTH;

/// A user-entered verification code. Never logged.
pub struct OtpCode(SecretString);

impl OtpCode {
    pub fn parse(s: &str) -> Result<OtpCode, String> {
        if s.len() == OTP_CODE_LENGTH && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(SecretString::from(s)))
        } else {
            Err(format!(
                "Please enter a valid {}-digit OTP.",
                OTP_CODE_LENGTH
            ))
        }
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("OtpCode(******)")
    }
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use crate::domain::OtpCode;

    #[quickcheck]
    fn codes_that_are_not_six_digits_are_rejected(code: String) -> bool {
        let well_formed = code.len() == 6 && code.chars().all(|c| c.is_ascii_digit());
        OtpCode::parse(&code).is_ok() == well_formed
    }

    #[test]
    fn test_otp_code_examples() {
        assert!(OtpCode::parse("123456").is_ok());
        assert!(OtpCode::parse("000000").is_ok());
        assert!(OtpCode::parse("12345").is_err());
        assert!(OtpCode::parse("1234567").is_err());
        assert!(OtpCode::parse("12a456").is_err());
        assert!(OtpCode::parse(" 123456").is_err());
        assert!(OtpCode::parse("١٢٣٤٥٦").is_err());
    }

    #[test]
    fn test_otp_code_is_redacted_in_debug() {
        let code = OtpCode::parse("123456").unwrap();
        assert_eq!(format!("{:?}", code), "OtpCode(******)");
        assert_eq!(code.expose(), "123456");
    }
}
