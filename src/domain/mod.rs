mod otp_code;
mod phone_number;

pub use otp_code::OtpCode;
pub use phone_number::PhoneNumber;
