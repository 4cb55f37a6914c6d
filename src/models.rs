pub mod otp;
pub mod qr_codes;
pub mod users;
