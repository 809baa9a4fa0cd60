pub const LOGIN_PATH: &str = "/admin/login";
pub const DASHBOARD_PATH: &str = "/admin";
pub const ADMIN_PATH_PREFIX: &str = "/admin";

pub const FEATURED_BIRD_LIMIT: i64 = 3;
pub const OTP_CODE_LENGTH: usize = 6;

pub const SESSION_COOKIE_NAME: &str = "token";
pub const MAX_LOGIN_FORMS_PER_SESSION: usize = 4;
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

pub const WHATSAPP_BASE_URL: &str = "https://wa.me";
