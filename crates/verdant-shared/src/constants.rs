/// Application name
pub const APP_NAME: &str = "Verdant Botanicals";

/// Fixed cash-on-delivery surcharge in whole rupees, applied exactly once,
/// server-side, on top of the client-submitted total
pub const COD_SURCHARGE: f64 = 25.0;

/// Subtotal above which shipping is free
pub const FREE_SHIPPING_THRESHOLD: f64 = 500.0;

/// Flat shipping rate charged below the free-shipping threshold
pub const FLAT_SHIPPING_RATE: f64 = 50.0;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// Estimated delivery window, in business days (inclusive bounds)
pub const DELIVERY_MIN_BUSINESS_DAYS: u32 = 7;
pub const DELIVERY_MAX_BUSINESS_DAYS: u32 = 10;

/// Default page size for order listings
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Country recorded on a shipping address when the client omits one
pub const DEFAULT_COUNTRY: &str = "India";

/// Client-side storage keys (one value per key, JSON/text)
pub const CART_KEY: &str = "verdant_cart_v1";
pub const IDENTITY_KEY: &str = "verdant_auth_user_v1";
pub const CREDENTIAL_KEY: &str = "verdant_auth_token_v1";

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Bearer token length in raw bytes, before hex encoding
pub const TOKEN_BYTES: usize = 32;

/// Default session lifetime in days
pub const SESSION_TTL_DAYS: i64 = 30;
