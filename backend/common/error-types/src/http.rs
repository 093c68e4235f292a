//! HTTP-style status codes carried by error kinds
//!
//! Plain numbers, so the taxonomy stays independent of any web framework.

/// HTTP status code helpers
pub mod status {
    pub const BAD_REQUEST: u16 = 400;
    pub const UNPROCESSABLE_ENTITY: u16 = 422;
    pub const TOO_MANY_REQUESTS: u16 = 429;

    pub const INTERNAL_SERVER_ERROR: u16 = 500;
    pub const SERVICE_UNAVAILABLE: u16 = 503;
}
