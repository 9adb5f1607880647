//! Framework error codes.
//!
//! Application codes (for example "book not found") are chosen by method
//! authors; the codes here are raised by the contract layer itself.

/// Integer error code carried by every [`ApiError`](crate::ApiError).
pub type ErrorCode = u32;

/// Unexpected failure or contract violation.
pub const INTERNAL_SERVER_ERROR: ErrorCode = 1001;
/// No method matches the route.
pub const METHOD_NOT_FOUND: ErrorCode = 1002;
/// The bearer credential has expired.
pub const TOKEN_EXPIRED: ErrorCode = 1003;

/// The caller lacks a permission.
pub const NOT_ENOUGH_RIGHTS: ErrorCode = 2001;
/// The method is only available to authenticated users.
pub const USERS_ONLY: ErrorCode = 2002;
/// Value is outside the declared enum domain.
pub const INVALID_ENUM_VALUE: ErrorCode = 2016;

/// String shorter than the declared minimum length.
pub const STRING_TOO_SHORT: ErrorCode = 3006;
/// String longer than the declared maximum length.
pub const STRING_TOO_LONG: ErrorCode = 3007;
/// Value is not a number.
pub const INVALID_FLOAT: ErrorCode = 3008;
/// Number below the declared minimum.
pub const FLOAT_TOO_SMALL: ErrorCode = 3009;
/// Number above the declared maximum.
pub const FLOAT_TOO_LARGE: ErrorCode = 3010;
/// Integer below the declared minimum.
pub const INTEGER_TOO_SMALL: ErrorCode = 3011;
/// Integer above the declared maximum.
pub const INTEGER_TOO_LARGE: ErrorCode = 3012;
/// An element of a UUID array is malformed.
pub const INVALID_UUID_IN_ARRAY: ErrorCode = 3014;
/// Value is not a canonical integer.
pub const INVALID_INTEGER: ErrorCode = 3025;
/// Value is not a UUID.
pub const INVALID_UUID: ErrorCode = 3026;
/// Value is neither RFC 3339 nor a unix timestamp.
pub const INVALID_DATE_TIME: ErrorCode = 3027;
/// Value is not a `YYYY-MM-DD` date.
pub const INVALID_DATE: ErrorCode = 3028;
