//! Virtual Private Cloud

pub mod natgateways;

/// Service name used to derive the NAT gateway endpoint
pub const NAT_SERVICE: &str = "nat";

/// API version of the NAT gateway API
pub const NAT_API_VERSION: &str = "v2";
