//! SOCKS protocol constants
//!
//! Defines the wire constants used by the SOCKS4 and SOCKS5 handshakes.

/// SOCKS4 protocol version
pub const SOCKS4_VERSION: u8 = 0x04;

/// Version byte of every SOCKS4 reply
pub const SOCKS4_REPLY_VERSION: u8 = 0x00;

/// SOCKS4 CONNECT command
pub const SOCKS4_CMD_CONNECT: u8 = 0x01;

/// Request granted
pub const SOCKS4_REPLY_GRANTED: u8 = 0x5A;
/// Request rejected or failed
pub const SOCKS4_REPLY_REJECTED: u8 = 0x5B;

/// SOCKS5 protocol version
pub const SOCKS5_VERSION: u8 = 0x05;

// Authentication methods
/// No authentication required
pub const SOCKS5_AUTH_METHOD_NONE: u8 = 0x00;
/// No acceptable methods
pub const SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE: u8 = 0xFF;

// Commands
/// TCP CONNECT command
pub const SOCKS5_CMD_TCP_CONNECT: u8 = 0x01;
/// TCP BIND command (not implemented)
pub const SOCKS5_CMD_TCP_BIND: u8 = 0x02;
/// UDP ASSOCIATE command (not implemented)
pub const SOCKS5_CMD_UDP_ASSOCIATE: u8 = 0x03;

// Address types
/// IPv4 address
pub const SOCKS5_ADDR_TYPE_IPV4: u8 = 0x01;
/// Domain name
pub const SOCKS5_ADDR_TYPE_DOMAIN: u8 = 0x03;
/// IPv6 address (rejected)
pub const SOCKS5_ADDR_TYPE_IPV6: u8 = 0x04;

// Reserved byte
/// Reserved byte value (always 0x00)
pub const SOCKS5_RESERVED: u8 = 0x00;

// Frame sizes
/// Length of every SOCKS4 reply
pub const SOCKS4_REPLY_LEN: usize = 8;
/// Length of a SOCKS5 reply carrying an IPv4 address
pub const SOCKS5_REPLY_LEN: usize = 10;
/// Fixed part of a SOCKS4 request before the user id
pub const SOCKS4_HEADER_LEN: usize = 8;
/// Largest SOCKS5 request: header, length byte, 255-byte domain, port
pub const SOCKS5_MAX_REQUEST_LEN: usize = 4 + 1 + 255 + 2;

// Buffer sizes
/// Default cap on a single handshake read
pub const DEFAULT_HANDSHAKE_BUFFER_SIZE: usize = SOCKS5_MAX_REQUEST_LEN;
/// Default buffer size for data transfer
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions() {
        assert_eq!(SOCKS4_VERSION, 4);
        assert_eq!(SOCKS5_VERSION, 5);
    }

    #[test]
    fn test_socks4_reply_codes() {
        assert_eq!(SOCKS4_REPLY_GRANTED, 90);
        assert_eq!(SOCKS4_REPLY_REJECTED, 91);
    }

    #[test]
    fn test_address_types() {
        assert_eq!(SOCKS5_ADDR_TYPE_IPV4, 1);
        assert_eq!(SOCKS5_ADDR_TYPE_DOMAIN, 3);
        assert_eq!(SOCKS5_ADDR_TYPE_IPV6, 4);
    }

    #[test]
    fn test_handshake_buffer_fits_largest_request() {
        assert_eq!(SOCKS5_MAX_REQUEST_LEN, 262);
        assert!(DEFAULT_HANDSHAKE_BUFFER_SIZE >= SOCKS5_MAX_REQUEST_LEN);
    }
}
