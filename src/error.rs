//! Error types for Socksie
//!
//! This module defines all custom error types used throughout the application.

use std::io;
use thiserror::Error;

/// Main error type for Socksie operations
#[derive(Error, Debug)]
pub enum SocksieError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// SOCKS handshake error
    #[error("Handshake error: {0}")]
    Handshake(#[from] HandshakeError),

    /// Outbound dial error
    #[error("Dial error: {0}")]
    Dial(#[source] io::Error),

    /// Tunnel transport error
    #[error("Tunnel error: {0}")]
    Tunnel(String),
}

/// How a failed handshake is classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeClass {
    /// The client violated the protocol
    Malformed,
    /// The request was well formed but refused by policy or could not be served
    Rejected,
}

/// Errors raised while negotiating a SOCKS4 or SOCKS5 request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// Fewer bytes than any SOCKS header needs
    #[error("Header too short: {0} bytes")]
    HeaderTooShort(usize),

    /// A field extends past the end of the buffer
    #[error("Truncated request")]
    TruncatedRequest,

    /// SOCKS4 user id without its NUL terminator
    #[error("Missing user id terminator")]
    NoUserIdTerminator,

    /// Domain name that is empty or not valid UTF-8
    #[error("Invalid domain name")]
    InvalidDomain,

    /// Request phase carries a different version than the method selection
    #[error("Request version {0} does not match negotiated version")]
    VersionMismatch(u8),

    /// First byte is neither 4 nor 5
    #[error("Unsupported SOCKS version: {0}")]
    UnknownVersion(u8),

    /// Anything other than CONNECT
    #[error("Command not supported: {0}")]
    UnsupportedCommand(u8),

    /// Address type other than IPv4 or domain name
    #[error("Address type not supported: {0}")]
    UnsupportedAddressType(u8),

    /// Client did not offer the "no authentication" method
    #[error("No acceptable authentication method")]
    NoAcceptableMethod,

    /// Domain name lookup failed or produced no IPv4 address
    #[error("Failed to resolve {host}: {reason}")]
    Resolution {
        /// Host name as sent by the client
        host: String,
        /// Resolver failure description
        reason: String,
    },
}

impl HandshakeError {
    /// Classify the error as a protocol violation or a rejection
    pub fn outcome_class(&self) -> OutcomeClass {
        match self {
            HandshakeError::HeaderTooShort(_)
            | HandshakeError::TruncatedRequest
            | HandshakeError::NoUserIdTerminator
            | HandshakeError::InvalidDomain
            | HandshakeError::VersionMismatch(_) => OutcomeClass::Malformed,
            HandshakeError::UnknownVersion(_)
            | HandshakeError::UnsupportedCommand(_)
            | HandshakeError::UnsupportedAddressType(_)
            | HandshakeError::NoAcceptableMethod
            | HandshakeError::Resolution { .. } => OutcomeClass::Rejected,
        }
    }

    /// Whether this error means the client broke the protocol
    pub fn is_malformed(&self) -> bool {
        self.outcome_class() == OutcomeClass::Malformed
    }
}

/// Reply codes for SOCKS5 protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Socks5ReplyCode {
    /// Command succeeded
    Succeeded = 0x00,
    /// General SOCKS server failure
    GeneralFailure = 0x01,
    /// Connection not allowed by ruleset
    ConnectionNotAllowed = 0x02,
    /// Network unreachable
    NetworkUnreachable = 0x03,
    /// Host unreachable
    HostUnreachable = 0x04,
    /// Connection refused
    ConnectionRefused = 0x05,
    /// Command not supported
    CommandNotSupported = 0x07,
    /// Address type not supported
    AddressTypeNotSupported = 0x08,
}

impl From<Socks5ReplyCode> for u8 {
    fn from(code: Socks5ReplyCode) -> Self {
        code as u8
    }
}

impl From<&io::Error> for Socks5ReplyCode {
    fn from(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => Socks5ReplyCode::ConnectionRefused,
            io::ErrorKind::TimedOut => Socks5ReplyCode::HostUnreachable,
            io::ErrorKind::AddrNotAvailable => Socks5ReplyCode::HostUnreachable,
            io::ErrorKind::PermissionDenied => Socks5ReplyCode::ConnectionNotAllowed,
            _ => Socks5ReplyCode::GeneralFailure,
        }
    }
}

impl Socks5ReplyCode {
    /// Negative reply sent for a rejected handshake, if the rejection has one
    pub fn for_rejection(err: &HandshakeError) -> Option<Self> {
        match err {
            HandshakeError::UnsupportedCommand(_) => Some(Socks5ReplyCode::CommandNotSupported),
            HandshakeError::UnsupportedAddressType(_) => {
                Some(Socks5ReplyCode::AddressTypeNotSupported)
            }
            HandshakeError::Resolution { .. } => Some(Socks5ReplyCode::HostUnreachable),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socks5_reply_code_to_u8() {
        assert_eq!(u8::from(Socks5ReplyCode::Succeeded), 0x00);
        assert_eq!(u8::from(Socks5ReplyCode::GeneralFailure), 0x01);
        assert_eq!(u8::from(Socks5ReplyCode::ConnectionNotAllowed), 0x02);
        assert_eq!(u8::from(Socks5ReplyCode::NetworkUnreachable), 0x03);
        assert_eq!(u8::from(Socks5ReplyCode::HostUnreachable), 0x04);
        assert_eq!(u8::from(Socks5ReplyCode::ConnectionRefused), 0x05);
        assert_eq!(u8::from(Socks5ReplyCode::CommandNotSupported), 0x07);
        assert_eq!(u8::from(Socks5ReplyCode::AddressTypeNotSupported), 0x08);
    }

    #[test]
    fn test_socks5_reply_code_from_io_error() {
        let err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(
            Socks5ReplyCode::from(&err),
            Socks5ReplyCode::ConnectionRefused
        );

        let err = io::Error::new(io::ErrorKind::TimedOut, "timeout");
        assert_eq!(
            Socks5ReplyCode::from(&err),
            Socks5ReplyCode::HostUnreachable
        );

        let err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(
            Socks5ReplyCode::from(&err),
            Socks5ReplyCode::ConnectionNotAllowed
        );

        let err = io::Error::new(io::ErrorKind::Other, "other");
        assert_eq!(Socks5ReplyCode::from(&err), Socks5ReplyCode::GeneralFailure);
    }

    #[test]
    fn test_reply_code_for_rejection() {
        assert_eq!(
            Socks5ReplyCode::for_rejection(&HandshakeError::UnsupportedCommand(2)),
            Some(Socks5ReplyCode::CommandNotSupported)
        );
        assert_eq!(
            Socks5ReplyCode::for_rejection(&HandshakeError::UnsupportedAddressType(4)),
            Some(Socks5ReplyCode::AddressTypeNotSupported)
        );
        let err = HandshakeError::Resolution {
            host: "nowhere".to_string(),
            reason: "no address".to_string(),
        };
        assert_eq!(
            Socks5ReplyCode::for_rejection(&err),
            Some(Socks5ReplyCode::HostUnreachable)
        );
        assert_eq!(
            Socks5ReplyCode::for_rejection(&HandshakeError::TruncatedRequest),
            None
        );
    }

    #[test]
    fn test_outcome_class() {
        assert!(HandshakeError::HeaderTooShort(1).is_malformed());
        assert!(HandshakeError::NoUserIdTerminator.is_malformed());
        assert!(HandshakeError::TruncatedRequest.is_malformed());
        assert!(HandshakeError::InvalidDomain.is_malformed());
        assert!(HandshakeError::VersionMismatch(4).is_malformed());
        assert_eq!(
            HandshakeError::UnknownVersion(6).outcome_class(),
            OutcomeClass::Rejected
        );
        assert_eq!(
            HandshakeError::NoAcceptableMethod.outcome_class(),
            OutcomeClass::Rejected
        );
    }

    #[test]
    fn test_handshake_error_display() {
        let err = HandshakeError::HeaderTooShort(1);
        assert_eq!(format!("{}", err), "Header too short: 1 bytes");

        let err = HandshakeError::UnknownVersion(6);
        assert_eq!(format!("{}", err), "Unsupported SOCKS version: 6");

        let err = HandshakeError::UnsupportedCommand(0x02);
        assert_eq!(format!("{}", err), "Command not supported: 2");

        let err = HandshakeError::Resolution {
            host: "bad.invalid".to_string(),
            reason: "no address".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Failed to resolve bad.invalid: no address"
        );
    }

    #[test]
    fn test_socksie_error_display() {
        let err = SocksieError::Config("invalid config".to_string());
        assert_eq!(format!("{}", err), "Configuration error: invalid config");

        let err = SocksieError::Dial(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        assert_eq!(format!("{}", err), "Dial error: refused");

        let err = SocksieError::Tunnel("auth failed".to_string());
        assert_eq!(format!("{}", err), "Tunnel error: auth failed");
    }

    #[test]
    fn test_socksie_error_from() {
        let io_err = io::Error::new(io::ErrorKind::Other, "io error");
        let err: SocksieError = io_err.into();
        assert!(matches!(err, SocksieError::Io(_)));

        let err: SocksieError = HandshakeError::NoAcceptableMethod.into();
        assert!(matches!(err, SocksieError::Handshake(_)));
    }
}
