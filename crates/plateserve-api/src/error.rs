//! Listener lifecycle errors.
//!
//! Request-level failures never reach this type; they are answered in `http/errors.rs`.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::io;
use std::net::SocketAddr;

/// Result alias for listener lifecycle operations.
pub type ApiServerResult<T> = std::result::Result<T, ApiServerError>;

/// Failures that stop the gateway from accepting requests.
#[derive(Debug)]
pub enum ApiServerError {
    /// The listening socket could not be bound.
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Socket error.
        source: io::Error,
    },
    /// A pre-bound listener did not report its address.
    ListenerAddr {
        /// Socket error.
        source: io::Error,
    },
    /// The accept loop ended with an error.
    Serve {
        /// Address the listener was bound to.
        addr: SocketAddr,
        /// Socket error.
        source: io::Error,
    },
}

impl ApiServerError {
    /// Address involved in the failure, when one was known.
    #[must_use]
    pub const fn addr(&self) -> Option<SocketAddr> {
        match self {
            Self::Bind { addr, .. } | Self::Serve { addr, .. } => Some(*addr),
            Self::ListenerAddr { .. } => None,
        }
    }
}

impl Display for ApiServerError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::Bind { .. } => "recognition listener could not bind",
            Self::ListenerAddr { .. } => "recognition listener has no local address",
            Self::Serve { .. } => "recognition listener stopped with an error",
        };
        formatter.write_str(message)
    }
}

impl Error for ApiServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Bind { source, .. } | Self::ListenerAddr { source } | Self::Serve { source, .. } => {
                Some(source)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_failure_keeps_address_out_of_message() -> Result<(), Box<dyn Error>> {
        let err = ApiServerError::Bind {
            addr: "127.0.0.1:8080".parse()?,
            source: io::Error::new(io::ErrorKind::AddrInUse, "busy"),
        };
        assert_eq!(err.to_string(), "recognition listener could not bind");
        assert_eq!(err.addr().map(|addr| addr.port()), Some(8080));
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("busy")
        );
        Ok(())
    }

    #[test]
    fn listener_addr_failure_has_no_address() {
        let err = ApiServerError::ListenerAddr {
            source: io::Error::other("not a socket"),
        };
        assert_eq!(err.addr(), None);
        assert!(err.source().is_some());
    }
}
