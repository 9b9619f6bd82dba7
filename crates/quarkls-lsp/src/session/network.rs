//! Coordination port bound for the lifetime of a session.

use std::io;
use std::net::{Ipv4Addr, UdpSocket};

use thiserror::Error;

/// Failure to bind the coordination port.
#[derive(Debug, Error)]
pub enum NetworkInitError {
    /// The suggested range contains no port.
    #[error("port range {first}..={last} is empty")]
    EmptyRange {
        /// First port of the range.
        first: u16,
        /// Last port of the range.
        last: u16,
    },
    /// Every port in the range was unavailable.
    #[error("no free port in {first}..={last}: {source}")]
    Unavailable {
        /// First port of the range.
        first: u16,
        /// Last port of the range.
        last: u16,
        /// Error from the final bind attempt.
        #[source]
        source: io::Error,
    },
}

/// UDP socket on `127.0.0.1` held open for external coordination.
#[derive(Debug)]
pub struct CoordinationPort {
    socket: UdpSocket,
    port: u16,
}

impl CoordinationPort {
    /// Binds the first free port in the inclusive range `first..=last`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkInitError`] when the range is empty or no port in it
    /// can be bound.
    pub fn bind(first: u16, last: u16) -> Result<Self, NetworkInitError> {
        if first > last {
            return Err(NetworkInitError::EmptyRange { first, last });
        }
        let mut last_error = None;
        for port in first..=last {
            match UdpSocket::bind((Ipv4Addr::LOCALHOST, port)) {
                Ok(socket) => return Ok(Self { socket, port }),
                Err(error) => last_error = Some(error),
            }
        }
        Err(NetworkInitError::Unavailable {
            first,
            last,
            source: last_error
                .unwrap_or_else(|| io::Error::from(io::ErrorKind::AddrNotAvailable)),
        })
    }

    /// Bound port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Underlying socket.
    #[must_use]
    pub fn socket(&self) -> &UdpSocket {
        &self.socket
    }
}
