use std::{io, net::SocketAddr};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to bind relay endpoint {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The channel failed mid-session. A clean close is not an error.
    #[error("channel receive failed")]
    Receive(#[source] io::Error),
}
