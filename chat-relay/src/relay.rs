use std::{net::SocketAddr, sync::Arc};

use tokio::{
    io::BufReader,
    net::{TcpListener, TcpStream, tcp::OwnedWriteHalf},
};
use tracing::{info, warn};

use crate::{
    channel::{LineReader, LineWriter},
    error::RelayError,
    registry::Registry,
    session::Session,
};

/// Outbound half of an accepted TCP connection.
pub type TcpSink = LineWriter<OwnedWriteHalf>;

/// Accepts connections and runs one [`Session`] task per connection, all
/// sharing one [`Registry`].
///
/// There is no connection cap and no shutdown hook: the relay runs until the
/// process exits.
pub struct Relay {
    listener: TcpListener,
    registry: Arc<Registry<TcpSink>>,
}

impl Relay {
    pub fn new(listener: TcpListener) -> Self {
        Self {
            listener,
            registry: Arc::new(Registry::new()),
        }
    }

    pub async fn bind(addr: SocketAddr) -> Result<Self, RelayError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| RelayError::Bind { addr, source })?;
        Ok(Self::new(listener))
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> Arc<Registry<TcpSink>> {
        Arc::clone(&self.registry)
    }

    pub async fn run(self) {
        let Relay { listener, registry } = self;

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => spawn_session(stream, peer, &registry),
                Err(err) => warn!(error = ?err, "failed to accept connection"),
            }
        }
    }
}

fn spawn_session(stream: TcpStream, peer: SocketAddr, registry: &Arc<Registry<TcpSink>>) {
    let registry = Arc::clone(registry);
    tokio::spawn(async move {
        info!(peer = %peer, "accepted connection");
        let (reader, writer) = stream.into_split();
        let session = Session::new(
            LineReader::new(BufReader::new(reader)),
            Arc::new(LineWriter::new(writer)),
        );
        if let Err(err) = session.run(&registry).await {
            warn!(peer = %peer, error = ?err, "client disconnected with error");
        }
    });
}
