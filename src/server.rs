//! Reader-facing TCP server.
//!
//! Every accepted socket gets its own task, which exclusively owns the
//! connection's [`ConnectionContext`]. Chunks are decoded synchronously between
//! reads, so events for one connection never interleave and nothing is shared
//! between connections except the broadcaster handle.
use std::future::Future;
use std::io::ErrorKind;
use std::net::SocketAddr;

use anyhow::{anyhow, Result};
use log::{error, info, trace};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpListener;

use crate::config::{Config, ProtocolConfig};
use crate::logutil::hex_snippet;
use crate::metrics;
use crate::reader::ConnectionContext;
use crate::relay::viewer::ViewerRelay;
use crate::relay::{Broadcaster, EventSink};

pub struct ReaderServer {
    listener: TcpListener,
    broadcaster: Broadcaster,
    protocol: ProtocolConfig,
    read_buffer_size: usize,
}

impl ReaderServer {
    /// Bind the reader listener. Failure here is fatal to the process.
    pub async fn bind(config: &Config, broadcaster: Broadcaster) -> Result<Self> {
        let addr = config.listener.addr();
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            if e.kind() == ErrorKind::AddrInUse {
                anyhow!("Reader port {} is already in use", addr)
            } else {
                anyhow!("Failed to bind reader listener on {}: {}", addr, e)
            }
        })?;
        Ok(Self {
            listener,
            broadcaster,
            protocol: config.protocol,
            read_buffer_size: config.listener.read_buffer_size,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept readers until `shutdown` resolves.
    pub async fn run_until<F: Future<Output = ()>>(self, shutdown: F) -> Result<()> {
        info!("Reader listener on {}", self.local_addr()?);
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Reader listener shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let mut sink = self.broadcaster.clone();
                            let protocol = self.protocol;
                            let size = self.read_buffer_size;
                            tokio::spawn(async move {
                                let ctx = ConnectionContext::open(peer, protocol);
                                pump_connection(stream, ctx, &mut sink, size).await;
                            });
                        }
                        Err(e) => {
                            error!("Reader accept error: {}", e);
                        }
                    }
                }
            }
        }
    }
}

/// Read chunks from one reader until EOF or error, decoding as they arrive.
/// The context is released when this returns.
pub async fn pump_connection<R, S>(
    mut stream: R,
    mut ctx: ConnectionContext,
    sink: &mut S,
    read_buffer_size: usize,
) where
    R: AsyncRead + Unpin,
    S: EventSink + ?Sized,
{
    let mut buf = vec![0u8; read_buffer_size.max(1)];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) => {
                ctx.close();
                return;
            }
            Ok(n) => {
                trace!("{}: {} bytes: {}", ctx.remote(), n, hex_snippet(&buf[..n], 64));
                ctx.on_data(&buf[..n], sink);
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                ctx.fail(&e);
                return;
            }
        }
    }
}

/// Run the reader listener and (if enabled) the viewer relay until Ctrl-C.
pub async fn run(config: Config) -> Result<()> {
    let broadcaster = Broadcaster::new(config.relay.channel_capacity);

    if config.relay.enabled {
        let relay = ViewerRelay::bind(&config.relay.addr(), broadcaster.clone()).await?;
        tokio::spawn(async move {
            if let Err(e) = relay.run().await {
                error!("Viewer relay stopped: {}", e);
            }
        });
    } else {
        info!("Viewer relay disabled; decoded reports are only logged");
    }

    let server = ReaderServer::bind(&config, broadcaster).await?;
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
            }
        })
        .await?;

    let stats = metrics::snapshot();
    info!(
        "Shutdown: {} connections ({} active), {} reports, {} rejected headers, {} garbage bytes, {} decode failures",
        stats.connections_opened,
        stats.active_connections(),
        stats.frames_decoded,
        stats.frames_rejected,
        stats.garbage_bytes,
        stats.decode_failures
    );
    Ok(())
}
