use crate::client::Communicator;
use crate::error::{ParkmeansError, Result};
use crate::types::Rank;

/// Send bytes to a peer with timeout, wrapping errors as `CollectiveFailed`.
pub(crate) async fn collective_send(
    client: &Communicator,
    dest: Rank,
    data: &[u8],
    operation: &'static str,
    tag: u64,
) -> Result<()> {
    let timeout = client.config().collective_timeout;
    match tokio::time::timeout(timeout, client.send_bytes(dest, tag, data)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(wrap_error(e, operation, dest)),
        Err(_) => Err(ParkmeansError::CollectiveFailed {
            operation,
            rank: dest,
            reason: format!("send timed out after {}ms", timeout.as_millis()),
        }),
    }
}

/// Receive bytes from a peer with timeout, wrapping errors as `CollectiveFailed`.
///
/// An abort from the peer is passed through unchanged so callers can tell a
/// remote teardown apart from a local failure.
pub(crate) async fn collective_recv(
    client: &Communicator,
    src: Rank,
    operation: &'static str,
    tag: u64,
) -> Result<Vec<u8>> {
    let timeout = client.config().collective_timeout;
    match tokio::time::timeout(timeout, client.recv_bytes(src, tag)).await {
        Ok(Ok(buf)) => Ok(buf),
        Ok(Err(e)) => Err(wrap_error(e, operation, src)),
        Err(_) => Err(ParkmeansError::CollectiveFailed {
            operation,
            rank: src,
            reason: format!("recv timed out after {}ms", timeout.as_millis()),
        }),
    }
}

fn wrap_error(e: ParkmeansError, operation: &'static str, rank: Rank) -> ParkmeansError {
    match e {
        ParkmeansError::Aborted { .. } => e,
        other => ParkmeansError::CollectiveFailed {
            operation,
            rank,
            reason: other.to_string(),
        },
    }
}

/// Check that a received buffer has the size the algorithm expects.
pub(crate) fn expect_len(received: &[u8], expected: usize) -> Result<()> {
    if received.len() != expected {
        return Err(ParkmeansError::BufferSizeMismatch {
            expected,
            actual: received.len(),
        });
    }
    Ok(())
}
