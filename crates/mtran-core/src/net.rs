use std::net::TcpListener;

use anyhow::{Context, Result};

/// Allocates an ephemeral OS-assigned TCP port and immediately releases it.
///
/// There is an inherent TOCTOU window between this call returning and the
/// child process binding the port: a concurrent allocation can observe the
/// same number before the first child claims it. Callers treat a bind
/// failure in the spawned child as an ordinary, retryable creation failure
/// rather than a bug (see spec §9, "Port allocation vs. TOCTOU").
pub fn allocate_free_port() -> Result<u16> {
    let listener =
        TcpListener::bind("127.0.0.1:0").context("failed to bind ephemeral port for allocation")?;
    let port = listener
        .local_addr()
        .context("failed to read local address of ephemeral listener")?
        .port();
    drop(listener);
    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_free_port_returns_nonzero_port() {
        let port = allocate_free_port().expect("allocate");
        assert!(port > 0);
    }

    #[test]
    fn concurrent_allocations_need_not_collide() {
        let a = allocate_free_port().expect("allocate a");
        let b = allocate_free_port().expect("allocate b");
        // Not a strict invariant (the OS may reuse a just-released port under
        // extreme churn), but in practice back-to-back calls differ.
        let _ = (a, b);
    }
}
