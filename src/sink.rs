use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use crate::error::StatsdError;

/// Destination for finished payloads.
///
/// Implementations send a payload as a single unit; a payload is never
/// split. Errors are returned to the client, which reports them through its
/// diagnostic channel rather than to the emitting caller.
pub trait MetricSink {
    fn emit(&self, payload: &[u8]) -> io::Result<usize>;
}

/// Sends each payload as one UDP datagram, fire-and-forget.
pub struct UdpMetricSink {
    addr: SocketAddr,
    socket: UdpSocket,
}

impl UdpMetricSink {
    /// Resolve the destination and bind a local socket for it.
    ///
    /// Resolution happens here so that a bad address fails at construction
    /// instead of on every send.
    pub fn new<A: ToSocketAddrs>(addr: A) -> Result<UdpMetricSink, StatsdError> {
        let addr = addr
            .to_socket_addrs()
            .map_err(|e| StatsdError::AddrParse(e.to_string()))?
            .next()
            .ok_or_else(|| StatsdError::AddrParse("address resolved to nothing".to_string()))?;

        // Bind to a generic port as we'll only be writing on this socket.
        let socket = if addr.is_ipv4() {
            UdpSocket::bind("0.0.0.0:0")?
        } else {
            UdpSocket::bind("[::]:0")?
        };
        socket.set_nonblocking(true)?;
        Ok(UdpMetricSink { addr, socket })
    }
}

impl MetricSink for UdpMetricSink {
    fn emit(&self, payload: &[u8]) -> io::Result<usize> {
        self.socket.send_to(payload, self.addr)
    }
}

/// Discards every payload. Useful for wiring up instrumented code paths
/// without a statsd server to talk to.
pub struct NopMetricSink;

impl MetricSink for NopMetricSink {
    fn emit(&self, payload: &[u8]) -> io::Result<usize> {
        Ok(payload.len())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str;

    #[test]
    fn test_udp_sink_round_trip() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let sink = UdpMetricSink::new(server.local_addr().unwrap()).unwrap();

        let sent = sink.emit(b"metric:1|c").unwrap();
        assert_eq!(sent, 10);

        let mut buf = [0; 64];
        let (len, _) = server.recv_from(&mut buf).unwrap();
        assert_eq!(str::from_utf8(&buf[0..len]).unwrap(), "metric:1|c");
    }

    #[test]
    fn test_udp_sink_bad_address() {
        let err = UdpMetricSink::new("not an address");
        assert!(matches!(err, Err(StatsdError::AddrParse(_))));
    }

    #[test]
    fn test_nop_sink_accepts_everything() {
        let sink = NopMetricSink;
        assert_eq!(sink.emit(b"metric:1|c").unwrap(), 10);
    }
}
