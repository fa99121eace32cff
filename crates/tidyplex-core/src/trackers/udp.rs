//! Client side of the UDP tracker connect handshake (BEP 15).
//!
//! A probe is the first exchange only: send a 16-byte connect request,
//! expect a 16-byte connect response echoing our transaction id. No
//! announce follows; a correct echo is proof enough that a live
//! tracker sits behind the address.

use std::io::{self, Cursor, Write};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

use byteorder::{NetworkEndian, ReadBytesExt, WriteBytesExt};
use rand::random;
use tracing::debug;
use url::Url;

use super::ProbeError;

const PROTOCOL_IDENTIFIER: i64 = 4_497_486_125_440;
const CONNECT_ACTION: i32 = 0;
const CONNECT_RESPONSE_LEN: usize = 16;

/// Announce URLs without an explicit port, like `udp://tracker.example/announce`.
const DEFAULT_TRACKER_PORT: u16 = 80;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct TransactionId(pub i32);

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct ConnectionId(pub i64);

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct ConnectRequest {
    pub transaction_id: TransactionId,
}

impl ConnectRequest {
    pub fn write(&self, bytes: &mut impl Write) -> Result<(), io::Error> {
        bytes.write_i64::<NetworkEndian>(PROTOCOL_IDENTIFIER)?;
        bytes.write_i32::<NetworkEndian>(CONNECT_ACTION)?;
        bytes.write_i32::<NetworkEndian>(self.transaction_id.0)?;
        Ok(())
    }
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct ConnectResponse {
    pub action: i32,
    pub transaction_id: TransactionId,
    pub connection_id: ConnectionId,
}

impl ConnectResponse {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, io::Error> {
        let mut cursor = Cursor::new(bytes);
        let action = cursor.read_i32::<NetworkEndian>()?;
        let transaction_id = cursor.read_i32::<NetworkEndian>()?;
        let connection_id = cursor.read_i64::<NetworkEndian>()?;
        Ok(Self {
            action,
            transaction_id: TransactionId(transaction_id),
            connection_id: ConnectionId(connection_id),
        })
    }
}

/// One connect exchange against the tracker behind `url`. Returns the
/// round-trip time on a valid echo.
pub fn probe(url: &Url, timeout: Duration) -> Result<Duration, ProbeError> {
    let host = url
        .host_str()
        .ok_or_else(|| ProbeError::Unreachable("URL has no host".to_string()))?;
    let port = url.port().unwrap_or(DEFAULT_TRACKER_PORT);

    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|err| ProbeError::Unreachable(format!("address lookup failed: {err}")))?
        .next()
        .ok_or_else(|| ProbeError::Unreachable("address lookup returned nothing".to_string()))?;

    let bind_addr = match addr {
        SocketAddr::V4(_) => "0.0.0.0:0",
        SocketAddr::V6(_) => "[::]:0",
    };
    let socket =
        UdpSocket::bind(bind_addr).map_err(|err| ProbeError::Unreachable(err.to_string()))?;
    socket
        .set_read_timeout(Some(timeout))
        .map_err(|err| ProbeError::Unreachable(err.to_string()))?;
    socket
        .set_write_timeout(Some(timeout))
        .map_err(|err| ProbeError::Unreachable(err.to_string()))?;
    // connect filters out datagrams from anyone but the tracker
    socket
        .connect(addr)
        .map_err(|err| ProbeError::Unreachable(err.to_string()))?;

    let transaction_id = TransactionId(random::<i32>());
    let mut request = Vec::with_capacity(16);
    ConnectRequest { transaction_id }
        .write(&mut request)
        .map_err(|err| ProbeError::Unreachable(err.to_string()))?;

    let started = Instant::now();
    socket
        .send(&request)
        .map_err(|err| ProbeError::Unreachable(err.to_string()))?;

    let mut buffer = [0u8; 32];
    let received = match socket.recv(&mut buffer) {
        Ok(n) => n,
        Err(err) if matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
            return Err(ProbeError::TimedOut);
        }
        Err(err) => return Err(ProbeError::Unreachable(err.to_string())),
    };
    let latency = started.elapsed();

    if received < CONNECT_RESPONSE_LEN {
        return Err(ProbeError::BadResponse(format!(
            "short reply: {received} bytes"
        )));
    }
    let response = ConnectResponse::from_bytes(&buffer[..received])
        .map_err(|err| ProbeError::BadResponse(err.to_string()))?;
    if response.action != CONNECT_ACTION {
        return Err(ProbeError::BadResponse(format!(
            "unexpected action {}",
            response.action
        )));
    }
    if response.transaction_id != transaction_id {
        return Err(ProbeError::BadResponse(
            "transaction id mismatch".to_string(),
        ));
    }

    debug!(
        "{} answered in {:?} (connection id {})",
        url,
        latency,
        response.connection_id.0
    );
    Ok(latency)
}
