//! Minimal SNTP (RFC 4330) client: one request, one reply.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use super::TimeSource;
use crate::{Error, Result};

pub const NTP_PORT: u16 = 123;
const PACKET_LEN: usize = 48;
/// Seconds between 1900-01-01 and 1970-01-01.
const NTP_UNIX_OFFSET: u64 = 2_208_988_800;
// LI = 0, VN = 3, Mode = 3 (client)
const CLIENT_HEADER: u8 = 0x1B;
const MODE_SERVER: u8 = 4;
const MODE_BROADCAST: u8 = 5;

#[derive(Debug, Default, Clone, Copy)]
pub struct SntpClient;

impl TimeSource for SntpClient {
    fn fetch(&self, server: &str, timeout: Duration) -> Result<SystemTime> {
        let deadline = Instant::now() + timeout;
        let target = resolve(server, timeout)?;
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(Error::TimeSync(format!("{server}: timed out resolving")));
        }

        let socket = UdpSocket::bind(bind_addr_for(&target))?;
        socket.set_read_timeout(Some(remaining))?;
        socket.set_write_timeout(Some(remaining))?;
        socket.connect(target)?;

        let started = Instant::now();
        socket.send(&request_packet())?;
        let mut buf = [0u8; PACKET_LEN];
        let read = socket.recv(&mut buf)?;
        let round_trip = started.elapsed();

        let transmit = parse_reply(&buf[..read])?;
        Ok(transmit + round_trip / 2)
    }
}

/// Look up `server` on a helper thread so the lookup is bounded by `timeout`.
/// A lookup still running at the deadline is abandoned.
pub fn resolve(server: &str, timeout: Duration) -> Result<SocketAddr> {
    let (tx, rx) = mpsc::channel();
    let host = server.to_string();
    thread::spawn(move || {
        let first = (host.as_str(), NTP_PORT)
            .to_socket_addrs()
            .map(|mut addrs| addrs.next());
        let _ = tx.send(first);
    });
    match rx.recv_timeout(timeout) {
        Ok(Ok(Some(addr))) => Ok(addr),
        Ok(Ok(None)) => Err(Error::TimeSync(format!("{server}: no addresses"))),
        Ok(Err(err)) => Err(Error::TimeSync(format!("{server}: {err}"))),
        Err(_) => Err(Error::TimeSync(format!("{server}: timed out resolving"))),
    }
}

/// Wildcard local address in the same family as `target`.
pub fn bind_addr_for(target: &SocketAddr) -> SocketAddr {
    match target {
        SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
        SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
    }
}

pub fn request_packet() -> [u8; PACKET_LEN] {
    let mut packet = [0u8; PACKET_LEN];
    packet[0] = CLIENT_HEADER;
    packet
}

/// Validate a server reply and return its transmit timestamp.
pub fn parse_reply(buf: &[u8]) -> Result<SystemTime> {
    if buf.len() < PACKET_LEN {
        return Err(Error::TimeSync(format!(
            "short reply: {} of {PACKET_LEN} bytes",
            buf.len()
        )));
    }
    let mode = buf[0] & 0x07;
    if mode != MODE_SERVER && mode != MODE_BROADCAST {
        return Err(Error::TimeSync(format!("unexpected mode {mode}")));
    }
    let stratum = buf[1];
    if stratum == 0 {
        return Err(Error::TimeSync("kiss-of-death reply (stratum 0)".into()));
    }

    let secs = u32::from_be_bytes([buf[40], buf[41], buf[42], buf[43]]) as u64;
    let frac = u32::from_be_bytes([buf[44], buf[45], buf[46], buf[47]]) as u64;
    if secs == 0 {
        return Err(Error::TimeSync("reply has no transmit timestamp".into()));
    }
    let unix_secs = secs
        .checked_sub(NTP_UNIX_OFFSET)
        .ok_or_else(|| Error::TimeSync("transmit timestamp predates 1970".into()))?;
    let nanos = (frac * 1_000_000_000) >> 32;
    Ok(UNIX_EPOCH + Duration::new(unix_secs, nanos as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(mode: u8, stratum: u8, secs: u32, frac: u32) -> [u8; PACKET_LEN] {
        let mut buf = [0u8; PACKET_LEN];
        buf[0] = 0x18 | mode;
        buf[1] = stratum;
        buf[40..44].copy_from_slice(&secs.to_be_bytes());
        buf[44..48].copy_from_slice(&frac.to_be_bytes());
        buf
    }

    #[test]
    fn request_is_v3_client() {
        let packet = request_packet();
        assert_eq!(packet[0], 0x1B);
        assert!(packet[1..].iter().all(|b| *b == 0));
    }

    #[test]
    fn converts_transmit_timestamp_to_unix() {
        let unix = 1_700_000_000u64;
        let buf = reply(4, 2, (unix + NTP_UNIX_OFFSET) as u32, 1 << 31);
        let t = parse_reply(&buf).unwrap();
        assert_eq!(
            t.duration_since(UNIX_EPOCH).unwrap(),
            Duration::new(unix, 500_000_000)
        );
    }

    #[test]
    fn rejects_short_and_bogus_replies() {
        assert!(parse_reply(&[0u8; 12]).is_err());
        let unix = (1_700_000_000u64 + NTP_UNIX_OFFSET) as u32;
        assert!(parse_reply(&reply(3, 2, unix, 0)).is_err());
        assert!(parse_reply(&reply(4, 0, unix, 0)).is_err());
        assert!(parse_reply(&reply(4, 2, 0, 0)).is_err());
    }

    #[test]
    fn binds_in_the_server_address_family() {
        let v6 = resolve("2001:db8::123", Duration::from_secs(1)).unwrap();
        assert_eq!(v6, "[2001:db8::123]:123".parse::<SocketAddr>().unwrap());
        assert_eq!(bind_addr_for(&v6), "[::]:0".parse::<SocketAddr>().unwrap());

        let v4 = resolve("192.0.2.7", Duration::from_secs(1)).unwrap();
        assert_eq!(bind_addr_for(&v4), "0.0.0.0:0".parse::<SocketAddr>().unwrap());
    }
}
