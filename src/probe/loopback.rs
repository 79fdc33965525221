//! UDP loopback transport statistics source
//!
//! Generates a paced packet train between two local sockets (sender and
//! echo) and derives the statistics the jitter probe polls: cumulative
//! received/lost counts, RFC 3550 style interarrival jitter and the most
//! recent echo round-trip time. The local loopback stands in for a real
//! media path the same way the original silent loopback call did, without
//! requiring any remote endpoint.

use crate::error::{AppError, Result};
use crate::models::TransportSnapshot;
use crate::probe::TransportStatsSource;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

/// Packet pacing of the generated train (50 packets/s, a typical voice
/// frame cadence)
const PACING: Duration = Duration::from_millis(20);

/// Wire payload: sequence number + send timestamp + padding
const PAYLOAD_LEN: usize = 32;
const HEADER_LEN: usize = 12;

#[derive(Debug, Default)]
struct LoopbackStats {
    packets_sent: u64,
    packets_received: u64,
    highest_seq: Option<u32>,
    jitter_seconds: f64,
    last_rtt_seconds: Option<f64>,
    prev_sent_elapsed: Option<f64>,
    prev_arrival_elapsed: Option<f64>,
}

impl LoopbackStats {
    /// RFC 3550 interarrival jitter over (arrival spacing - send spacing)
    fn record_arrival(&mut self, seq: u32, sent_elapsed: f64, arrival_elapsed: f64) {
        self.packets_received += 1;
        self.highest_seq = Some(self.highest_seq.map_or(seq, |h| h.max(seq)));
        self.last_rtt_seconds = Some((arrival_elapsed - sent_elapsed).max(0.0));

        if let (Some(prev_sent), Some(prev_arrival)) =
            (self.prev_sent_elapsed, self.prev_arrival_elapsed)
        {
            let d = (arrival_elapsed - prev_arrival) - (sent_elapsed - prev_sent);
            self.jitter_seconds += (d.abs() - self.jitter_seconds) / 16.0;
        }
        self.prev_sent_elapsed = Some(sent_elapsed);
        self.prev_arrival_elapsed = Some(arrival_elapsed);
    }

    fn snapshot(&self) -> Option<TransportSnapshot> {
        if self.packets_received == 0 {
            return None;
        }
        // Expected count follows the highest sequence seen, so packets
        // still in flight are not counted as lost.
        let expected = self.highest_seq.map_or(0, |h| h as u64 + 1);
        let lost = expected.saturating_sub(self.packets_received);
        Some(TransportSnapshot {
            packets_lost: lost,
            packets_received: self.packets_received,
            jitter_seconds: self.jitter_seconds,
            round_trip_seconds: self.last_rtt_seconds,
        })
    }
}

struct LiveTransport {
    stats: Arc<Mutex<LoopbackStats>>,
    sender_task: JoinHandle<()>,
    echo_task: JoinHandle<()>,
    recv_task: JoinHandle<()>,
}

impl LiveTransport {
    fn abort(&self) {
        self.sender_task.abort();
        self.echo_task.abort();
        self.recv_task.abort();
    }
}

/// In-process UDP loopback packet train
pub struct UdpLoopbackTransport {
    live: Option<LiveTransport>,
}

impl UdpLoopbackTransport {
    /// Create an idle transport; sockets are bound on `negotiate`
    pub fn new() -> Self {
        Self { live: None }
    }

    fn encode_packet(seq: u32, sent_elapsed_micros: u64) -> [u8; PAYLOAD_LEN] {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[..4].copy_from_slice(&seq.to_be_bytes());
        payload[4..12].copy_from_slice(&sent_elapsed_micros.to_be_bytes());
        payload
    }

    fn decode_packet(buf: &[u8]) -> Option<(u32, u64)> {
        if buf.len() < HEADER_LEN {
            return None;
        }
        let seq = u32::from_be_bytes(buf[..4].try_into().ok()?);
        let sent = u64::from_be_bytes(buf[4..12].try_into().ok()?);
        Some((seq, sent))
    }
}

impl Default for UdpLoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransportStatsSource for UdpLoopbackTransport {
    async fn negotiate(&mut self) -> Result<()> {
        // A stale run must be torn down before starting fresh
        if let Some(live) = self.live.take() {
            live.abort();
        }

        let bind_addr: SocketAddr = "127.0.0.1:0".parse().expect("static loopback address");
        let sender = Arc::new(UdpSocket::bind(bind_addr).await.map_err(|e| {
            AppError::resource_unavailable(format!("cannot bind loopback sender socket: {}", e))
        })?);
        let echo = Arc::new(UdpSocket::bind(bind_addr).await.map_err(|e| {
            AppError::resource_unavailable(format!("cannot bind loopback echo socket: {}", e))
        })?);
        let echo_addr = echo.local_addr().map_err(AppError::from)?;

        let stats = Arc::new(Mutex::new(LoopbackStats::default()));
        let epoch = Instant::now();

        // Paced sender: sequence + send timestamp toward the echo socket
        let sender_task = {
            let socket = sender.clone();
            let stats = stats.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(PACING);
                let mut seq: u32 = 0;
                loop {
                    ticker.tick().await;
                    let elapsed = epoch.elapsed().as_micros() as u64;
                    let payload = Self::encode_packet(seq, elapsed);
                    if socket.send_to(&payload, echo_addr).await.is_err() {
                        break;
                    }
                    stats.lock().expect("stats lock poisoned").packets_sent += 1;
                    seq = seq.wrapping_add(1);
                }
            })
        };

        // Echo side: reflect every datagram back to its source
        let echo_task = {
            let socket = echo.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; PAYLOAD_LEN];
                loop {
                    match socket.recv_from(&mut buf).await {
                        Ok((n, src)) => {
                            let _ = socket.send_to(&buf[..n], src).await;
                        }
                        Err(_) => break,
                    }
                }
            })
        };

        // Receive side: match echoes to send timestamps and update stats
        let recv_task = {
            let socket = sender.clone();
            let stats = stats.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; PAYLOAD_LEN];
                loop {
                    match socket.recv_from(&mut buf).await {
                        Ok((n, _)) => {
                            if let Some((seq, sent_micros)) = Self::decode_packet(&buf[..n]) {
                                let arrival = epoch.elapsed().as_secs_f64();
                                let sent = sent_micros as f64 / 1_000_000.0;
                                stats
                                    .lock()
                                    .expect("stats lock poisoned")
                                    .record_arrival(seq, sent, arrival);
                            }
                        }
                        Err(_) => break,
                    }
                }
            })
        };

        self.live = Some(LiveTransport {
            stats,
            sender_task,
            echo_task,
            recv_task,
        });

        Ok(())
    }

    async fn sample(&mut self) -> Result<Option<TransportSnapshot>> {
        let live = self
            .live
            .as_ref()
            .ok_or_else(|| AppError::probe("loopback transport is not negotiated"))?;
        Ok(live.stats.lock().expect("stats lock poisoned").snapshot())
    }

    async fn shutdown(&mut self) -> Result<()> {
        if let Some(live) = self.live.take() {
            live.abort();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_codec_round_trip() {
        let payload = UdpLoopbackTransport::encode_packet(7, 123_456);
        let (seq, sent) = UdpLoopbackTransport::decode_packet(&payload).unwrap();
        assert_eq!(seq, 7);
        assert_eq!(sent, 123_456);

        assert!(UdpLoopbackTransport::decode_packet(&payload[..8]).is_none());
    }

    #[test]
    fn test_stats_loss_follows_highest_sequence() {
        let mut stats = LoopbackStats::default();
        stats.record_arrival(0, 0.000, 0.001);
        stats.record_arrival(1, 0.020, 0.021);
        // Sequence 2 lost, 3 arrives
        stats.record_arrival(3, 0.060, 0.062);

        let snapshot = stats.snapshot().unwrap();
        assert_eq!(snapshot.packets_received, 3);
        assert_eq!(snapshot.packets_lost, 1);
    }

    #[test]
    fn test_stats_jitter_converges_toward_spacing_variation() {
        let mut stats = LoopbackStats::default();
        // Perfectly regular arrivals: jitter stays at zero
        for i in 0..10u32 {
            let t = i as f64 * 0.020;
            stats.record_arrival(i, t, t + 0.001);
        }
        assert!(stats.jitter_seconds.abs() < 1e-12);

        // A 5 ms arrival disturbance registers as jitter
        stats.record_arrival(10, 0.200, 0.206);
        assert!(stats.jitter_seconds > 0.0);
    }

    #[test]
    fn test_empty_stats_yield_no_snapshot() {
        let stats = LoopbackStats::default();
        assert!(stats.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_loopback_train_produces_samples() {
        let mut transport = UdpLoopbackTransport::new();
        transport.negotiate().await.unwrap();

        // Give the train a few pacing intervals to circulate
        tokio::time::sleep(Duration::from_millis(120)).await;

        let snapshot = transport.sample().await.unwrap();
        transport.shutdown().await.unwrap();

        let snapshot = snapshot.expect("loopback should have echoed packets");
        assert!(snapshot.packets_received > 0);
        assert!(snapshot.round_trip_seconds.is_some());
        // Loopback RTT is far below a real network path
        assert!(snapshot.round_trip_seconds.unwrap() < 1.0);
    }

    #[tokio::test]
    async fn test_sample_before_negotiate_is_an_error() {
        let mut transport = UdpLoopbackTransport::new();
        assert!(transport.sample().await.is_err());
    }
}
