// link.rs
//
// In-memory stand-in for the UART between the host poller and the
// meter. Faithful to the real driver in the one property that matters:
// reception is one-shot, so a frame sent while the receiver is
// disarmed is lost without trace.

use ecometer_core::{SerialRx, SerialTx, TxTimeout, REQUEST_LEN};
use embassy_time::Duration;

/// Captures everything the responder transmits.
pub struct LoopbackSerial {
    outbox: Vec<u8>,
}

impl LoopbackSerial {
    pub fn new() -> Self {
        Self { outbox: Vec::new() }
    }

    /// Pops one fixed-size frame off the front of the outbox, if a
    /// complete one is there.
    pub fn take_frame<const N: usize>(&mut self) -> Option<[u8; N]> {
        if self.outbox.len() < N {
            return None;
        }
        let mut frame = [0u8; N];
        frame.copy_from_slice(&self.outbox[..N]);
        self.outbox.drain(..N);
        Some(frame)
    }

    pub fn drain_all(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.outbox)
    }
}

impl SerialTx for LoopbackSerial {
    fn transmit(&mut self, bytes: &[u8], _timeout: Duration) -> Result<(), TxTimeout> {
        self.outbox.extend_from_slice(bytes);
        Ok(())
    }
}

/// One-shot receive slot the poller must find armed before a frame
/// can get through.
pub struct OneShotReceiver {
    armed_len: Option<usize>,
}

impl OneShotReceiver {
    pub fn new() -> Self {
        Self { armed_len: None }
    }

    /// Delivers a request frame if the receiver is armed for exactly
    /// that many bytes. Consumes the armed slot either way the driver
    /// would: a completed reception must be re-armed before the next
    /// frame can land.
    pub fn try_deliver(&mut self, frame: &[u8; REQUEST_LEN]) -> Option<[u8; REQUEST_LEN]> {
        match self.armed_len.take() {
            Some(len) if len == REQUEST_LEN => Some(*frame),
            _ => None,
        }
    }
}

impl SerialRx for OneShotReceiver {
    fn arm(&mut self, len: usize) {
        self.armed_len = Some(len);
    }
}
