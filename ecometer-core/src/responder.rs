// responder.rs
use crate::protocol::{FrameError, RequestFrame, ResponseFrame, REQUEST_LEN};
use embassy_time::Duration;

/// Upper bound on a single blocking transmit. A reply that cannot go
/// out within this window is abandoned, never retried.
pub const TX_TIMEOUT: Duration = Duration::from_millis(100);

/// Transmit was still in progress when the timeout expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxTimeout;

/// Blocking send over the serial link, provided by the platform layer.
pub trait SerialTx {
    fn transmit(&mut self, bytes: &[u8], timeout: Duration) -> Result<(), TxTimeout>;
}

/// One-shot receive arming, provided by the platform layer.
///
/// `arm` requests exactly one asynchronous reception of `len` bytes
/// into the shared request buffer; completion hands that buffer to
/// [`Responder::on_receive_complete`] exactly once. A frame arriving
/// while disarmed is lost below this layer.
pub trait SerialRx {
    fn arm(&mut self, len: usize);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    WaitingForRequest,
    ProcessingRequest,
}

/// What a single handler invocation did. Purely informational: the
/// host is never told about failures, it just sees silence this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandleOutcome {
    Responded,
    BadFrame(FrameError),
    ResponseLost,
}

/// Fixed-point base reading: 4.20 kWh in hundredths.
pub const ELECTRICITY_BASE_CWH: u16 = 420;

/// Fixed-point base reading: 1.15 L in hundredths.
pub const WATER_BASE_CL: u16 = 115;

/// Simulated meter counters, in hundredths of a kWh and of a litre.
///
/// Owned by the responder and only ever touched from the handler, so
/// no locking discipline is needed. The counters only grow, modulo
/// 16-bit wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MeterReadings {
    pub electricity_cwh: u16,
    pub water_cl: u16,
}

impl MeterReadings {
    pub const fn new() -> Self {
        Self {
            electricity_cwh: ELECTRICITY_BASE_CWH,
            water_cl: WATER_BASE_CL,
        }
    }

    /// Advances both counters by a small tick-derived delta. No real
    /// randomness needed, just visible motion between polls.
    pub fn advance(&mut self, tick: u64) {
        self.electricity_cwh = self.electricity_cwh.wrapping_add((tick % 5) as u16);
        self.water_cl = self.water_cl.wrapping_add((tick % 3) as u16);
    }
}

impl Default for MeterReadings {
    fn default() -> Self {
        Self::new()
    }
}

/// Answers host poll frames with the current simulated readings.
///
/// The cycle is perpetual: the receiver is armed once at startup and
/// re-armed at the end of every handler invocation, valid frame or
/// not. A path that skips the re-arm stops the device answering
/// forever, so the re-arm is held by a scope guard instead of by
/// convention.
pub struct Responder {
    pub state: LinkState,
    pub readings: MeterReadings,
}

impl Responder {
    pub const fn new() -> Self {
        Self {
            state: LinkState::WaitingForRequest,
            readings: MeterReadings::new(),
        }
    }

    /// Handler for a completed 5-byte reception.
    ///
    /// Runs in the receive-completion context, so it must not block
    /// beyond the bounded transmit. `now_ticks` comes from the
    /// platform's monotonic tick source.
    pub fn on_receive_complete<T: SerialTx, R: SerialRx>(
        &mut self,
        buf: &[u8; REQUEST_LEN],
        now_ticks: u64,
        tx: &mut T,
        rx: &mut R,
    ) -> HandleOutcome {
        self.state = LinkState::ProcessingRequest;
        let outcome = {
            // Dropped on every exit path, including unwind.
            let _rearm = RearmGuard(rx);
            self.process(buf, now_ticks, tx)
        };
        self.state = LinkState::WaitingForRequest;
        outcome
    }

    fn process<T: SerialTx>(
        &mut self,
        buf: &[u8; REQUEST_LEN],
        now_ticks: u64,
        tx: &mut T,
    ) -> HandleOutcome {
        let request = match RequestFrame::parse(buf) {
            Ok(request) => request,
            Err(e) => {
                // A malformed frame costs the host one polling cycle
                // with no reply; it times out and retries.
                log::warn!("dropping malformed request: {:?}", e);
                return HandleOutcome::BadFrame(e);
            }
        };
        log::trace!("poll id {}", request.request_id);

        self.readings.advance(now_ticks);
        let response = ResponseFrame {
            electricity_cwh: self.readings.electricity_cwh,
            water_cl: self.readings.water_cl,
        };

        match tx.transmit(&response.encode(), TX_TIMEOUT) {
            Ok(()) => HandleOutcome::Responded,
            Err(TxTimeout) => {
                log::warn!("response transmit timed out, reply lost");
                HandleOutcome::ResponseLost
            }
        }
    }
}

impl Default for Responder {
    fn default() -> Self {
        Self::new()
    }
}

/// Re-arms the receiver for the next request when dropped.
struct RearmGuard<'a, R: SerialRx>(&'a mut R);

impl<R: SerialRx> Drop for RearmGuard<'_, R> {
    fn drop(&mut self) {
        self.0.arm(REQUEST_LEN);
    }
}
