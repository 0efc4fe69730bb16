// export.rs
//
// Plain-text telemetry export. Not part of the binary poll loop: this
// is a standalone entry point for a consumer that reads newline-
// terminated ASCII (`readline()` on the far end) instead of response
// frames. It shares the blocking transmit capability and its timeout
// with the responder, nothing else.

use crate::responder::{SerialTx, TxTimeout, TX_TIMEOUT};
use core::fmt::Write;

/// The far end parses by line; a line that does not fit must fail,
/// never transmit truncated.
pub const EXPORT_LINE_MAX: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExportError {
    LineOverflow,
    TransmitTimeout,
}

impl From<TxTimeout> for ExportError {
    fn from(_: TxTimeout) -> Self {
        ExportError::TransmitTimeout
    }
}

/// Formats the status line for the given tick.
///
/// The values are simulated: fixed bases with a tick-derived
/// perturbation, independent of the binary path's counters.
/// Electricity is formatted to two decimal places, water to three.
pub fn format_status_line(tick: u64) -> Result<heapless::String<EXPORT_LINE_MAX>, ExportError> {
    let power_kwh = 2.5f32 + (tick % 100) as f32 / 50.0;
    let water_l = 0.5f32 + (tick % 200) as f32 / 1000.0;

    let mut line = heapless::String::new();
    write!(line, "elec:{:.2},water:{:.3}\n", power_kwh, water_l)
        .map_err(|_| ExportError::LineOverflow)?;
    Ok(line)
}

/// Formats and transmits one status line with the bounded timeout.
pub fn export_status<T: SerialTx>(tx: &mut T, tick: u64) -> Result<(), ExportError> {
    let line = format_status_line(tick)?;
    tx.transmit(line.as_bytes(), TX_TIMEOUT)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_time::Duration;

    #[test]
    fn test_line_at_tick_zero() {
        let line = format_status_line(0).unwrap();
        assert_eq!(line.as_str(), "elec:2.50,water:0.500\n");
    }

    #[test]
    fn test_line_perturbation() {
        // 2.5 + 75/50 = 4.00, 0.5 + 75/1000 = 0.575
        let line = format_status_line(75).unwrap();
        assert_eq!(line.as_str(), "elec:4.00,water:0.575\n");
    }

    #[test]
    fn test_perturbation_wraps_with_tick() {
        assert_eq!(format_status_line(100).unwrap(), format_status_line(300).unwrap());
    }

    struct CaptureTx(heapless::Vec<u8, 64>);

    impl SerialTx for CaptureTx {
        fn transmit(&mut self, bytes: &[u8], _timeout: Duration) -> Result<(), TxTimeout> {
            self.0.extend_from_slice(bytes).unwrap();
            Ok(())
        }
    }

    #[test]
    fn test_export_transmits_one_terminated_line() {
        let mut tx = CaptureTx(heapless::Vec::new());
        export_status(&mut tx, 42).unwrap();
        assert_eq!(tx.0.last(), Some(&b'\n'));
        assert_eq!(tx.0.iter().filter(|&&b| b == b'\n').count(), 1);
        assert!(tx.0.starts_with(b"elec:"));
    }
}
