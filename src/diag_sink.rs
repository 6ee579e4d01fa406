//! Diagnostic log sink.
//!
//! Drains a `LogStream` into any `core::fmt::Write` (UART console on the
//! board, stdout on host). Output format:
//!
//! ```text
//! [  12345678] INFO: start: 0.25 Hz, 400 cycles, top 1250
//! ```
//!
//! A failing writer loses the line. Nothing is propagated back to the
//! main loop.

use core::fmt::{self, Write};

use crate::logging::{format_to_buffer, LogRecord, LogStream};

/// Format one record into `buf`.
///
/// Returns the number of bytes written.
pub fn format_record(record: &LogRecord, buf: &mut [u8]) -> usize {
    format_to_buffer(
        buf,
        format_args!(
            "[{:10}] {}: {}\n",
            record.timestamp_us,
            record.level.as_str(),
            record.message()
        ),
    )
}

/// Write one record as a line.
pub fn write_record<W: Write>(out: &mut W, record: &LogRecord) -> fmt::Result {
    writeln!(
        out,
        "[{:10}] {}: {}",
        record.timestamp_us,
        record.level.as_str(),
        record.message()
    )
}

/// Drain every pending record into `out`, then report drops.
///
/// Returns the number of records drained.
pub fn drain_into<W: Write, const N: usize>(stream: &LogStream<N>, out: &mut W) -> usize {
    let mut count = 0;
    while let Some(record) = stream.drain() {
        let _ = write_record(out, &record);
        count += 1;
    }

    let dropped = stream.take_dropped();
    if dropped > 0 {
        let _ = writeln!(out, "[WARN] Dropped: {}", dropped);
    }
    count
}
