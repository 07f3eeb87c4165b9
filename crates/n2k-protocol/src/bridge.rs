//! Serial CAN Bridge I/O
//!
//! Async byte transport for an SLCAN adapter. The reader hands raw chunks
//! to the caller (parsing stays synchronous in [`crate::TelemetryDecoder`]);
//! the writer serializes outbound frames as SLCAN lines.

use crate::error::N2kError;
use crate::frame::CanFrame;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info};

/// Read chunk size; a handful of SLCAN lines
const READ_CHUNK: usize = 256;

/// Receive half of the bridge
pub struct SlcanReader<R> {
    reader: R,
    buf: [u8; READ_CHUNK],
    bytes_read: u64,
}

impl<R: AsyncRead + Unpin> SlcanReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: [0; READ_CHUNK],
            bytes_read: 0,
        }
    }

    /// Wait for the next chunk of bytes.
    ///
    /// Returns whatever the transport had available (at least one byte).
    /// End-of-stream is reported as [`N2kError::BridgeClosed`]. Cancel safe.
    pub async fn read_chunk(&mut self) -> Result<&[u8], N2kError> {
        let n = self.reader.read(&mut self.buf).await?;
        if n == 0 {
            return Err(N2kError::BridgeClosed);
        }
        self.bytes_read += n as u64;
        Ok(&self.buf[..n])
    }

    /// Total bytes received so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

/// Transmit half of the bridge
pub struct SlcanWriter<W> {
    writer: W,
    frames_sent: u64,
}

impl<W: AsyncWrite + Unpin> SlcanWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            frames_sent: 0,
        }
    }

    /// Write one frame as an SLCAN line and flush it
    pub async fn send_frame(&mut self, frame: &CanFrame) -> Result<(), N2kError> {
        let line = frame.to_slcan_line();
        debug!("TX {}", line.trim_end());
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        self.frames_sent += 1;
        Ok(())
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }
}

/// Open a serial SLCAN adapter and split it into reader and writer halves
pub fn open_serial(
    device: &str,
    baud_rate: u32,
) -> Result<(SlcanReader<ReadHalf<SerialStream>>, SlcanWriter<WriteHalf<SerialStream>>), N2kError>
{
    info!("Opening CAN bridge on {} at {} baud", device, baud_rate);
    let stream = tokio_serial::new(device, baud_rate).open_native_async()?;
    let (reader, writer) = tokio::io::split(stream);
    Ok((SlcanReader::new(reader), SlcanWriter::new(writer)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{AutopilotCommand, CommandEncoder};
    use crate::decoder::TelemetryDecoder;
    use crate::state::ApMode;

    #[tokio::test]
    async fn test_read_chunks_feed_decoder() {
        let (mut remote, local) = tokio::io::duplex(64);
        let mut reader = SlcanReader::new(local);
        let mut decoder = TelemetryDecoder::new();

        remote.write_all(b"T09F2000A4000070").await.unwrap();
        remote.write_all(b"17\r").await.unwrap();
        drop(remote);

        loop {
            match reader.read_chunk().await {
                Ok(bytes) => {
                    decoder.feed(bytes);
                }
                Err(N2kError::BridgeClosed) => break,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(decoder.state().engine_rpm(), 1500);
        assert_eq!(reader.bytes_read(), 19);
    }

    #[tokio::test]
    async fn test_send_frame_writes_slcan_line() {
        let (mut remote, local) = tokio::io::duplex(64);
        let mut writer = SlcanWriter::new(local);
        let frame = CommandEncoder::default().encode(&AutopilotCommand::new(
            false,
            ApMode::Standby,
            0.0,
        ));
        writer.send_frame(&frame).await.unwrap();
        assert_eq!(writer.frames_sent(), 1);

        let mut buf = vec![0u8; 27];
        remote.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"T09F1056480000000000000000\r");
    }
}
