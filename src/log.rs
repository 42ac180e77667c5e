//! Diagnostics emitted by the decoder.
//!
//! The decoder does not log on its own. It reports to a [DecodeLog] that is
//! handed to it at construction, so callers decide where malformed input
//! ends up.

/// Receiver of decoder diagnostics.
pub trait DecodeLog {
    /// Called once for each chunk-size line that could not be parsed.
    ///
    /// `line` is the line with surrounding whitespace stripped.
    fn invalid_chunk_size(&mut self, line: &[u8]);

    /// Called with the raw input of each decode call.
    fn received(&mut self, _data: &[u8]) {}

    /// Called with the output of each decode call.
    fn decoded(&mut self, _data: &[u8]) {}
}

/// Sends diagnostics to [tracing].
///
/// Malformed chunk-size lines are WARN events; input and output sizes are
/// TRACE events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl DecodeLog for TracingLog {
    fn invalid_chunk_size(&mut self, line: &[u8]) {
        tracing::warn!(line = ?String::from_utf8_lossy(line), "invalid chunk size");
    }

    fn received(&mut self, data: &[u8]) {
        tracing::trace!(len = data.len(), "chunked data");
    }

    fn decoded(&mut self, data: &[u8]) {
        tracing::trace!(len = data.len(), "decoded chunk");
    }
}

/// Discards all diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl DecodeLog for NullLog {
    fn invalid_chunk_size(&mut self, _line: &[u8]) {}
}

/// Passes malformed chunk-size lines to a closure.
pub struct CallbackLog<F: FnMut(&[u8])>(pub F);

impl<F: FnMut(&[u8])> DecodeLog for CallbackLog<F> {
    fn invalid_chunk_size(&mut self, line: &[u8]) {
        (self.0)(line)
    }
}

impl<L: DecodeLog + ?Sized> DecodeLog for &mut L {
    fn invalid_chunk_size(&mut self, line: &[u8]) {
        (**self).invalid_chunk_size(line)
    }

    fn received(&mut self, data: &[u8]) {
        (**self).received(data)
    }

    fn decoded(&mut self, data: &[u8]) {
        (**self).decoded(data)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::Write,
        sync::{Arc, Mutex},
    };

    use super::*;

    #[test]
    fn test_callback_log() {
        let mut lines = Vec::new();
        let mut log = CallbackLog(|line: &[u8]| lines.push(line.to_vec()));

        log.invalid_chunk_size(b"zz");
        log.received(b"ignored");
        drop(log);

        assert_eq!(lines, vec![b"zz".to_vec()]);
    }

    #[test]
    fn test_mut_ref_log() {
        let mut lines = Vec::new();
        let mut log = CallbackLog(|line: &[u8]| lines.push(line.len()));

        fn report<L: DecodeLog>(mut log: L) {
            log.invalid_chunk_size(b"abc");
        }

        report(&mut log);
        report(&mut log);
        drop(log);

        assert_eq!(lines, vec![3, 3]);
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_tracing_log() {
        let buffer = SharedBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut log = TracingLog;
            log.invalid_chunk_size(b"not-hex");
            log.received(b"abc");
        });

        let text = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let lines = text.lines().collect::<Vec<&str>>();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("WARN"));
        assert!(lines[0].contains("invalid chunk size"));
        assert!(lines[0].contains(r#"line="not-hex""#));
        assert!(lines[1].contains("TRACE"));
        assert!(lines[1].contains("len=3"));
    }
}
