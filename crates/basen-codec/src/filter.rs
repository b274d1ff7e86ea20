//! The push-style filter interface and terminal sinks.
//!
//! A filter accepts bytes through [`Filter::put2`] and forwards processed
//! bytes to the downstream it owns. Backpressure is reported as a residual
//! count: a return of 0 means the call completed; anything else means the
//! caller must repeat the call (same buffer, same `message_end`) until it
//! returns 0. Filters remember where they stopped — which emission site,
//! how much of that emission was accepted, and how far into the input they
//! had consumed — so the repeated call resumes instead of restarting.

use core::cmp;

/// A node that accepts a stream of bytes.
pub trait Filter {
    /// Submits `input`.
    ///
    /// A non-zero `message_end` finalizes the current message once all
    /// input is consumed; the level is forwarded verbatim downstream on the
    /// final emission (level 2 conventionally cascades a flush). `blocking`
    /// is propagated to the downstream.
    ///
    /// Returns 0 on completion, or a residual count (at least 1, at most
    /// `input.len()`) when the downstream blocked. Repeat the call with the
    /// same arguments to continue.
    fn put2(&mut self, input: &[u8], message_end: u32, blocking: bool) -> usize;

    /// Finalizes the current message without submitting new input.
    fn message_end(&mut self, level: u32, blocking: bool) -> usize {
        self.put2(&[], level, blocking)
    }
}

/// Residual to report upstream when blocked: never 0, so the caller knows
/// to come back even if every input byte was consumed.
#[inline]
pub(crate) fn unconsumed(len: usize, pos: usize) -> usize {
    cmp::max(1, len.saturating_sub(pos))
}

/// Tracks a blocked emission so `put2` can resume at the same site.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct FsmState {
    /// Which output statement blocked; 0 when none is pending.
    pub site: u8,
    /// Bytes of the pending emission already accepted downstream.
    pub emit_offset: usize,
    /// Bytes of the caller's buffer already consumed.
    pub input_position: usize,
}

impl FsmState {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Pushes `data[*offset..]` downstream, advancing `offset` past whatever
/// was accepted. Returns true when the emission completed.
pub(crate) fn drain<S: Filter>(
    sink: &mut S,
    data: &[u8],
    offset: &mut usize,
    message_end: u32,
    blocking: bool,
) -> bool {
    let pending = &data[*offset..];
    let residual = sink.put2(pending, message_end, blocking);
    *offset += pending.len().saturating_sub(residual);
    residual == 0
}

/// Terminal sink that collects everything it is given.
#[derive(Clone, Debug, Default)]
pub struct VecSink {
    data: Vec<u8>,
    messages: usize,
}

impl VecSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The bytes collected so far.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of completed messages observed.
    pub fn messages(&self) -> usize {
        self.messages
    }

    /// Consumes the sink, returning the collected bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl Filter for VecSink {
    fn put2(&mut self, input: &[u8], message_end: u32, _blocking: bool) -> usize {
        self.data.extend_from_slice(input);
        if message_end > 0 {
            self.messages += 1;
        }
        0
    }
}

/// Terminal sink that accepts at most a fixed number of bytes per call.
///
/// Useful for exercising backpressure: upstream filters see a residual on
/// every oversized emission and have to resume.
#[derive(Clone, Debug)]
pub struct MeteredSink {
    data: Vec<u8>,
    quota: usize,
    messages: usize,
}

impl MeteredSink {
    /// Creates a sink accepting `quota` bytes per call.
    pub fn new(quota: usize) -> Self {
        Self {
            data: Vec::new(),
            quota,
            messages: 0,
        }
    }

    /// The bytes collected so far.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of completed messages observed.
    pub fn messages(&self) -> usize {
        self.messages
    }

    /// Consumes the sink, returning the collected bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl Filter for MeteredSink {
    fn put2(&mut self, input: &[u8], message_end: u32, _blocking: bool) -> usize {
        let take = input.len().min(self.quota);
        self.data.extend_from_slice(&input[..take]);
        let residual = input.len() - take;
        if residual == 0 {
            if message_end > 0 {
                self.messages += 1;
            }
            0
        } else {
            residual
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_sink_accepts_everything() {
        let mut sink = VecSink::new();
        assert_eq!(sink.put2(b"hello", 0, true), 0);
        assert_eq!(sink.put2(b" world", 1, true), 0);
        assert_eq!(sink.data(), b"hello world");
        assert_eq!(sink.messages(), 1);
    }

    #[test]
    fn metered_sink_reports_residual() {
        let mut sink = MeteredSink::new(3);
        assert_eq!(sink.put2(b"abcdef", 0, false), 3);
        assert_eq!(sink.data(), b"abc");
        // Message end only counts once the final chunk fits.
        assert_eq!(sink.put2(b"def", 1, false), 0);
        assert_eq!(sink.data(), b"abcdef");
        assert_eq!(sink.messages(), 1);
    }

    #[test]
    fn drain_tracks_partial_acceptance() {
        let mut sink = MeteredSink::new(2);
        let mut offset = 0;
        assert!(!drain(&mut sink, b"abcde", &mut offset, 0, false));
        assert_eq!(offset, 2);
        assert!(!drain(&mut sink, b"abcde", &mut offset, 0, false));
        assert_eq!(offset, 4);
        assert!(drain(&mut sink, b"abcde", &mut offset, 0, false));
        assert_eq!(offset, 5);
        assert_eq!(sink.data(), b"abcde");
    }
}
