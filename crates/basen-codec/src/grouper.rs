//! Streaming group formatter.

use crate::error::ConfigError;
use crate::filter::{drain, unconsumed, Filter, FsmState};

const SITE_SEPARATOR: u8 = 1;
const SITE_TERMINATOR: u8 = 2;

/// Configuration for [`Grouper`].
#[derive(Clone, Debug, Default)]
pub struct GrouperConfig {
    /// Bytes per group; 0 disables grouping.
    pub group_size: usize,
    /// Inserted between groups; required when `group_size > 0`.
    pub separator: Option<Vec<u8>>,
    /// Appended at end of message; may be empty.
    pub terminator: Vec<u8>,
}

impl GrouperConfig {
    /// Starts a configuration with grouping disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups every `group_size` bytes, joined by `separator`.
    pub fn with_groups(mut self, group_size: usize, separator: impl Into<Vec<u8>>) -> Self {
        self.group_size = group_size;
        self.separator = Some(separator.into());
        self
    }

    /// Appends `terminator` at end of message.
    pub fn with_terminator(mut self, terminator: impl Into<Vec<u8>>) -> Self {
        self.terminator = terminator.into();
        self
    }
}

/// Forwards its input, inserting a separator every `group_size` bytes and
/// a terminator at end of message.
pub struct Grouper<S> {
    sink: S,
    group_size: usize,
    separator: Vec<u8>,
    terminator: Vec<u8>,
    counter: usize,
    fsm: FsmState,
    final_end: u32,
}

impl<S: Filter> Grouper<S> {
    /// Configures a grouper writing to `sink`.
    pub fn new(config: GrouperConfig, sink: S) -> Result<Self, ConfigError> {
        if config.group_size > 0 && config.separator.is_none() {
            return Err(ConfigError::InvalidArgument {
                filter: "Grouper",
                parameter: "separator",
                message: "required when group_size > 0".to_string(),
            });
        }
        Ok(Self {
            sink,
            group_size: config.group_size,
            separator: config.separator.unwrap_or_default(),
            terminator: config.terminator,
            counter: 0,
            fsm: FsmState::default(),
            final_end: 0,
        })
    }

    /// Shared reference to the downstream.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consumes the grouper, returning the downstream.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: Filter> Filter for Grouper<S> {
    fn put2(&mut self, input: &[u8], message_end: u32, blocking: bool) -> usize {
        match self.fsm.site {
            SITE_SEPARATOR => {
                if !drain(
                    &mut self.sink,
                    &self.separator,
                    &mut self.fsm.emit_offset,
                    0,
                    blocking,
                ) {
                    return unconsumed(input.len(), self.fsm.input_position);
                }
                self.fsm.site = 0;
                self.fsm.emit_offset = 0;
                self.counter = 0;
            }
            SITE_TERMINATOR => {
                if !drain(
                    &mut self.sink,
                    &self.terminator,
                    &mut self.fsm.emit_offset,
                    self.final_end,
                    blocking,
                ) {
                    return 1;
                }
                self.counter = 0;
                self.fsm.clear();
                return 0;
            }
            _ => {}
        }

        let mut pos = self.fsm.input_position;
        if self.group_size > 0 {
            while pos < input.len() {
                if self.counter == self.group_size {
                    self.fsm.input_position = pos;
                    if !drain(
                        &mut self.sink,
                        &self.separator,
                        &mut self.fsm.emit_offset,
                        0,
                        blocking,
                    ) {
                        self.fsm.site = SITE_SEPARATOR;
                        return unconsumed(input.len(), pos);
                    }
                    self.fsm.emit_offset = 0;
                    self.counter = 0;
                }

                let len = (input.len() - pos).min(self.group_size - self.counter);
                let residual = self.sink.put2(&input[pos..pos + len], 0, blocking);
                let accepted = len - residual.min(len);
                pos += accepted;
                self.counter += accepted;
                if residual > 0 {
                    // Forwarded bytes come straight from the input, so the
                    // saved input position is the whole resume state.
                    self.fsm.input_position = pos;
                    return unconsumed(input.len(), pos);
                }
            }
        } else if pos < input.len() {
            let residual = self.sink.put2(&input[pos..], 0, blocking);
            pos = input.len() - residual.min(input.len() - pos);
            if residual > 0 {
                self.fsm.input_position = pos;
                return unconsumed(input.len(), pos);
            }
        }

        if message_end > 0 {
            self.final_end = message_end;
            self.fsm.input_position = pos;
            if !drain(
                &mut self.sink,
                &self.terminator,
                &mut self.fsm.emit_offset,
                message_end,
                blocking,
            ) {
                self.fsm.site = SITE_TERMINATOR;
                return 1;
            }
            self.counter = 0;
        }
        self.fsm.clear();
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::VecSink;

    fn grouper(group_size: usize, separator: &[u8], terminator: &[u8]) -> Grouper<VecSink> {
        let mut config = GrouperConfig::new().with_terminator(terminator);
        if group_size > 0 {
            config = config.with_groups(group_size, separator);
        }
        Grouper::new(config, VecSink::new()).unwrap()
    }

    #[test]
    fn separator_required_with_groups() {
        let config = GrouperConfig {
            group_size: 4,
            separator: None,
            terminator: Vec::new(),
        };
        match Grouper::new(config, VecSink::new()) {
            Err(ConfigError::InvalidArgument {
                filter, parameter, ..
            }) => {
                assert_eq!(filter, "Grouper");
                assert_eq!(parameter, "separator");
            }
            Ok(_) => panic!("missing separator was accepted"),
        }
    }

    #[test]
    fn groups_of_four_with_dash() {
        let mut g = grouper(4, b"-", b"");
        assert_eq!(g.put2(b"ABCDEFGHI", 1, true), 0);
        assert_eq!(g.sink().data(), b"ABCD-EFGH-I");
    }

    #[test]
    fn exact_multiple_has_no_trailing_separator() {
        let mut g = grouper(4, b"-", b"");
        g.put2(b"ABCDEFGH", 1, true);
        assert_eq!(g.sink().data(), b"ABCD-EFGH");
    }

    #[test]
    fn zero_group_size_passes_through() {
        let mut g = grouper(0, b"", b"!");
        g.put2(b"hello world", 1, true);
        assert_eq!(g.sink().data(), b"hello world!");
    }

    #[test]
    fn terminator_emitted_at_message_end() {
        let mut g = grouper(3, b", ", b".\n");
        g.put2(b"abcdef", 1, true);
        assert_eq!(g.sink().data(), b"abc, def.\n");
    }

    #[test]
    fn chunked_input_matches_single_call() {
        let input = b"The quick brown fox";
        let mut whole = grouper(5, b"/", b"|");
        whole.put2(input, 1, true);

        let mut split = grouper(5, b"/", b"|");
        for chunk in input.chunks(2) {
            assert_eq!(split.put2(chunk, 0, true), 0);
        }
        assert_eq!(split.put2(&[], 1, true), 0);

        assert_eq!(whole.sink().data(), split.sink().data());
    }

    #[test]
    fn counter_resets_between_messages() {
        let mut g = grouper(4, b"-", b"");
        g.put2(b"AB", 1, true);
        g.put2(b"CDEFG", 1, true);
        // Each message starts a fresh group.
        assert_eq!(g.sink().data(), b"ABCDEF-G");
        assert_eq!(g.sink().messages(), 2);
    }
}
