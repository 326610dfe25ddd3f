//! Callback contract between the dispatcher and whatever consumes its
//! events, plus the flat collector the line tokenizer uses.

/// Name given to whitespace events by [`TokenCollector`].
pub const WS: &str = "WS";

/// Receives the dispatcher's event stream for one line.
///
/// Spans are UTF-16 code unit offsets into the line passed to `reset`.
pub trait EventHandler {
    fn reset(&mut self, line: &str);

    fn start_nonterminal(&mut self, _name: &'static str, _begin: usize) {}

    fn end_nonterminal(&mut self, _name: &'static str, _end: usize) {}

    fn terminal(&mut self, name: &'static str, begin: usize, end: usize);

    fn whitespace(&mut self, begin: usize, end: usize);
}

/// One collected terminal or whitespace run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken {
    pub name: &'static str,
    pub value: String,
    pub begin: usize,
    pub end: usize,
}

/// Flattens terminals and whitespace into [`RawToken`]s; nonterminal
/// events are ignored.
#[derive(Debug, Default)]
pub struct TokenCollector {
    input: Vec<u16>,
    tokens: Vec<RawToken>,
}

impl TokenCollector {
    pub fn new(line: &str) -> Self {
        let mut collector = Self::default();
        collector.reset(line);
        collector
    }

    pub fn tokens(&self) -> &[RawToken] {
        &self.tokens
    }

    /// Hand over everything collected so far.
    pub fn take(&mut self) -> Vec<RawToken> {
        std::mem::take(&mut self.tokens)
    }

    fn push(&mut self, name: &'static str, begin: usize, end: usize) {
        let end = end.min(self.input.len());
        let begin = begin.min(end);
        self.tokens.push(RawToken {
            name,
            value: String::from_utf16_lossy(&self.input[begin..end]),
            begin,
            end,
        });
    }
}

impl EventHandler for TokenCollector {
    fn reset(&mut self, line: &str) {
        self.input = line.encode_utf16().collect();
        self.tokens.clear();
    }

    fn terminal(&mut self, name: &'static str, begin: usize, end: usize) {
        self.push(name, begin, end);
    }

    fn whitespace(&mut self, begin: usize, end: usize) {
        if begin < end {
            self.push(WS, begin, end);
        }
    }
}
