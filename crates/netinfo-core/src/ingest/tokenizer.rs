//! Stanza tokenizer for RPSL-style registry dumps
//!
//! Splits a decompressed byte stream into blank-line-delimited paragraphs of
//! `key: value` lines without interpreting any key.
//!
//! # Format
//! ```text
//! % comment, skipped
//! inetnum:        193.0.0.0 - 193.0.7.255
//! descr:          RIPE Network Coordination Centre
//!                 Amsterdam        <- continuation of descr
//! +                                <- continuation (RPSL empty line)
//!
//! inetnum:        ...              <- next stanza
//! ```
//!
//! The tokenizer is a lazy iterator over a [`BufRead`]; memory use is bounded
//! by the largest stanza. Restarting means reopening the input.

use std::io::{self, BufRead};
use tracing::warn;

use super::models::{RawStanza, Source};

/// Dialect-controlled knobs of the tokenizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerOptions {
    /// Lines starting with any of these characters are skipped
    pub comment_prefixes: &'static [char],
    /// Inserted between a value and its continuation line
    pub continuation_separator: char,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            comment_prefixes: &['%', '#'],
            continuation_separator: ' ',
        }
    }
}

/// Iterator of [`RawStanza`] read from a dump stream
pub struct StanzaTokenizer<R> {
    reader: R,
    source: Source,
    options: TokenizerOptions,
    buf: Vec<u8>,
    line_number: usize,
    malformed_lines: u64,
    finished: bool,
}

impl<R: BufRead> StanzaTokenizer<R> {
    pub fn new(reader: R, source: Source, options: TokenizerOptions) -> Self {
        Self {
            reader,
            source,
            options,
            buf: Vec::with_capacity(256),
            line_number: 0,
            malformed_lines: 0,
            finished: false,
        }
    }

    /// Lines skipped because they were neither attributes nor continuations
    pub fn malformed_lines(&self) -> u64 {
        self.malformed_lines
    }

    fn is_comment(&self, line: &str) -> bool {
        line.starts_with(self.options.comment_prefixes)
    }

    fn record_malformed(&mut self, line: &str) {
        self.malformed_lines += 1;
        let preview: String = line.chars().take(80).collect();
        warn!(
            source = %self.source,
            line = self.line_number,
            content = %preview,
            "Skipping malformed line"
        );
    }
}

impl<R: BufRead> Iterator for StanzaTokenizer<R> {
    type Item = io::Result<RawStanza>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut stanza: Option<RawStanza> = None;
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.finished = true;
                    return stanza.map(Ok);
                },
                Ok(_) => {},
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                },
            }
            self.line_number += 1;

            let decoded = decode_latin1(&self.buf);
            let line = decoded.trim_end_matches(['\r', '\n']);

            if line.trim().is_empty() {
                if stanza.is_some() {
                    return stanza.map(Ok);
                }
                continue;
            }

            if self.is_comment(line) {
                continue;
            }

            if line.starts_with([' ', '\t', '+']) {
                let separator = self.options.continuation_separator;
                match stanza.as_mut().and_then(|s| s.attributes.last_mut()) {
                    Some((_, value)) => {
                        let extra = line.strip_prefix('+').unwrap_or(line).trim();
                        append_continuation(value, extra, separator);
                    },
                    None => self.record_malformed(line),
                }
                continue;
            }

            match split_attribute(line) {
                Some((key, value)) => {
                    let (source, line_number) = (self.source, self.line_number);
                    stanza
                        .get_or_insert_with(|| RawStanza::new(source, line_number))
                        .attributes
                        .push((key.to_string(), value.to_string()));
                },
                None => self.record_malformed(line),
            }
        }
    }
}

/// Dumps are ISO-8859-1; every byte maps to the code point of the same value
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// `key: value` with a non-empty key free of whitespace
fn split_attribute(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some((key, value.trim()))
}

fn append_continuation(value: &mut String, extra: &str, separator: char) {
    if extra.is_empty() {
        return;
    }
    if !value.is_empty() {
        value.push(separator);
    }
    value.push_str(extra);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tokenize(input: &str) -> (Vec<RawStanza>, u64) {
        tokenize_with(input.as_bytes(), TokenizerOptions::default())
    }

    fn tokenize_with(input: &[u8], options: TokenizerOptions) -> (Vec<RawStanza>, u64) {
        let mut tokenizer = StanzaTokenizer::new(Cursor::new(input.to_vec()), Source::Ripe, options);
        let stanzas = tokenizer.by_ref().collect::<io::Result<Vec<_>>>().unwrap();
        (stanzas, tokenizer.malformed_lines())
    }

    #[test]
    fn test_blank_runs_delimit_stanzas() {
        let input = "\n\ninetnum: 10.0.0.0/8\nnetname: A\n\n\ninetnum: 11.0.0.0/8\nnetname: B\n\n\n";
        let (stanzas, malformed) = tokenize(input);

        assert_eq!(stanzas.len(), 2);
        assert_eq!(malformed, 0);
        assert_eq!(stanzas[0].attributes[1], ("netname".to_string(), "A".to_string()));
        assert_eq!(stanzas[1].attributes[0], ("inetnum".to_string(), "11.0.0.0/8".to_string()));
        assert_eq!(stanzas[0].line, 3);
        assert_eq!(stanzas[1].line, 7);
    }

    #[test]
    fn test_last_stanza_without_trailing_newline() {
        let (stanzas, _) = tokenize("inetnum: 10.0.0.0/8\nnetname: A");
        assert_eq!(stanzas.len(), 1);
        assert_eq!(stanzas[0].attributes.len(), 2);
    }

    #[test]
    fn test_continuation_appends_to_previous_value() {
        let input = "inetnum: 10.0.0.0/8\ndescr: First line\n        second line\n\tthird\n+\ncountry: NL\n";
        let (stanzas, _) = tokenize(input);

        assert_eq!(stanzas.len(), 1);
        let stanza = &stanzas[0];
        assert_eq!(stanza.attributes.len(), 3);
        assert_eq!(stanza.attributes[1].1, "First line second line third");
        assert_eq!(stanza.attributes[2].0, "country");
    }

    #[test]
    fn test_newline_continuation_separator() {
        let options = TokenizerOptions {
            continuation_separator: '\n',
            ..TokenizerOptions::default()
        };
        let (stanzas, _) = tokenize_with(b"descr: one\n two\n", options);
        assert_eq!(stanzas[0].attributes[0].1, "one\ntwo");
    }

    #[test]
    fn test_comments_do_not_end_stanza() {
        let input = "% header comment\n\ninetnum: 10.0.0.0/8\n% inline note\n# another\nnetname: A\n";
        let (stanzas, malformed) = tokenize(input);

        assert_eq!(stanzas.len(), 1);
        assert_eq!(stanzas[0].attributes.len(), 2);
        assert_eq!(malformed, 0);
    }

    #[test]
    fn test_malformed_lines_are_counted_and_skipped() {
        let input = "   orphan continuation\ninetnum: 10.0.0.0/8\nthis line has no key\nbad key: value\nnetname: A\n";
        let (stanzas, malformed) = tokenize(input);

        assert_eq!(malformed, 3);
        assert_eq!(stanzas.len(), 1);
        assert_eq!(
            stanzas[0].attributes,
            vec![
                ("inetnum".to_string(), "10.0.0.0/8".to_string()),
                ("netname".to_string(), "A".to_string()),
            ]
        );
    }

    #[test]
    fn test_latin1_and_crlf() {
        let input = b"inetnum: 10.0.0.0/8\r\ndescr: S\xe3o Paulo\r\n\r\n";
        let (stanzas, _) = tokenize_with(input, TokenizerOptions::default());
        assert_eq!(stanzas[0].attributes[0].1, "10.0.0.0/8");
        assert_eq!(stanzas[0].attributes[1].1, "São Paulo");
    }

    #[test]
    fn test_value_keeps_inner_colons() {
        let (stanzas, _) = tokenize("inet6num: 2001:db8::/32\n");
        assert_eq!(stanzas[0].attributes[0], ("inet6num".to_string(), "2001:db8::/32".to_string()));
    }

    #[test]
    fn test_empty_input() {
        let (stanzas, malformed) = tokenize("\n\n% only comments\n");
        assert!(stanzas.is_empty());
        assert_eq!(malformed, 0);
    }
}
