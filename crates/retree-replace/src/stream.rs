//! Streaming literal substitution.
//!
//! Input is consumed in fixed-size chunks. The tail of each chunk that could
//! still begin an occurrence is carried into the next read, so patterns that
//! straddle a chunk boundary (including multi-line patterns) are found.

use std::collections::BTreeSet;
use std::io::{self, ErrorKind, Read, Write};

use memchr::memchr_iter;
use memchr::memmem::Finder;

const CHUNK_LEN: usize = 64 * 1024;

/// Which side of the stream failed.
#[derive(Debug)]
pub(crate) enum StreamError {
    Read(io::Error),
    Write(io::Error),
}

/// A literal search and its replacement, prepared for repeated scans.
#[derive(Debug, Clone)]
pub(crate) struct Pattern {
    finder: Finder<'static>,
    replacement: Vec<u8>,
}

impl Pattern {
    pub(crate) fn new(search: &str, replacement: &str) -> Self {
        Self {
            finder: Finder::new(search.as_bytes()).into_owned(),
            replacement: replacement.as_bytes().to_vec(),
        }
    }

    /// Copies `reader` to `writer`, replacing every non-overlapping occurrence
    /// that starts on a line outside `skip`.
    ///
    /// Returns the 1-based start line of every occurrence, whether replaced or
    /// kept.
    pub(crate) fn substitute<R: Read, W: Write>(
        &self,
        mut reader: R,
        mut writer: W,
        skip: &BTreeSet<usize>,
    ) -> Result<Vec<usize>, StreamError> {
        let needle = self.finder.needle();
        let carry = needle.len().saturating_sub(1);
        let mut chunk = vec![0_u8; CHUNK_LEN];
        let mut pending: Vec<u8> = Vec::with_capacity(CHUNK_LEN + carry);
        let mut line = 1_usize;
        let mut occurrences = Vec::new();

        loop {
            let read = match reader.read(&mut chunk) {
                Ok(count) => count,
                Err(error) if error.kind() == ErrorKind::Interrupted => continue,
                Err(error) => return Err(StreamError::Read(error)),
            };
            let eof = read == 0;
            pending.extend_from_slice(chunk.get(..read).unwrap_or_default());

            let mut cursor = 0;
            while let Some(offset) = pending.get(cursor..).and_then(|rest| self.finder.find(rest)) {
                let start = cursor + offset;
                line = emit(&mut writer, pending.get(cursor..start).unwrap_or_default(), line)?;
                occurrences.push(line);
                let output = if skip.contains(&line) {
                    needle
                } else {
                    self.replacement.as_slice()
                };
                writer.write_all(output).map_err(StreamError::Write)?;
                line += count_newlines(needle);
                cursor = start + needle.len();
            }

            // Bytes before `flush_to` cannot begin an occurrence that the next
            // read would complete.
            let flush_to = if eof {
                pending.len()
            } else {
                pending.len().saturating_sub(carry).max(cursor)
            };
            line = emit(&mut writer, pending.get(cursor..flush_to).unwrap_or_default(), line)?;
            if eof {
                break;
            }
            pending.drain(..flush_to);
        }

        writer.flush().map_err(StreamError::Write)?;
        Ok(occurrences)
    }
}

fn emit<W: Write>(writer: &mut W, bytes: &[u8], line: usize) -> Result<usize, StreamError> {
    writer.write_all(bytes).map_err(StreamError::Write)?;
    Ok(line + count_newlines(bytes))
}

fn count_newlines(bytes: &[u8]) -> usize {
    memchr_iter(b'\n', bytes).count()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::*;

    /// Reader that yields at most `step` bytes per call.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let len = self.step.min(buf.len()).min(self.data.len());
            let (head, tail) = self.data.split_at(len);
            if let Some(slot) = buf.get_mut(..len) {
                slot.copy_from_slice(head);
            }
            self.data = tail;
            Ok(len)
        }
    }

    fn run(pattern: &Pattern, input: &str, skip_lines: &[usize]) -> (String, Vec<usize>) {
        let mut out = Vec::new();
        let skip: BTreeSet<usize> = skip_lines.iter().copied().collect();
        let lines = pattern
            .substitute(Cursor::new(input.as_bytes()), &mut out, &skip)
            .expect("substitution succeeds");
        (String::from_utf8(out).expect("utf-8 output"), lines)
    }

    #[rstest]
    #[case("hello world", "goodbye world", vec![1])]
    #[case("hello\nhello hello\n", "goodbye\ngoodbye goodbye\n", vec![1, 2, 2])]
    #[case("no match here", "no match here", vec![])]
    #[case("Hello world", "Hello world", vec![])]
    fn replaces_literal_occurrences(
        #[case] input: &str,
        #[case] expected: &str,
        #[case] expected_lines: Vec<usize>,
    ) {
        let pattern = Pattern::new("hello", "goodbye");
        let (output, lines) = run(&pattern, input, &[]);
        assert_eq!(output, expected);
        assert_eq!(lines, expected_lines);
    }

    #[test]
    fn skipped_lines_keep_their_occurrences() {
        let pattern = Pattern::new("foo", "bar");
        let (output, lines) = run(&pattern, "foo\nfoo foo\nfoo\n", &[2]);
        assert_eq!(output, "bar\nfoo foo\nbar\n");
        assert_eq!(lines, vec![1, 2, 2, 3]);
    }

    #[test]
    fn multi_line_patterns_advance_the_line_count() {
        let pattern = Pattern::new("a\nb", "X");
        let (output, lines) = run(&pattern, "a\nb\na\nb\n", &[]);
        assert_eq!(output, "X\nX\n");
        assert_eq!(lines, vec![1, 3]);
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(5)]
    fn matches_across_read_boundaries(#[case] step: usize) {
        let pattern = Pattern::new("needle", "pin");
        let input = b"hay needle hay\nneedleneedle";
        let mut out = Vec::new();
        let lines = pattern
            .substitute(Trickle { data: input, step }, &mut out, &BTreeSet::new())
            .expect("substitution succeeds");
        assert_eq!(out, b"hay pin hay\npinpin");
        assert_eq!(lines, vec![1, 2, 2]);
    }
}
