//! Line-at-a-time streaming transform shared by the built-in stages.

use std::io::{self, BufRead, BufReader, Read};

/// Applies `transform` to each line of `input` as it is pulled.
///
/// Only the current line is buffered. Line terminators (`\n` or `\r\n`) are
/// passed through untouched and are not visible to `transform`.
pub(crate) struct LineFilter<F> {
    input: BufReader<Box<dyn Read>>,
    transform: F,
    line: Vec<u8>,
    out: Vec<u8>,
    pos: usize,
}

impl<F> LineFilter<F>
where
    F: FnMut(&str) -> String,
{
    pub(crate) fn new(input: Box<dyn Read>, transform: F) -> Self {
        Self {
            input: BufReader::new(input),
            transform,
            line: Vec::new(),
            out: Vec::new(),
            pos: 0,
        }
    }

    /// Refill `out` with the next transformed line. Returns `false` at end of input.
    fn fill(&mut self) -> io::Result<bool> {
        self.line.clear();
        self.out.clear();
        self.pos = 0;

        if self.input.read_until(b'\n', &mut self.line)? == 0 {
            return Ok(false);
        }

        let (body, terminator) = split_terminator(&self.line);
        let text = std::str::from_utf8(body)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        self.out.extend_from_slice((self.transform)(text).as_bytes());
        self.out.extend_from_slice(terminator);
        Ok(true)
    }
}

impl<F> Read for LineFilter<F>
where
    F: FnMut(&str) -> String,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        // A transform may turn a line into nothing; keep pulling until there
        // is output or the input is exhausted.
        while self.pos >= self.out.len() {
            if !self.fill()? {
                return Ok(0);
            }
        }

        let n = buf.len().min(self.out.len() - self.pos);
        buf[..n].copy_from_slice(&self.out[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

fn split_terminator(line: &[u8]) -> (&[u8], &[u8]) {
    let cut = if line.ends_with(b"\r\n") {
        line.len() - 2
    } else if line.ends_with(b"\n") {
        line.len() - 1
    } else {
        line.len()
    };
    line.split_at(cut)
}
