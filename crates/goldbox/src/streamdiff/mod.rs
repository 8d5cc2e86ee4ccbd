//! Line diff of two streams in bounded memory
//!
//! Both streams are read line by line in lock-step.  While they match, only the last few
//! lines are kept for context.  At the first difference, a few more lines are read from each
//! side and the window is rendered as unified-diff hunks with absolute line numbers.  Content
//! after the window is never read.

mod ring;

use std::io::BufRead;
use std::io::Write;

use crate::report::Palette;
use ring::Ring;

/// Lines of context shown around a difference
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Configurable stream differ
///
/// ```rust
/// let mut report = Vec::new();
/// let same = goldbox::streamdiff::StreamDiff::new()
///     .context_lines(1)
///     .diff(&mut report, "expected", &b"a\nb\n"[..], "actual", &b"a\nc\n"[..])
///     .unwrap();
/// assert!(!same);
/// assert!(String::from_utf8(report).unwrap().starts_with("--- expected\n+++ actual\n"));
/// ```
#[derive(Copy, Clone, Debug)]
pub struct StreamDiff {
    context: usize,
    palette: Palette,
}

impl StreamDiff {
    pub fn new() -> Self {
        Self {
            context: DEFAULT_CONTEXT_LINES,
            palette: Palette::never(),
        }
    }

    pub fn context_lines(mut self, context: usize) -> Self {
        self.context = context;
        self
    }

    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Compare `a` to `b`, writing a report to `writer` if they differ
    ///
    /// Returns `true`, having written nothing, when both streams end together with every line
    /// equal.
    pub fn diff(
        &self,
        writer: &mut dyn Write,
        name_a: impl std::fmt::Display,
        mut a: impl BufRead,
        name_b: impl std::fmt::Display,
        mut b: impl BufRead,
    ) -> std::io::Result<bool> {
        let mut ring_a = Ring::new(self.context);
        let mut ring_b = Ring::new(self.context);
        let mut matched = 0usize;
        let (line_a, line_b) = loop {
            match (read_line(&mut a)?, read_line(&mut b)?) {
                (None, None) => return Ok(true),
                (Some(line_a), Some(line_b)) if line_a == line_b => {
                    ring_a.push(line_a);
                    ring_b.push(line_b);
                    matched += 1;
                }
                mismatch => break mismatch,
            }
        };
        goldbox_macros::debug!("streams differ after {} matching lines", matched);

        // Both rings hold the same number of lines
        let first = matched + 1 - ring_a.len();
        let old = self.window(ring_a, line_a, &mut a)?;
        let new = self.window(ring_b, line_b, &mut b)?;

        writeln!(
            writer,
            "{}",
            self.palette.info(format_args!("--- {name_a}"))
        )?;
        writeln!(
            writer,
            "{}",
            self.palette.error(format_args!("+++ {name_b}"))
        )?;
        let ops = similar::capture_diff_slices(similar::Algorithm::Myers, &old, &new);
        for group in similar::group_diff_ops(ops, self.context) {
            self.write_hunk(writer, first, &group, &old, &new)?;
        }
        Ok(false)
    }

    /// Leading context, the first differing line, and up to `context` more lines
    fn window(
        &self,
        ring: Ring<Vec<u8>>,
        diverged: Option<Vec<u8>>,
        reader: &mut impl BufRead,
    ) -> std::io::Result<Vec<Vec<u8>>> {
        let mut lines = ring.into_ordered();
        if let Some(diverged) = diverged {
            lines.push(diverged);
            for _ in 0..self.context {
                match read_line(reader)? {
                    Some(line) => lines.push(line),
                    None => break,
                }
            }
        }
        Ok(lines)
    }

    fn write_hunk(
        &self,
        writer: &mut dyn Write,
        first: usize,
        group: &[similar::DiffOp],
        old: &[Vec<u8>],
        new: &[Vec<u8>],
    ) -> std::io::Result<()> {
        let (Some(head), Some(tail)) = (group.first(), group.last()) else {
            return Ok(());
        };
        let old_range = head.old_range().start..tail.old_range().end;
        let new_range = head.new_range().start..tail.new_range().end;
        writeln!(
            writer,
            "{}",
            self.palette.hint(format_args!(
                "@@ -{} +{} @@",
                HunkRange(first + old_range.start, old_range.len()),
                HunkRange(first + new_range.start, new_range.len()),
            ))
        )?;

        for op in group {
            let (tag, old_range, new_range) = op.as_tag_tuple();
            match tag {
                similar::DiffTag::Equal => {
                    for line in &old[old_range] {
                        self.write_line(writer, ' ', line, anstyle::Style::new())?;
                    }
                }
                similar::DiffTag::Delete => {
                    for line in &old[old_range] {
                        self.write_line(writer, '-', line, self.palette.expected)?;
                    }
                }
                similar::DiffTag::Insert => {
                    for line in &new[new_range] {
                        self.write_line(writer, '+', line, self.palette.actual)?;
                    }
                }
                similar::DiffTag::Replace => {
                    for line in &old[old_range] {
                        self.write_line(writer, '-', line, self.palette.expected)?;
                    }
                    for line in &new[new_range] {
                        self.write_line(writer, '+', line, self.palette.actual)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn write_line(
        &self,
        writer: &mut dyn Write,
        sign: char,
        line: &[u8],
        style: anstyle::Style,
    ) -> std::io::Result<()> {
        let text = String::from_utf8_lossy(line);
        let body = text.strip_suffix('\n').unwrap_or(&text);
        writeln!(
            writer,
            "{}{sign}{body}{}",
            style.render(),
            style.render_reset()
        )?;
        if !line.ends_with(b"\n") {
            writeln!(writer, "\\ No newline at end of file")?;
        }
        Ok(())
    }
}

impl Default for StreamDiff {
    fn default() -> Self {
        Self::new()
    }
}

/// Compare two streams with `context` lines of context and no styling
pub fn diff(
    writer: &mut dyn Write,
    name_a: impl std::fmt::Display,
    a: impl BufRead,
    name_b: impl std::fmt::Display,
    b: impl BufRead,
    context: usize,
) -> std::io::Result<bool> {
    StreamDiff::new()
        .context_lines(context)
        .diff(writer, name_a, a, name_b, b)
}

fn read_line(reader: &mut impl BufRead) -> std::io::Result<Option<Vec<u8>>> {
    let mut line = Vec::new();
    let read = reader.read_until(b'\n', &mut line)?;
    Ok((read != 0).then_some(line))
}

/// `start,len` of a hunk; an empty range names the line before it
struct HunkRange(usize, usize);

impl std::fmt::Display for HunkRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self(start, len) = *self;
        if len == 0 {
            write!(f, "{},0", start - 1)
        } else {
            write!(f, "{start},{len}")
        }
    }
}
