//! Structured documents: headings and fenced blocks with their positions

use crate::utils::Line;
use crate::utils::LinesWithTerminator;

/// A top-level node of a document, in source order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node<'s> {
    Heading(Heading<'s>),
    Block(Block<'s>),
    /// Any other content, e.g. prose
    Paragraph(Paragraph<'s>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heading<'s> {
    /// `1` for `#`, `2` for `##`, ...
    pub level: usize,
    pub text: &'s str,
    pub line: usize,
}

/// Consecutive non-blank lines that are neither a heading nor a fence
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paragraph<'s> {
    pub text: &'s str,
    pub line: usize,
}

/// A fenced code block
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block<'s> {
    /// Text after the opening fence (the "info string")
    pub header: &'s str,
    /// Raw content between the fences
    pub text: &'s str,
    /// 1-based line of the opening fence
    pub line: usize,
    /// Byte range of `text` within the source
    pub span: std::ops::Range<usize>,
}

/// Turns a document into [`Node`]s
///
/// Only the interface matters to the loader, so alternative markup (or a full CommonMark
/// implementation) can be plugged in with [`Loader::parser`][crate::load::Loader::parser].
pub trait DocumentParser {
    fn parse<'s>(&self, source: &'s str) -> Vec<Node<'s>>;
}

impl<F> DocumentParser for F
where
    F: for<'s> Fn(&'s str) -> Vec<Node<'s>>,
{
    fn parse<'s>(&self, source: &'s str) -> Vec<Node<'s>> {
        (self)(source)
    }
}

/// Minimal Markdown scanner for headings and fenced code blocks
///
/// Fences are three or more backticks or tildes, indented at most three spaces; a block is
/// closed by a fence of the same character that is at least as long.  An unclosed block runs
/// to the end of the document.
///
/// Headings are ATX (`## Title`) or setext (a paragraph underlined with `=` or `-`).  All
/// other content is reported as [`Paragraph`]s.
#[derive(Copy, Clone, Debug, Default)]
pub struct Markdown;

impl DocumentParser for Markdown {
    fn parse<'s>(&self, source: &'s str) -> Vec<Node<'s>> {
        let mut nodes = Vec::new();
        let mut lines = LinesWithTerminator::new(source).peekable();
        while let Some(line) = lines.next() {
            if is_blank(&line) {
                continue;
            }
            let content = strip_indent(line.trim_terminator());

            if let Some(heading) = parse_heading(content, line.number) {
                nodes.push(Node::Heading(heading));
                continue;
            }

            let Some((fence, fence_len)) = parse_fence(content) else {
                nodes.push(parse_paragraph(source, line, &mut lines));
                continue;
            };
            let header = content[fence_len..].trim();
            if fence == '`' && header.contains('`') {
                // Inline code span, not a fence
                nodes.push(parse_paragraph(source, line, &mut lines));
                continue;
            }

            let start = line.end();
            let mut end = source.len();
            for inner in lines.by_ref() {
                let inner_content = strip_indent(inner.trim_terminator());
                if let Some((close, close_len)) = parse_fence(inner_content) {
                    if close == fence
                        && fence_len <= close_len
                        && inner_content[close_len..].trim().is_empty()
                    {
                        end = inner.offset;
                        break;
                    }
                }
            }

            nodes.push(Node::Block(Block {
                header,
                text: &source[start..end],
                line: line.number,
                span: start..end,
            }));
        }
        nodes
    }
}

/// Consume the rest of the paragraph starting at `first`
///
/// A paragraph followed by a setext underline is a heading.
fn parse_paragraph<'s>(
    source: &'s str,
    first: Line<'s>,
    lines: &mut std::iter::Peekable<LinesWithTerminator<'s>>,
) -> Node<'s> {
    let mut last = first;
    while let Some(next) = lines.peek() {
        if is_blank(next) {
            break;
        }
        let content = strip_indent(next.trim_terminator());
        if let Some(level) = setext_level(content) {
            lines.next();
            return Node::Heading(Heading {
                level,
                text: paragraph_text(source, first, last),
                line: first.number,
            });
        }
        if parse_heading(content, next.number).is_some() || parse_fence(content).is_some() {
            break;
        }
        last = *next;
        lines.next();
    }
    Node::Paragraph(Paragraph {
        text: paragraph_text(source, first, last),
        line: first.number,
    })
}

fn paragraph_text<'s>(source: &'s str, first: Line<'s>, last: Line<'s>) -> &'s str {
    source[first.offset..last.offset + last.trim_terminator().len()].trim()
}

fn is_blank(line: &Line<'_>) -> bool {
    line.text.trim().is_empty()
}

fn strip_indent(line: &str) -> &str {
    let indent = line.bytes().take(4).take_while(|b| *b == b' ').count();
    if indent <= 3 {
        &line[indent..]
    } else {
        // Indented code, never a fence
        ""
    }
}

fn parse_fence(line: &str) -> Option<(char, usize)> {
    let fence = line.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = line.chars().take_while(|c| *c == fence).count();
    (3 <= len).then_some((fence, len))
}

/// `1` for a `===` underline, `2` for `---`
fn setext_level(line: &str) -> Option<usize> {
    let underline = line.trim_end();
    let level = match underline.chars().next()? {
        '=' => 1,
        '-' => 2,
        _ => return None,
    };
    let marker = if level == 1 { '=' } else { '-' };
    underline.chars().all(|c| c == marker).then_some(level)
}

fn parse_heading(line: &str, number: usize) -> Option<Heading<'_>> {
    let level = line.bytes().take_while(|b| *b == b'#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let rest = &line[level..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    let text = rest.trim();
    // Optional closing sequence
    let text = text.trim_end_matches('#');
    let text = if text.ends_with([' ', '\t']) || text.is_empty() {
        text.trim_end()
    } else {
        rest.trim()
    };
    Some(Heading {
        level,
        text,
        line: number,
    })
}
