/// Lines of text, keeping each line's terminator and where it starts
#[derive(Clone, Debug)]
pub struct LinesWithTerminator<'a> {
    data: &'a str,
    offset: usize,
    number: usize,
}

/// A line yielded by [`LinesWithTerminator`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number
    pub number: usize,
    /// Byte offset of the first character
    pub offset: usize,
    /// Content, including any trailing `\n`
    pub text: &'a str,
}

impl<'a> Line<'a> {
    /// Byte offset one past the terminator
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    pub fn trim_terminator(&self) -> &'a str {
        let text = self.text.strip_suffix('\n').unwrap_or(self.text);
        text.strip_suffix('\r').unwrap_or(text)
    }
}

impl<'a> LinesWithTerminator<'a> {
    pub fn new(data: &'a str) -> LinesWithTerminator<'a> {
        LinesWithTerminator {
            data,
            offset: 0,
            number: 0,
        }
    }
}

impl<'a> Iterator for LinesWithTerminator<'a> {
    type Item = Line<'a>;

    #[inline]
    fn next(&mut self) -> Option<Line<'a>> {
        let text = match self.data.find('\n') {
            None if self.data.is_empty() => return None,
            None => {
                let line = self.data;
                self.data = "";
                line
            }
            Some(end) => {
                let line = &self.data[..end + 1];
                self.data = &self.data[end + 1..];
                line
            }
        };
        self.number += 1;
        let line = Line {
            number: self.number,
            offset: self.offset,
            text,
        };
        self.offset += text.len();
        Some(line)
    }
}
