/// Styles for human-facing output
///
/// - `section`: headings inside a test log (`INPUT`, `OUTPUT DIFF`)
/// - `expected` / `actual`: removed and added diff lines
#[derive(Copy, Clone, Debug, Default)]
pub struct Palette {
    pub(crate) info: anstyle::Style,
    pub(crate) warn: anstyle::Style,
    pub(crate) error: anstyle::Style,
    pub(crate) hint: anstyle::Style,
    pub(crate) section: anstyle::Style,
    pub(crate) expected: anstyle::Style,
    pub(crate) actual: anstyle::Style,
}

impl Palette {
    /// Colored, when the `color` feature is enabled
    pub fn always() -> Self {
        if cfg!(feature = "color") {
            Self {
                info: anstyle::AnsiColor::Green.on_default(),
                warn: anstyle::AnsiColor::Yellow.on_default(),
                error: anstyle::AnsiColor::Red.on_default(),
                hint: anstyle::Effects::DIMMED.into(),
                section: anstyle::Effects::BOLD.into(),
                expected: anstyle::AnsiColor::Green.on_default(),
                actual: anstyle::AnsiColor::Red.on_default(),
            }
        } else {
            Self::never()
        }
    }

    pub fn never() -> Self {
        Self::default()
    }

    /// Colored if stderr supports it
    pub fn auto() -> Self {
        if is_colored() {
            Self::always()
        } else {
            Self::never()
        }
    }

    pub fn info<D: std::fmt::Display>(self, item: D) -> Styled<D> {
        Styled::new(item, self.info)
    }

    pub fn warn<D: std::fmt::Display>(self, item: D) -> Styled<D> {
        Styled::new(item, self.warn)
    }

    pub fn error<D: std::fmt::Display>(self, item: D) -> Styled<D> {
        Styled::new(item, self.error)
    }

    pub fn hint<D: std::fmt::Display>(self, item: D) -> Styled<D> {
        Styled::new(item, self.hint)
    }

    pub fn section<D: std::fmt::Display>(self, item: D) -> Styled<D> {
        Styled::new(item, self.section)
    }
}

fn is_colored() -> bool {
    #[cfg(feature = "color")]
    {
        anstream::AutoStream::choice(&std::io::stderr()) != anstream::ColorChoice::Never
    }
    #[cfg(not(feature = "color"))]
    {
        false
    }
}

/// Display wrapped in a style's escape codes
#[derive(Debug)]
pub struct Styled<D> {
    display: D,
    style: anstyle::Style,
}

impl<D: std::fmt::Display> Styled<D> {
    pub(crate) fn new(display: D, style: anstyle::Style) -> Self {
        Self { display, style }
    }
}

impl<D: std::fmt::Display> std::fmt::Display for Styled<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.style.render())?;
        self.display.fmt(f)?;
        write!(f, "{}", self.style.render_reset())
    }
}
