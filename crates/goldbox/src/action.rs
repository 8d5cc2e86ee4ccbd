pub const DEFAULT_ACTION_ENV: &str = "GOLDEN";

/// What to do with each assertion, see [`Config`][crate::runner::Config]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Do not run the assertion
    Skip,
    /// Report mismatches without failing
    Ignore,
    /// Fail on mismatch
    Verify,
    /// Bless the expected output on mismatch
    Overwrite,
}

impl Action {
    pub fn with_env_var(var: impl AsRef<std::ffi::OsStr>) -> Option<Self> {
        let var = var.as_ref();
        let value = std::env::var_os(var)?;
        Self::with_env_value(value)
    }

    pub fn with_env_value(value: impl AsRef<std::ffi::OsStr>) -> Option<Self> {
        let value = value.as_ref();
        match value.to_str()? {
            "skip" => Some(Action::Skip),
            "ignore" => Some(Action::Ignore),
            "verify" => Some(Action::Verify),
            "overwrite" | "bless" => Some(Action::Overwrite),
            _ => None,
        }
    }
}

impl Default for Action {
    fn default() -> Self {
        Self::Verify
    }
}
