/// Per-context creation options.
#[derive(Debug, Clone)]
pub struct ContextInit {
    /// Name used in log output.
    pub label: Option<String>,

    /// Read the pending native error before a destroy releases the context
    /// from the calling thread, and report it once destruction is done.
    pub check_errors_on_destroy: bool,
}

impl Default for ContextInit {
    fn default() -> Self {
        Self {
            label: None,
            check_errors_on_destroy: true,
        }
    }
}

impl ContextInit {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }
}
