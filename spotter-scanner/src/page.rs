use std::fmt;

/// A single page to fetch, tagged with the output file its records belong to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageRef {
    url: String,
    output: String,
}

impl PageRef {
    pub fn new(url: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            output: output.into(),
        }
    }

    /// A page discovered beneath this one. Children always write to the root's output file.
    pub fn child(&self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            output: self.output.clone(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn output(&self) -> &str {
        &self.output
    }
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.url, self.output)
    }
}
