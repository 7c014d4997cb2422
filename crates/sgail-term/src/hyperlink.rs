//! OSC 8 hyperlink values, interned per page.

/// A hyperlink attached to one or more cells.
///
/// Equality compares both the URI and the explicit id, which is what joins
/// split hyperlink regions across pages: two cells belong to the same link
/// exactly when their interned values compare equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Hyperlink {
    /// Explicit id from the `id=` parameter, if any.
    pub id: Option<String>,
    /// The link target.
    pub uri: String,
}

impl Hyperlink {
    /// Construct a hyperlink.
    pub fn new(id: Option<impl Into<String>>, uri: impl Into<String>) -> Self {
        Self {
            id: id.map(Into::into),
            uri: uri.into(),
        }
    }
}
