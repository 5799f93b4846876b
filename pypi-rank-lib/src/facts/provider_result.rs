use std::sync::Arc;

/// Outcome of a single data-source adapter call.
#[derive(Debug, Clone)]
pub enum ProviderResult<T> {
    /// The request succeeded and data was found.
    Found(T),

    /// The upstream service answered that the requested item does not exist.
    NotFound,

    /// The request failed or the response could not be decoded.
    Error(Arc<ohno::AppError>),
}

impl<T> ProviderResult<T> {
    /// Converts into the contained data if `Found`, otherwise `None`.
    #[must_use]
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Found(data) => Some(data),
            _ => None,
        }
    }

    /// Maps the found value, leaving the other variants untouched.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ProviderResult<U> {
        match self {
            Self::Found(data) => ProviderResult::Found(f(data)),
            Self::NotFound => ProviderResult::NotFound,
            Self::Error(e) => ProviderResult::Error(e),
        }
    }
}
