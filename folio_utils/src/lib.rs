mod macros;

/// Returns the version of the workspace, as reported in user agents and the
/// CLI.
pub fn folio_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub trait Apply {
    /// Applies the function `f` with a mutable reference to `self`.
    fn with<X>(mut self, f: impl FnOnce(&mut Self) -> X) -> Self
    where
        Self: Sized,
    {
        f(&mut self);
        self
    }

    /// Applies the function `f` only if `value` is `Some(...)` and provides the
    /// contained value to `f`.
    ///
    /// #### Example
    /// ```rust
    /// # use folio_utils::Apply;
    /// fn append_signature(body: String, signature: Option<&str>) -> String {
    ///     body.apply_map(signature, |body, signature| format!("{body}\n-- {signature}"))
    /// }
    /// assert_eq!(append_signature("Hi".into(), None), "Hi");
    /// assert_eq!(append_signature("Hi".into(), Some("Max")), "Hi\n-- Max");
    /// ```
    fn apply_map<U>(self, value: Option<U>, f: impl FnOnce(Self, U) -> Self) -> Self
    where
        Self: Sized,
    {
        if let Some(value) = value {
            f(self, value)
        } else {
            self
        }
    }
}

impl<T> Apply for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with() {
        let list = Vec::new().with(|v| v.push(7));
        assert_eq!(list, [7]);
    }

    #[test]
    fn assert_matches_guard() {
        let value: Result<u32, ()> = Ok(3);
        crate::assert_matches!(value, Ok(x) if *x == 3);
    }

    #[test]
    #[should_panic = "did not match pattern"]
    fn assert_matches_mismatch() {
        crate::assert_matches!(Some(1), None);
    }
}
