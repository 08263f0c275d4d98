//! Small validated value types shared across the qedit crates.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-blank content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The text is kept exactly as given: surrounding whitespace is part of the value.
///
/// Used for questionnaire `linkId`s, which are meaningless when blank but must round-trip
/// byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted into an owned string
    ///
    /// # Returns
    ///
    /// Returns `Ok(NonEmptyText)` if the input has a non-whitespace character,
    /// or `Err(TextError::Empty)` if it's empty or contains only whitespace.
    pub fn new(input: impl Into<String>) -> Result<Self, TextError> {
        let text = input.into();
        if text.trim().is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(text))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_surrounding_whitespace() {
        let text = NonEmptyText::new("  q1 ").expect("non-empty");
        assert_eq!(text.as_str(), "  q1 ");
        assert_ne!(text, NonEmptyText::new("q1").expect("non-empty"));
    }

    #[test]
    fn rejects_blank_input() {
        assert!(matches!(NonEmptyText::new(""), Err(TextError::Empty)));
        assert!(matches!(NonEmptyText::new(" \t\n"), Err(TextError::Empty)));
    }
}
