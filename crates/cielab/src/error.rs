use thiserror::Error;

/// Why a hex color string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseColorError {
    #[error("hex color {input:?} has {digits} digits, expected 3 or 6")]
    Length { input: String, digits: usize },

    #[error("hex color {input:?} contains {found:?}, which is not a hex digit")]
    Digit { input: String, found: char },
}
