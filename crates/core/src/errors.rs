use thiserror::Error;

/// Comparison-group rule violations. Display text is the user-facing
/// message returned at the API boundary.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Cannot anchor a list item that is part of a comparison group")]
    AnchorOnGroupedItem,
    #[error("Cannot anchor a selected list item")]
    AnchorOnSelectedItem,
    #[error("Base and comparison list items must differ")]
    SelfComparison,
    #[error("Anchored list items cannot join a comparison group")]
    ComparisonOnAnchoredItem,
    #[error("A comparison list item cannot act as a base product")]
    NestedComparisonGroup,
    #[error("List item is not a base product")]
    NotABaseProduct,
    #[error("Base list item is anchored")]
    BaseIsAnchored,
    #[error("List item is not part of the comparison group")]
    NotInComparisonGroup,
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}
