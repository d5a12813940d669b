use crate::error::{Error, ErrorType};
use serde::{Deserialize, Serialize};

/// The fixed set of spending categories an expense can belong to.
#[derive(
    Default, Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Transportation,
    Entertainment,
    Utilities,
    #[default]
    Other,
}

serde_plain::derive_display_from_serialize!(Category);
serde_plain::derive_fromstr_from_deserialize!(Category, |e| -> Error {
    Error::new(
        ErrorType::Validation,
        format!(
            "Invalid category ({e}), expected one of: {}",
            Category::ALL
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    )
});

impl Category {
    /// Every category, in the order they are offered for selection.
    pub const ALL: [Category; 5] = [
        Category::Food,
        Category::Transportation,
        Category::Entertainment,
        Category::Utilities,
        Category::Other,
    ];

    /// The human-facing label, e.g. `Transportation`.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transportation => "Transportation",
            Category::Entertainment => "Entertainment",
            Category::Utilities => "Utilities",
            Category::Other => "Other",
        }
    }
}
