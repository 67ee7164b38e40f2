//! Parse switches for value expressions.

/// Which constructs the expression parser accepts.
///
/// Named constants cover the combinations used by the project schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExpressionOptions {
    /// `@(Item)` references.
    pub items: bool,
    /// `%(Metadata)` references.
    pub metadata: bool,
    /// `;`-separated lists.
    pub lists: bool,
    /// `,`-separated lists.
    pub comma_lists: bool,
    /// No references at all; the value is literal text (lists still split).
    pub plain_text: bool,
}

impl ExpressionOptions {
    pub const NONE: Self = Self {
        items: false,
        metadata: false,
        lists: false,
        comma_lists: false,
        plain_text: false,
    };
    pub const ITEMS: Self = Self {
        items: true,
        ..Self::NONE
    };
    pub const METADATA: Self = Self {
        metadata: true,
        ..Self::NONE
    };
    pub const ITEMS_AND_METADATA: Self = Self {
        items: true,
        metadata: true,
        ..Self::NONE
    };
    pub const LISTS: Self = Self {
        lists: true,
        ..Self::NONE
    };
    pub const COMMA_LISTS: Self = Self {
        comma_lists: true,
        ..Self::NONE
    };
    pub const ITEMS_METADATA_AND_LISTS: Self = Self {
        items: true,
        metadata: true,
        lists: true,
        ..Self::NONE
    };
    pub const PLAIN_TEXT: Self = Self {
        plain_text: true,
        ..Self::NONE
    };

    /// Also accept `;` lists.
    pub fn with_lists(mut self) -> Self {
        self.lists = true;
        self
    }

    /// Also accept `,` lists.
    pub fn with_comma_lists(mut self) -> Self {
        self.comma_lists = true;
        self
    }

    /// The same reference switches, without list splitting.
    pub fn without_lists(mut self) -> Self {
        self.lists = false;
        self.comma_lists = false;
        self
    }
}
