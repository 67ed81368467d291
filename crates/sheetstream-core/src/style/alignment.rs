//! Text alignment types
//!
//! Both enums carry a stable numeric code; the codes are what a packed
//! [`StyleCode`](super::StyleCode) stores, so they must never be renumbered.

/// Horizontal and vertical alignment of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Alignment {
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
}

impl Alignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_horizontal(mut self, align: HorizontalAlignment) -> Self {
        self.horizontal = align;
        self
    }

    pub fn with_vertical(mut self, align: VerticalAlignment) -> Self {
        self.vertical = align;
        self
    }

    /// Whether both axes use their defaults
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Horizontal alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalAlignment {
    /// Text left, numbers right
    #[default]
    General,
    Left,
    Center,
    Right,
    /// Repeat content to fill the cell width
    Fill,
    Justify,
    CenterContinuous,
    Distributed,
}

impl HorizontalAlignment {
    const ALL: [HorizontalAlignment; 8] = [
        HorizontalAlignment::General,
        HorizontalAlignment::Left,
        HorizontalAlignment::Center,
        HorizontalAlignment::Right,
        HorizontalAlignment::Fill,
        HorizontalAlignment::Justify,
        HorizontalAlignment::CenterContinuous,
        HorizontalAlignment::Distributed,
    ];

    /// Packed code (General = 0)
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Inverse of [`HorizontalAlignment::code`]
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// `horizontal` attribute value
    pub fn xlsx_name(&self) -> &'static str {
        match self {
            HorizontalAlignment::General => "general",
            HorizontalAlignment::Left => "left",
            HorizontalAlignment::Center => "center",
            HorizontalAlignment::Right => "right",
            HorizontalAlignment::Fill => "fill",
            HorizontalAlignment::Justify => "justify",
            HorizontalAlignment::CenterContinuous => "centerContinuous",
            HorizontalAlignment::Distributed => "distributed",
        }
    }
}

/// Vertical alignment options
///
/// Bottom is the spreadsheet default, so it takes code 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerticalAlignment {
    #[default]
    Bottom,
    Top,
    Center,
    Justify,
    Distributed,
}

impl VerticalAlignment {
    const ALL: [VerticalAlignment; 5] = [
        VerticalAlignment::Bottom,
        VerticalAlignment::Top,
        VerticalAlignment::Center,
        VerticalAlignment::Justify,
        VerticalAlignment::Distributed,
    ];

    /// Packed code (Bottom = 0)
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Inverse of [`VerticalAlignment::code`]
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// `vertical` attribute value
    pub fn xlsx_name(&self) -> &'static str {
        match self {
            VerticalAlignment::Bottom => "bottom",
            VerticalAlignment::Top => "top",
            VerticalAlignment::Center => "center",
            VerticalAlignment::Justify => "justify",
            VerticalAlignment::Distributed => "distributed",
        }
    }
}
