//! Fill components

use super::Color;

/// One entry of the fill pool, shaped like `<patternFill>`
///
/// A solid fill is the `Solid` pattern with the fill color in the
/// foreground slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FillStyle {
    pub pattern: PatternType,
    pub foreground: Color,
    pub background: Color,
}

impl FillStyle {
    /// No fill; always pool entry 0
    pub const NONE: FillStyle = FillStyle::pattern(PatternType::None, Color::Auto, Color::Auto);

    /// 12.5% gray; always pool entry 1
    pub const GRAY_125: FillStyle =
        FillStyle::pattern(PatternType::Gray125, Color::Auto, Color::Auto);

    pub const fn solid(color: Color) -> Self {
        Self::pattern(PatternType::Solid, color, Color::Auto)
    }

    pub const fn pattern(pattern: PatternType, foreground: Color, background: Color) -> Self {
        FillStyle {
            pattern,
            foreground,
            background,
        }
    }

    pub fn is_none(&self) -> bool {
        self.pattern == PatternType::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PatternType {
    #[default]
    None,
    Solid,
    Gray125,
    Gray0625,
    DarkGray,
    MediumGray,
    LightGray,
    DarkHorizontal,
    DarkVertical,
    LightHorizontal,
    LightVertical,
}

impl PatternType {
    /// `patternType` attribute value
    pub fn xlsx_name(&self) -> &'static str {
        match self {
            PatternType::None => "none",
            PatternType::Solid => "solid",
            PatternType::Gray125 => "gray125",
            PatternType::Gray0625 => "gray0625",
            PatternType::DarkGray => "darkGray",
            PatternType::MediumGray => "mediumGray",
            PatternType::LightGray => "lightGray",
            PatternType::DarkHorizontal => "darkHorizontal",
            PatternType::DarkVertical => "darkVertical",
            PatternType::LightHorizontal => "lightHorizontal",
            PatternType::LightVertical => "lightVertical",
        }
    }
}
