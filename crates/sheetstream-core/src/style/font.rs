//! Font components

use std::fmt;

use super::Color;

/// Font size in twentieths of a point
///
/// Sizes are stored in fixed point so fonts compare and hash exactly when
/// they are pooled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontSize(u16);

impl FontSize {
    pub const MIN_POINTS: f64 = 1.0;
    pub const MAX_POINTS: f64 = 409.0;

    /// 11pt, the default body font size
    pub const DEFAULT: FontSize = FontSize(220);

    /// Round `points` to the nearest twentieth, clamped to 1pt..=409pt
    ///
    /// Non-finite input yields the default size.
    pub fn from_points(points: f64) -> Self {
        if !points.is_finite() {
            return Self::DEFAULT;
        }
        let clamped = points.clamp(Self::MIN_POINTS, Self::MAX_POINTS);
        FontSize((clamped * 20.0).round() as u16)
    }

    pub fn points(self) -> f64 {
        f64::from(self.0) / 20.0
    }

    pub fn twentieths(self) -> u16 {
        self.0
    }
}

impl Default for FontSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Renders as points, e.g. `11` or `10.5`
impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.points())
    }
}

/// One entry of the font pool
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontStyle {
    /// Family name, e.g. "Calibri"
    pub name: String,
    pub size: FontSize,
    pub bold: bool,
    pub italic: bool,
    pub underline: Underline,
    pub strikethrough: bool,
    pub color: Color,
}

impl Default for FontStyle {
    fn default() -> Self {
        Self {
            name: "Calibri".to_string(),
            size: FontSize::DEFAULT,
            bold: false,
            italic: false,
            underline: Underline::None,
            strikethrough: false,
            color: Color::Auto,
        }
    }
}

impl FontStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Set the size in points
    pub fn with_size(mut self, points: f64) -> Self {
        self.size = FontSize::from_points(points);
        self
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    pub fn with_underline(mut self, underline: Underline) -> Self {
        self.underline = underline;
        self
    }

    pub fn with_strikethrough(mut self, strikethrough: bool) -> Self {
        self.strikethrough = strikethrough;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Underline {
    #[default]
    None,
    Single,
    Double,
    /// Underline spanning the cell width
    SingleAccounting,
    DoubleAccounting,
}

impl Underline {
    /// Value of the `<u val="...">` attribute, `None` for no underline
    pub fn xlsx_value(&self) -> Option<&'static str> {
        match self {
            Underline::None => None,
            Underline::Single => Some("single"),
            Underline::Double => Some("double"),
            Underline::SingleAccounting => Some("singleAccounting"),
            Underline::DoubleAccounting => Some("doubleAccounting"),
        }
    }
}
