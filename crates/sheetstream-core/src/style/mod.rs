//! Cell styling
//!
//! - [`Style`] - Complete cell style built from components
//! - [`StyleDescriptor`] / [`StyleCode`] - Packed 32-bit form of a style
//! - [`StyleRegistry`] - Shared dedup table and component pools
//! - [`NumberFormat`] - Number formats and date/time classification

mod alignment;
mod border;
mod color;
mod descriptor;
mod fill;
mod font;
mod number_format;
mod pool;
mod registry;

pub use alignment::{Alignment, HorizontalAlignment, VerticalAlignment};
pub use border::{BorderEdge, BorderLineStyle, BorderSide, BorderStyle};
pub use color::Color;
pub use descriptor::{StyleCode, StyleDescriptor, StyleField};
pub use fill::{FillStyle, PatternType};
pub use font::{FontSize, FontStyle, Underline};
pub use number_format::{
    builtin_format_string, is_builtin_date_time, is_date_time_format, NumberFormat,
};
pub use pool::ComponentPool;
pub use registry::{StyleRegistry, StyleSheet};

/// Complete cell style
///
/// Resolved into a [`StyleCode`] by [`StyleRegistry::register_style`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub font: FontStyle,
    pub fill: FillStyle,
    pub border: BorderStyle,
    pub alignment: Alignment,
    pub number_format: NumberFormat,
}

impl Style {
    /// Create a new default style
    pub fn new() -> Self {
        Self::default()
    }

    /// Set font to bold
    pub fn bold(mut self, bold: bool) -> Self {
        self.font.bold = bold;
        self
    }

    /// Set font to italic
    pub fn italic(mut self, italic: bool) -> Self {
        self.font.italic = italic;
        self
    }

    /// Set font size in points
    pub fn font_size(mut self, size: f64) -> Self {
        self.font.size = FontSize::from_points(size);
        self
    }

    /// Set font name
    pub fn font_name<S: Into<String>>(mut self, name: S) -> Self {
        self.font.name = name.into();
        self
    }

    /// Set font color
    pub fn font_color(mut self, color: Color) -> Self {
        self.font.color = color;
        self
    }

    /// Set fill color (solid fill)
    pub fn fill_color(mut self, color: Color) -> Self {
        self.fill = FillStyle::solid(color);
        self
    }

    pub fn border(mut self, border: BorderStyle) -> Self {
        self.border = border;
        self
    }

    /// Set a custom number format string
    pub fn number_format<S: Into<String>>(mut self, format: S) -> Self {
        self.number_format = NumberFormat::Custom(format.into());
        self
    }

    /// Set a number format by value
    pub fn with_number_format(mut self, format: NumberFormat) -> Self {
        self.number_format = format;
        self
    }

    /// Set horizontal alignment
    pub fn horizontal_alignment(mut self, align: HorizontalAlignment) -> Self {
        self.alignment.horizontal = align;
        self
    }

    /// Set vertical alignment
    pub fn vertical_alignment(mut self, align: VerticalAlignment) -> Self {
        self.alignment.vertical = align;
        self
    }
}
