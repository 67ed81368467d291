//! Packed 32-bit style codes
//!
//! A [`StyleDescriptor`] holds six sub-fields that pack into fixed,
//! non-overlapping bit ranges of a `u32` (least significant bit first):
//!
//! | field         | bits  | width |
//! |---------------|-------|-------|
//! | horizontal    | 0-2   | 3     |
//! | vertical      | 3-5   | 3     |
//! | border        | 6-10  | 5     |
//! | fill          | 11-15 | 5     |
//! | font          | 16-22 | 7     |
//! | number format | 23-31 | 9     |
//!
//! The all-zero code is the default style.

use super::{HorizontalAlignment, VerticalAlignment};
use crate::error::{Error, Result};
use std::fmt;

/// One sub-field of a packed style code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleField {
    Horizontal,
    Vertical,
    Border,
    Fill,
    Font,
    NumberFormat,
}

impl StyleField {
    pub const ALL: [StyleField; 6] = [
        StyleField::Horizontal,
        StyleField::Vertical,
        StyleField::Border,
        StyleField::Fill,
        StyleField::Font,
        StyleField::NumberFormat,
    ];

    /// Position of the field's lowest bit
    pub const fn shift(self) -> u32 {
        match self {
            StyleField::Horizontal => 0,
            StyleField::Vertical => 3,
            StyleField::Border => 6,
            StyleField::Fill => 11,
            StyleField::Font => 16,
            StyleField::NumberFormat => 23,
        }
    }

    /// Width of the field in bits
    pub const fn width(self) -> u32 {
        match self {
            StyleField::Horizontal | StyleField::Vertical => 3,
            StyleField::Border | StyleField::Fill => 5,
            StyleField::Font => 7,
            StyleField::NumberFormat => 9,
        }
    }

    /// Largest value the field can hold
    pub const fn max_value(self) -> u32 {
        (1 << self.width()) - 1
    }

    /// Mask of the field's bits within a packed code
    pub const fn mask(self) -> u32 {
        self.max_value() << self.shift()
    }

    pub const fn name(self) -> &'static str {
        match self {
            StyleField::Horizontal => "horizontal",
            StyleField::Vertical => "vertical",
            StyleField::Border => "border",
            StyleField::Fill => "fill",
            StyleField::Font => "font",
            StyleField::NumberFormat => "number_format",
        }
    }
}

/// A packed style code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StyleCode(u32);

impl StyleCode {
    /// The default style
    pub const DEFAULT: StyleCode = StyleCode(0);

    /// Wrap a raw packed value without validation
    pub const fn from_raw(raw: u32) -> Self {
        StyleCode(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Raw value of one field
    pub const fn field(self, field: StyleField) -> u32 {
        (self.0 & field.mask()) >> field.shift()
    }

    /// Copy of this code with `field` zeroed, all other bits unchanged
    pub const fn clear_field(self, field: StyleField) -> Self {
        StyleCode(self.0 & !field.mask())
    }

    pub const fn is_default(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for StyleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Unpacked form of a [`StyleCode`]
///
/// `border`, `fill` and `font` are indices into the registry's component
/// pools; `number_format` is a format id (built-in below 164, custom above).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StyleDescriptor {
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
    pub border: u32,
    pub fill: u32,
    pub font: u32,
    pub number_format: u32,
}

impl StyleDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_horizontal(mut self, horizontal: HorizontalAlignment) -> Self {
        self.horizontal = horizontal;
        self
    }

    pub fn with_vertical(mut self, vertical: VerticalAlignment) -> Self {
        self.vertical = vertical;
        self
    }

    pub fn with_border(mut self, border: u32) -> Self {
        self.border = border;
        self
    }

    pub fn with_fill(mut self, fill: u32) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_font(mut self, font: u32) -> Self {
        self.font = font;
        self
    }

    pub fn with_number_format(mut self, number_format: u32) -> Self {
        self.number_format = number_format;
        self
    }

    fn value(&self, field: StyleField) -> u32 {
        match field {
            StyleField::Horizontal => self.horizontal.code(),
            StyleField::Vertical => self.vertical.code(),
            StyleField::Border => self.border,
            StyleField::Fill => self.fill,
            StyleField::Font => self.font,
            StyleField::NumberFormat => self.number_format,
        }
    }

    /// Pack into a code, rejecting values wider than their field
    pub fn pack(&self) -> Result<StyleCode> {
        let mut raw = 0u32;
        for field in StyleField::ALL {
            let value = self.value(field);
            if value > field.max_value() {
                return Err(Error::StyleFieldOverflow {
                    field: field.name(),
                    value,
                    max: field.max_value(),
                });
            }
            raw |= value << field.shift();
        }
        Ok(StyleCode(raw))
    }

    /// Exact inverse of [`StyleDescriptor::pack`]
    pub fn unpack(code: StyleCode) -> Result<Self> {
        let horizontal = HorizontalAlignment::from_code(code.field(StyleField::Horizontal))
            .ok_or(Error::MalformedStyleCode {
                code: code.raw(),
                reason: "horizontal alignment out of range",
            })?;
        let vertical = VerticalAlignment::from_code(code.field(StyleField::Vertical)).ok_or(
            Error::MalformedStyleCode {
                code: code.raw(),
                reason: "vertical alignment out of range",
            },
        )?;

        Ok(Self {
            horizontal,
            vertical,
            border: code.field(StyleField::Border),
            fill: code.field(StyleField::Fill),
            font: code.field(StyleField::Font),
            number_format: code.field(StyleField::NumberFormat),
        })
    }
}
