//! Shared style registry
//!
//! Resolves styles into packed [`StyleCode`]s and assigns each distinct code
//! a dense slot index (the `xf` index a serializer writes into `s="..."`).
//! Slot 0 is always the default style.

use super::number_format::builtin_format_string;
use super::{
    BorderStyle, ComponentPool, FillStyle, FontStyle, NumberFormat, Style, StyleCode,
    StyleDescriptor, StyleField,
};
use crate::error::{Error, Result};
use crate::index_map::PrimitiveIndexMap;
use parking_lot::Mutex;

/// Registry of packed style codes and the component pools they index
///
/// Safe to share between sheet writers through an `Arc`; every
/// check-then-insert runs under one internal lock.
#[derive(Debug)]
pub struct StyleRegistry {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    slots: Vec<StyleCode>,
    by_code: PrimitiveIndexMap<u32, u32>,
    fonts: ComponentPool<FontStyle>,
    fills: ComponentPool<FillStyle>,
    borders: ComponentPool<BorderStyle>,
    formats: ComponentPool<String>,
}

/// Point-in-time copy of everything needed to render a stylesheet
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSheet {
    pub fonts: Vec<FontStyle>,
    pub fills: Vec<FillStyle>,
    pub borders: Vec<BorderStyle>,
    /// Custom number formats as `(id, format string)`, ids from 164
    pub number_formats: Vec<(u32, String)>,
    /// Registered styles in slot order
    pub cell_formats: Vec<StyleDescriptor>,
}

impl StyleRegistry {
    /// Create a registry holding only the default style
    pub fn new() -> Self {
        let mut by_code = PrimitiveIndexMap::with_capacity(64);
        by_code.insert(StyleCode::DEFAULT.raw(), 0);

        Self {
            inner: Mutex::new(Inner {
                slots: vec![StyleCode::DEFAULT],
                by_code,
                fonts: ComponentPool::seeded([FontStyle::default()]),
                // Readers expect the two reserved fills at 0 and 1.
                fills: ComponentPool::seeded([FillStyle::NONE, FillStyle::GRAY_125]),
                borders: ComponentPool::seeded([BorderStyle::default()]),
                formats: ComponentPool::new(),
            }),
        }
    }

    /// Register a descriptor, returning its packed code
    ///
    /// Identical descriptors always yield the same code and slot.
    pub fn register(&self, descriptor: &StyleDescriptor) -> Result<StyleCode> {
        let code = descriptor.pack()?;
        self.inner.lock().slot_for(code);
        Ok(code)
    }

    /// Resolve a full style into pooled components and register it
    pub fn register_style(&self, style: &Style) -> Result<StyleCode> {
        let mut inner = self.inner.lock();

        let font = pooled(&mut inner.fonts, &style.font, StyleField::Font)?;
        let fill = pooled(&mut inner.fills, &style.fill, StyleField::Fill)?;
        let border = pooled(&mut inner.borders, &style.border, StyleField::Border)?;
        let number_format = inner.number_format_id(&style.number_format)?;

        let code = StyleDescriptor {
            horizontal: style.alignment.horizontal,
            vertical: style.alignment.vertical,
            border,
            fill,
            font,
            number_format,
        }
        .pack()?;
        inner.slot_for(code);
        Ok(code)
    }

    /// Exact inverse of packing
    pub fn unpack(&self, code: StyleCode) -> Result<StyleDescriptor> {
        StyleDescriptor::unpack(code)
    }

    /// Copy of `code` with `field` zeroed
    pub fn clear_field(&self, code: StyleCode, field: StyleField) -> StyleCode {
        code.clear_field(field)
    }

    /// Whether a number format renders dates or times
    pub fn classify_number_format(&self, format: &NumberFormat) -> bool {
        format.is_date_time()
    }

    /// Whether the number format referenced by `code` renders dates or times
    pub fn is_date_style(&self, code: StyleCode) -> bool {
        let id = code.field(StyleField::NumberFormat);
        if id < NumberFormat::FIRST_CUSTOM_ID {
            return super::is_builtin_date_time(id);
        }
        let inner = self.inner.lock();
        inner
            .formats
            .get(id - NumberFormat::FIRST_CUSTOM_ID)
            .is_some_and(|s| super::is_date_time_format(s))
    }

    /// Slot index of a registered code
    pub fn slot_of(&self, code: StyleCode) -> Option<u32> {
        self.inner.lock().by_code.get(code.raw())
    }

    /// Slot index of `code`, registering it first if it is new
    pub fn slot_for(&self, code: StyleCode) -> Result<u32> {
        StyleDescriptor::unpack(code)?;
        Ok(self.inner.lock().slot_for(code))
    }

    /// Number of registered styles, default included
    pub fn len(&self) -> usize {
        self.inner.lock().slots.len()
    }

    /// Always false; the default style is registered at construction
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Copy out the pools and slots for rendering
    pub fn snapshot(&self) -> Result<StyleSheet> {
        let inner = self.inner.lock();

        let cell_formats = inner
            .slots
            .iter()
            .map(|code| StyleDescriptor::unpack(*code))
            .collect::<Result<Vec<_>>>()?;
        let number_formats = inner
            .formats
            .items()
            .iter()
            .zip(NumberFormat::FIRST_CUSTOM_ID..)
            .map(|(s, id)| (id, s.clone()))
            .collect();

        Ok(StyleSheet {
            fonts: inner.fonts.items().to_vec(),
            fills: inner.fills.items().to_vec(),
            borders: inner.borders.items().to_vec(),
            number_formats,
            cell_formats,
        })
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn slot_for(&mut self, code: StyleCode) -> u32 {
        if let Some(slot) = self.by_code.get(code.raw()) {
            return slot;
        }
        let slot = self.slots.len() as u32;
        self.slots.push(code);
        self.by_code.insert(code.raw(), slot);
        log::trace!("registered style {code} at slot {slot}");
        slot
    }

    fn number_format_id(&mut self, format: &NumberFormat) -> Result<u32> {
        let max_builtin = NumberFormat::FIRST_CUSTOM_ID - 1;
        match format {
            NumberFormat::General => Ok(NumberFormat::ID_GENERAL),
            NumberFormat::BuiltIn(id) if *id <= max_builtin => Ok(*id),
            NumberFormat::BuiltIn(id) => Err(Error::StyleFieldOverflow {
                field: StyleField::NumberFormat.name(),
                value: *id,
                max: max_builtin,
            }),
            NumberFormat::Custom(s) => {
                if let Some(id) = (0..NumberFormat::FIRST_CUSTOM_ID)
                    .find(|id| builtin_format_string(*id) == Some(s.as_str()))
                {
                    return Ok(id);
                }
                let max_index = StyleField::NumberFormat.max_value() - NumberFormat::FIRST_CUSTOM_ID;
                let index = self.formats.get_or_insert(s, max_index).ok_or(
                    Error::StyleFieldOverflow {
                        field: StyleField::NumberFormat.name(),
                        value: NumberFormat::FIRST_CUSTOM_ID + self.formats.len() as u32,
                        max: StyleField::NumberFormat.max_value(),
                    },
                )?;
                Ok(NumberFormat::FIRST_CUSTOM_ID + index)
            }
        }
    }
}

fn pooled<T>(pool: &mut ComponentPool<T>, item: &T, field: StyleField) -> Result<u32>
where
    T: std::hash::Hash + Eq + Clone,
{
    pool.get_or_insert(item, field.max_value())
        .ok_or(Error::StyleFieldOverflow {
            field: field.name(),
            value: pool.len() as u32,
            max: field.max_value(),
        })
}
