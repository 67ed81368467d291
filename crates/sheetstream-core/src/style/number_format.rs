//! Number format types and date/time classification

/// Number format for cell display
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NumberFormat {
    /// General format (default)
    #[default]
    General,

    /// Built-in format by ID
    BuiltIn(u32),

    /// Custom format string
    Custom(String),
}

impl NumberFormat {
    /// 0 - General
    pub const ID_GENERAL: u32 = 0;
    /// 1 - 0
    pub const ID_NUMBER_INT: u32 = 1;
    /// 2 - 0.00
    pub const ID_NUMBER_DEC2: u32 = 2;
    /// 3 - #,##0
    pub const ID_NUMBER_SEP: u32 = 3;
    /// 4 - #,##0.00
    pub const ID_NUMBER_SEP_DEC2: u32 = 4;
    /// 9 - 0%
    pub const ID_PERCENT_INT: u32 = 9;
    /// 10 - 0.00%
    pub const ID_PERCENT_DEC2: u32 = 10;
    /// 11 - 0.00E+00
    pub const ID_SCIENTIFIC: u32 = 11;
    /// 14 - mm-dd-yy
    pub const ID_DATE_SHORT: u32 = 14;
    /// 18 - h:mm AM/PM
    pub const ID_TIME_AMPM: u32 = 18;
    /// 22 - m/d/yy h:mm
    pub const ID_DATETIME: u32 = 22;
    /// 49 - @
    pub const ID_TEXT: u32 = 49;

    /// First id available to custom format strings
    pub const FIRST_CUSTOM_ID: u32 = 164;

    /// Create a number format from a format string
    pub fn from_string<S: Into<String>>(format: S) -> Self {
        NumberFormat::Custom(format.into())
    }

    /// Create a built-in format by ID
    pub fn from_id(id: u32) -> Self {
        if id == Self::ID_GENERAL {
            NumberFormat::General
        } else {
            NumberFormat::BuiltIn(id)
        }
    }

    /// Integer format (0)
    pub fn integer() -> Self {
        NumberFormat::BuiltIn(Self::ID_NUMBER_INT)
    }

    /// Decimal format (0.00)
    pub fn decimal() -> Self {
        NumberFormat::BuiltIn(Self::ID_NUMBER_DEC2)
    }

    /// Number with thousands separator and decimals (#,##0.00)
    pub fn thousands_decimal() -> Self {
        NumberFormat::BuiltIn(Self::ID_NUMBER_SEP_DEC2)
    }

    /// Percentage with decimals (0.00%)
    pub fn percent_decimal() -> Self {
        NumberFormat::BuiltIn(Self::ID_PERCENT_DEC2)
    }

    /// Short date (mm-dd-yy)
    pub fn date_short() -> Self {
        NumberFormat::BuiltIn(Self::ID_DATE_SHORT)
    }

    /// Date and time (m/d/yy h:mm)
    pub fn datetime() -> Self {
        NumberFormat::BuiltIn(Self::ID_DATETIME)
    }

    /// Text format (@)
    pub fn text() -> Self {
        NumberFormat::BuiltIn(Self::ID_TEXT)
    }

    /// Get the format string
    ///
    /// Locale-dependent built-ins without a fixed string render as "General".
    pub fn format_string(&self) -> &str {
        match self {
            NumberFormat::General => "General",
            NumberFormat::BuiltIn(id) => builtin_format_string(*id).unwrap_or("General"),
            NumberFormat::Custom(s) => s,
        }
    }

    /// Whether values shown with this format are dates or times
    pub fn is_date_time(&self) -> bool {
        match self {
            NumberFormat::General => false,
            NumberFormat::BuiltIn(id) => is_builtin_date_time(*id),
            NumberFormat::Custom(s) => is_date_time_format(s),
        }
    }
}

/// Fixed format string of a built-in id, if it has one
pub fn builtin_format_string(id: u32) -> Option<&'static str> {
    let s = match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    };
    Some(s)
}

/// Whether a built-in format id renders a date or time
///
/// Covers the standard ids plus the locale-specific ranges 27-36 and 50-58.
pub fn is_builtin_date_time(id: u32) -> bool {
    matches!(id, 14..=22 | 27..=36 | 45..=47 | 50..=58)
}

/// Whether a custom format string renders a date or time
///
/// Date/time tokens (`y m d h s`, `AM/PM`, `A/P`) count only outside quoted
/// literals, `\x` escapes, `_x` and `*x` pairs and `[...]` directives.
/// Elapsed-time directives such as `[h]` or `[mm]` count as time tokens.
pub fn is_date_time_format(format: &str) -> bool {
    let bytes = format.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    i += 1;
                }
                i += 1;
            }
            b'\\' | b'_' | b'*' => {
                // Skip the following character, which may be multi-byte.
                i += 1;
                if let Some(c) = format.get(i..).and_then(|rest| rest.chars().next()) {
                    i += c.len_utf8();
                }
            }
            b'[' => {
                let start = i + 1;
                while i < bytes.len() && bytes[i] != b']' {
                    i += 1;
                }
                let directive = &bytes[start..i.min(bytes.len())];
                if !directive.is_empty()
                    && directive
                        .iter()
                        .all(|b| matches!(b.to_ascii_lowercase(), b'h' | b'm' | b's'))
                {
                    return true;
                }
                i += 1;
            }
            b'a' | b'A' => {
                let rest = &bytes[i..];
                if starts_with_ignore_case(rest, b"am/pm") || starts_with_ignore_case(rest, b"a/p") {
                    return true;
                }
                i += 1;
            }
            b => {
                if matches!(b.to_ascii_lowercase(), b'y' | b'm' | b'd' | b'h' | b's') {
                    return true;
                }
                i += 1;
            }
        }
    }

    false
}

fn starts_with_ignore_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len() && haystack[..needle.len()].eq_ignore_ascii_case(needle)
}
