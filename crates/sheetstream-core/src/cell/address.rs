//! A1-style cell addressing
//!
//! Rows and columns are 0-based internally and rendered 1-based / lettered.

use std::fmt;

/// Convert a column index to letters (0 = A, 25 = Z, 26 = AA, ...)
pub fn column_letters(col: u32) -> String {
    let mut buf = [0u8; 8];
    let mut pos = buf.len();
    let mut n = u64::from(col) + 1;

    while n > 0 {
        n -= 1;
        pos -= 1;
        buf[pos] = b'A' + (n % 26) as u8;
        n /= 26;
    }

    buf[pos..].iter().map(|&b| b as char).collect()
}

/// Convert column letters to an index (A = 0, AA = 26, ...)
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }

    let mut col: u64 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (c.to_ascii_uppercase() as u64 - 'A' as u64 + 1);
        if col > u64::from(u32::MAX) {
            return None;
        }
    }

    u32::try_from(col - 1).ok()
}

/// Render a cell reference such as `B7`
pub fn cell_reference(row: u32, col: u32) -> String {
    let mut s = column_letters(col);
    s.push_str(&(u64::from(row) + 1).to_string());
    s
}

/// Used range of a sheet, tracked as cells are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dimension {
    bounds: Option<(u32, u32, u32, u32)>,
}

impl Dimension {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow to include the cell at `(row, col)`
    pub fn extend(&mut self, row: u32, col: u32) {
        self.bounds = Some(match self.bounds {
            None => (row, col, row, col),
            Some((r0, c0, r1, c1)) => (r0.min(row), c0.min(col), r1.max(row), c1.max(col)),
        });
    }

    /// `(first_row, first_col, last_row, last_col)` if any cell was written
    pub fn bounds(&self) -> Option<(u32, u32, u32, u32)> {
        self.bounds
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }
}

/// `A1` when empty, `B2` for a single cell, `A1:C10` otherwise
impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds {
            None => f.write_str("A1"),
            Some((r0, c0, r1, c1)) if r0 == r1 && c0 == c1 => {
                f.write_str(&cell_reference(r0, c0))
            }
            Some((r0, c0, r1, c1)) => {
                write!(f, "{}:{}", cell_reference(r0, c0), cell_reference(r1, c1))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
        assert_eq!(column_letters(16_383), "XFD");
    }

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("aa"), Some(26));
        assert_eq!(column_index("XFD"), Some(16_383));
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
    }

    #[test]
    fn test_cell_reference() {
        assert_eq!(cell_reference(0, 0), "A1");
        assert_eq!(cell_reference(6, 1), "B7");
        assert_eq!(cell_reference(1_048_575, 16_383), "XFD1048576");
    }

    #[test]
    fn test_dimension() {
        let mut dim = Dimension::new();
        assert_eq!(dim.to_string(), "A1");

        dim.extend(1, 1);
        assert_eq!(dim.to_string(), "B2");

        dim.extend(9, 2);
        dim.extend(3, 0);
        assert_eq!(dim.to_string(), "A2:C10");
        assert_eq!(dim.bounds(), Some((1, 0, 9, 2)));
    }
}
