//! Formula text rewriting for column moves and row replication.
//!
//! Formulas are never evaluated here. References are recognized lexically as
//! `$?COL$?ROW` tokens outside string literals; function names such as `LOG10(`
//! and sheet prefixes such as `ABC1!` are not references.

use crate::mapper::PositionMap;
use crate::validation::MAX_COLS;
use crate::xml::write_col_letter;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static CELL_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\$?)([A-Z]{1,3})(\$?)([0-9]+)").expect("valid cell reference pattern"));

/// Zero-based column index of an A1-style column label ("A" = 0, "AA" = 26).
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_uppercase()) {
        return None;
    }
    let n = letters
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + (b - b'A' + 1) as usize);
    Some(n - 1)
}

/// A1-style column label for a zero-based index.
pub fn column_name(index: usize) -> Option<String> {
    if index >= MAX_COLS {
        return None;
    }
    let mut buf = [0u8; 4];
    let len = write_col_letter(index, &mut buf);
    Some(String::from_utf8_lossy(&buf[..len]).into_owned())
}

/// Rewrite column letters through `pos_map`. Unmapped and unmoved columns are left verbatim.
pub fn remap_formula_columns(formula: &str, pos_map: &PositionMap) -> String {
    rewrite_refs(formula, |caps| {
        let col = column_index(&caps[2])?;
        let new_col = *pos_map.get(&col)?;
        if new_col == col {
            return None;
        }
        let letters = column_name(new_col)?;
        Some(format!("{}{}{}{}", &caps[1], letters, &caps[3], &caps[4]))
    })
}

/// Shift every relative row number by `target_row - template_row`.
///
/// Rows anchored with `$` stay put. A shift landing above row 1 becomes `#REF!`.
pub fn adjust_formula_row(formula: &str, template_row: u32, target_row: u32) -> String {
    let offset = target_row as i64 - template_row as i64;
    if offset == 0 {
        return formula.to_string();
    }
    rewrite_refs(formula, |caps| {
        if &caps[3] == "$" {
            return None;
        }
        let row: i64 = caps[4].parse().ok()?;
        let new_row = row + offset;
        if new_row < 1 {
            return Some("#REF!".to_string());
        }
        Some(format!("{}{}{}", &caps[1], &caps[2], new_row))
    })
}

/// Move relative references by a row and column delta, the way a shared formula
/// is filled from its anchor cell. `$`-anchored parts stay put.
pub fn shift_formula_refs(formula: &str, row_delta: i64, col_delta: i64) -> String {
    if row_delta == 0 && col_delta == 0 {
        return formula.to_string();
    }
    rewrite_refs(formula, |caps| {
        let col_fixed = &caps[1] == "$" || col_delta == 0;
        let row_fixed = &caps[3] == "$" || row_delta == 0;
        if col_fixed && row_fixed {
            return None;
        }
        let col = column_index(&caps[2])? as i64;
        let row: i64 = caps[4].parse().ok()?;
        let new_col = if col_fixed { col } else { col + col_delta };
        let new_row = if row_fixed { row } else { row + row_delta };
        if new_col < 0 || new_row < 1 {
            return Some("#REF!".to_string());
        }
        let letters = match column_name(new_col as usize) {
            Some(letters) => letters,
            None => return Some("#REF!".to_string()),
        };
        Some(format!("{}{}{}{}", &caps[1], letters, &caps[3], new_row))
    })
}

/// Column remap first, then row adjustment.
pub fn translate_formula(formula: &str, pos_map: &PositionMap, template_row: u32, target_row: u32) -> String {
    adjust_formula_row(&remap_formula_columns(formula, pos_map), template_row, target_row)
}

/// Apply `replace` to each cell reference; `None` keeps the token as written.
fn rewrite_refs<F>(formula: &str, mut replace: F) -> String
where
    F: FnMut(&Captures) -> Option<String>,
{
    let literals = string_literal_spans(formula);
    let bytes = formula.as_bytes();
    let mut out = String::with_capacity(formula.len() + 8);
    let mut last = 0;

    for caps in CELL_REF.captures_iter(formula) {
        let m = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        let (start, end) = (m.start(), m.end());

        if literals.iter().any(|&(s, e)| start >= s && start < e) {
            continue;
        }
        if start > 0 && is_name_byte(bytes[start - 1]) {
            continue;
        }
        if let Some(&next) = bytes.get(end) {
            if is_name_byte(next) || next == b'(' || next == b'!' {
                continue;
            }
        }

        if let Some(replacement) = replace(&caps) {
            out.push_str(&formula[last..start]);
            out.push_str(&replacement);
            last = end;
        }
    }

    out.push_str(&formula[last..]);
    out
}

#[inline]
fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

/// Byte spans of double-quoted literals; `""` inside a literal is an escaped quote.
fn string_literal_spans(formula: &str) -> Vec<(usize, usize)> {
    let bytes = formula.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;

    while let Some(offset) = memchr::memchr(b'"', &bytes[i..]) {
        let start = i + offset;
        let mut j = start + 1;
        loop {
            match memchr::memchr(b'"', &bytes[j..]) {
                Some(o) if bytes.get(j + o + 1) == Some(&b'"') => j += o + 2,
                Some(o) => {
                    j += o + 1;
                    break;
                }
                None => {
                    j = bytes.len();
                    break;
                }
            }
        }
        spans.push((start, j));
        i = j;
        if i >= bytes.len() {
            break;
        }
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters_round_trip_edges() {
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("Z"), Some(25));
        assert_eq!(column_index("AA"), Some(26));
        assert_eq!(column_index("AZ"), Some(51));
        assert_eq!(column_index("XFD"), Some(16_383));
        assert_eq!(column_index("a"), None);
        assert_eq!(column_name(27).as_deref(), Some("AB"));
        assert_eq!(column_name(16_383).as_deref(), Some("XFD"));
        assert_eq!(column_name(MAX_COLS), None);
    }

    #[test]
    fn test_remap_columns() {
        let map = PositionMap::from([(0, 2), (1, 0)]);
        assert_eq!(remap_formula_columns("=A2*B2", &map), "=C2*A2");
    }

    #[test]
    fn test_remap_leaves_unmapped_and_unmoved() {
        let map = PositionMap::from([(0, 0), (2, 3)]);
        assert_eq!(remap_formula_columns("=A2+B2+C2", &map), "=A2+B2+D2");
        assert_eq!(remap_formula_columns("=SUM($C$2:C9)", &map), "=SUM($D$2:D9)");
    }

    #[test]
    fn test_remap_multi_letter_columns() {
        let map = PositionMap::from([(26, 1), (1, 27)]);
        assert_eq!(remap_formula_columns("=AA3-B3", &map), "=B3-AB3");
    }

    #[test]
    fn test_adjust_rows() {
        assert_eq!(adjust_formula_row("=C2*D2", 1, 4), "=C5*D5");
        assert_eq!(adjust_formula_row("=C2*D2", 3, 3), "=C2*D2");
        assert_eq!(adjust_formula_row("=C2*$D$1+E$1", 1, 2), "=C3*$D$1+E$1");
        assert_eq!(adjust_formula_row("=A1", 5, 1), "=#REF!");
    }

    #[test]
    fn test_skips_functions_literals_and_sheet_prefixes() {
        let map = PositionMap::from([(0, 1)]);
        assert_eq!(
            remap_formula_columns("=IF(A2>0,\"A2 ok\",LOG10(A2))", &map),
            "=IF(B2>0,\"A2 ok\",LOG10(B2))"
        );
        assert_eq!(adjust_formula_row("=ABC1!A2+Sheet1!A2", 1, 2), "=ABC1!A3+Sheet1!A3");
        assert_eq!(adjust_formula_row("=\"say \"\"A1\"\"\"&A1", 1, 2), "=\"say \"\"A1\"\"\"&A2");
    }

    #[test]
    fn test_shift_shared_formula() {
        assert_eq!(shift_formula_refs("=A1+$B$1+C$2", 2, 1), "=B3+$B$1+D$2");
        assert_eq!(shift_formula_refs("=SUM(A1:A3)", 0, 0), "=SUM(A1:A3)");
        assert_eq!(shift_formula_refs("=B2", 0, -2), "=#REF!");
    }

    #[test]
    fn test_translate_composes_remap_then_adjust() {
        let map = PositionMap::from([(0, 2), (1, 0)]);
        assert_eq!(translate_formula("=A2*B2", &map, 1, 3), "=C4*A4");
    }
}
