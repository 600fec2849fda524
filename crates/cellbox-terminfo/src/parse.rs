// SPDX-License-Identifier: MIT
//
// Compiled terminfo reader.
//
// File layout (all integers little-endian):
//
//   header        6 × i16: magic, names size, booleans size, number count,
//                 string count, string table size
//   names         `names size` bytes
//   booleans      `booleans size` bytes, plus one pad byte when
//                 names + booleans is odd
//   numbers       `number count` × 2 bytes (× 4 for the extended magic)
//   string offs   `string count` × i16, each an offset into the table or
//                 negative when the capability is absent
//   string table  NUL-terminated strings
//
// Only the string capabilities named in KEY_INDICES and FUNC_INDICES are
// read. Everything after the string table (the extended block) is ignored.

use crate::caps::{Capabilities, Func, MOUSE_ENTER, MOUSE_EXIT, Source, SpecialKey};
use crate::error::ParseError;

/// Legacy format: 16-bit numbers.
const MAGIC_LEGACY: i16 = 0o432;
/// ncurses 6.1 extended format: 32-bit numbers.
const MAGIC_EXTENDED: i16 = 0o1036;

const HEADER_LEN: usize = 12;

/// String-capability slots for each [`SpecialKey`], in declaration order:
/// kf1..kf12, kich1, kdch1, khome, kend, kpp, knp, kcuu1, kcud1, kcub1, kcuf1.
pub const KEY_INDICES: [usize; SpecialKey::COUNT] = [
    66, 68, 69, 70, 71, 72, 73, 74, 75, 67, 216, 217, 77, 59, 76, 164, 82, 81, 87, 61, 79, 83,
];

/// String-capability slots for [`Func::EnterCa`] through [`Func::ExitKeypad`]:
/// smcup, rmcup, cnorm, civis, clear, sgr0, smul, bold, blink, rev, smkx, rmkx.
pub const FUNC_INDICES: [usize; 12] = [28, 40, 16, 13, 5, 39, 36, 27, 26, 34, 89, 88];

// ─── Header ──────────────────────────────────────────────────────────────────

/// Byte ranges of the string sections, derived from the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    string_count: usize,
    offsets_start: usize,
    table_start: usize,
    table_len: usize,
}

fn read_i16(data: &[u8], at: usize) -> Option<i16> {
    data.get(at..at + 2).map(|b| i16::from_le_bytes([b[0], b[1]]))
}

fn size(value: i16, what: &'static str) -> Result<usize, ParseError> {
    usize::try_from(value).map_err(|_| ParseError::NegativeSize { what, value })
}

fn layout(data: &[u8]) -> Result<Layout, ParseError> {
    let mut header = [0i16; 6];
    for (i, field) in header.iter_mut().enumerate() {
        *field = read_i16(data, i * 2).ok_or(ParseError::Truncated("header"))?;
    }

    let number_width = match header[0] {
        MAGIC_LEGACY => 2,
        MAGIC_EXTENDED => 4,
        other => return Err(ParseError::BadMagic(other)),
    };

    let names = size(header[1], "names")?;
    let mut bools = size(header[2], "booleans")?;
    let numbers = size(header[3], "numbers")?;
    let string_count = size(header[4], "strings")?;
    let table_len = size(header[5], "string table")?;

    // Numbers start on an even offset.
    if (names + bools) % 2 != 0 {
        bools += 1;
    }

    let offsets_start = HEADER_LEN + names + bools + numbers * number_width;
    let table_start = offsets_start + string_count * 2;

    if data.len() < table_start {
        return Err(ParseError::Truncated("string offsets"));
    }
    if data.len() < table_start + table_len {
        return Err(ParseError::Truncated("string table"));
    }

    Ok(Layout {
        string_count,
        offsets_start,
        table_start,
        table_len,
    })
}

// ─── Strings ─────────────────────────────────────────────────────────────────

/// String capability `index`, or `None` if absent or cancelled.
fn string_at(data: &[u8], layout: &Layout, index: usize) -> Result<Option<Vec<u8>>, ParseError> {
    if index >= layout.string_count {
        return Ok(None);
    }
    let raw = read_i16(data, layout.offsets_start + index * 2)
        .ok_or(ParseError::Truncated("string offsets"))?;
    // -1 is absent, -2 is cancelled.
    let Ok(offset) = usize::try_from(raw) else {
        return Ok(None);
    };
    if offset >= layout.table_len {
        return Err(ParseError::OffsetOutOfRange { index });
    }

    let table = &data[layout.table_start..layout.table_start + layout.table_len];
    let tail = &table[offset..];
    let end = tail
        .iter()
        .position(|&b| b == 0)
        .ok_or(ParseError::Unterminated { index })?;
    Ok(Some(tail[..end].to_vec()))
}

/// Decode a compiled terminfo entry into a capability table.
///
/// # Errors
///
/// Returns a [`ParseError`] if the header is invalid, a section is
/// truncated, or a referenced string is out of range or unterminated.
/// Absent capabilities are not errors.
pub fn parse(name: &str, source: Source, data: &[u8]) -> Result<Capabilities, ParseError> {
    let layout = layout(data)?;

    let mut keys = Vec::with_capacity(SpecialKey::COUNT);
    for (index, key) in KEY_INDICES.into_iter().zip(SpecialKey::ALL) {
        if let Some(seq) = string_at(data, &layout, index)? {
            keys.push((seq, key));
        }
    }

    let mut funcs: [Vec<u8>; Func::COUNT] = Default::default();
    for (slot, index) in funcs.iter_mut().zip(FUNC_INDICES) {
        *slot = string_at(data, &layout, index)?.unwrap_or_default();
    }
    funcs[Func::EnterMouse as usize] = MOUSE_ENTER.to_vec();
    funcs[Func::ExitMouse as usize] = MOUSE_EXIT.to_vec();

    Ok(Capabilities::new(name, source, keys, funcs))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::caps::KeyMatch;
    use pretty_assertions::assert_eq;

    /// Build a compiled entry with the given string capabilities set.
    pub(crate) fn compiled(names: &[u8], bools: usize, strings: &[(usize, &[u8])]) -> Vec<u8> {
        let count = strings.iter().map(|(i, _)| i + 1).max().unwrap_or(0);
        let mut offsets = vec![-1i16; count];
        let mut table = Vec::new();
        for &(index, value) in strings {
            offsets[index] = i16::try_from(table.len()).unwrap();
            table.extend_from_slice(value);
            table.push(0);
        }

        let mut out = Vec::new();
        for field in [
            MAGIC_LEGACY,
            i16::try_from(names.len()).unwrap(),
            i16::try_from(bools).unwrap(),
            0,
            i16::try_from(count).unwrap(),
            i16::try_from(table.len()).unwrap(),
        ] {
            out.extend_from_slice(&field.to_le_bytes());
        }
        out.extend_from_slice(names);
        out.resize(out.len() + bools, 1);
        if (names.len() + bools) % 2 != 0 {
            out.push(0);
        }
        for off in offsets {
            out.extend_from_slice(&off.to_le_bytes());
        }
        out.extend_from_slice(&table);
        out
    }

    fn parse_bytes(data: &[u8]) -> Result<Capabilities, ParseError> {
        parse("test", Source::Builtin, data)
    }

    // ── Header ──────────────────────────────────────────────────────────

    #[test]
    fn single_string_resolves() {
        // clear_screen is string capability 5.
        let data = compiled(b"t\0", 0, &[(5, b"A")]);
        let caps = parse_bytes(&data).unwrap();
        assert_eq!(caps.func(Func::ClearScreen), b"A");
    }

    #[test]
    fn odd_names_and_booleans_are_padded() {
        let data = compiled(b"abc\0", 3, &[(5, b"A")]);
        let caps = parse_bytes(&data).unwrap();
        assert_eq!(caps.func(Func::ClearScreen), b"A");
    }

    #[test]
    fn odd_names_with_even_booleans_are_padded() {
        // 3 + 2 is odd, so one pad byte follows the booleans even though
        // the booleans section alone has even length.
        let data = compiled(b"ab\0", 2, &[(5, b"A")]);
        assert_eq!(data.len(), HEADER_LEN + 3 + 2 + 1 + 6 * 2 + 2);
        let caps = parse_bytes(&data).unwrap();
        assert_eq!(caps.func(Func::ClearScreen), b"A");
    }

    #[test]
    fn odd_names_with_odd_booleans_are_not_padded() {
        // 3 + 1 is even: no pad byte, although the booleans section alone
        // has odd length.
        let data = compiled(b"ab\0", 1, &[(5, b"A")]);
        assert_eq!(data.len(), HEADER_LEN + 3 + 1 + 6 * 2 + 2);
        let caps = parse_bytes(&data).unwrap();
        assert_eq!(caps.func(Func::ClearScreen), b"A");
    }

    #[test]
    fn extended_magic_uses_wide_numbers() {
        let mut data = Vec::new();
        for field in [MAGIC_EXTENDED, 2, 0, 1, 6, 2] {
            data.extend_from_slice(&i16::to_le_bytes(field));
        }
        data.extend_from_slice(b"t\0");
        data.extend_from_slice(&80i32.to_le_bytes());
        for off in [-1i16, -1, -1, -1, -1, 0] {
            data.extend_from_slice(&off.to_le_bytes());
        }
        data.extend_from_slice(b"B\0");

        let caps = parse_bytes(&data).unwrap();
        assert_eq!(caps.func(Func::ClearScreen), b"B");
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut data = compiled(b"t\0", 0, &[]);
        data[0] = 0x42;
        assert!(matches!(parse_bytes(&data), Err(ParseError::BadMagic(_))));
    }

    #[test]
    fn short_header_is_truncated() {
        assert_eq!(
            parse_bytes(&[0x1a, 0x01, 0x00]),
            Err(ParseError::Truncated("header"))
        );
    }

    #[test]
    fn errors_are_exported_from_crate_root() {
        let err: crate::ParseError = parse_bytes(&[]).unwrap_err();
        assert_eq!(err.to_string(), "file ends inside the header");
    }

    #[test]
    fn missing_string_table_is_truncated() {
        let mut data = compiled(b"t\0", 0, &[(5, b"hello")]);
        data.truncate(data.len() - 3);
        assert_eq!(parse_bytes(&data), Err(ParseError::Truncated("string table")));
    }

    #[test]
    fn negative_section_size_is_rejected() {
        let mut data = compiled(b"t\0", 0, &[]);
        data[2..4].copy_from_slice(&(-4i16).to_le_bytes());
        assert!(matches!(
            parse_bytes(&data),
            Err(ParseError::NegativeSize { what: "names", .. })
        ));
    }

    // ── Strings ─────────────────────────────────────────────────────────

    #[test]
    fn absent_capabilities_are_empty() {
        let data = compiled(b"t\0", 0, &[(5, b"A")]);
        let caps = parse_bytes(&data).unwrap();
        assert!(caps.func(Func::EnterCa).is_empty());
        assert_eq!(caps.keys().count(), 0);
    }

    #[test]
    fn key_sequences_are_read() {
        let data = compiled(b"t\0", 1, &[(66, b"\x1bOP"), (87, b"\x1bOA")]);
        let caps = parse_bytes(&data).unwrap();
        assert_eq!(caps.match_key(b"\x1bOP"), KeyMatch::Key(SpecialKey::F1, 3));
        assert_eq!(caps.match_key(b"\x1bOA"), KeyMatch::Key(SpecialKey::ArrowUp, 3));
    }

    #[test]
    fn mouse_functions_are_filled_in() {
        let data = compiled(b"t\0", 0, &[]);
        let caps = parse_bytes(&data).unwrap();
        assert_eq!(caps.func(Func::EnterMouse), MOUSE_ENTER);
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        let mut data = compiled(b"t\0", 0, &[(5, b"A")]);
        let at = HEADER_LEN + 2 + 5 * 2;
        data[at..at + 2].copy_from_slice(&40i16.to_le_bytes());
        assert_eq!(
            parse_bytes(&data),
            Err(ParseError::OffsetOutOfRange { index: 5 })
        );
    }

    #[test]
    fn unterminated_string_is_rejected() {
        let mut data = compiled(b"t\0", 0, &[(5, b"AB")]);
        let last = data.len() - 1;
        data[last] = b'C';
        assert_eq!(
            parse_bytes(&data),
            Err(ParseError::Unterminated { index: 5 })
        );
    }
}
