//! `char_class` – maps code points onto the small alphabet the scanner
//! automaton runs over.
//
//  Three tiers: a direct table for ASCII, a packed nibble trie for the rest
//  of the BMP below the surrogates, and a binary-searched range table for
//  everything from U+E000 up (including combined surrogate pairs).

use once_cell::sync::Lazy;

use crate::tables::pack;

/// End of input, or a code point that is not an XML `Char`.
pub const EOF: u8 = 0;
pub const TAB: u8 = 1;
pub const LF: u8 = 2;
pub const CR: u8 = 3;
/// First class of the printable ASCII block; `' '` maps here.
const PRINTABLE_BASE: u8 = 4;
/// Non-ASCII `NameStartChar`.
pub const NAME_START_OTHER: u8 = 99;
/// Non-ASCII `NameChar` that cannot start a name.
pub const NAME_OTHER: u8 = 100;
/// Any other non-ASCII XML `Char`.
pub const CHAR_OTHER: u8 = 101;

pub const CLASS_COUNT: usize = 102;

/// Class of an ASCII byte. Printable bytes (`0x20..=0x7e`) get one class
/// each; DEL is an ordinary XML `Char`.
pub const fn ascii(b: u8) -> u8 {
    match b {
        b'\t' => TAB,
        b'\n' => LF,
        b'\r' => CR,
        0x20..=0x7e => b - 0x20 + PRINTABLE_BASE,
        0x7f => CHAR_OTHER,
        _ => EOF,
    }
}

static MAP0: [u8; 128] = {
    let mut map = [0u8; 128];
    let mut i = 0;
    while i < 128 {
        map[i] = ascii(i as u8);
        i += 1;
    }
    map
};

// Non-ASCII ranges below the surrogates, per XML 1.0 (5th ed.) names.
const BMP_NAME_START: &[(u32, u32)] = &[
    (0xC0, 0xD6),
    (0xD8, 0xF6),
    (0xF8, 0x2FF),
    (0x370, 0x37D),
    (0x37F, 0x1FFF),
    (0x200C, 0x200D),
    (0x2070, 0x218F),
    (0x2C00, 0x2FEF),
    (0x3001, 0xD7FF),
];
const BMP_NAME_ONLY: &[(u32, u32)] = &[(0xB7, 0xB7), (0x300, 0x36F), (0x203F, 0x2040)];

const MAP1_LEVELS: [u32; 2] = [4, 5];

/// Packed classes for `0x80..0xD800`.
static MAP1: Lazy<Vec<u32>> = Lazy::new(|| {
    let in_any = |ranges: &[(u32, u32)], c: u32| ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi);
    let dense: Vec<u32> = (0..0xD800u32)
        .map(|c| {
            if c < 0x80 {
                0
            } else if in_any(BMP_NAME_START, c) {
                NAME_START_OTHER as u32
            } else if in_any(BMP_NAME_ONLY, c) {
                NAME_OTHER as u32
            } else {
                CHAR_OTHER as u32
            }
        })
        .collect();
    pack(&dense, &MAP1_LEVELS)
});

// U+E000 and above: six ranges, everything else is class 0.
const MAP2_LOW: [u32; 6] = [0xE000, 0xF900, 0xFDD0, 0xFDF0, 0x10000, 0xF0000];
const MAP2_HIGH: [u32; 6] = [0xF8FF, 0xFDCF, 0xFDEF, 0xFFFD, 0xEFFFF, 0x10FFFF];
const MAP2_CLASS: [u8; 6] = [
    CHAR_OTHER,
    NAME_START_OTHER,
    CHAR_OTHER,
    NAME_START_OTHER,
    NAME_START_OTHER,
    CHAR_OTHER,
];

/// Classify one code point.
pub fn classify(c: u32) -> u8 {
    if c < 0x80 {
        MAP0[c as usize]
    } else if c < 0xD800 {
        let c1 = c >> 4;
        let i = MAP1[((c1 & 31) + MAP1[(c1 >> 5) as usize]) as usize];
        MAP1[((c & 15) + i) as usize] as u8
    } else {
        classify_high(c)
    }
}

fn classify_high(c: u32) -> u8 {
    let (mut lo, mut hi) = (0usize, MAP2_LOW.len() - 1);
    loop {
        let m = (lo + hi) / 2;
        if MAP2_LOW[m] > c {
            if m == 0 {
                return EOF;
            }
            hi = m - 1;
        } else if MAP2_HIGH[m] < c {
            lo = m + 1;
        } else {
            return MAP2_CLASS[m];
        }
        if lo > hi {
            return EOF;
        }
    }
}

/// One classified position of a UTF-16 line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified {
    pub class: u8,
    /// Code units consumed (2 for a surrogate pair).
    pub width: usize,
    pub nonbmp: bool,
}

/// Classify the code point at `pos`. Positions at or past the end read as
/// code point 0 and still occupy one unit, so end of input drives the
/// automaton like any other character.
pub fn classify_at(input: &[u16], pos: usize) -> Classified {
    let c0 = input.get(pos).copied().unwrap_or(0) as u32;
    if (0xD800..0xDC00).contains(&c0) {
        if let Some(&c1) = input.get(pos + 1) {
            let c1 = c1 as u32;
            if (0xDC00..0xE000).contains(&c1) {
                let c = ((c0 & 0x3ff) << 10) + (c1 & 0x3ff) + 0x10000;
                return Classified {
                    class: classify(c),
                    width: 2,
                    nonbmp: true,
                };
            }
        }
    }
    Classified {
        class: classify(c0),
        width: 1,
        nonbmp: false,
    }
}

pub fn is_low_surrogate(unit: Option<&u16>) -> bool {
    matches!(unit, Some(&u) if (0xDC00..0xE000).contains(&u))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ascii_is_one_class_per_character() {
        assert_eq!(classify(0), EOF);
        assert_eq!(classify(0x07), EOF);
        assert_eq!(classify('\t' as u32), TAB);
        assert_eq!(classify(' ' as u32), PRINTABLE_BASE);
        assert_eq!(classify('~' as u32), 98);
        assert_eq!(classify(0x7f), CHAR_OTHER);
        assert_ne!(classify('a' as u32), classify('b' as u32));
    }

    #[test]
    fn bmp_names_follow_xml_productions() {
        assert_eq!(classify('é' as u32), NAME_START_OTHER);
        assert_eq!(classify(0xB7), NAME_OTHER);
        assert_eq!(classify(0x0301), NAME_OTHER);
        assert_eq!(classify(0xD7), CHAR_OTHER); // ×
        assert_eq!(classify('中' as u32), NAME_START_OTHER);
        assert_eq!(classify(0x2000), CHAR_OTHER);
    }

    #[test]
    fn high_ranges() {
        assert_eq!(classify(0xE000), CHAR_OTHER);
        assert_eq!(classify(0xFB01), NAME_START_OTHER);
        assert_eq!(classify(0xFFFE), EOF);
        assert_eq!(classify(0xFFFF), EOF);
        assert_eq!(classify(0x1F600), NAME_START_OTHER);
        assert_eq!(classify(0xF0000), CHAR_OTHER);
        assert_eq!(classify(0xDC00), EOF);
    }

    #[test]
    fn surrogate_pairs_are_combined() {
        let units: Vec<u16> = "a😀".encode_utf16().collect();
        let c = classify_at(&units, 1);
        assert_eq!(c.width, 2);
        assert!(c.nonbmp);
        assert_eq!(c.class, classify(0x1F600));

        let lone = [0xD800u16, 'x' as u16];
        let c = classify_at(&lone, 0);
        assert_eq!(c.width, 1);
        assert_eq!(c.class, EOF);
    }

    #[test]
    fn past_the_end_reads_as_eof() {
        let units: Vec<u16> = "ab".encode_utf16().collect();
        assert_eq!(classify_at(&units, 2).class, EOF);
        assert_eq!(classify_at(&units, 7).width, 1);
    }

    fn is_xml_char(c: u32) -> bool {
        matches!(c, 0x9 | 0xA | 0xD | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x10000..=0x10FFFF)
    }

    proptest! {
        #[test]
        fn classify_is_stable_and_in_range(c in 0u32..=0x10FFFF) {
            let class = classify(c);
            prop_assert_eq!(class, classify(c));
            prop_assert!((class as usize) < CLASS_COUNT);
            prop_assert_eq!(class == EOF, !is_xml_char(c));
            if c >= 0x80 {
                prop_assert!(matches!(
                    class,
                    EOF | NAME_START_OTHER | NAME_OTHER | CHAR_OTHER
                ));
            }
        }

        #[test]
        fn encoded_char_classifies_like_its_code_point(ch in any::<char>(), before in "[a-z]{0,3}") {
            let mut units: Vec<u16> = before.encode_utf16().collect();
            let pos = units.len();
            let mut buf = [0u16; 2];
            units.extend_from_slice(ch.encode_utf16(&mut buf));
            let c = classify_at(&units, pos);
            prop_assert_eq!(c.class, classify(ch as u32));
            prop_assert_eq!(c.width, ch.len_utf16());
            prop_assert_eq!(c.nonbmp, ch.len_utf16() == 2);
        }
    }
}
