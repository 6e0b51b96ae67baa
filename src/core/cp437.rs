//! Code page 437 decoding
//!
//! BBS hosts write drop files in the IBM PC character set. The low half is
//! ASCII; the high half maps to accented letters, box drawing and symbols.

/// Characters for bytes `0x80..=0xFF`
const HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', //
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ', //
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»', //
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐', //
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧', //
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀', //
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩', //
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{a0}',
];

pub fn decode_char(byte: u8) -> char {
    match byte {
        0x00..=0x7f => char::from(byte),
        _ => HIGH[usize::from(byte - 0x80)],
    }
}

/// Decode CP437 bytes. Every byte maps to exactly one character.
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().copied().map(decode_char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passes_through() {
        assert_eq!(decode(b"SYSOP 1"), "SYSOP 1");
    }

    #[test]
    fn test_high_half() {
        assert_eq!(decode(b"P\x96rpl\x82"), "Pûrplé");
        assert_eq!(decode_char(0xdb), '█');
        assert_eq!(decode_char(0xb0), '░');
        assert_eq!(decode_char(0x80), 'Ç');
        assert_eq!(decode_char(0xff), '\u{a0}');
    }
}
