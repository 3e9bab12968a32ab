//! Dallas/Maxim CRC-8 (polynomial x^8 + x^5 + x^4 + 1, reflected `0x8C`)

/// Folds a single byte into `crc`, least significant bit first
pub fn crc8(crc: u8, byte: u8) -> u8 {
    let mut crc = crc;
    let mut byte = byte;
    for _ in 0..8 {
        let mix = (crc ^ byte) & 0x01;
        crc >>= 1;
        if mix != 0x00 {
            crc ^= 0x8C;
        }
        byte >>= 1;
    }
    crc
}

pub fn compute_partial_crc8(crc: u8, data: &[u8]) -> u8 {
    data.iter().fold(crc, |crc, byte| crc8(crc, *byte))
}

/// CRC-8 of `data` starting from a zero seed
pub fn checksum(data: &[u8]) -> u8 {
    compute_partial_crc8(0u8, data)
}

/// Checks a buffer whose last byte is the CRC-8 of the bytes before it
pub fn is_valid(sequence: &[u8]) -> bool {
    match sequence.split_last() {
        Some((crc, data)) => checksum(data) == *crc,
        None => false,
    }
}
