//! Program image format: header plus text and data segments.

use serde::{Deserialize, Serialize};

use crate::error::KasmError;
use crate::{DATA_BASE, MAGIC, TEXT_BASE, VERSION};

/// Size of the serialized program header in bytes.
pub const HEADER_SIZE: usize = 24;

/// Fixed-size header at the front of every program image.
///
/// All fields are little-endian. Segment begin addresses record where each
/// segment is based in the address space, not file offsets; the text bytes
/// follow the header immediately and the data bytes follow the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramHeader {
    pub magic: u32,
    pub version: u32,
    pub text_begin: u32,
    pub text_length: u32,
    pub data_begin: u32,
    pub data_length: u32,
}

impl ProgramHeader {
    /// Header for a freshly assembled image with the given segment sizes.
    pub fn new(text_length: u32, data_length: u32) -> ProgramHeader {
        ProgramHeader {
            magic: MAGIC,
            version: VERSION,
            text_begin: TEXT_BASE,
            text_length,
            data_begin: DATA_BASE,
            data_length,
        }
    }

    /// Serialize to the 24-byte little-endian wire form.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.text_begin.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.text_length.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.data_begin.to_le_bytes());
        bytes[20..24].copy_from_slice(&self.data_length.to_le_bytes());
        bytes
    }

    /// Deserialize from the wire form.
    pub fn from_bytes(bytes: &[u8]) -> Result<ProgramHeader, KasmError> {
        if bytes.len() < HEADER_SIZE {
            return Err(KasmError::TruncatedImage {
                expected: HEADER_SIZE,
                actual: bytes.len(),
            });
        }
        let word = |range: std::ops::Range<usize>| -> u32 {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(&bytes[range]);
            u32::from_le_bytes(buf)
        };
        Ok(ProgramHeader {
            magic: word(0..4),
            version: word(4..8),
            text_begin: word(8..12),
            text_length: word(12..16),
            data_begin: word(16..20),
            data_length: word(20..24),
        })
    }

    /// Check magic and version.
    pub fn validate(&self) -> Result<(), KasmError> {
        if self.magic != MAGIC {
            return Err(KasmError::BadMagic(self.magic));
        }
        if self.version != VERSION {
            return Err(KasmError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// A loaded (or freshly assembled) program image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub header: ProgramHeader,
    pub text: Vec<u8>,
    pub data: Vec<u8>,
}

impl Program {
    /// Build an image from raw segment bytes, synthesizing the header.
    pub fn new(text: Vec<u8>, data: Vec<u8>) -> Program {
        Program {
            header: ProgramHeader::new(text.len() as u32, data.len() as u32),
            text,
            data,
        }
    }

    /// Serialize the whole image: header, text bytes, data bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + self.text.len() + self.data.len());
        bytes.extend_from_slice(&self.header.to_bytes());
        bytes.extend_from_slice(&self.text);
        bytes.extend_from_slice(&self.data);
        bytes
    }

    /// Parse and validate a serialized image.
    pub fn from_bytes(bytes: &[u8]) -> Result<Program, KasmError> {
        let header = ProgramHeader::from_bytes(bytes)?;
        header.validate()?;

        let text_len = header.text_length as usize;
        let data_len = header.data_length as usize;
        let expected = HEADER_SIZE + text_len + data_len;
        if bytes.len() < expected {
            return Err(KasmError::TruncatedImage {
                expected,
                actual: bytes.len(),
            });
        }

        let text = bytes[HEADER_SIZE..HEADER_SIZE + text_len].to_vec();
        let data = bytes[HEADER_SIZE + text_len..expected].to_vec();
        Ok(Program { header, text, data })
    }

    /// Number of instruction words in the text segment.
    pub fn instruction_count(&self) -> usize {
        self.text.len() / crate::INSTRUCTION_SIZE as usize
    }

    /// Read the instruction word at the given text-segment index.
    pub fn text_word(&self, index: usize) -> Option<u32> {
        let start = index.checked_mul(crate::INSTRUCTION_SIZE as usize)?;
        let bytes = self.text.get(start..start + 4)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(bytes);
        Some(u32::from_le_bytes(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let header = ProgramHeader::new(16, 8);
        let parsed = ProgramHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(parsed, header);
        parsed.validate().unwrap();
    }

    #[test]
    fn program_round_trip() {
        let program = Program::new(vec![1, 2, 3, 4, 5, 6, 7, 8], vec![9, 10]);
        let parsed = Program::from_bytes(&program.to_bytes()).unwrap();
        assert_eq!(parsed, program);
        assert_eq!(parsed.instruction_count(), 2);
        assert_eq!(parsed.text_word(0), Some(u32::from_le_bytes([1, 2, 3, 4])));
        assert_eq!(parsed.text_word(2), None);
    }

    #[test]
    fn bad_magic_rejected() {
        let mut bytes = Program::new(vec![], vec![]).to_bytes();
        bytes[0] ^= 0xFF;
        assert!(matches!(
            Program::from_bytes(&bytes),
            Err(KasmError::BadMagic(_))
        ));
    }

    #[test]
    fn truncated_image_rejected() {
        let bytes = Program::new(vec![0; 8], vec![]).to_bytes();
        assert!(matches!(
            Program::from_bytes(&bytes[..bytes.len() - 2]),
            Err(KasmError::TruncatedImage { .. })
        ));
    }

    #[test]
    fn truncated_header_rejected() {
        assert!(matches!(
            ProgramHeader::from_bytes(&[0u8; 10]),
            Err(KasmError::TruncatedImage { .. })
        ));
    }
}
