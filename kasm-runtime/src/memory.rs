//! Program memory model: one address space over disjoint regions.
//!
//! Every access dispatches through a single region table ordered by
//! descending base address, rather than per-region special cases. Text and
//! data are seeded from the loaded image; stack, global, and heap regions
//! materialize zeroed at load time and are never serialized.
//!
//! All accesses are bounds-checked and word accesses must be 4-aligned;
//! either violation is a fatal runtime error.

use kasm_spec::{
    Program, DATA_BASE, GLOBAL_BASE, GLOBAL_SIZE, HEAP_BASE, HEAP_SIZE, STACK_BASE, STACK_SIZE,
    TEXT_BASE,
};

use crate::error::{Result, RuntimeError};

#[derive(Debug, Clone)]
struct Region {
    name: &'static str,
    base: u32,
    data: Vec<u8>,
}

/// Addressable storage for one VM instance.
#[derive(Debug, Clone)]
pub struct Memory {
    /// Regions sorted by descending base address.
    regions: Vec<Region>,
}

impl Memory {
    /// Build the address space for a loaded program.
    pub fn new(program: &Program) -> Memory {
        let regions = vec![
            Region {
                name: "global",
                base: GLOBAL_BASE,
                data: vec![0; GLOBAL_SIZE as usize],
            },
            Region {
                name: "stack",
                base: STACK_BASE,
                data: vec![0; STACK_SIZE as usize],
            },
            Region {
                name: "heap",
                base: HEAP_BASE,
                data: vec![0; HEAP_SIZE as usize],
            },
            Region {
                name: "data",
                base: DATA_BASE,
                data: program.data.clone(),
            },
            Region {
                name: "text",
                base: TEXT_BASE,
                data: program.text.clone(),
            },
        ];
        Memory { regions }
    }

    /// Reinitialize the runtime-only regions (stack, global, heap) to zero
    /// and restore text and data from the image.
    pub fn reset(&mut self, program: &Program) {
        *self = Memory::new(program);
    }

    /// Length of the text segment in bytes.
    pub fn text_length(&self) -> u32 {
        self.regions
            .iter()
            .find(|r| r.name == "text")
            .map(|r| r.data.len() as u32)
            .unwrap_or(0)
    }

    fn region(&self, address: u32) -> Result<(&Region, usize)> {
        for region in &self.regions {
            if address >= region.base {
                let offset = (address - region.base) as usize;
                if offset < region.data.len() {
                    return Ok((region, offset));
                }
                return Err(RuntimeError::OutOfBounds { address });
            }
        }
        Err(RuntimeError::OutOfBounds { address })
    }

    fn region_mut(&mut self, address: u32) -> Result<(&mut Region, usize)> {
        for region in &mut self.regions {
            if address >= region.base {
                let offset = (address - region.base) as usize;
                if offset < region.data.len() {
                    return Ok((region, offset));
                }
                return Err(RuntimeError::OutOfBounds { address });
            }
        }
        Err(RuntimeError::OutOfBounds { address })
    }

    pub fn read_byte(&self, address: u32) -> Result<u8> {
        let (region, offset) = self.region(address)?;
        Ok(region.data[offset])
    }

    pub fn write_byte(&mut self, address: u32, value: u8) -> Result<()> {
        let (region, offset) = self.region_mut(address)?;
        region.data[offset] = value;
        Ok(())
    }

    /// Read a little-endian word. The address must be 4-aligned and the
    /// whole word must lie within one region.
    pub fn read_word(&self, address: u32) -> Result<u32> {
        self.check_alignment(address)?;
        let (region, offset) = self.region(address)?;
        let bytes = region
            .data
            .get(offset..offset + 4)
            .ok_or(RuntimeError::OutOfBounds { address })?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(buf))
    }

    /// Write a little-endian word, with the same constraints as
    /// [`Memory::read_word`].
    pub fn write_word(&mut self, address: u32, value: u32) -> Result<()> {
        self.check_alignment(address)?;
        let (region, offset) = self.region_mut(address)?;
        let bytes = region
            .data
            .get_mut(offset..offset + 4)
            .ok_or(RuntimeError::OutOfBounds { address })?;
        bytes.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Read bytes up to (excluding) the first null terminator.
    pub fn read_cstring(&self, address: u32) -> Result<Vec<u8>> {
        let (region, mut offset) = self.region(address)?;
        let mut bytes = Vec::new();
        loop {
            let byte = *region
                .data
                .get(offset)
                .ok_or(RuntimeError::OutOfBounds { address })?;
            if byte == 0 {
                return Ok(bytes);
            }
            bytes.push(byte);
            offset += 1;
        }
    }

    /// Write a byte slice starting at the given address.
    pub fn write_bytes(&mut self, address: u32, bytes: &[u8]) -> Result<()> {
        let (region, offset) = self.region_mut(address)?;
        let slot = region
            .data
            .get_mut(offset..offset + bytes.len())
            .ok_or(RuntimeError::OutOfBounds { address })?;
        slot.copy_from_slice(bytes);
        Ok(())
    }

    fn check_alignment(&self, address: u32) -> Result<()> {
        if address % 4 != 0 {
            return Err(RuntimeError::MisalignedAccess { address });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Memory {
        let program = Program::new(vec![0xAA; 8], vec![1, 2, 3, 4]);
        Memory::new(&program)
    }

    #[test]
    fn dispatches_to_each_region() {
        let mut mem = memory();

        // Text, loaded from the image.
        assert_eq!(mem.read_byte(TEXT_BASE).unwrap(), 0xAA);
        // Data, loaded from the image.
        assert_eq!(
            mem.read_word(DATA_BASE).unwrap(),
            u32::from_le_bytes([1, 2, 3, 4])
        );
        // Stack and global, zeroed.
        assert_eq!(mem.read_word(STACK_BASE).unwrap(), 0);
        assert_eq!(mem.read_word(GLOBAL_BASE).unwrap(), 0);

        mem.write_word(GLOBAL_BASE, 42).unwrap();
        assert_eq!(mem.read_word(GLOBAL_BASE).unwrap(), 42);
    }

    #[test]
    fn out_of_bounds_rejected() {
        let mem = memory();

        // Past the end of data.
        assert!(matches!(
            mem.read_byte(DATA_BASE + 4),
            Err(RuntimeError::OutOfBounds { .. })
        ));
        // Between text and data.
        assert!(matches!(
            mem.read_byte(0x0800_0000),
            Err(RuntimeError::OutOfBounds { .. })
        ));
        // Past the end of the global region.
        assert!(matches!(
            mem.read_byte(GLOBAL_BASE + GLOBAL_SIZE),
            Err(RuntimeError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn word_straddling_region_end_rejected() {
        let mem = memory();
        // Data region holds 4 bytes; a word at +2 is misaligned, and a
        // word at the aligned end is out of bounds.
        assert!(matches!(
            mem.read_word(DATA_BASE + 2),
            Err(RuntimeError::MisalignedAccess { .. })
        ));
        assert!(matches!(
            mem.read_word(DATA_BASE + 4),
            Err(RuntimeError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn cstring_reads_until_null() {
        let program = Program::new(vec![], b"hi\0after".to_vec());
        let mem = Memory::new(&program);
        assert_eq!(mem.read_cstring(DATA_BASE).unwrap(), b"hi");
    }

    #[test]
    fn cstring_without_terminator_rejected() {
        let program = Program::new(vec![], b"hi".to_vec());
        let mem = Memory::new(&program);
        assert!(mem.read_cstring(DATA_BASE).is_err());
    }
}
