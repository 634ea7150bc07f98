//! Byte-addressed memory behind the CPU: a flat 64 KiB RAM and a mapper
//! that composes address regions over devices.

use miette::Result;

use crate::error;

/// Byte-addressed storage with big-endian 16-bit access. Word accesses
/// default to two byte accesses so region remapping applies per byte.
pub trait Memory {
    fn read_u8(&self, addr: u16) -> Result<u8>;
    fn write_u8(&mut self, addr: u16, value: u8) -> Result<()>;

    fn read_u16(&self, addr: u16) -> Result<u16> {
        let hi = self.read_u8(addr)?;
        let lo = self.read_u8(addr.wrapping_add(1))?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    fn write_u16(&mut self, addr: u16, value: u16) -> Result<()> {
        let [hi, lo] = value.to_be_bytes();
        self.write_u8(addr, hi)?;
        self.write_u8(addr.wrapping_add(1), lo)
    }
}

/// Flat 64 KiB of RAM. Every address is valid, so accesses never fail.
pub struct Ram {
    bytes: Box<[u8; 0x10000]>,
}

impl Ram {
    pub fn new() -> Self {
        Ram {
            bytes: Box::new([0; 0x10000]),
        }
    }

    /// Copy a program image in starting at `offset`, wrapping at the top of
    /// memory.
    pub fn load(&mut self, offset: u16, image: &[u8]) {
        let mut addr = offset;
        for byte in image {
            self.bytes[addr as usize] = *byte;
            addr = addr.wrapping_add(1);
        }
    }
}

impl Default for Ram {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory for Ram {
    fn read_u8(&self, addr: u16) -> Result<u8> {
        Ok(self.bytes[addr as usize])
    }

    fn write_u8(&mut self, addr: u16, value: u8) -> Result<()> {
        self.bytes[addr as usize] = value;
        Ok(())
    }
}

struct Region {
    device: Box<dyn Memory>,
    start: u16,
    end: u16,
    remap: bool,
}

impl Region {
    fn contains(&self, addr: u16) -> bool {
        addr >= self.start && addr <= self.end
    }

    /// Device-local address: offset from the region start when remapping,
    /// the bus address otherwise.
    fn local(&self, addr: u16) -> u16 {
        if self.remap {
            addr - self.start
        } else {
            addr
        }
    }
}

/// Routes accesses to mapped devices. The most recently mapped region wins
/// on overlap; accesses outside every region are fatal.
#[derive(Default)]
pub struct MemoryMapper {
    regions: Vec<Region>,
}

impl MemoryMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `device` over the inclusive address range `start..=end`. With
    /// `remap`, the device sees addresses relative to `start`.
    pub fn map(&mut self, device: Box<dyn Memory>, start: u16, end: u16, remap: bool) {
        self.regions.insert(
            0,
            Region {
                device,
                start,
                end,
                remap,
            },
        );
    }

    fn region(&self, addr: u16) -> Option<&Region> {
        self.regions.iter().find(|r| r.contains(addr))
    }

    fn region_mut(&mut self, addr: u16) -> Option<&mut Region> {
        self.regions.iter_mut().find(|r| r.contains(addr))
    }
}

impl Memory for MemoryMapper {
    fn read_u8(&self, addr: u16) -> Result<u8> {
        match self.region(addr) {
            Some(region) => region.device.read_u8(region.local(addr)),
            None => Err(error::run_unmapped_read(addr)),
        }
    }

    fn write_u8(&mut self, addr: u16, value: u8) -> Result<()> {
        match self.region_mut(addr) {
            Some(region) => {
                let local = region.local(addr);
                region.device.write_u8(local, value)
            }
            None => Err(error::run_unmapped_write(addr)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ram_round_trips_words_big_endian() {
        let mut ram = Ram::new();
        ram.write_u16(0x100, 0xABCD).unwrap();
        assert_eq!(ram.read_u8(0x100).unwrap(), 0xAB);
        assert_eq!(ram.read_u8(0x101).unwrap(), 0xCD);
        assert_eq!(ram.read_u16(0x100).unwrap(), 0xABCD);
    }

    #[test]
    fn ram_load_places_the_image() {
        let mut ram = Ram::new();
        ram.load(0x10, &[1, 2, 3]);
        assert_eq!(ram.read_u8(0x10).unwrap(), 1);
        assert_eq!(ram.read_u8(0x12).unwrap(), 3);
    }

    #[test]
    fn mapper_remaps_into_device_local_offsets() {
        let mut mapper = MemoryMapper::new();
        mapper.map(Box::new(Ram::new()), 0x3000, 0x3FFF, true);

        mapper.write_u16(0x3004, 0xBEEF).unwrap();
        assert_eq!(mapper.read_u16(0x3004).unwrap(), 0xBEEF);

        // The device saw the access at its own offset 4.
        let region = mapper.region(0x3004).unwrap();
        assert_eq!(region.device.read_u16(4).unwrap(), 0xBEEF);
    }

    #[test]
    fn most_recent_mapping_wins() {
        let mut mapper = MemoryMapper::new();
        let mut base = Ram::new();
        base.write_u8(0x20, 0x11).unwrap();
        mapper.map(Box::new(base), 0x0000, 0xFFFF, false);

        let mut overlay = Ram::new();
        overlay.write_u8(0, 0x22).unwrap();
        mapper.map(Box::new(overlay), 0x20, 0x2F, true);

        assert_eq!(mapper.read_u8(0x20).unwrap(), 0x22);
        assert_eq!(mapper.read_u8(0x30).unwrap(), 0x00);
    }

    #[test]
    fn unmapped_addresses_error() {
        let mut mapper = MemoryMapper::new();
        mapper.map(Box::new(Ram::new()), 0x0000, 0x0FFF, false);
        assert!(mapper.read_u8(0x2000).is_err());
        assert!(mapper.write_u8(0x2000, 1).is_err());
    }
}
