//! Block types and their material properties

/// A single voxel's block type, stored as one byte.
///
/// The byte space is open for extension; bytes with no known discriminant
/// decode as [`Block::Reserved`].
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Block {
    #[default]
    Empty = 0x00,
    Stone = 0x01,
    Dirt = 0x02,
    Grass = 0x03,
    /// Sentinel for "unknown / outside the loaded world". Never placeable;
    /// excluded from mesh generation but opaque for culling and collision.
    Reserved = 0xFF,
}

impl Block {
    /// Decode a stored byte. Unknown bytes map to `Reserved` so that
    /// forward-incompatible data reads as opaque rather than as air.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => Block::Empty,
            0x01 => Block::Stone,
            0x02 => Block::Dirt,
            0x03 => Block::Grass,
            _ => Block::Reserved,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn is_empty(self) -> bool {
        self == Block::Empty
    }

    /// Whether this block occupies space for mesh face culling.
    /// `Reserved` counts as opaque: an unknown neighbor never opens a face.
    pub fn is_opaque(self) -> bool {
        self != Block::Empty
    }

    /// Whether this block emits mesh faces of its own.
    pub fn is_meshable(self) -> bool {
        !matches!(self, Block::Empty | Block::Reserved)
    }

    /// Whether entities collide with this block. Unknown space is solid.
    pub fn collides(self) -> bool {
        self != Block::Empty
    }

    /// Flat RGB color used by the mesh builder
    pub fn color(self) -> [f32; 3] {
        match self {
            Block::Stone => [0.78, 0.78, 0.78],
            Block::Dirt => [0.59, 0.29, 0.0],
            Block::Grass => [0.0, 0.5, 0.0],
            // Empty/Reserved never reach the mesher; loud fallback for
            // unknown future block types.
            _ => [1.0, 0.4, 0.7],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_round_trip() {
        for block in [Block::Empty, Block::Stone, Block::Dirt, Block::Grass, Block::Reserved] {
            assert_eq!(Block::from_byte(block.to_byte()), block);
        }
    }

    #[test]
    fn test_unknown_byte_reads_as_reserved() {
        assert_eq!(Block::from_byte(0x7C), Block::Reserved);
    }

    #[test]
    fn test_reserved_is_opaque_but_not_meshable() {
        assert!(Block::Reserved.is_opaque());
        assert!(Block::Reserved.collides());
        assert!(!Block::Reserved.is_meshable());
    }

    #[test]
    fn test_empty_is_transparent() {
        assert!(!Block::Empty.is_opaque());
        assert!(!Block::Empty.collides());
        assert!(!Block::Empty.is_meshable());
    }
}
