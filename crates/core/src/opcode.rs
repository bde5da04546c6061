//! Record opcodes of the dump format.
//!
//! Every record in a dump file begins with a fixed 4-byte ASCII tag. The
//! set is closed: keeping it in an enum lets the encoder and the reader
//! match on it exhaustively instead of scattering string literals.

/// Record type, identified on the wire by a 4-byte ASCII tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Triangle: 3 vertex records follow.
    Tri,
    /// Quad: 4 vertex records follow.
    Quad,
    /// Texture image parameter word.
    TexParam,
    /// Texture palette base word.
    TexPalette,
    /// Polygon attribute word.
    PolygonAttr,
    /// VRAM snapshot: bank mappings plus raw banks A–G.
    Vram,
    /// 3D display control word.
    DispCnt,
    /// Toon shading table (32 entries).
    ToonTable,
}

impl Opcode {
    /// The 4-byte wire tag for this record type.
    pub const fn tag(self) -> [u8; 4] {
        match self {
            Opcode::Tri => *b"TRI ",
            Opcode::Quad => *b"QUAD",
            Opcode::TexParam => *b"TPRM",
            Opcode::TexPalette => *b"TPLT",
            Opcode::PolygonAttr => *b"PATR",
            Opcode::Vram => *b"VRAM",
            Opcode::DispCnt => *b"DISP",
            Opcode::ToonTable => *b"TOON",
        }
    }

    /// Look up a record type from its wire tag. `None` for unknown tags.
    pub fn from_tag(tag: [u8; 4]) -> Option<Opcode> {
        match &tag {
            b"TRI " => Some(Opcode::Tri),
            b"QUAD" => Some(Opcode::Quad),
            b"TPRM" => Some(Opcode::TexParam),
            b"TPLT" => Some(Opcode::TexPalette),
            b"PATR" => Some(Opcode::PolygonAttr),
            b"VRAM" => Some(Opcode::Vram),
            b"DISP" => Some(Opcode::DispCnt),
            b"TOON" => Some(Opcode::ToonTable),
            _ => None,
        }
    }
}
