//! Dump buffer: one capture unit of the ripper's double buffer.
//!
//! Accumulates opcode-tagged binary records for a single frame, starting
//! from the fixed 24-byte preamble. All multi-byte fields are little-endian.
//! An empty payload means "inactive": payload emptiness alone encodes the
//! slot state the coordinator inspects, so there is no separate state flag
//! to fall out of sync.
//!
//! ## Record encoding
//!
//! ```text
//! TRI /QUAD  per vertex: 3×i32 world position, 3×u32 color, 2×i16 texcoord
//! TPRM TPLT PATR DISP    one u32
//! VRAM       4×u32 texture map, 8×u32 palette map, banks A–G verbatim
//! TOON       32×u16
//! ```

use crate::gpu_state::GpuState;
use crate::opcode::Opcode;
use crate::{DUMP_MAGIC, DUMP_PREAMBLE_LEN};

/// Initial payload reservation. A typical frame runs to 1–2 MB once the
/// VRAM snapshot (608 KB) is attached.
const PAYLOAD_RESERVE: usize = 2 * 1024 * 1024;

/// One vertex as it left the geometry engine.
///
/// Positions are 20.12 fixed-point world coordinates, colors the
/// rasterizer's expanded per-channel values, texture coordinates 12.4
/// fixed-point texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Vertex {
    pub world_pos: [i32; 3],
    pub color: [u32; 3],
    pub tex_coord: [i16; 2],
}

/// Encoded size of one vertex record.
pub const VERTEX_BYTES: usize = 3 * 4 + 3 * 4 + 2 * 2;

/// One capture unit: accumulating record payload plus the output filename
/// resolved for it when the capture began.
#[derive(Debug, Default)]
pub struct DumpBuffer {
    payload: Vec<u8>,
    filename: String,
}

impl DumpBuffer {
    pub fn new() -> Self {
        DumpBuffer { payload: Vec::new(), filename: String::new() }
    }

    /// Start a capture: the payload becomes the zero-padded magic preamble
    /// and the filename is fixed for the lifetime of this dump.
    ///
    /// Must only be called on an inactive buffer; the coordinator guarantees
    /// this.
    pub fn begin(&mut self, filename: String) {
        debug_assert!(!self.is_active(), "begin on an active dump buffer");
        self.payload.reserve(PAYLOAD_RESERVE);
        self.payload.extend_from_slice(DUMP_MAGIC);
        self.payload.resize(DUMP_PREAMBLE_LEN, 0);
        self.filename = filename;
    }

    /// Active from `begin` until `reset`.
    pub fn is_active(&self) -> bool {
        !self.payload.is_empty()
    }

    /// Output filename resolved when the capture began.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Encoded bytes so far.
    pub fn bytes(&self) -> &[u8] {
        &self.payload
    }

    /// Take the payload, leaving the buffer inactive.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.payload)
    }

    /// Return to the inactive state. The filename is kept until the next
    /// `begin` overwrites it.
    pub fn reset(&mut self) {
        self.payload.clear();
    }

    fn op(&mut self, op: Opcode) {
        self.payload.extend_from_slice(&op.tag());
    }

    fn u16(&mut self, v: u16) {
        self.payload.extend_from_slice(&v.to_le_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.payload.extend_from_slice(&v.to_le_bytes());
    }

    // ─── Command records ────────────────────────────────────────────────────

    /// Append a `TRI `/`QUAD` record. `verts` must hold 3 or 4 vertices.
    pub fn polygon(&mut self, verts: &[Vertex]) {
        debug_assert!(verts.len() == 3 || verts.len() == 4);
        self.op(if verts.len() == 3 { Opcode::Tri } else { Opcode::Quad });
        for v in verts {
            for &p in &v.world_pos {
                self.u32(p as u32);
            }
            for &c in &v.color {
                self.u32(c);
            }
            for &t in &v.tex_coord {
                self.u16(t as u16);
            }
        }
    }

    pub fn tex_param(&mut self, param: u32) {
        self.op(Opcode::TexParam);
        self.u32(param);
    }

    pub fn tex_palette(&mut self, pal: u32) {
        self.op(Opcode::TexPalette);
        self.u32(pal);
    }

    pub fn polygon_attr(&mut self, attr: u32) {
        self.op(Opcode::PolygonAttr);
        self.u32(attr);
    }

    // ─── Finalization records ───────────────────────────────────────────────

    /// Append the `VRAM` record: texture/palette bank mappings, then the raw
    /// contents of banks A–G in that order.
    pub fn vram_snapshot(&mut self, gpu: &GpuState) {
        self.op(Opcode::Vram);
        for &m in &gpu.vram_map_texture {
            self.u32(m);
        }
        for &m in &gpu.vram_map_texpal {
            self.u32(m);
        }
        for bank in &gpu.vram {
            self.payload.extend_from_slice(bank);
        }
    }

    pub fn disp_cnt(&mut self, disp_cnt: u32) {
        self.op(Opcode::DispCnt);
        self.u32(disp_cnt);
    }

    pub fn toon_table(&mut self, table: &[u16; 32]) {
        self.op(Opcode::ToonTable);
        for &entry in table {
            self.u16(entry);
        }
    }
}
