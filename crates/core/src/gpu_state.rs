//! Render-time GPU state attached to a dump when it is finalized.
//!
//! The host emulator owns one `GpuState` and passes it by reference into
//! [`Ripper::notify_render`](crate::Ripper::notify_render); the ripper only
//! reads it, at that exact call, because VRAM may have changed since the
//! corresponding flush. Banks H and I are 2D-engine palette banks the 3D
//! renderer never samples, so only A–G are modeled.

use crate::{VRAM_BANK_COUNT, VRAM_BANK_SIZES};

/// VRAM banks plus the global 3D registers a rip snapshots.
pub struct GpuState {
    /// Texture image slot mapping: which banks back texture slots 0–3.
    pub vram_map_texture: [u32; 4],
    /// Texture palette slot mapping: which banks back palette slots 0–7.
    pub vram_map_texpal: [u32; 8],
    /// Raw bank contents, A–G order, each at its native size.
    pub vram: [Vec<u8>; VRAM_BANK_COUNT],
    /// 3D display control word as latched for the rendered frame.
    pub disp_cnt: u32,
    /// Toon shading table (32 RGB555 entries).
    pub toon_table: [u16; 32],
}

impl GpuState {
    /// All banks allocated at their native sizes, zero-filled.
    pub fn new() -> Self {
        GpuState {
            vram_map_texture: [0; 4],
            vram_map_texpal: [0; 8],
            vram: VRAM_BANK_SIZES.map(|size| vec![0; size]),
            disp_cnt: 0,
            toon_table: [0; 32],
        }
    }

    /// Byte size of a `VRAM` record minus its tag: both mapping tables plus
    /// every bank.
    pub fn snapshot_len() -> usize {
        4 * 4 + 8 * 4 + VRAM_BANK_SIZES.iter().sum::<usize>()
    }
}

impl Default for GpuState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_sizes() {
        let gpu = GpuState::new();
        let sizes: Vec<usize> = gpu.vram.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, VRAM_BANK_SIZES);
        // A–D 128K, E 64K, F–G 16K
        assert_eq!(GpuState::snapshot_len(), 48 + 608 * 1024);
    }
}
