//! # melonrip-core
//!
//! Frame ripper for an emulated Nintendo DS 3D GPU (v0.3.0).
//!
//! Captures one frame (or a short run of consecutive frames) of the 3D
//! command stream (polygons, texture parameters, palettes, polygon
//! attributes) together with the VRAM and render state the hardware used
//! for that frame, and writes it as a self-contained binary `.dump` file
//! for offline inspection.
//!
//! The DS geometry and rendering engines are pipelined with exactly one
//! frame of latency: polygons flushed at the end of frame N are rasterized
//! while frame N+1 is being submitted, against the texture/VRAM state as it
//! exists at that later point. Capturing VRAM at flush time would snapshot
//! the wrong state, so the ripper double-buffers: commands record into a
//! `current` dump, a flush promotes it to `pending`, and the render signal
//! finalizes `pending` with the state actually used to draw it.
//!
//! ## Architecture
//!
//! - [`Ripper`] — Double-buffer coordinator driven by the host emulator's
//!   flush/render signals; owns the request lifecycle and both dump slots
//! - [`DumpBuffer`] — One capture unit: accumulating record payload plus the
//!   output filename resolved when the capture began
//! - [`RipRequest`] — How many frames were asked for, how many are done, and
//!   how files are named across a multi-frame request
//! - [`GpuState`] — VRAM banks and global render state, read at render time
//! - [`Opcode`] — The closed set of 4-byte record tags in the dump format
//! - [`reader`] — Offline dump parser used by the viewer and the tests
//! - [`png`] — PNG encoder for viewer screenshots
//!
//! The host emulator calls into the ripper synchronously from its own event
//! delivery; nothing here spawns threads or blocks beyond the final file
//! write.

pub mod dump;
pub mod gpu_state;
pub mod opcode;
pub mod png;
pub mod reader;
pub mod request;
pub mod ripper;
pub mod writer;

pub use dump::{DumpBuffer, Vertex};
pub use gpu_state::GpuState;
pub use opcode::Opcode;
pub use request::RipRequest;
pub use ripper::{FinishedRip, Ripper};

/// Fixed ASCII magic at the start of every dump file.
pub const DUMP_MAGIC: &[u8; 15] = b"melon ripper v2";
/// The magic is zero-padded to this many bytes before the first record.
pub const DUMP_PREAMBLE_LEN: usize = 24;

/// Number of VRAM banks captured in a `VRAM` record (banks A–G).
pub const VRAM_BANK_COUNT: usize = 7;
/// Native byte size of each captured bank, in A–G order.
pub const VRAM_BANK_SIZES: [usize; VRAM_BANK_COUNT] = [
    128 * 1024, // A
    128 * 1024, // B
    128 * 1024, // C
    128 * 1024, // D
    64 * 1024,  // E
    16 * 1024,  // F
    16 * 1024,  // G
];

/// 3D engine output width in pixels
pub const SCREEN_WIDTH: usize = 256;
/// 3D engine output height in pixels
pub const SCREEN_HEIGHT: usize = 192;

/// Filename stem used when the game title sanitizes to nothing.
pub const DEFAULT_STEM: &str = "melonrip";
