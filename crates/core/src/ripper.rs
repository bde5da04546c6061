//! Double-buffer capture coordinator.
//!
//! Polygons submitted during frame N are not drawn until frame N+1, so the
//! VRAM/state snapshot belonging to frame N's geometry is the one in effect
//! at the *next* render signal, not at the flush that closed the batch. The
//! ripper therefore keeps two dump slots:
//!
//! - `current` records commands between two flush signals
//! - `pending` holds a flushed frame until the render signal arrives, at
//!   which point the VRAM/state records are appended and the dump is written
//!
//! Flow for a one-frame rip:
//!
//! - Host requests a rip.
//! - At the next flush, a dump begins recording into `current`.
//! - At the following flush, `current` moves to `pending`.
//! - At the next render, VRAM, display control, and toon table are attached
//!   to `pending` and the finished dump is written out.
//!
//! All entry points are called synchronously from the host emulator's event
//! delivery; a single render per flush in strict alternation is the expected
//! cadence. If a render signal never arrives, `pending` stays full and new
//! frame starts stall; the guards below refuse work instead of blocking.

use std::path::PathBuf;

use crate::dump::{DumpBuffer, Vertex};
use crate::gpu_state::GpuState;
use crate::request::RipRequest;
use crate::writer;

/// A finalized rip retained in memory instead of written to disk.
pub struct FinishedRip {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Frame ripper state machine. One per emulated GPU; created at emulator
/// startup and reset with it.
pub struct Ripper {
    current: DumpBuffer,
    pending: DumpBuffer,
    request: RipRequest,
    /// Title used to derive dump filenames (cart header field, may be empty).
    game_title: String,
    /// Directory finished dumps are written into.
    out_dir: PathBuf,
    /// True while the flush period in progress is being captured.
    pub is_dumping: bool,
    /// When set, finished rips are queued for `take_finished` instead of
    /// written to disk.
    rip_to_memory: bool,
    finished: Vec<FinishedRip>,
}

impl Ripper {
    pub fn new() -> Self {
        Ripper {
            current: DumpBuffer::new(),
            pending: DumpBuffer::new(),
            request: RipRequest::new(),
            game_title: String::new(),
            out_dir: PathBuf::from("."),
            is_dumping: false,
            rip_to_memory: false,
            finished: Vec::new(),
        }
    }

    /// Set the title used for dump filenames, typically the cart header
    /// title. Takes effect on the next accepted request.
    pub fn set_game_title(&mut self, title: &str) {
        self.game_title = title.to_string();
    }

    /// Set the directory finished dumps are written into.
    pub fn set_output_dir(&mut self, dir: impl Into<PathBuf>) {
        self.out_dir = dir.into();
    }

    /// Keep finished rips in memory for [`take_finished`](Self::take_finished)
    /// instead of writing them to disk.
    pub fn set_rip_to_memory(&mut self, enabled: bool) {
        self.rip_to_memory = enabled;
    }

    /// Request a rip of the next `frames` frames. Ignored while a previous
    /// request is still in progress, and for `frames == 0`.
    pub fn request_rip(&mut self, frames: u32) {
        if frames == 0 {
            return;
        }
        self.request.start(frames, &self.game_title);
    }

    /// Frames finalized so far by the active (or last completed) request.
    pub fn frames_done(&self) -> u32 {
        self.request.frames_done()
    }

    /// True once every requested frame has been finalized.
    pub fn is_done(&self) -> bool {
        self.request.is_done()
    }

    /// Drain rips finished in memory mode.
    pub fn take_finished(&mut self) -> Vec<FinishedRip> {
        std::mem::take(&mut self.finished)
    }

    // ─── Command stream ─────────────────────────────────────────────────────

    /// A polygon left the geometry pipeline (3 or 4 vertices). Dropped when
    /// no capture is recording.
    pub fn polygon(&mut self, verts: &[Vertex]) {
        if self.current.is_active() {
            self.current.polygon(verts);
        }
    }

    /// Texture image parameter word.
    pub fn tex_param(&mut self, param: u32) {
        if self.current.is_active() {
            self.current.tex_param(param);
        }
    }

    /// Texture palette base word.
    pub fn tex_palette(&mut self, pal: u32) {
        if self.current.is_active() {
            self.current.tex_palette(pal);
        }
    }

    /// Polygon attribute word.
    pub fn polygon_attr(&mut self, attr: u32) {
        if self.current.is_active() {
            self.current.polygon_attr(attr);
        }
    }

    // ─── Pipeline signals ───────────────────────────────────────────────────

    /// Submission batch closed: promote `current` to `pending` and begin the
    /// next frame's dump if the request still wants one.
    pub fn notify_flush(&mut self) {
        // The flag tracks only whether *this* flush period is captured.
        self.is_dumping = false;

        if self.request.is_done() {
            return;
        }

        // Promote current → pending. Pending should have been drained by a
        // render signal before the next flush; if it wasn't, skip the
        // promotion and let back-pressure stall the request.
        if self.current.is_active() && !self.pending.is_active() {
            std::mem::swap(&mut self.current, &mut self.pending);
        }
        if self.current.is_active() {
            // Promotion was skipped; don't begin a new dump on top of one
            // still recording.
            return;
        }

        if self.request.next_frame_index() >= self.request.frames_requested() {
            // The request's last frame is already pending/draining.
            return;
        }

        let filename = self.request.frame_filename(self.request.next_frame_index());
        self.current.begin(filename);
        self.request.record_frame_started();
        self.is_dumping = true;
    }

    /// A flushed batch has been rendered: finalize the pending dump with the
    /// VRAM/state snapshot in effect right now, and persist it. No-op when
    /// nothing is pending.
    pub fn notify_render(&mut self, gpu: &GpuState) {
        if !self.pending.is_active() {
            return;
        }

        self.pending.vram_snapshot(gpu);
        self.pending.disp_cnt(gpu.disp_cnt);
        self.pending.toon_table(&gpu.toon_table);

        let filename = self.pending.filename().to_string();
        let data = self.pending.take();
        if self.rip_to_memory {
            self.finished.push(FinishedRip { filename, data });
        } else {
            // Failure is reported by the writer, never propagated back here;
            // the frame still counts as done.
            writer::write_dump(&self.out_dir.join(&filename), &data);
        }
        self.request.record_frame_done();
    }

    /// Emulator reset: drop both slots and abandon any in-flight request.
    /// The game title and output directory persist.
    pub fn reset(&mut self) {
        self.current.reset();
        self.pending.reset();
        self.request = RipRequest::new();
        self.is_dumping = false;
        self.finished.clear();
    }
}

impl Default for Ripper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::VERTEX_BYTES;
    use crate::reader::{parse_dump, Record};
    use crate::DUMP_PREAMBLE_LEN;

    fn memory_ripper(title: &str) -> Ripper {
        let mut r = Ripper::new();
        r.set_game_title(title);
        r.set_rip_to_memory(true);
        r
    }

    fn quad() -> [Vertex; 4] {
        [
            Vertex { world_pos: [0, 0, 0], color: [63, 0, 0], tex_coord: [0, 0] },
            Vertex { world_pos: [4096, 0, 0], color: [0, 63, 0], tex_coord: [16, 0] },
            Vertex { world_pos: [4096, 4096, 0], color: [0, 0, 63], tex_coord: [16, 16] },
            Vertex { world_pos: [0, 4096, 0], color: [63, 63, 63], tex_coord: [0, 16] },
        ]
    }

    #[test]
    fn test_single_frame_end_to_end() {
        let mut r = memory_ripper("TEST GAME");
        let mut gpu = GpuState::new();
        gpu.disp_cnt = 0x1234_5678;
        gpu.toon_table[0] = 0x7FFF;
        gpu.vram[0][0] = 0xAB;

        r.request_rip(1);
        assert!(!r.is_done());

        r.notify_flush(); // begins frame 0
        assert!(r.is_dumping);
        r.polygon(&quad());
        r.tex_param(7);

        r.notify_flush(); // promotes; request satisfied, no new dump
        assert!(!r.is_dumping);

        r.notify_render(&gpu);
        assert_eq!(r.frames_done(), 1);
        assert!(r.is_done());

        let rips = r.take_finished();
        assert_eq!(rips.len(), 1);
        assert!(rips[0].filename.starts_with("testgame-"));
        assert!(rips[0].filename.ends_with(".dump"));
        assert!(!rips[0].filename.contains("_f"));

        // Records decode back in emission order, snapshot records last.
        let records = parse_dump(&rips[0].data).unwrap();
        assert_eq!(records.len(), 5);
        match &records[0] {
            Record::Quad(verts) => {
                assert_eq!(verts[1].world_pos, [4096, 0, 0]);
                assert_eq!(verts[2].color, [0, 0, 63]);
                assert_eq!(verts[3].tex_coord, [0, 16]);
            }
            other => panic!("expected quad, got {:?}", other.opcode()),
        }
        assert!(matches!(records[1], Record::TexParam(7)));
        match &records[2] {
            Record::Vram(snap) => assert_eq!(snap.banks[0][0], 0xAB),
            other => panic!("expected vram, got {:?}", other.opcode()),
        }
        assert!(matches!(records[3], Record::DispCnt(0x1234_5678)));
        match &records[4] {
            Record::ToonTable(t) => assert_eq!(t[0], 0x7FFF),
            other => panic!("expected toon, got {:?}", other.opcode()),
        }
    }

    #[test]
    fn test_two_frames_separate_files_and_windows() {
        let mut r = memory_ripper("ab");
        let gpu = GpuState::new();

        r.request_rip(2);

        r.notify_flush(); // begin f0
        r.tex_param(0xF0);

        r.notify_flush(); // promote f0, begin f1
        assert!(r.is_dumping);
        r.tex_param(0xF1);

        r.notify_render(&gpu); // finalize f0
        r.notify_flush(); // promote f1; next_frame_index == 2, no new dump
        assert!(!r.is_dumping);
        r.notify_render(&gpu); // finalize f1

        assert!(r.is_done());
        let rips = r.take_finished();
        assert_eq!(rips.len(), 2);
        assert!(rips[0].filename.ends_with("_f0.dump"));
        assert!(rips[1].filename.ends_with("_f1.dump"));

        // Each dump contains only its own submission window's commands.
        for (rip, word) in rips.iter().zip([0xF0u32, 0xF1]) {
            let records = parse_dump(&rip.data).unwrap();
            let params: Vec<u32> = records
                .iter()
                .filter_map(|r| match r {
                    Record::TexParam(v) => Some(*v),
                    _ => None,
                })
                .collect();
            assert_eq!(params, vec![word]);
        }
    }

    #[test]
    fn test_render_without_pending_is_noop() {
        let mut r = memory_ripper("x");
        let gpu = GpuState::new();
        r.notify_render(&gpu);
        assert!(r.take_finished().is_empty());
        assert_eq!(r.frames_done(), 0);

        // Promotion at flush is the only path into pending, so a render
        // arriving before any flush must change nothing either.
        r.request_rip(1);
        r.notify_render(&gpu);
        assert_eq!(r.frames_done(), 0);
    }

    #[test]
    fn test_flush_when_done_is_noop() {
        let mut r = memory_ripper("x");
        let gpu = GpuState::new();
        r.request_rip(1);
        r.notify_flush();
        r.notify_flush();
        r.notify_render(&gpu);
        assert!(r.is_done());

        r.notify_flush();
        assert!(!r.is_dumping);
        r.tex_param(1); // dropped: nothing recording
        r.notify_render(&gpu);
        assert_eq!(r.take_finished().len(), 1);
    }

    #[test]
    fn test_request_rejected_while_in_progress() {
        let mut r = memory_ripper("x");
        r.request_rip(2);
        r.notify_flush();
        r.request_rip(5); // must not disturb the active request
        let gpu = GpuState::new();
        r.notify_flush();
        r.notify_render(&gpu);
        r.notify_flush();
        r.notify_render(&gpu);
        assert!(r.is_done());
        assert_eq!(r.take_finished().len(), 2);
    }

    #[test]
    fn test_zero_frame_request_ignored() {
        let mut r = memory_ripper("x");
        r.request_rip(0);
        r.notify_flush();
        assert!(!r.is_dumping);
        assert!(r.is_done());
    }

    #[test]
    fn test_missed_render_backpressure() {
        let mut r = memory_ripper("x");
        let gpu = GpuState::new();
        r.request_rip(2);

        r.notify_flush(); // begin f0
        r.notify_flush(); // promote f0, begin f1
        r.tex_param(0xF1);

        // Render never arrived: pending still holds f0, so this flush must
        // neither promote f1 nor begin a new dump on top of it.
        r.notify_flush();
        assert!(!r.is_dumping);
        r.tex_param(0xF2); // f1 is still current and recording

        r.notify_render(&gpu); // drains f0
        r.notify_flush(); // now f1 promotes; request exhausted
        r.notify_render(&gpu); // drains f1

        assert!(r.is_done());
        let rips = r.take_finished();
        assert_eq!(rips.len(), 2);

        // f1 kept both words it recorded across the stalled flush.
        let records = parse_dump(&rips[1].data).unwrap();
        let params: Vec<u32> = records
            .iter()
            .filter_map(|r| match r {
                Record::TexParam(v) => Some(*v),
                _ => None,
            })
            .collect();
        assert_eq!(params, vec![0xF1, 0xF2]);
    }

    #[test]
    fn test_commands_dropped_when_idle() {
        let mut r = memory_ripper("x");
        r.polygon(&quad());
        r.tex_param(1);
        r.tex_palette(2);
        r.polygon_attr(3);
        r.request_rip(1);
        r.notify_flush();
        // Only payload from here on counts.
        r.polygon_attr(9);
        r.notify_flush();
        r.notify_render(&GpuState::new());
        let rips = r.take_finished();
        let records = parse_dump(&rips[0].data).unwrap();
        // PATR + VRAM + DISP + TOON
        assert_eq!(records.len(), 4);
        assert!(matches!(records[0], Record::PolygonAttr(9)));
    }

    #[test]
    fn test_reset_abandons_in_flight_request() {
        let mut r = memory_ripper("x");
        r.request_rip(3);
        r.notify_flush();
        r.polygon(&quad());
        r.reset();
        assert!(!r.is_dumping);
        assert!(r.is_done());
        // The pipeline keeps running; nothing is recorded any more.
        r.notify_flush();
        r.notify_render(&GpuState::new());
        assert!(r.take_finished().is_empty());
        // And a fresh request is accepted after reset.
        r.request_rip(1);
        assert!(!r.is_done());
    }

    #[test]
    fn test_disk_output() {
        let dir = std::env::temp_dir().join(format!("melonrip-ripper-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut r = Ripper::new();
        r.set_game_title("disk");
        r.set_output_dir(&dir);
        r.request_rip(1);
        r.notify_flush();
        r.polygon(&quad());
        r.notify_flush();
        r.notify_render(&GpuState::new());
        assert!(r.is_done());

        let entries: Vec<_> = std::fs::read_dir(&dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let data = std::fs::read(entries[0].as_ref().unwrap().path()).unwrap();
        assert_eq!(&data[..15], b"melon ripper v2");
        // preamble + QUAD + VRAM + DISP + TOON
        let expected = DUMP_PREAMBLE_LEN
            + (4 + 4 * VERTEX_BYTES)
            + (4 + GpuState::snapshot_len())
            + 8
            + (4 + 64);
        assert_eq!(data.len(), expected);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
