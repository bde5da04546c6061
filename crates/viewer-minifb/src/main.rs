//! melonrip dump viewer v0.3.0.
//!
//! Loads a `.dump` frame capture, software-rasterizes the recorded geometry
//! at the DS 3D resolution (256×192), and shows it in a scaled window. Also
//! runs headlessly:
//!
//! - `--info` prints a record census and exits
//! - `--screenshot <out.png>` renders straight to a PNG and exits
//!
//! The rasterizer is a preview aid, not a DS renderer: orthographic
//! projection auto-fitted to the captured bounding box, submission-order
//! painter's algorithm, per-vertex color interpolation, no texturing.

use melonrip_core::reader::{parse_dump, Record};
use melonrip_core::{png, Vertex, SCREEN_HEIGHT, SCREEN_WIDTH};
use minifb::{Key, Scale, ScaleMode, Window, WindowOptions};
use std::env;
use std::fs;

/// Framebuffer clear color (0RGB)
const BACKGROUND: u32 = 0x001A1A2E;
/// Wireframe edge color
const WIRE_COLOR: u32 = 0x00E0E0E0;
/// Margin around the fitted geometry, in pixels
const FIT_MARGIN: f32 = 8.0;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("melonrip dump viewer v0.3.0");
        eprintln!("Usage: {} <file.dump> [options]", args[0]);
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --info               Print a record summary and exit");
        eprintln!("  --screenshot <png>   Render to a PNG and exit");
        eprintln!("  --wire               Start in wireframe mode");
        eprintln!("  --scale N            Initial window scale 1-6 (default 3)");
        eprintln!();
        eprintln!("GUI keys: W=Wireframe S=Screenshot 1-6=Scale Esc/Q=Quit");
        std::process::exit(1);
    }

    let dump_path = &args[1];
    let info = args.iter().any(|a| a == "--info");
    let wire = args.iter().any(|a| a == "--wire");
    let screenshot: Option<String> = args
        .iter()
        .position(|a| a == "--screenshot")
        .and_then(|i| args.get(i + 1))
        .cloned();
    let initial_scale: usize = args
        .iter()
        .position(|a| a == "--scale")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(3)
        .clamp(1, 6);

    let data = fs::read(dump_path).unwrap_or_else(|e| {
        eprintln!("melonrip-view: cannot read {}: {}", dump_path, e);
        std::process::exit(1);
    });
    let records = parse_dump(&data).unwrap_or_else(|e| {
        eprintln!("melonrip-view: {}: {}", dump_path, e);
        std::process::exit(1);
    });

    if info {
        print_info(dump_path, data.len(), &records);
        return;
    }

    let polys = collect_polygons(&records);
    if polys.is_empty() {
        eprintln!("melonrip-view: {} contains no geometry records", dump_path);
    }

    if let Some(out) = screenshot {
        let mut fb = vec![BACKGROUND; SCREEN_WIDTH * SCREEN_HEIGHT];
        render(&polys, &mut fb, wire);
        let png_data = png::encode_png_argb(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32, &fb);
        match fs::write(&out, &png_data) {
            Ok(()) => println!("melonrip-view: wrote {}", out),
            Err(e) => {
                eprintln!("melonrip-view: cannot write {}: {}", out, e);
                std::process::exit(1);
            }
        }
        return;
    }

    run_gui(dump_path, &polys, wire, initial_scale);
}

// ─── Record summary ─────────────────────────────────────────────────────────

fn print_info(path: &str, file_len: usize, records: &[Record]) {
    let mut tris = 0usize;
    let mut quads = 0usize;
    let mut tex_params = 0usize;
    let mut tex_palettes = 0usize;
    let mut poly_attrs = 0usize;

    println!("{}: {} bytes, {} records", path, file_len, records.len());
    for record in records {
        match record {
            Record::Triangle(_) => tris += 1,
            Record::Quad(_) => quads += 1,
            Record::TexParam(_) => tex_params += 1,
            Record::TexPalette(_) => tex_palettes += 1,
            Record::PolygonAttr(_) => poly_attrs += 1,
            Record::Vram(snap) => {
                println!("  VRAM: texture map {:08X?}", snap.map_texture);
                println!("        palette map {:08X?}", snap.map_texpal);
                for (i, bank) in snap.banks.iter().enumerate() {
                    let used = bank.iter().filter(|&&b| b != 0).count();
                    println!(
                        "        bank {}: {} KB, {} nonzero bytes",
                        (b'A' + i as u8) as char,
                        bank.len() / 1024,
                        used
                    );
                }
            }
            Record::DispCnt(v) => println!("  DISP: 0x{:08X}", v),
            Record::ToonTable(t) => {
                println!("  TOON: {:04X} {:04X} {:04X} {:04X} ...", t[0], t[1], t[2], t[3]);
            }
        }
    }
    println!(
        "  polygons: {} ({} tris, {} quads)",
        tris + quads,
        tris,
        quads
    );
    println!(
        "  state words: {} TPRM, {} TPLT, {} PATR",
        tex_params, tex_palettes, poly_attrs
    );
}

// ─── Rasterizer ─────────────────────────────────────────────────────────────

fn collect_polygons(records: &[Record]) -> Vec<Vec<Vertex>> {
    let mut polys = Vec::new();
    for record in records {
        match record {
            Record::Triangle(v) => polys.push(v.to_vec()),
            Record::Quad(v) => polys.push(v.to_vec()),
            _ => {}
        }
    }
    polys
}

/// Render all polygons into a 256×192 framebuffer.
fn render(polys: &[Vec<Vertex>], fb: &mut [u32], wire: bool) {
    for px in fb.iter_mut() {
        *px = BACKGROUND;
    }
    if polys.is_empty() {
        return;
    }

    // Fit the captured bounding box into the screen. Positions are 20.12
    // fixed point, but a pure fit makes the exponent irrelevant.
    let mut min_x = i64::MAX;
    let mut max_x = i64::MIN;
    let mut min_y = i64::MAX;
    let mut max_y = i64::MIN;
    let mut max_col = 1u32;
    for v in polys.iter().flatten() {
        min_x = min_x.min(v.world_pos[0] as i64);
        max_x = max_x.max(v.world_pos[0] as i64);
        min_y = min_y.min(v.world_pos[1] as i64);
        max_y = max_y.max(v.world_pos[1] as i64);
        max_col = max_col.max(*v.color.iter().max().unwrap());
    }
    let span_x = (max_x - min_x).max(1) as f32;
    let span_y = (max_y - min_y).max(1) as f32;
    let scale = ((SCREEN_WIDTH as f32 - 2.0 * FIT_MARGIN) / span_x)
        .min((SCREEN_HEIGHT as f32 - 2.0 * FIT_MARGIN) / span_y);
    let center_x = (min_x + max_x) as f32 / 2.0;
    let center_y = (min_y + max_y) as f32 / 2.0;

    // World Y is up, screen Y is down.
    let project = |v: &Vertex| -> (f32, f32) {
        (
            SCREEN_WIDTH as f32 / 2.0 + (v.world_pos[0] as f32 - center_x) * scale,
            SCREEN_HEIGHT as f32 / 2.0 - (v.world_pos[1] as f32 - center_y) * scale,
        )
    };
    let shade = |v: &Vertex| -> [f32; 3] {
        [
            v.color[0] as f32 / max_col as f32 * 255.0,
            v.color[1] as f32 / max_col as f32 * 255.0,
            v.color[2] as f32 / max_col as f32 * 255.0,
        ]
    };

    for poly in polys {
        if wire {
            let pts: Vec<(f32, f32)> = poly.iter().map(&project).collect();
            for i in 0..pts.len() {
                draw_line(fb, pts[i], pts[(i + 1) % pts.len()], WIRE_COLOR);
            }
        } else {
            // Fan-split quads; tris pass through.
            for tri in [[0usize, 1, 2], [0, 2, 3]].iter().take(poly.len() - 2) {
                let pts = [project(&poly[tri[0]]), project(&poly[tri[1]]), project(&poly[tri[2]])];
                let cols = [shade(&poly[tri[0]]), shade(&poly[tri[1]]), shade(&poly[tri[2]])];
                fill_triangle(fb, pts, cols);
            }
        }
    }
}

fn edge(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> f32 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

/// Fill one triangle with barycentric per-vertex color interpolation.
fn fill_triangle(fb: &mut [u32], pts: [(f32, f32); 3], cols: [[f32; 3]; 3]) {
    let area = edge(pts[0], pts[1], pts[2]);
    if area.abs() < f32::EPSILON {
        return; // degenerate
    }

    let x0 = pts.iter().map(|p| p.0).fold(f32::MAX, f32::min).floor().max(0.0) as usize;
    let x1 = pts.iter().map(|p| p.0).fold(f32::MIN, f32::max).ceil() as isize;
    let y0 = pts.iter().map(|p| p.1).fold(f32::MAX, f32::min).floor().max(0.0) as usize;
    let y1 = pts.iter().map(|p| p.1).fold(f32::MIN, f32::max).ceil() as isize;
    let x1 = (x1.max(0) as usize).min(SCREEN_WIDTH - 1);
    let y1 = (y1.max(0) as usize).min(SCREEN_HEIGHT - 1);

    for y in y0..=y1 {
        for x in x0..=x1 {
            let p = (x as f32 + 0.5, y as f32 + 0.5);
            // Dividing by the signed area makes the weights winding-agnostic.
            let w0 = edge(pts[1], pts[2], p) / area;
            let w1 = edge(pts[2], pts[0], p) / area;
            let w2 = edge(pts[0], pts[1], p) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }
            let r = w0 * cols[0][0] + w1 * cols[1][0] + w2 * cols[2][0];
            let g = w0 * cols[0][1] + w1 * cols[1][1] + w2 * cols[2][1];
            let b = w0 * cols[0][2] + w1 * cols[1][2] + w2 * cols[2][2];
            fb[y * SCREEN_WIDTH + x] =
                ((r as u32).min(255) << 16) | ((g as u32).min(255) << 8) | (b as u32).min(255);
        }
    }
}

fn draw_line(fb: &mut [u32], a: (f32, f32), b: (f32, f32), color: u32) {
    let (mut x0, mut y0) = (a.0.round() as i32, a.1.round() as i32);
    let (x1, y1) = (b.0.round() as i32, b.1.round() as i32);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        if x0 >= 0 && (x0 as usize) < SCREEN_WIDTH && y0 >= 0 && (y0 as usize) < SCREEN_HEIGHT {
            fb[y0 as usize * SCREEN_WIDTH + x0 as usize] = color;
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

// ─── GUI ────────────────────────────────────────────────────────────────────

fn run_gui(dump_path: &str, polys: &[Vec<Vertex>], start_wire: bool, initial_scale: usize) {
    let title = format!("melonrip-view: {}", dump_path);
    let mut wire = start_wire;
    let mut scale = initial_scale;
    let mut scaled_w = SCREEN_WIDTH * scale;
    let mut scaled_h = SCREEN_HEIGHT * scale;

    let mut window = Window::new(
        &title,
        scaled_w,
        scaled_h,
        WindowOptions {
            scale: Scale::X1,
            scale_mode: ScaleMode::AspectRatioStretch,
            resize: true,
            ..Default::default()
        },
    )
    .expect("Failed to create window");
    window.set_target_fps(60);

    let mut fb = vec![BACKGROUND; SCREEN_WIDTH * SCREEN_HEIGHT];
    render(polys, &mut fb, wire);
    let mut scaled_buf = vec![0u32; scaled_w * scaled_h];

    let mut prev_w = false;
    let mut prev_s = false;
    let mut prev_num = [false; 6];
    let mut screenshot_n = 0u32;

    while window.is_open() && !window.is_key_down(Key::Escape) && !window.is_key_down(Key::Q) {
        // Scale toggle (1-6): minifb fixes the scale at creation, so recreate.
        let num = [
            window.is_key_down(Key::Key1),
            window.is_key_down(Key::Key2),
            window.is_key_down(Key::Key3),
            window.is_key_down(Key::Key4),
            window.is_key_down(Key::Key5),
            window.is_key_down(Key::Key6),
        ];
        for i in 0..6 {
            if num[i] && !prev_num[i] {
                scale = i + 1;
                scaled_w = SCREEN_WIDTH * scale;
                scaled_h = SCREEN_HEIGHT * scale;
                scaled_buf.resize(scaled_w * scaled_h, 0);
                window = Window::new(
                    &title,
                    scaled_w,
                    scaled_h,
                    WindowOptions {
                        scale: Scale::X1,
                        scale_mode: ScaleMode::AspectRatioStretch,
                        resize: true,
                        ..Default::default()
                    },
                )
                .expect("window");
                window.set_target_fps(60);
            }
        }
        prev_num = num;

        // Wireframe toggle (W)
        let w = window.is_key_down(Key::W);
        if w && !prev_w {
            wire = !wire;
            render(polys, &mut fb, wire);
        }
        prev_w = w;

        // Screenshot (S)
        let s = window.is_key_down(Key::S);
        if s && !prev_s {
            let f = format!("ripview_{:04}.png", screenshot_n);
            let png_data = png::encode_png_argb(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32, &fb);
            match fs::write(&f, &png_data) {
                Ok(()) => {
                    eprintln!("Screenshot: {}", f);
                    screenshot_n += 1;
                }
                Err(e) => eprintln!("Screenshot error: {}: {}", f, e),
            }
        }
        prev_s = s;

        upscale(&fb, &mut scaled_buf, scale);
        window
            .update_with_buffer(&scaled_buf, scaled_w, scaled_h)
            .expect("update");
    }
}

/// Nearest-neighbor upscale of the 256×192 framebuffer.
fn upscale(src: &[u32], dst: &mut [u32], scale: usize) {
    let dst_w = SCREEN_WIDTH * scale;
    for y in 0..SCREEN_HEIGHT {
        for x in 0..SCREEN_WIDTH {
            let px = src[y * SCREEN_WIDTH + x];
            for dy in 0..scale {
                let row = (y * scale + dy) * dst_w + x * scale;
                for dx in 0..scale {
                    dst[row + dx] = px;
                }
            }
        }
    }
}
