//! Deterministic test frame: falling rain streaks in a few colors plus a
//! handful of sprites.

use drizzle_engine::{BlendMode, Color, Rect, RenderSurface, SpriteOptions, Texture};

const PALETTE: [Color; 3] = [
    Color::new(0.55, 0.65, 0.85, 0.6),
    Color::new(0.75, 0.8, 0.95, 0.8),
    Color::new(0.4, 0.5, 0.7, 0.4),
];

/// Streaks drawn per color before switching, so batches form runs.
const RUN: usize = 256;

/// xorshift32; fixed seed keeps frames comparable between backends.
struct Rng(u32);

impl Rng {
    fn next_f32(&mut self) -> f32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        (x >> 8) as f32 / (1u32 << 24) as f32
    }
}

/// Draws `count` rain streaks, then a few additive splash sprites.
pub fn draw_rain(surface: &mut dyn RenderSurface, count: usize) {
    let (width, height) = surface.size();
    let (w, h) = (width as f32, height as f32);
    let mut rng = Rng(0x9E37_79B9);

    for i in 0..count {
        let color = PALETTE[(i / RUN) % PALETTE.len()];
        let x = rng.next_f32() * w;
        let y = rng.next_f32() * h;
        let len = 4.0 + rng.next_f32() * 12.0;
        surface.fill_rect(Rect::new(x, y, 1.0, len), color);
    }

    let splash = Texture::solid(4, 4, Color::WHITE);
    let options = SpriteOptions::tinted(Color::new(0.6, 0.7, 1.0, 0.5)).with_blend(BlendMode::Additive);
    for _ in 0..4 {
        let x = rng.next_f32() * (w - 8.0).max(0.0);
        surface.draw_sprite(&splash, Rect::new(x, h - 8.0, 8.0, 4.0), options);
    }
}
