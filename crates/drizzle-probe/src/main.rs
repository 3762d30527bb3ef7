//! drizzle-probe: reports whether the accelerated backend works on this
//! machine, renders one offscreen test frame and prints batching stats.
//!
//! Usage:
//!   drizzle-probe                               probe + default frame
//!   drizzle-probe --backend fallback --rects 500
//!   drizzle-probe --size 256x256 --out frame.png

mod args;
mod scene;

use anyhow::{Context, Result};
use drizzle_engine::logging::{init_logging, LoggingConfig};
use drizzle_engine::{create_renderer, is_acceleration_available, Canvas, Color, RendererConfig};

use clap::Parser;

use args::ProbeArgs;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let args = ProbeArgs::parse();

    let available = is_acceleration_available();
    println!("acceleration available: {}", if available { "yes" } else { "no" });

    let mut config = RendererConfig::default().with_preference(args.backend);
    if let Some(batch) = args.batch {
        config = config.with_max_batch_size(batch);
    }

    let (width, height) = args.size;
    let canvas = Canvas::offscreen(width, height);
    let mut surface = create_renderer(&canvas, &config)
        .with_context(|| format!("creating a {} renderer", args.backend))?;
    println!("backend: {}", surface.backend());

    surface.begin_frame(Some(Color::rgb(0.05, 0.06, 0.1)));
    scene::draw_rain(surface.as_mut(), args.rects);
    surface.end_frame();

    let stats = surface.stats();
    log::info!(
        "frame done: {} draw calls, {} rects, {} sprites",
        stats.draw_calls,
        stats.total_rects,
        stats.total_sprites
    );
    println!(
        "draw calls: {}  rects: {}  sprites: {}  primitives/call: {:.1}",
        stats.draw_calls,
        stats.total_rects,
        stats.total_sprites,
        stats.primitives_per_draw_call()
    );

    if let Some(path) = &args.out {
        let image = surface.read_pixels().context("reading back the frame")?;
        image
            .save(path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("wrote {}", path.display());
    }

    surface.dispose();
    Ok(())
}
