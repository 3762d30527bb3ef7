use std::path::PathBuf;

use clap::Parser;
use drizzle_engine::BackendPreference;

/// Checks which drizzle renderer backend works here and draws one offscreen test frame.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "drizzle-probe", version, about)]
pub struct ProbeArgs {
    /// Backend to request (auto, accelerated, fallback).
    #[arg(long, default_value = "auto")]
    pub backend: BackendPreference,

    /// Offscreen canvas size as WIDTHxHEIGHT.
    #[arg(long, value_name = "WxH", value_parser = parse_size, default_value = "640x360")]
    pub size: (u32, u32),

    /// Rectangles in the test frame.
    #[arg(long, default_value_t = 10_000)]
    pub rects: usize,

    /// Rectangles per batch.
    #[arg(long, value_parser = parse_batch)]
    pub batch: Option<usize>,

    /// Write the frame as PNG.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w: u32 = w.trim().parse().map_err(|e| format!("bad width in '{s}': {e}"))?;
    let h: u32 = h.trim().parse().map_err(|e| format!("bad height in '{s}': {e}"))?;
    if w == 0 || h == 0 {
        return Err(format!("size must be non-zero, got '{s}'"));
    }
    Ok((w, h))
}

fn parse_batch(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("batch must be at least 1".into()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("bad batch size '{s}': {e}")),
    }
}
