/// How a sprite's pixels combine with what is already on the canvas.
///
/// All modes operate on premultiplied color.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum BlendMode {
    /// Source-over.
    #[default]
    Normal,
    /// `dst + src`, used for glows and light particles.
    Additive,
    /// `src * dst + dst * (1 - src_alpha)`.
    Multiply,
}

impl BlendMode {
    pub const ALL: [BlendMode; 3] = [BlendMode::Normal, BlendMode::Additive, BlendMode::Multiply];

    pub(crate) fn index(self) -> usize {
        match self {
            BlendMode::Normal => 0,
            BlendMode::Additive => 1,
            BlendMode::Multiply => 2,
        }
    }

    /// Composites one premultiplied source pixel over a premultiplied destination.
    #[inline]
    pub fn composite(self, src: [f32; 4], dst: [f32; 4]) -> [f32; 4] {
        let inv = 1.0 - src[3];
        let mut out = [0.0f32; 4];
        for i in 0..4 {
            out[i] = match self {
                BlendMode::Normal => src[i] + dst[i] * inv,
                BlendMode::Additive => src[i] + dst[i],
                BlendMode::Multiply => {
                    if i == 3 {
                        src[3] + dst[3] * inv
                    } else {
                        src[i] * dst[i] + dst[i] * inv
                    }
                }
            };
            out[i] = out[i].clamp(0.0, 1.0);
        }
        out
    }

    /// GPU blend state equivalent to [`composite`](Self::composite).
    pub fn to_wgpu(self) -> wgpu::BlendState {
        let over = wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        };
        match self {
            BlendMode::Normal => wgpu::BlendState { color: over, alpha: over },
            BlendMode::Additive => {
                let add = wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                };
                wgpu::BlendState { color: add, alpha: add }
            }
            BlendMode::Multiply => wgpu::BlendState {
                // src * dst + dst * (1 - src.a)
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::Dst,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: over,
            },
        }
    }
}
