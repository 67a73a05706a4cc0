use crate::foundation::core::{BezPath, Canvas, Rect, Rgba8};
use crate::foundation::error::{VizError, VizResult};
use crate::render::backend::{FrameRGBA, RenderBackend};
use crate::render::blur::blur_rgba8_premul;
use crate::render::compile::{DrawOp, FramePlan};
use crate::render::composite::{add_in_place, tint_in_place};

/// Software rasterizer built on `vello_cpu`.
///
/// Surfaces are kept between frames and reallocated only when the canvas size changes.
#[derive(Default)]
pub struct CpuBackend {
    base: Option<CpuSurface>,
    effects: Option<CpuSurface>,
}

struct CpuSurface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
}

impl CpuSurface {
    fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            pixmap: vello_cpu::Pixmap::new(width, height),
        }
    }
}

impl CpuBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderBackend for CpuBackend {
    fn render_plan(&mut self, plan: &FramePlan) -> VizResult<FrameRGBA> {
        let (w, h) = canvas_to_u16(plan.canvas)?;

        let base = ensure_surface(&mut self.base, w, h);
        draw_ops(base, &plan.base);

        if !plan.effects.is_empty() {
            let effects = ensure_surface(&mut self.effects, w, h);
            draw_ops(effects, &plan.effects);
            let layer = effects.pixmap.data_as_u8_slice();
            let dst = base.pixmap.data_as_u8_slice_mut();

            if let Some(glow) = plan.glow {
                let mut halo = blur_rgba8_premul(
                    layer,
                    u32::from(w),
                    u32::from(h),
                    glow.radius_px,
                    glow.sigma,
                )?;
                tint_in_place(&mut halo, glow.color);
                add_in_place(dst, &halo)?;
            }
            add_in_place(dst, layer)?;
        }

        Ok(FrameRGBA {
            width: plan.canvas.width,
            height: plan.canvas.height,
            data: base.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

fn canvas_to_u16(canvas: Canvas) -> VizResult<(u16, u16)> {
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| VizError::render("surface width exceeds u16"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| VizError::render("surface height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(VizError::render("surface width/height must be > 0"));
    }
    Ok((w, h))
}

fn ensure_surface(slot: &mut Option<CpuSurface>, width: u16, height: u16) -> &mut CpuSurface {
    let stale = slot
        .as_ref()
        .is_none_or(|s| s.width != width || s.height != height);
    if stale {
        *slot = Some(CpuSurface::new(width, height));
    }
    slot.get_or_insert_with(|| CpuSurface::new(width, height))
}

fn draw_ops(surface: &mut CpuSurface, ops: &[DrawOp]) {
    clear_pixmap(&mut surface.pixmap, [0, 0, 0, 0]);
    let mut ctx = vello_cpu::RenderContext::new(surface.width, surface.height);
    for op in ops {
        draw_op(&mut ctx, op);
    }
    ctx.flush();
    ctx.render_to_pixmap(&mut surface.pixmap);
}

fn draw_op(ctx: &mut vello_cpu::RenderContext, op: &DrawOp) {
    match op {
        DrawOp::FillRect { rect, color } => {
            set_color(ctx, *color);
            ctx.fill_rect(&rect_to_cpu(*rect));
        }
        DrawOp::FillPath { path, color } => {
            set_color(ctx, *color);
            ctx.fill_path(&bezpath_to_cpu(path));
        }
        DrawOp::StrokePath { path, width, color } => {
            set_color(ctx, *color);
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(*width));
            ctx.stroke_path(&bezpath_to_cpu(path));
        }
    }
}

fn set_color(ctx: &mut vello_cpu::RenderContext, c: Rgba8) {
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    for px in pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn point_to_cpu(p: crate::foundation::core::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
