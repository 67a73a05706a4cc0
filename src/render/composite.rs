use crate::foundation::core::Rgba8;
use crate::foundation::error::{VizError, VizResult};

pub type PremulRgba8 = [u8; 4];

/// Additive ("lighter") blend of two premultiplied pixels.
pub fn add(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    [
        dst[0].saturating_add(src[0]),
        dst[1].saturating_add(src[1]),
        dst[2].saturating_add(src[2]),
        dst[3].saturating_add(src[3]),
    ]
}

/// `dst = dst + src` over equal-length premultiplied RGBA8 buffers.
pub fn add_in_place(dst: &mut [u8], src: &[u8]) -> VizResult<()> {
    check_lengths(dst, src, "add_in_place")?;
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = add([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Replace every pixel's color with `color`, keeping the coverage in alpha.
///
/// The result is premultiplied; `color.a` scales the coverage.
pub fn tint_in_place(buf: &mut [u8], color: Rgba8) {
    for px in buf.chunks_exact_mut(4) {
        let a = mul_div255(u16::from(px[3]), u16::from(color.a));
        px[0] = mul_div255(u16::from(color.r), u16::from(a));
        px[1] = mul_div255(u16::from(color.g), u16::from(a));
        px[2] = mul_div255(u16::from(color.b), u16::from(a));
        px[3] = a;
    }
}

/// Flatten premultiplied or straight pixels over an opaque background.
pub fn flatten_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    src_is_premul: bool,
    bg: Rgba8,
) -> VizResult<()> {
    check_lengths(dst, src, "flatten_to_opaque_rgba8")?;

    let bg_c = [u16::from(bg.r), u16::from(bg.g), u16::from(bg.b)];
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - a;
        for c in 0..3 {
            let sc = if src_is_premul {
                u16::from(s[c])
            } else {
                u16::from(mul_div255(u16::from(s[c]), a))
            };
            d[c] = (sc + u16::from(mul_div255(bg_c[c], inv))).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

fn check_lengths(dst: &[u8], src: &[u8], what: &str) -> VizResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(VizError::render(format!(
            "{what} expects equal-length rgba8 buffers"
        )));
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
