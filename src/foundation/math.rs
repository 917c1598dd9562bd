pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Flatten one premultiplied RGBA8 pixel over an opaque background.
pub(crate) fn flatten_premul_px(px: [u8; 4], bg: [u8; 3]) -> [u8; 3] {
    let a = u16::from(px[3]);
    if a == 255 {
        return [px[0], px[1], px[2]];
    }
    let inv = 255u16 - a;
    let mut out = [0u8; 3];
    for i in 0..3 {
        let v = u16::from(px[i]) + mul_div255_u16(u16::from(bg[i]), inv);
        out[i] = v.min(255) as u8;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
