/// Number of entries in the lookup table.
pub const LUT_SIZE: usize = 1024;

const OPAQUE: u32 = 0xFF00_0000;

/// Gradient stops as (offset, [red, green, blue]).
const STOPS: [(f64, [u8; 3]); 5] = [
    (0.00, [0x00, 0x00, 0xFF]),
    (0.25, [0x00, 0xFF, 0xFF]),
    (0.50, [0x00, 0xFF, 0x00]),
    (0.75, [0xFF, 0xFF, 0x00]),
    (1.00, [0xFF, 0x00, 0x00]),
];

/// Maps a normalized power onto the blue, cyan, green, yellow, red gradient.
///
/// Colours are packed as `0xAARRGGBB` and always fully opaque.
#[derive(Clone, Debug)]
pub struct ColorMapper {
    lut: Vec<u32>,
}

impl ColorMapper {
    pub fn new() -> Self {
        let lut = (0..LUT_SIZE)
            .map(|i| interpolate(i as f64 / (LUT_SIZE - 1) as f64))
            .collect();
        Self { lut }
    }

    /// Looks up the colour of `value`, values outside `[0, 1]` take the colour of the nearest end.
    pub fn get_color(&self, value: f64) -> u32 {
        //  The float to int cast truncates towards zero and maps NaN to zero
        let index = ((value * (LUT_SIZE - 1) as f64) as i64).clamp(0, LUT_SIZE as i64 - 1);
        self.lut.get(index as usize).copied().unwrap_or(OPAQUE)
    }

    pub fn lut(&self) -> &[u32] {
        &self.lut
    }

    /// Splits a packed colour into its red, green and blue channels.
    pub const fn rgb(color: u32) -> (u8, u8, u8) {
        ((color >> 16) as u8, (color >> 8) as u8, color as u8)
    }
}

impl Default for ColorMapper {
    fn default() -> Self {
        Self::new()
    }
}

fn interpolate(value: f64) -> u32 {
    for pair in STOPS.windows(2) {
        let [(start, from), (end, to)] = pair else {
            continue;
        };
        if value < *start || value > *end {
            continue;
        }
        let t = (value - start) / (end - start);
        let [r, g, b] = [0, 1, 2].map(|channel| {
            let from = from.get(channel).copied().unwrap_or_default() as f64;
            let to = to.get(channel).copied().unwrap_or_default() as f64;
            (from + (to - from) * t) as u8
        });
        return OPAQUE | ((r as u32) << 16) | ((g as u32) << 8) | b as u32;
    }
    OPAQUE
}
