#![no_main]

use libfuzzer_sys::fuzz_target;
use riemersma::{dither_to_gray, ColorDepth, DitherOptions};
use arbitrary::Arbitrary;

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    width: u8,
    height: u8,
    pixels: Vec<u8>,
    history_len: u8,
    ratio: f64,
    depth: u8,
}

fuzz_target!(|input: FuzzInput| {
    let width = (input.width as usize).min(128);
    let height = (input.height as usize).min(128);

    // Ensure we have enough pixels (RGBA = 4 bytes per pixel)
    let expected_size = width * height * 4;
    if input.pixels.len() < expected_size {
        return;
    }

    let pixels = &input.pixels[..expected_size];
    let Ok(depth) = ColorDepth::from_bits(input.depth) else {
        return;
    };
    let opts = DitherOptions {
        history_len: input.history_len as usize,
        ratio: input.ratio,
    };

    // Bad options are rejected, never panic
    if let Ok(luma) = dither_to_gray(pixels, width, height, depth, &opts) {
        assert_eq!(luma.len(), width * height);
    }
});
