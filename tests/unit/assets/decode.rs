use std::io::Cursor;

use image::{Delay, Frame, Rgba};

use super::*;

fn png_bytes(img: &RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img.clone())
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn gif_bytes(frames: usize, delay_ms: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut enc = image::codecs::gif::GifEncoder::new(&mut buf);
        let frames = (0..frames).map(|i| {
            let shade = (i * 60) as u8;
            let img = RgbaImage::from_pixel(4, 3, Rgba([shade, 0, 0, 255]));
            Frame::from_parts(img, 0, 0, Delay::from_numer_denom_ms(delay_ms, 1))
        });
        enc.encode_frames(frames).unwrap();
    }
    buf
}

#[test]
fn png_decodes_static() {
    let img = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]));
    match decode_emote(&png_bytes(&img), 40).unwrap() {
        Emote::Static(s) => {
            assert_eq!(s.dimensions(), (3, 2));
            assert_eq!(s.get_pixel(0, 0), &Rgba([1, 2, 3, 255]));
        }
        Emote::Animated(_) => panic!("png must decode as static"),
    }
}

#[test]
fn multi_frame_gif_decodes_animated_with_delay() {
    match decode_emote(&gif_bytes(3, 100), 40).unwrap() {
        Emote::Animated(a) => {
            assert_eq!(a.frame_count(), 3);
            assert_eq!(a.frame_ms(), 100);
            assert_eq!((a.width(), a.height()), (4, 3));
        }
        Emote::Static(_) => panic!("gif with 3 frames must be animated"),
    }
}

#[test]
fn zero_delay_falls_back_to_default() {
    match decode_emote(&gif_bytes(2, 0), 40).unwrap() {
        Emote::Animated(a) => assert_eq!(a.frame_ms(), 40),
        Emote::Static(_) => panic!("expected animated"),
    }
}

#[test]
fn single_frame_gif_is_static() {
    assert!(matches!(
        decode_emote(&gif_bytes(1, 50), 40).unwrap(),
        Emote::Static(_)
    ));
}

#[test]
fn garbage_bytes_fail_to_decode() {
    assert!(decode_emote(b"not an image", 40).is_err());
}

#[test]
fn frame_index_is_wall_clock_modulo() {
    assert_eq!(frame_index(0, 40, 5), 0);
    assert_eq!(frame_index(39, 40, 5), 0);
    assert_eq!(frame_index(40, 40, 5), 1);
    assert_eq!(frame_index(40 * 5, 40, 5), 0);
    assert_eq!(frame_index(40 * 7 + 3, 40, 5), 2);
    assert_eq!(frame_index(1234, 0, 3), 1234 % 3);
    assert_eq!(frame_index(1234, 40, 0), 0);
}

#[test]
fn animated_emote_rejects_mismatched_frames() {
    let a = RgbaImage::new(2, 2);
    let b = RgbaImage::new(3, 2);
    assert!(AnimatedEmote::new(vec![a, b], 40, 40).is_err());
    assert!(AnimatedEmote::new(vec![], 40, 40).is_err());
}

#[test]
fn frame_at_selects_by_time() {
    let frames = (0..4u8)
        .map(|i| RgbaImage::from_pixel(1, 1, Rgba([i, 0, 0, 255])))
        .collect();
    let anim = AnimatedEmote::new(frames, 0, 40).unwrap();
    assert_eq!(anim.frame_at(0).get_pixel(0, 0)[0], 0);
    assert_eq!(anim.frame_at(85).get_pixel(0, 0)[0], 2);
    assert_eq!(anim.frame_at(160).get_pixel(0, 0)[0], 0);
}

#[test]
fn fit_width_scales_wide_emotes_and_keeps_narrow_ones() {
    let narrow = Emote::Static(Arc::new(RgbaImage::new(28, 28)));
    assert_eq!(narrow.fit_width(330).unwrap().width(), 28);

    let wide = Emote::Static(Arc::new(RgbaImage::new(336, 112)));
    let fitted = wide.fit_width(330).unwrap();
    assert_eq!((fitted.width(), fitted.height()), (330, 110));

    let frames = vec![RgbaImage::new(400, 40), RgbaImage::new(400, 40)];
    let anim = Emote::Animated(Arc::new(AnimatedEmote::new(frames, 70, 40).unwrap()));
    match anim.fit_width(200).unwrap() {
        Emote::Animated(a) => {
            assert_eq!((a.width(), a.height()), (200, 20));
            assert_eq!(a.frame_count(), 2);
            assert_eq!(a.frame_ms(), 70);
        }
        Emote::Static(_) => panic!("animation lost"),
    }
}
