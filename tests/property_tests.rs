//! Property-based tests for the TIFF directory walker and the alpha filters.

mod common;

use dimsniff::formats::webp::alpha::{AlphaFilter, unfilter};
use dimsniff::Size;
use proptest::prelude::*;

/// Forward prediction filter, the inverse of `unfilter`.
fn filter(plane: &[u8], stride: usize, filter: AlphaFilter) -> Vec<u8> {
    let predict = |i: usize| -> u8 {
        let (x, y) = (i % stride, i / stride);
        let left = || plane[i - 1];
        let above = || plane[i - stride];
        match (filter, x, y) {
            (AlphaFilter::None, _, _) | (_, 0, 0) => 0,
            (_, _, 0) => left(),
            (_, 0, _) => above(),
            (AlphaFilter::Horizontal, _, _) => left(),
            (AlphaFilter::Vertical, _, _) => above(),
            (AlphaFilter::Gradient, _, _) => {
                let g = left() as i16 + above() as i16 - plane[i - stride - 1] as i16;
                g.clamp(0, 255) as u8
            }
        }
    };
    (0..plane.len())
        .map(|i| plane[i].wrapping_sub(predict(i)))
        .collect()
}

fn any_filter() -> impl Strategy<Value = AlphaFilter> {
    prop_oneof![
        Just(AlphaFilter::None),
        Just(AlphaFilter::Horizontal),
        Just(AlphaFilter::Vertical),
        Just(AlphaFilter::Gradient),
    ]
}

proptest! {
    /// Unfiltering a filtered plane restores the original.
    #[test]
    fn unfilter_inverts_filter(
        stride in 1usize..16,
        rows in 1usize..8,
        seed in proptest::collection::vec(any::<u8>(), 256),
        kind in any_filter(),
    ) {
        let plane: Vec<u8> = seed.iter().copied().cycle().take(stride * rows).collect();
        let mut restored = filter(&plane, stride, kind);
        unfilter(&mut restored, stride, kind);
        prop_assert_eq!(restored, plane);
    }

    /// A directory decodes exactly when its tags are strictly ascending.
    #[test]
    fn tiff_requires_ascending_tags(
        order in Just(vec![256u16, 257, 258, 259, 262, 277]).prop_shuffle(),
        width in 1u32..=u16::MAX as u32,
        height in 1u32..=u16::MAX as u32,
        little_endian in any::<bool>(),
    ) {
        let value = |tag: u16| match tag {
            256 => width,
            257 => height,
            _ => 1,
        };
        let values: Vec<[u32; 1]> = order.iter().map(|&t| [value(t)]).collect();
        let entries: Vec<common::Entry<'_>> = order
            .iter()
            .zip(&values)
            .map(|(&tag, v)| (tag, 4, &v[..]))
            .collect();
        let data = common::tiff(little_endian, &entries);

        let sorted = order.windows(2).all(|w| w[0] < w[1]);
        match dimsniff::decode_bytes(&data) {
            Ok((size, format)) => {
                prop_assert!(sorted);
                prop_assert_eq!(format, "tiff");
                prop_assert_eq!(size, Size::new(width, height));
            }
            Err(err) => {
                prop_assert!(!sorted);
                prop_assert!(err.is_format());
            }
        }
    }

    /// Arbitrary bytes never panic the built-in decoders.
    #[test]
    fn arbitrary_input_is_handled(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let _ = dimsniff::decode_bytes(&data);
    }

    /// Arbitrary bytes behind a WebP signature never panic.
    #[test]
    fn arbitrary_webp_body_is_handled(body in proptest::collection::vec(any::<u8>(), 0..256)) {
        let mut data = b"RIFF\x00\x01\x00\x00WEBPVP8".to_vec();
        data.extend_from_slice(&body);
        let options = dimsniff::DecodeOptions::new().with_verify_alpha(true);
        let _ = dimsniff::FormatRegistry::with_options(&options).decode_size(&data[..]);
    }
}
