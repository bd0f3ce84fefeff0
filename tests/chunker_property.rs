//! Property tests for the sliding-window chunker.

#[macro_use]
extern crate proptest;

use contextsmith::config::ChunkingConfig;
use contextsmith::ingestion::Chunker;
use proptest::prelude::{Strategy, prop};

/// Window configs with a positive stride and no minimum-length widening,
/// so the stride arithmetic is exact for every pair.
fn config_strategy() -> impl Strategy<Value = ChunkingConfig> {
    (2usize..200, 0usize..199).prop_filter_map(
        "overlap must be smaller than chunk_size",
        |(chunk_size, chunk_overlap)| {
            (chunk_overlap < chunk_size).then(|| ChunkingConfig {
                chunk_size,
                chunk_overlap,
                min_chunk_size: 1,
                max_chunk_size: 400,
            })
        },
    )
}

fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::char::range('a', 'z'), 0..1500)
        .prop_map(|chars| chars.into_iter().collect())
}

fn expected_count(len: usize, size: usize, overlap: usize) -> usize {
    if len == 0 {
        0
    } else if len <= size {
        1
    } else {
        (len - overlap).div_ceil(size - overlap)
    }
}

proptest! {
    #[test]
    fn window_count_matches_formula(
        config in config_strategy(),
        text in text_strategy(),
    ) {
        let windows = Chunker::new(config.clone()).unwrap().split_text(&text);
        prop_assert_eq!(
            windows.len(),
            expected_count(text.chars().count(), config.chunk_size, config.chunk_overlap)
        );
    }

    #[test]
    fn no_window_exceeds_chunk_size(
        config in config_strategy(),
        text in text_strategy(),
    ) {
        let windows = Chunker::new(config.clone()).unwrap().split_text(&text);
        for window in &windows {
            prop_assert!(window.chars().count() <= config.chunk_size);
        }
    }

    #[test]
    fn consecutive_windows_share_exactly_the_overlap(
        config in config_strategy(),
        text in text_strategy(),
    ) {
        let windows = Chunker::new(config.clone()).unwrap().split_text(&text);
        let stride = config.chunk_size - config.chunk_overlap;
        let chars: Vec<char> = text.chars().collect();

        // With min_chunk_size = 1 no window is ever widened, so window i
        // starts exactly at i * stride and the shared region between
        // neighbours is the configured overlap.
        for (i, window) in windows.iter().enumerate() {
            let start = i * stride;
            let expected: String = chars[start..(start + config.chunk_size).min(chars.len())]
                .iter()
                .collect();
            prop_assert_eq!(window, &expected);
        }
    }

    #[test]
    fn boundaries_are_deterministic(
        config in config_strategy(),
        text in text_strategy(),
    ) {
        let chunker = Chunker::new(config).unwrap();
        prop_assert_eq!(chunker.split_text(&text), chunker.split_text(&text));
    }
}
