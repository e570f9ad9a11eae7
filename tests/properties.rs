//! Property tests for the tokenizer and the bounded token sets.

use annotated_disk_cache::{
    BoundedTokenIndex, ListCollector, MemoryIndex, MemoryMapping, SimpleTokenizer, Tokenizer, WholePhrase,
};
use proptest::prelude::*;

/// Model of one token's set: append new values, evict from the front.
fn model_insert(model: &mut Vec<u8>, values: &[u8], max: usize) {
    for v in values {
        if !model.contains(v) {
            model.push(*v);
        }
    }
    if model.len() > max {
        model.drain(..model.len() - max);
    }
}

proptest! {
    #[test]
    fn tokens_respect_min_length_and_stop_words(
        words in prop::collection::vec("[a-zA-Z]{1,8}", 0..20),
        min in 1usize..6,
    ) {
        let tokenizer = SimpleTokenizer::new(min);
        let phrase = words.join(" ");
        let tokens = tokenizer.tokenize(&phrase);

        for token in &tokens {
            prop_assert!(token.chars().count() >= min);
            prop_assert!(!tokenizer.is_stop_word(token));
        }
        // Tokens are a subsequence of the input words
        let mut remaining = words.iter();
        for token in &tokens {
            prop_assert!(remaining.any(|w| w == token));
        }
    }

    #[test]
    fn token_set_matches_fifo_model(
        batches in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..8), 1..20),
        max in 1usize..10,
    ) {
        let index: MemoryIndex<u8> = BoundedTokenIndex::new(MemoryMapping::new(), WholePhrase, max).unwrap();
        let mut model = Vec::new();

        for batch in &batches {
            let added = index.index_token("t", batch).unwrap();
            prop_assert_eq!(added, batch.len().min(max));
            if !batch.is_empty() {
                model_insert(&mut model, batch, max);
            }
        }

        let mut stored = ListCollector::new();
        index.find_token("t", &mut stored, 0, usize::MAX).unwrap();
        prop_assert!(stored.values().len() <= max);
        prop_assert_eq!(stored.into_values(), model);
    }

    #[test]
    fn pages_partition_the_result_list(
        a in prop::collection::vec(any::<u16>(), 0..12),
        b in prop::collection::vec(any::<u16>(), 0..12),
        page in 1usize..5,
    ) {
        let index: MemoryIndex<u16> = BoundedTokenIndex::new(MemoryMapping::new(), WholePhrase, 64).unwrap();
        index.index_token("a", &a).unwrap();
        index.index_token("b", &b).unwrap();

        let mut all = ListCollector::new();
        index.find_tokens_with(&["a", "b"], &mut all, 0, usize::MAX).unwrap();

        let mut paged = Vec::new();
        let mut offset = 0;
        loop {
            let mut hits = ListCollector::new();
            let n = index.find_tokens_with(&["a", "b"], &mut hits, offset, page).unwrap();
            prop_assert!(n <= page);
            if n == 0 {
                break;
            }
            paged.extend(hits.into_values());
            offset += n;
        }
        prop_assert_eq!(paged, all.into_values());
    }
}
