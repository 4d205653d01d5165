//! Property tests for the recursive chunker.

use docqa_rag::{Chunk, Chunker, Document, RecursiveChunker};
use proptest::prelude::*;

/// Drop each chunk's declared overlap and concatenate the rest.
fn reassemble(chunks: &[Chunk]) -> String {
    let mut text = String::new();
    for chunk in chunks {
        text.extend(chunk.text.chars().skip(chunk.overlap));
    }
    text
}

/// Valid `(chunk_size, chunk_overlap)` pairs with overlap < size.
fn arb_sizes() -> impl Strategy<Value = (usize, usize)> {
    (1usize..120).prop_flat_map(|size| (Just(size), 0..size))
}

/// Documents mixing words, spaces, line breaks, paragraphs and non-ASCII text.
fn arb_document() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            4 => "[a-zA-Z]{1,12}",
            3 => Just(" ".to_string()),
            1 => Just("\n".to_string()),
            1 => Just("\n\n".to_string()),
            1 => "[äöüßéñ漢字]{1,4}",
            1 => "[.,;!?]{1}",
        ],
        1..200,
    )
    .prop_map(|parts| parts.concat())
}

mod prop_chunking {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn reassembly_reconstructs_document((size, overlap) in arb_sizes(), text in arb_document()) {
            let doc = Document::new(text.clone());
            let chunks = RecursiveChunker::new(size, overlap).chunk(&doc).unwrap();
            prop_assert_eq!(reassemble(&chunks), text);
        }

        #[test]
        fn chunks_respect_size_and_overlap_bounds((size, overlap) in arb_sizes(), text in arb_document()) {
            let doc = Document::new(text);
            let chunks = RecursiveChunker::new(size, overlap).chunk(&doc).unwrap();

            prop_assert!(!chunks.is_empty());
            prop_assert_eq!(chunks[0].overlap, 0);
            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert_eq!(chunk.index, i);
                prop_assert!(chunk.text.chars().count() <= size);
                prop_assert!(chunk.overlap <= overlap);
                prop_assert!(!chunk.text.is_empty());
            }
            for pair in chunks.windows(2) {
                let prev_end = pair[0].offset + pair[0].text.chars().count();
                prop_assert_eq!(pair[1].offset + pair[1].overlap, prev_end);
            }
        }

        #[test]
        fn chunking_is_deterministic((size, overlap) in arb_sizes(), text in arb_document()) {
            let doc = Document::new(text);
            let chunker = RecursiveChunker::new(size, overlap);
            prop_assert_eq!(chunker.chunk(&doc).unwrap(), chunker.chunk(&doc).unwrap());
        }

        #[test]
        fn fixed_windows_without_separators((size, overlap) in arb_sizes(), text in "[a-z ]{1,300}") {
            let doc = Document::new(text.clone());
            let chunker = RecursiveChunker::new(size, overlap).with_separators(Vec::<&str>::new());
            let chunks = chunker.chunk(&doc).unwrap();

            prop_assert_eq!(reassemble(&chunks), text.clone());
            // Every chunk but the last is a full window.
            for chunk in &chunks[..chunks.len() - 1] {
                prop_assert_eq!(chunk.text.chars().count(), size);
            }
        }
    }
}

#[test]
fn default_sizes_keep_short_documents_whole() {
    let text = "Sales orders must be approved by a manager.";
    let chunks = RecursiveChunker::new(1000, 200).chunk(&Document::new(text)).unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, text);
}

#[test]
fn long_documents_break_on_paragraphs_first() {
    let paragraph = "word ".repeat(30);
    let text = format!("{paragraph}\n\n{paragraph}\n\n{paragraph}");
    let chunks = RecursiveChunker::new(200, 20).chunk(&Document::new(text.clone())).unwrap();

    assert!(chunks.len() >= 3);
    assert!(chunks[0].text.ends_with("\n\n"));
    assert_eq!(reassemble(&chunks), text);
}
