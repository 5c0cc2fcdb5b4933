//! Word-window text chunker.
//!
//! Splits document text into consecutive windows of a fixed number of
//! whitespace-separated words so each passage stays within a comfortable
//! embedding input size. Windows do not overlap and the final window may be
//! shorter. Output is fully determined by the input and the window size.

/// Split `text` into windows of `window_size` words.
/// Blank input (or a zero window) yields an empty sequence.
pub fn chunk_words(text: &str, window_size: usize) -> Vec<String> {
    if window_size == 0 {
        return Vec::new();
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    words
        .chunks(window_size)
        .map(|window| window.join(" "))
        .collect()
}
