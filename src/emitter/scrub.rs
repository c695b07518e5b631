//! Text preparation for streamed replies

/// Remove characters that break line-oriented clients
///
/// Drops every `\n`, then keeps only printable ASCII (0x20..=0x7E), tab, and
/// any non-ASCII character. Other control characters and DEL are dropped.
pub fn scrub(text: &str) -> String {
    text.chars().filter(|&c| is_kept(c)).collect()
}

fn is_kept(c: char) -> bool {
    matches!(c, '\t' | ' '..='~') || !c.is_ascii()
}

/// Split `text` into slices of at most `size` characters
///
/// Splits on character boundaries, so multi-byte text is never cut. A zero
/// size is treated as one.
pub fn chunk_chars(text: &str, size: usize) -> Vec<String> {
    let size = size.max(1);
    let mut chunks = Vec::with_capacity(text.len() / size + 1);
    let mut current = String::new();
    let mut count = 0;
    for c in text.chars() {
        current.push(c);
        count += 1;
        if count == size {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
