//! Split reply text into posts that fit the platform's length limit.

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Paragraphs (blank-line separated) are packed together while they fit.
/// An oversized paragraph is split on whitespace, and a single word longer
/// than the limit is cut on character boundaries. Chunks are trimmed and
/// never empty; empty input yields no chunks.
pub fn split_post(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let joined_len = if current.is_empty() {
            char_len(paragraph)
        } else {
            char_len(&current) + 2 + char_len(paragraph)
        };

        if joined_len <= max_chars {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(paragraph);
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        if char_len(paragraph) <= max_chars {
            current.push_str(paragraph);
        } else {
            let mut pieces = split_words(paragraph, max_chars);
            // The tail may still share a post with the next paragraph.
            if let Some(last) = pieces.pop() {
                chunks.extend(pieces);
                current = last;
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_words(paragraph: &str, max_chars: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();

    for word in paragraph.split_whitespace() {
        let word_len = char_len(word);
        let needed = if current.is_empty() {
            word_len
        } else {
            char_len(&current) + 1 + word_len
        };

        if needed <= max_chars {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            continue;
        }

        if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }

        if word_len <= max_chars {
            current.push_str(word);
        } else {
            let chars: Vec<char> = word.chars().collect();
            let mut pieces: Vec<String> = chars
                .chunks(max_chars)
                .map(|c| c.iter().collect())
                .collect();
            if let Some(last) = pieces.pop() {
                out.extend(pieces);
                current = last;
            }
        }
    }

    if !current.is_empty() {
        out.push(current);
    }
    out
}
