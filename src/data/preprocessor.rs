// ============================================================
// Layer 4 — Sentence Preprocessor
// ============================================================
// Cleans one raw corpus field before tokenisation.
//
// Review corpora scraped from the web carry:
//   - Non-breaking / zero-width spaces
//   - Stray control characters and tabs
//   - Runs of repeated whitespace
//
// A sentence is classified as a single line, so every kind of
// whitespace (newlines included) collapses to one ASCII space.

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean a raw sentence. Takes a &str and returns an owned String.
    pub fn clean(&self, text: &str) -> String {
        let mut out        = String::with_capacity(text.len());
        let mut last_space = true; // swallows leading whitespace

        for c in text.chars() {
            let c = match c {
                '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
                c if c.is_whitespace() || c.is_control() => ' ',
                c => c,
            };

            if c == ' ' {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }

        // At most one trailing space can survive the loop
        if out.ends_with(' ') {
            out.pop();
        }
        out
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_multiple_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("good   movie"), "good movie");
    }

    #[test]
    fn test_trims_edges() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("  good movie  "), "good movie");
    }

    #[test]
    fn test_flattens_newlines_and_controls() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("good\n\nmovie\x01!"), "good movie !");
    }

    #[test]
    fn test_unicode_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("a\u{00A0}b\u{200B}c"), "a b c");
    }

    #[test]
    fn test_empty_string() {
        let p = Preprocessor::new();
        assert_eq!(p.clean(" \t "), "");
    }
}
