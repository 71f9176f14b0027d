/// Text segmentation for keyword retrieval.
///
/// The keyword adapter only depends on the `Tokenizer` trait; `UnicodeSegmenter`
/// is the default implementation. It splits on Unicode word boundaries (UAX #29),
/// lower-cases alphabetic words, and turns every contiguous run of Han/Kana
/// characters into overlapping bigrams, since those scripts carry no whitespace
/// between words. UAX #29 yields one segment per ideograph or Hiragana character
/// but keeps a Katakana word whole; both shapes join the same run.

use unicode_segmentation::UnicodeSegmentation;

/// Text in, ordered tokens out. No guarantee tokens are whitespace-delimited in the source.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeSegmenter;

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3040..=0x30FF      // Hiragana, Katakana
        | 0x3400..=0x4DBF    // CJK Extension A
        | 0x4E00..=0x9FFF    // CJK Unified Ideographs
        | 0xF900..=0xFAFF    // CJK Compatibility Ideographs
        | 0x20000..=0x2A6DF) // CJK Extension B
}

/// Emit a CJK run as overlapping bigrams; a lone character is emitted as-is.
fn flush_run(run: &mut Vec<char>, out: &mut Vec<String>) {
    match run.len() {
        0 => {}
        1 => out.push(run[0].to_string()),
        _ => {
            for pair in run.windows(2) {
                out.push(pair.iter().collect());
            }
        }
    }
    run.clear();
}

impl Tokenizer for UnicodeSegmenter {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut run: Vec<char> = Vec::new();
        let mut run_end = 0usize;

        for (start, word) in text.unicode_word_indices() {
            if word.chars().all(is_cjk) {
                // Punctuation or spaces between ideographs break the run.
                if !run.is_empty() && start != run_end {
                    flush_run(&mut run, &mut tokens);
                }
                run.extend(word.chars());
                run_end = start + word.len();
            } else {
                flush_run(&mut run, &mut tokens);
                tokens.push(word.to_lowercase());
            }
        }
        flush_run(&mut run, &mut tokens);
        tokens
    }
}
