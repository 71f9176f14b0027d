/// Result assembly: summaries and final display shaping.
///
/// Summaries prefer whole sentences. Content within the budget is returned as-is;
/// otherwise sentences are accumulated greedily while they fit, and a run-on first
/// sentence falls back to a hard cut plus "...". Lengths count Unicode scalar values.

use crate::document::{FusedResult, SearchResult};

pub const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summarizer {
    max_chars: usize,
    terminator: char,
}

impl Default for Summarizer {
    fn default() -> Self {
        Summarizer::new(100, '。')
    }
}

impl Summarizer {
    pub fn new(max_chars: usize, terminator: char) -> Self {
        Summarizer { max_chars, terminator }
    }

    pub fn summarize(&self, content: &str) -> String {
        if content.chars().count() <= self.max_chars {
            return content.to_string();
        }

        let mut summary = String::new();
        let mut summary_len = 0;
        for sentence in content.split(self.terminator) {
            let sentence_len = sentence.chars().count();
            if summary_len + sentence_len + 1 > self.max_chars {
                break;
            }
            if summary.is_empty() {
                summary.push_str(sentence);
                summary_len = sentence_len;
            } else {
                summary.push(self.terminator);
                summary.push_str(sentence);
                summary_len += sentence_len + 1;
            }
        }

        if summary.is_empty() {
            let mut cut: String = content.chars().take(self.max_chars).collect();
            cut.push_str(ELLIPSIS);
            cut
        } else {
            summary.push(self.terminator);
            summary
        }
    }

    /// Fill in summaries and convert fused results to display records, preserving order.
    pub fn assemble(&self, fused: Vec<FusedResult>) -> Vec<SearchResult> {
        fused
            .into_iter()
            .map(|mut result| {
                result.summary = self.summarize(&result.document.content);
                SearchResult::from(result)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ContributingRanks, Document};

    #[test]
    fn test_short_content_unchanged() {
        let s = Summarizer::default();
        assert_eq!(s.summarize("图书馆几点关门？"), "图书馆几点关门？");
        assert_eq!(s.summarize(""), "");
    }

    #[test]
    fn test_exact_length_unchanged() {
        let s = Summarizer::new(5, '。');
        assert_eq!(s.summarize("一二三四五"), "一二三四五");
    }

    #[test]
    fn test_accumulates_whole_sentences() {
        let s = Summarizer::new(10, '。');
        // "一二三" (3) + "四五六" (3+1) fits 7; "七八九十" would need 12
        let summary = s.summarize("一二三。四五六。七八九十。尾巴");
        assert_eq!(summary, "一二三。四五六。");
    }

    #[test]
    fn test_never_exceeds_budget_by_more_than_terminator() {
        let s = Summarizer::new(8, '。');
        let content = "一二三。四五六七。八九十一二三四五六";
        let summary = s.summarize(content);
        assert!(summary.chars().count() <= 8 + 1);
        assert!(summary.ends_with('。'));
    }

    #[test]
    fn test_run_on_sentence_truncates_with_ellipsis() {
        let s = Summarizer::new(4, '。');
        assert_eq!(s.summarize("一二三四五六七八。九"), "一二三四...");
    }

    #[test]
    fn test_custom_terminator() {
        let s = Summarizer::new(12, '.');
        assert_eq!(s.summarize("Short one. Another one. Tail"), "Short one.");
    }

    #[test]
    fn test_assemble_keeps_order_and_fills_summary() {
        let s = Summarizer::new(4, '。');
        let fused = ["b", "a"]
            .iter()
            .map(|id| FusedResult {
                document_id: id.to_string(),
                fused_score: 0.5,
                contributing_ranks: ContributingRanks::default(),
                document: Document {
                    id: id.to_string(),
                    title: "t".into(),
                    content: "一二三四五六".into(),
                    author: "x".into(),
                    url: String::new(),
                    timestamp: String::new(),
                },
                summary: String::new(),
            })
            .collect();
        let results = s.assemble(fused);
        assert_eq!(results[0].id, "b");
        assert_eq!(results[1].id, "a");
        assert_eq!(results[0].summary, "一二三四...");
        assert_eq!(results[0].content, "一二三四五六");
    }
}
