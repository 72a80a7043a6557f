//! 旁白分块器
//!
//! 把长文本切成适合单次合成调用的片段。纯函数，无外部状态。
//!
//! 全局上限（任何模式都生效）：
//! - 输入先截断到 `MAX_TOTAL_CHARS` 个字符
//! - 输出最多 `MAX_CHUNKS` 段，多出的部分直接丢弃
//! - `max_chars` 被钳制到 `[MIN_CHUNK_CHARS, MAX_CHUNK_CHARS]`

use serde::{Deserialize, Serialize};

/// 单次旁白允许的最大字符数
pub const MAX_TOTAL_CHARS: usize = 5000;

/// 单次旁白允许的最大片段数
pub const MAX_CHUNKS: usize = 15;

/// `max_chars` 下限
pub const MIN_CHUNK_CHARS: usize = 50;

/// `max_chars` 上限
pub const MAX_CHUNK_CHARS: usize = 1500;

/// 默认片段长度
pub const DEFAULT_CHUNK_CHARS: usize = 500;

/// 分块模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkMode {
    /// 按句子切分并合并短句
    #[default]
    Sentence,
    /// 按空行切分段落
    Paragraph,
    /// 固定窗口，尽量在空白处断开
    Fixed,
}

impl ChunkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkMode::Sentence => "sentence",
            ChunkMode::Paragraph => "paragraph",
            ChunkMode::Fixed => "fixed",
        }
    }

    /// 解析模式名，无法识别时回退到 sentence
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "paragraph" => ChunkMode::Paragraph,
            "fixed" => ChunkMode::Fixed,
            _ => ChunkMode::Sentence,
        }
    }
}

impl std::fmt::Display for ChunkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 钳制片段长度
pub fn clamp_chunk_chars(max_chars: usize) -> usize {
    max_chars.clamp(MIN_CHUNK_CHARS, MAX_CHUNK_CHARS)
}

/// 句末标点
#[inline]
fn is_sentence_terminal(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}

/// 按字符（而非字节）截断
fn truncate_chars(s: &str, limit: usize) -> &str {
    match s.char_indices().nth(limit) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// 对文本进行分块
///
/// 相同输入总是得到相同输出，返回的片段均非空且保持原文顺序。
pub fn split_for_narration(text: &str, mode: ChunkMode, max_chars: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let text = truncate_chars(text, MAX_TOTAL_CHARS);
    let max_chars = clamp_chunk_chars(max_chars);

    let mut chunks = match mode {
        ChunkMode::Paragraph => split_paragraphs(text),
        ChunkMode::Fixed => split_fixed(text, max_chars),
        ChunkMode::Sentence => split_sentences(text, max_chars),
    };
    chunks.truncate(MAX_CHUNKS);
    chunks
}

/// 段落模式：空行（仅含空白的行）为边界
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            flush_paragraph(&mut current, &mut chunks);
        } else {
            current.push(line);
        }
    }
    flush_paragraph(&mut current, &mut chunks);

    chunks
}

fn flush_paragraph(lines: &mut Vec<&str>, chunks: &mut Vec<String>) {
    let paragraph = lines.join("\n");
    let paragraph = paragraph.trim();
    if !paragraph.is_empty() && chunks.len() < MAX_CHUNKS {
        chunks.push(paragraph.to_string());
    }
    lines.clear();
}

/// 固定窗口模式
///
/// 窗口会切断单词时，若前一个空白位于窗口后半段则在空白处断开，否则硬切。
fn split_fixed(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() && chunks.len() < MAX_CHUNKS {
        let remaining = &chars[start..];
        if remaining.len() <= max_chars {
            let tail: String = remaining.iter().collect();
            let tail = tail.trim();
            if !tail.is_empty() {
                chunks.push(tail.to_string());
            }
            break;
        }

        let window = &remaining[..max_chars];
        let cut = match window.iter().rposition(|c| c.is_whitespace()) {
            Some(pos) if pos > max_chars / 2 => pos + 1,
            _ => max_chars,
        };

        let piece: String = remaining[..cut].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }

        start += cut;
        while start < chars.len() && chars[start].is_whitespace() {
            start += 1;
        }
    }

    chunks
}

/// 把文本拆成句子：句末标点后跟空白即为边界
fn split_into_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut seg_start = 0;
    let mut iter = text.char_indices().peekable();

    while let Some((idx, ch)) = iter.next() {
        if !is_sentence_terminal(ch) {
            continue;
        }
        let next_is_space = iter.peek().map_or(false, |(_, c)| c.is_whitespace());
        if !next_is_space {
            continue;
        }

        let end = idx + ch.len_utf8();
        sentences.push(&text[seg_start..end]);

        // 跳过分隔空白
        seg_start = end;
        while let Some(&(i, c)) = iter.peek() {
            if c.is_whitespace() {
                iter.next();
                seg_start = i + c.len_utf8();
            } else {
                break;
            }
        }
    }

    if seg_start < text.len() {
        sentences.push(&text[seg_start..]);
    }

    sentences
}

/// 句子模式：贪心合并相邻句子，单句超长时硬截断
fn split_sentences(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in split_into_sentences(text) {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }
        let sentence_len = sentence.chars().count();

        let combined_len = if current.is_empty() {
            sentence_len
        } else {
            current_len + 1 + sentence_len
        };

        if combined_len <= max_chars && chunks.len() < MAX_CHUNKS {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
            current_len = combined_len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            if chunks.len() >= MAX_CHUNKS {
                return chunks;
            }
        }

        current = truncate_chars(sentence, max_chars).to_string();
        current_len = current.chars().count();
    }

    if !current.is_empty() && chunks.len() < MAX_CHUNKS {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(s: &str) -> String {
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_sentence_short_text_single_chunk() {
        let chunks = split_for_narration("A. B. C.", ChunkMode::Sentence, 100);
        assert_eq!(chunks, vec!["A. B. C.".to_string()]);
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(split_for_narration("   \n\n  ", ChunkMode::Sentence, 500).is_empty());
        assert!(split_for_narration("", ChunkMode::Fixed, 500).is_empty());
    }

    #[test]
    fn test_sentence_coalesces_until_limit() {
        let sentence = "This sentence has exactly forty chars ok.";
        let text = vec![sentence; 4].join(" ");
        let chunks = split_for_narration(&text, ChunkMode::Sentence, 90);

        assert_eq!(chunks.len(), 2);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 90);
        }
    }

    #[test]
    fn test_sentence_longer_than_limit_is_truncated() {
        let long = "x".repeat(120);
        let text = format!("{}. Short one.", long);
        let chunks = split_for_narration(&text, ChunkMode::Sentence, 60);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 60);
        assert_eq!(chunks[1], "Short one.");
    }

    #[test]
    fn test_punctuation_without_space_does_not_split() {
        let chunks = split_for_narration("Version 1.5 is out.Really", ChunkMode::Sentence, 50);
        assert_eq!(chunks, vec!["Version 1.5 is out.Really".to_string()]);
    }

    #[test]
    fn test_paragraph_mode_splits_on_blank_lines() {
        let text = "First paragraph\nstill first.\n\n\n  \nSecond paragraph.\r\n\r\nThird.";
        let chunks = split_for_narration(text, ChunkMode::Paragraph, 500);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], "First paragraph\nstill first.");
        assert_eq!(chunks[1], "Second paragraph.");
        assert_eq!(chunks[2], "Third.");
    }

    #[test]
    fn test_fixed_mode_breaks_at_whitespace() {
        // 10 字符一个单词（含空格），6000 字符截断到 5000
        let text = "abcdefghi ".repeat(600);
        let chunks = split_for_narration(&text, ChunkMode::Fixed, 500);

        assert_eq!(chunks.len(), 10);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 500);
            assert!(chunk.ends_with("abcdefghi"));
        }
    }

    #[test]
    fn test_fixed_mode_hard_cut_without_whitespace() {
        let text = "y".repeat(260);
        let chunks = split_for_narration(&text, ChunkMode::Fixed, 100);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 100);
        assert_eq!(chunks[1].len(), 100);
        assert_eq!(chunks[2].len(), 60);
    }

    #[test]
    fn test_fixed_mode_whitespace_in_first_half_is_ignored() {
        let text = format!("ab {}", "z".repeat(200));
        let chunks = split_for_narration(&text, ChunkMode::Fixed, 100);

        assert_eq!(chunks[0].chars().count(), 100);
        assert!(chunks[0].starts_with("ab z"));
    }

    #[test]
    fn test_max_chars_is_clamped() {
        let text = "w".repeat(400);
        let chunks = split_for_narration(&text, ChunkMode::Fixed, 1);
        assert_eq!(chunks[0].len(), MIN_CHUNK_CHARS);

        let chunks = split_for_narration(&"w".repeat(3000), ChunkMode::Fixed, 100_000);
        assert_eq!(chunks[0].len(), MAX_CHUNK_CHARS);
    }

    #[test]
    fn test_chunk_count_is_capped_in_every_mode() {
        let sentences = "Tiny. ".repeat(400);
        let paragraphs = "Para.\n\n".repeat(100);
        let words = "word ".repeat(1000);

        for (text, mode) in [
            (&sentences, ChunkMode::Sentence),
            (&paragraphs, ChunkMode::Paragraph),
            (&words, ChunkMode::Fixed),
        ] {
            let chunks = split_for_narration(text, mode, 50);
            assert!(chunks.len() <= MAX_CHUNKS, "mode {} produced {}", mode, chunks.len());
        }
    }

    #[test]
    fn test_total_content_never_exceeds_limit() {
        let text = "Lorem ipsum dolor sit amet. ".repeat(400);
        for mode in [ChunkMode::Sentence, ChunkMode::Paragraph, ChunkMode::Fixed] {
            let chunks = split_for_narration(&text, mode, 1500);
            let total: usize = chunks.iter().map(|c| c.chars().count()).sum();
            assert!(total <= MAX_TOTAL_CHARS);
        }
    }

    #[test]
    fn test_chunks_reproduce_prefix_of_input() {
        let text = "One fish. Two fish! Red fish? Blue fish.\n\nThe end of the story is near.";
        for mode in [ChunkMode::Sentence, ChunkMode::Paragraph, ChunkMode::Fixed] {
            let joined = normalize(&split_for_narration(text, mode, 50).join(" "));
            assert!(normalize(text).starts_with(&joined), "mode {}", mode);
        }
    }

    #[test]
    fn test_multibyte_text_is_counted_in_chars() {
        let text = "测".repeat(MAX_TOTAL_CHARS + 100);
        let chunks = split_for_narration(&text, ChunkMode::Paragraph, 500);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chars().count(), MAX_TOTAL_CHARS);
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha beta. Gamma delta! Epsilon zeta? ".repeat(50);
        let a = split_for_narration(&text, ChunkMode::Sentence, 120);
        let b = split_for_narration(&text, ChunkMode::Sentence, 120);
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_lenient_mode() {
        assert_eq!(ChunkMode::parse_lenient("Paragraph"), ChunkMode::Paragraph);
        assert_eq!(ChunkMode::parse_lenient("fixed"), ChunkMode::Fixed);
        assert_eq!(ChunkMode::parse_lenient("words"), ChunkMode::Sentence);
    }
}
