//! 分段 - 业务能力层
//!
//! 把一段块序列切成"说明块 + 题组列表"，以及定位 `PHẦN n` 标记。

use crate::models::block::Block;
use crate::models::label::{self, LabelKind};
use crate::models::mode::ExamPart;
use crate::models::question::{PartSegments, QuestionGroup};

/// 第一个包含 `PHẦN n` 的块下标
pub fn find_part_boundary(blocks: &[Block], part: ExamPart) -> Option<usize> {
    blocks
        .iter()
        .position(|block| label::is_part_marker(&block.visible_text(), part))
}

/// 切分一段块序列
///
/// - 第一个题号之前的块全部进入 `intro`；
/// - 每个题号开启一个新题组，直到下一个题号或以 `PHẦN n` 开头的块为止；
/// - 题组被部分标记截断后、下一个题号出现之前的块同样归入 `intro`。
pub fn segment(blocks: Vec<Block>) -> PartSegments {
    let mut segments = PartSegments::default();
    let mut current: Option<QuestionGroup> = None;

    for block in blocks {
        let text = block.visible_text();

        if LabelKind::QuestionHeader.matches(&text) {
            if let Some(group) = current.take() {
                segments.groups.push(group);
            }
            current = Some(QuestionGroup::new(block));
        } else if label::is_part_start(&text) {
            if let Some(group) = current.take() {
                segments.groups.push(group);
            }
            segments.intro.push(block);
        } else if let Some(group) = current.as_mut() {
            group.push(block);
        } else {
            segments.intro.push(block);
        }
    }

    if let Some(group) = current {
        segments.groups.push(group);
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{blocks_from, line, texts};

    #[test]
    fn test_segment_splits_intro_and_groups() {
        let blocks = blocks_from(
            &[
                line("Thời gian: 50 phút"),
                line("Câu 1. Một cộng một?"),
                line("A. 1"),
                line("B. 2"),
                line("Câu 2. Hai cộng hai?"),
                "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>bảng</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"
                    .to_string(),
                line("A. 4"),
            ]
            .concat(),
        );

        let segments = segment(blocks);
        assert_eq!(texts(&segments.intro), vec!["Thời gian: 50 phút"]);
        assert_eq!(segments.groups.len(), 2);
        assert_eq!(segments.groups[0].len(), 3);
        assert_eq!(segments.groups[1].len(), 3);
        assert_eq!(segments.groups[1].header().visible_text(), "Câu 2. Hai cộng hai?");
    }

    #[test]
    fn test_segment_without_headers_is_all_intro() {
        let blocks = blocks_from(&[line("Đề bài"), line("A. 1"), line("ghi chú")].concat());
        let segments = segment(blocks);
        assert!(segments.groups.is_empty());
        assert_eq!(texts(&segments.intro), vec!["Đề bài", "A. 1", "ghi chú"]);
    }

    #[test]
    fn test_part_start_closes_group() {
        let blocks = blocks_from(
            &[
                line("Câu 1. x"),
                line("A. 1"),
                line("PHẦN 9. Phụ lục"),
                line("ghi chú"),
                line("Câu 2. y"),
            ]
            .concat(),
        );
        let segments = segment(blocks);
        assert_eq!(segments.groups.len(), 2);
        assert_eq!(segments.groups[0].len(), 2);
        assert_eq!(texts(&segments.intro), vec!["PHẦN 9. Phụ lục", "ghi chú"]);
    }

    #[test]
    fn test_find_part_boundary() {
        let blocks = blocks_from(
            &[
                line("ĐỀ THI THỬ"),
                line("PHẦN 1. Trắc nghiệm"),
                line("Câu 1. x"),
                line("Phần 3: Trả lời ngắn"),
            ]
            .concat(),
        );
        assert_eq!(find_part_boundary(&blocks, ExamPart::MultipleChoice), Some(1));
        assert_eq!(find_part_boundary(&blocks, ExamPart::TrueFalse), None);
        assert_eq!(find_part_boundary(&blocks, ExamPart::ShortAnswer), Some(3));
    }
}
