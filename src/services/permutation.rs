//! 混排与答案推导 - 业务能力层
//!
//! 所有混排都走同一个 Fisher–Yates 实现。每道题先做一次"事实提取"
//! （选项字母、是否划线），之后的重排只消费这些事实，不再回头读下划线。

use crate::models::answer::DerivedAnswer;
use crate::models::block::Block;
use crate::models::label::{self, LabelKind};
use crate::models::question::QuestionGroup;
use crate::services::inspector;
use rand::Rng;
use tracing::warn;

/// Fisher–Yates：i 从 len-1 递减到 1，在 [0, i] 中均匀抽取 j 并交换
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// 选项的一次性事实
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionFact {
    /// 选项块在题组中的下标
    pub index: usize,
    /// 改写前标签里的字母
    pub letter: char,
    /// 内容是否被划了下划线
    pub is_correct: bool,
}

/// 提取题组中某类选项的事实，按文档顺序
pub fn option_facts(group: &QuestionGroup, kind: LabelKind) -> Vec<OptionFact> {
    group
        .blocks()
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(index, block)| {
            let text = block.visible_text();
            if !kind.matches(&text) {
                return None;
            }
            Some(OptionFact {
                index,
                letter: label::option_letter(kind, &text)?,
                is_correct: inspector::has_underlined_substantive_content(block),
            })
        })
        .collect()
}

/// 第 n 个位置对应的选择题字母（A、B、C……）
pub fn choice_letter(position: usize) -> char {
    char::from(b'A' + position.min(25) as u8)
}

/// 按选项起点把题组切成 前段 / 选项条目 / 后段
///
/// 夹在两个选项之间的非选项块跟随前一个选项移动。
fn split_option_region(
    blocks: Vec<Block>,
    starts: &[usize],
) -> (Vec<Block>, Vec<Vec<Block>>, Vec<Block>) {
    let (Some(&first), Some(&last)) = (starts.first(), starts.last()) else {
        return (blocks, Vec::new(), Vec::new());
    };

    let mut before = Vec::new();
    let mut entries: Vec<Vec<Block>> = Vec::with_capacity(starts.len());
    let mut after = Vec::new();

    for (index, block) in blocks.into_iter().enumerate() {
        if index < first {
            before.push(block);
        } else if index > last {
            after.push(block);
        } else if starts.binary_search(&index).is_ok() {
            entries.push(vec![block]);
        } else if let Some(entry) = entries.last_mut() {
            entry.push(block);
        } else {
            before.push(block);
        }
    }

    (before, entries, after)
}

fn reassemble(before: Vec<Block>, middle: Vec<Vec<Block>>, after: Vec<Block>) -> QuestionGroup {
    let blocks: Vec<Block> = before
        .into_iter()
        .chain(middle.into_iter().flatten())
        .chain(after)
        .collect();
    QuestionGroup::from_blocks(blocks)
}

/// 选择题：混排 A/B/C/D，返回混排后正确选项的字母
///
/// 少于 2 个选项时原样返回，答案为空。多个选项划线时以最后一个为准。
pub fn shuffle_mcq_options<R: Rng + ?Sized>(
    group: QuestionGroup,
    rng: &mut R,
) -> (QuestionGroup, DerivedAnswer) {
    let facts = option_facts(&group, LabelKind::McqOption);
    if facts.len() < 2 {
        warn!("⚠️ 选择题选项不足 2 个（{} 个），保持原样", facts.len());
        return (group, DerivedAnswer::Choice(None));
    }

    let correct = facts.iter().rposition(|fact| fact.is_correct);
    let starts: Vec<usize> = facts.iter().map(|fact| fact.index).collect();
    let (before, entries, after) = split_option_region(group.into_blocks(), &starts);

    let mut tagged: Vec<(usize, Vec<Block>)> = entries.into_iter().enumerate().collect();
    fisher_yates(&mut tagged, rng);

    let new_correct = correct
        .and_then(|original| tagged.iter().position(|(tag, _)| *tag == original))
        .map(choice_letter);

    let middle = tagged.into_iter().map(|(_, blocks)| blocks).collect();
    (reassemble(before, middle, after), DerivedAnswer::Choice(new_correct))
}

/// 判断题：只在 a/b/c 之间混排，d 永远排在最后
///
/// 答案按混排后 a→b→c→d 的位置给出真假；不同字母少于 2 个时原样返回，
/// 答案按原字母槽位给出。重复出现的字母跟随前一个选项。
pub fn shuffle_tf_options<R: Rng + ?Sized>(
    group: QuestionGroup,
    rng: &mut R,
) -> (QuestionGroup, DerivedAnswer) {
    let mut slots: [Option<usize>; 4] = [None; 4];
    let mut kept: Vec<OptionFact> = Vec::new();
    for fact in option_facts(&group, LabelKind::TfOption) {
        let slot = usize::from(fact.letter as u8 - b'a');
        if slots[slot].is_none() {
            slots[slot] = Some(kept.len());
            kept.push(fact);
        }
    }

    if kept.len() < 2 {
        warn!("⚠️ 判断题选项不足 2 个（{} 个），保持原样", kept.len());
        let key = slots.map(|slot| slot.map(|k| kept[k].is_correct));
        return (group, DerivedAnswer::TrueFalse(key));
    }

    let starts: Vec<usize> = kept.iter().map(|fact| fact.index).collect();
    let (before, entries, after) = split_option_region(group.into_blocks(), &starts);
    let mut entries: Vec<Option<Vec<Block>>> = entries.into_iter().map(Some).collect();

    let mut abc: Vec<(Vec<Block>, bool)> = slots[..3]
        .iter()
        .flatten()
        .filter_map(|&k| Some((entries[k].take()?, kept[k].is_correct)))
        .collect();
    if abc.len() >= 2 {
        fisher_yates(&mut abc, rng);
    }

    let mut ordered = abc;
    if let Some(d) = slots[3] {
        if let Some(blocks) = entries[d].take() {
            ordered.push((blocks, kept[d].is_correct));
        }
    }

    let mut key = [None; 4];
    for (slot, (_, truth)) in key.iter_mut().zip(&ordered) {
        *slot = Some(*truth);
    }

    let middle = ordered.into_iter().map(|(blocks, _)| blocks).collect();
    (reassemble(before, middle, after), DerivedAnswer::TrueFalse(key))
}

/// 简答题：读取第一行 `Đáp án: ...` 作为答案，不混排选项
///
/// `strip_answer_line` 为真时把该行从题组中移除，避免答案出现在试卷上。
pub fn extract_short_answer(
    group: QuestionGroup,
    strip_answer_line: bool,
) -> (QuestionGroup, DerivedAnswer) {
    let found = group.blocks().iter().enumerate().skip(1).find_map(|(index, block)| {
        let text = block.visible_text();
        if LabelKind::FreeAnswerLine.matches(&text) {
            label::free_answer(&text).map(|answer| (index, answer))
        } else {
            None
        }
    });

    let Some((index, answer)) = found else {
        return (group, DerivedAnswer::Short(None));
    };

    if !strip_answer_line {
        return (group, DerivedAnswer::Short(Some(answer)));
    }

    let mut blocks = group.into_blocks();
    blocks.remove(index);
    (QuestionGroup::from_blocks(blocks), DerivedAnswer::Short(Some(answer)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::answer::TRUE_MARK;
    use crate::services::segmenter::segment;
    use crate::test_support::{blocks_from, line, para, plain, texts, underlined};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn single_group(inner: &str) -> QuestionGroup {
        let mut segments = segment(blocks_from(inner));
        assert_eq!(segments.groups.len(), 1);
        segments.groups.remove(0)
    }

    fn mcq_group() -> QuestionGroup {
        single_group(
            &[
                line("Câu 1. Chọn đáp án đúng"),
                line("A. A content"),
                para(&[plain("B. "), underlined("B content")]),
                line("C. C content"),
                line("D. D content"),
                line("Lời giải: xem sách"),
            ]
            .concat(),
        )
    }

    #[test]
    fn test_fisher_yates_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        for len in 0..12 {
            let mut items: Vec<usize> = (0..len).collect();
            fisher_yates(&mut items, &mut rng);
            let mut sorted = items.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..len).collect::<Vec<_>>());
        }

        let mut one = vec!["x"];
        fisher_yates(&mut one, &mut rng);
        assert_eq!(one, vec!["x"]);
    }

    #[test]
    fn test_fisher_yates_reaches_every_position() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = [false; 4];
        for _ in 0..200 {
            let mut items = [0, 1, 2, 3];
            fisher_yates(&mut items, &mut rng);
            let pos = items.iter().position(|&x| x == 0).unwrap();
            seen[pos] = true;
        }
        assert_eq!(seen, [true; 4]);
    }

    #[test]
    fn test_mcq_answer_follows_underlined_block() {
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (group, answer) = shuffle_mcq_options(mcq_group(), &mut rng);

            let DerivedAnswer::Choice(Some(letter)) = answer else {
                panic!("应推导出答案字母");
            };
            let position = (letter as u8 - b'A') as usize;
            let options = &group.blocks()[1..5];
            assert!(options[position].visible_text().ends_with("B content"));
            assert_eq!(group.blocks()[5].visible_text(), "Lời giải: xem sách");
            assert_eq!(group.header().visible_text(), "Câu 1. Chọn đáp án đúng");
        }
    }

    #[test]
    fn test_mcq_without_mark_gives_empty_answer() {
        let group = single_group(&[line("Câu 1. x"), line("A. 1"), line("B. 2")].concat());
        let mut rng = StdRng::seed_from_u64(1);
        let (group, answer) = shuffle_mcq_options(group, &mut rng);
        assert_eq!(answer, DerivedAnswer::Choice(None));
        assert_eq!(group.len(), 3);
    }

    #[test]
    fn test_mcq_with_single_option_is_untouched() {
        let group = single_group(
            &[line("Câu 1. x"), para(&[plain("A. "), underlined("đúng")]), line("ghi chú")].concat(),
        );
        let mut rng = StdRng::seed_from_u64(1);
        let (group, answer) = shuffle_mcq_options(group, &mut rng);
        assert_eq!(answer, DerivedAnswer::Choice(None));
        assert_eq!(texts(group.blocks()), vec!["Câu 1. x", "A. đúng", "ghi chú"]);
    }

    #[test]
    fn test_mcq_keeps_attached_blocks_with_option() {
        let xml = [
            line("Câu 1. x"),
            line("A. 1"),
            line("hình A"),
            para(&[plain("B. "), underlined("2")]),
        ]
        .concat();
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (group, _) = shuffle_mcq_options(single_group(&xml), &mut rng);
            let order = texts(group.blocks());
            let a = order.iter().position(|t| t == "A. 1").unwrap();
            assert_eq!(order[a + 1], "hình A");
        }
    }

    #[test]
    fn test_tf_keeps_d_last_and_builds_key() {
        for seed in 0..30 {
            let group = single_group(
                &[
                    line("Câu 1. Xét các mệnh đề"),
                    para(&[plain("a) "), underlined("mệnh đề a")]),
                    line("b) mệnh đề b"),
                    line("c) mệnh đề c"),
                    para(&[plain("d) "), underlined("mệnh đề d")]),
                ]
                .concat(),
            );
            let mut rng = StdRng::seed_from_u64(seed);
            let (group, answer) = shuffle_tf_options(group, &mut rng);

            let key = answer.to_answer_string();
            assert_eq!(key.chars().count(), 4);
            assert_eq!(key.chars().last(), Some(TRUE_MARK));
            assert_eq!(group.blocks()[4].visible_text(), "d) mệnh đề d");

            let DerivedAnswer::TrueFalse(slots) = answer else {
                panic!("应为判断题答案");
            };
            for (slot, block) in slots.iter().zip(&group.blocks()[1..]) {
                let is_a = block.visible_text() == "a) mệnh đề a";
                let is_d = block.visible_text() == "d) mệnh đề d";
                assert_eq!(*slot, Some(is_a || is_d));
            }
        }
    }

    #[test]
    fn test_tf_with_one_option_passes_through() {
        let group = single_group(
            &[line("Câu 1. x"), para(&[plain("d) "), underlined("đúng")])].concat(),
        );
        let mut rng = StdRng::seed_from_u64(3);
        let (group, answer) = shuffle_tf_options(group, &mut rng);
        assert_eq!(answer, DerivedAnswer::TrueFalse([None, None, None, Some(true)]));
        assert_eq!(answer.to_answer_string(), "   Đ");
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn test_tf_with_three_options_pads_key() {
        let group = single_group(
            &[line("Câu 1. x"), line("a) 1"), line("b) 2"), line("c) 3")].concat(),
        );
        let mut rng = StdRng::seed_from_u64(5);
        let (group, answer) = shuffle_tf_options(group, &mut rng);
        assert_eq!(answer.to_answer_string(), "SSS ");
        assert_eq!(group.len(), 4);
    }

    #[test]
    fn test_short_answer_is_extracted_and_stripped() {
        let group = single_group(
            &[line("Câu 1. Giải phương trình"), line("2x = 10"), line("Đáp án: x = 5")].concat(),
        );
        let (group, answer) = extract_short_answer(group, true);
        assert_eq!(answer, DerivedAnswer::Short(Some("x = 5".to_string())));
        assert_eq!(texts(group.blocks()), vec!["Câu 1. Giải phương trình", "2x = 10"]);
    }

    #[test]
    fn test_short_answer_kept_when_not_stripping() {
        let group = single_group(&[line("Câu 1. x"), line("Đáp án - 12")].concat());
        let (group, answer) = extract_short_answer(group, false);
        assert_eq!(answer, DerivedAnswer::Short(Some("12".to_string())));
        assert_eq!(group.len(), 2);

        let group = single_group(&line("Câu 2. y"));
        let (_, answer) = extract_short_answer(group, true);
        assert_eq!(answer, DerivedAnswer::Short(None));
    }

    #[test]
    fn test_empty_answer_line_is_skipped() {
        let group = single_group(
            &[line("Câu 1. x"), line("Đáp án:"), line("Đáp án: 7")].concat(),
        );
        let (group, answer) = extract_short_answer(group, true);
        assert_eq!(answer, DerivedAnswer::Short(Some("7".to_string())));
        assert_eq!(texts(group.blocks()), vec!["Câu 1. x", "Đáp án:"]);
    }
}
