//! 标签与正确性识别 - 业务能力层
//!
//! 只回答"这个块是什么"和"这个块的内容是否被划了下划线"，不修改任何东西
//! （`clear_underline` 除外，它只在事实提取之后才会被调用）。

use crate::infrastructure::xml_tree::{XmlElement, W_NS};
use crate::models::block::Block;
use crate::models::label::{self, LabelKind};

/// 块的可见文本
pub fn text_of(block: &Block) -> String {
    block.visible_text()
}

/// 按块的开头文本判断标签种类
pub fn match_label_kind(block: &Block) -> Option<LabelKind> {
    LabelKind::detect(&block.visible_text())
}

/// 一个 run 内全部 `w:t` 的文本
pub fn run_text(run: &XmlElement) -> String {
    run.descendants()
        .into_iter()
        .filter(|el| el.is(W_NS, "t"))
        .map(XmlElement::text)
        .collect()
}

/// run 是否带下划线：存在 `w:u` 且 `w:val` 不是 `none`
pub fn run_has_underline(run: &XmlElement) -> bool {
    let Some(underline) = run
        .find_child(W_NS, "rPr")
        .and_then(|rpr| rpr.find_child(W_NS, "u"))
    else {
        return false;
    };

    !underline
        .attr("val")
        .is_some_and(|val| val.trim().eq_ignore_ascii_case("none"))
}

/// 块的"内容"是否被划了下划线
///
/// 只统计文本非空且不是纯标签（`A.`、`a)`、`Câu 7.`）的 run，
/// 这样单独给标签加的下划线不会被当成正确答案。
pub fn has_underlined_substantive_content(block: &Block) -> bool {
    block.runs().into_iter().any(|run| {
        if !run_has_underline(run) {
            return false;
        }
        let text = run_text(run);
        !text.trim().is_empty() && !label::is_label_only(&text)
    })
}

/// 去掉块内所有 run 的下划线，返回处理的 run 数
pub fn clear_underline(block: &mut Block) -> usize {
    let mut cleared = 0;
    for path in block.run_paths() {
        let Some(run) = block.element_mut().at_path_mut(&path) else {
            continue;
        };
        if let Some(rpr) = run.find_child_mut(W_NS, "rPr") {
            cleared += rpr.remove_children(W_NS, "u").min(1);
        }
    }
    cleared
}
