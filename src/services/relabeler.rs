//! 标签改写 - 业务能力层
//!
//! 在原 run 里就地改写 `Câu N.`、`A.`、`a)`，不新建段落，
//! 所以字体、字号、公式和图片都保持不动。标签可能被 Word 拆到几个 run 里
//! （`B` + `.`、`Câu ` + `1` + `2.`），改写时会向后吸收这些碎片。

use crate::infrastructure::xml_tree::{XmlElement, XmlNode, W_NS};
use crate::models::block::Block;
use crate::models::label::{self, LabelKind};
use crate::models::question::QuestionGroup;
use crate::services::permutation::choice_letter;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static HEADER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)(?i:Câu)(\s*\d+)?([.:])?").expect("题号标签正则"));
static MCQ_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)([A-D])([.)])?").expect("选择题标签正则"));
static TF_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)([a-d])(\))?").expect("判断题标签正则"));
static LEADING_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+").expect("数字正则"));
static SPACED_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+").expect("数字正则"));

/// `w:rPr` 子元素的规范顺序，新插入的 `w:b` / `w:color` 按此定位
const RPR_ORDER: &[&str] = &[
    "rStyle", "rFonts", "b", "bCs", "i", "iCs", "caps", "smallCaps", "strike", "dstrike",
    "outline", "shadow", "emboss", "imprint", "noProof", "snapToGrid", "vanish", "webHidden",
    "color", "spacing", "w", "kern", "position", "sz", "szCs", "highlight", "u", "effect",
    "bdr", "shd", "fitText", "vertAlign", "rtl", "cs", "em", "lang", "eastAsianLayout",
    "specVanish", "oMath",
];

/// 改写后标签的样式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelStyle {
    /// 是否给标签加粗并着色
    pub highlight: bool,
    /// 十六进制颜色，例如 `0000FF`
    pub color: String,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            highlight: true,
            color: "0000FF".to_string(),
        }
    }
}

/// 三种可改写的标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenRule {
    Header,
    Mcq,
    Tf,
}

impl TokenRule {
    fn pattern(self) -> &'static Regex {
        match self {
            TokenRule::Header => &HEADER_TOKEN,
            TokenRule::Mcq => &MCQ_TOKEN,
            TokenRule::Tf => &TF_TOKEN,
        }
    }

    /// 改写后使用的标点
    fn punct(self) -> char {
        match self {
            TokenRule::Tf => ')',
            _ => '.',
        }
    }

    /// 原文中可被替换的标点
    fn is_punct(self, c: char) -> bool {
        match self {
            TokenRule::Header => c == '.' || c == ':',
            TokenRule::Mcq => c == '.' || c == ')',
            TokenRule::Tf => c == ')',
        }
    }

    fn numbered(self) -> bool {
        self == TokenRule::Header
    }
}

/// 把题号块改写为 `Câu {number}.`，找不到标签时不动并返回 false
pub fn relabel_question(block: &mut Block, number: usize, style: &LabelStyle) -> bool {
    rewrite_label(block, TokenRule::Header, &format!("Câu {}", number), style)
}

/// 按位置依次改写题组中的选项标签（A/B/C/D 或 a/b/c/d），返回改写数量
///
/// 判断题里重复出现的字母不算新选项，保持原样。
pub fn relabel_options(group: &mut QuestionGroup, kind: LabelKind, style: &LabelStyle) -> usize {
    let rule = match kind {
        LabelKind::McqOption => TokenRule::Mcq,
        LabelKind::TfOption => TokenRule::Tf,
        _ => return 0,
    };

    let mut position = 0;
    let mut rewritten = 0;
    let mut seen = Vec::new();
    for block in group.blocks_mut().iter_mut().skip(1) {
        let text = block.visible_text();
        if !kind.matches(&text) {
            continue;
        }
        if kind == LabelKind::TfOption {
            match label::option_letter(kind, &text) {
                Some(letter) if seen.contains(&letter) => continue,
                Some(letter) => seen.push(letter),
                None => {}
            }
        }
        let letter = match kind {
            LabelKind::TfOption => choice_letter(position).to_ascii_lowercase(),
            _ => choice_letter(position),
        };
        if rewrite_label(block, rule, &letter.to_string(), style) {
            rewritten += 1;
        }
        position += 1;
    }
    rewritten
}

fn text_at(block: &Block, path: &[usize]) -> String {
    block
        .element()
        .at_path(path)
        .map(XmlElement::text)
        .unwrap_or_default()
}

fn write_text(block: &mut Block, path: &[usize], text: String) {
    if let Some(t) = block.element_mut().at_path_mut(path) {
        if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
            t.set_attr("xml:space", "preserve");
        }
        t.set_text(text);
    }
}

fn rewrite_label(block: &mut Block, rule: TokenRule, token: &str, style: &LabelStyle) -> bool {
    let paths = block.text_paths();
    let Some(first) = paths
        .iter()
        .position(|path| !text_at(block, path).trim().is_empty())
    else {
        return false;
    };

    let text = text_at(block, &paths[first]);
    let Some(caps) = rule.pattern().captures(&text) else {
        debug!("标签不在首个文本节点，跳过: {}", text);
        return false;
    };

    let lead = caps.get(1).map_or("", |m| m.as_str()).to_string();
    let has_number = rule.numbered() && caps.get(2).is_some();
    let has_punct = caps.get(3).is_some();
    let mut rest = text[caps.get(0).map_or(0, |m| m.end())..].to_string();

    // 题号数字不在这个节点里：这里剩下的只能是空白
    let needs_number = rule.numbered() && !has_number;
    if needs_number {
        if !rest.trim().is_empty() {
            return false;
        }
        rest.clear();
    }

    let punct_found_later = if !has_punct && rest.is_empty() {
        absorb_following(block, &paths[first + 1..], rule, needs_number, has_number)
    } else {
        false
    };

    let rewritten = if punct_found_later {
        format!("{}{}{}", lead, token, rest)
    } else {
        format!("{}{}{}{}", lead, token, rule.punct(), rest)
    };
    write_text(block, &paths[first], rewritten);

    if style.highlight {
        let run_path = &paths[first][..paths[first].len() - 1];
        if let Some(run) = block.element_mut().at_path_mut(run_path) {
            if run.is(W_NS, "r") {
                emphasize_run(run, &style.color);
            }
        }
    }
    true
}

/// 向后扫描被拆开的标签碎片
///
/// 题号的数字碎片被清空；以标点开头的节点把首字符换成目标标点并返回 true；
/// 遇到其它内容停止并返回 false（由调用方补标点）。
fn absorb_following(
    block: &mut Block,
    paths: &[Vec<usize>],
    rule: TokenRule,
    mut needs_number: bool,
    had_number: bool,
) -> bool {
    let mut digits_may_continue = rule.numbered() && had_number;

    for path in paths {
        let mut text = text_at(block, path);
        if text.is_empty() {
            continue;
        }

        if needs_number || digits_may_continue {
            if needs_number && text.trim().is_empty() {
                write_text(block, path, String::new());
                continue;
            }
            let digits = if needs_number { &SPACED_DIGITS } else { &LEADING_DIGITS };
            let end = digits.find(&text).map(|m| m.end());
            needs_number = false;
            match end {
                Some(end) => {
                    text = text[end..].to_string();
                    write_text(block, path, text.clone());
                    digits_may_continue = text.is_empty();
                    if text.is_empty() {
                        continue;
                    }
                }
                None => digits_may_continue = false,
            }
        }

        if text.trim().is_empty() {
            continue;
        }

        let mut chars = text.chars();
        return match chars.next() {
            Some(c) if rule.is_punct(c) => {
                write_text(block, path, format!("{}{}", rule.punct(), chars.as_str()));
                true
            }
            _ => false,
        };
    }
    false
}

/// 给 run 加粗并着色，`w:rPr` 不存在时创建
fn emphasize_run(run: &mut XmlElement, color: &str) {
    let has_rpr = run.find_child(W_NS, "rPr").is_some();
    if !has_rpr {
        let rpr = run.sibling_kind("rPr");
        run.children.insert(0, XmlNode::Element(rpr));
    }
    let Some(rpr) = run.find_child_mut(W_NS, "rPr") else {
        return;
    };

    match rpr.find_child_mut(W_NS, "b") {
        Some(bold) => bold.remove_attr("val"),
        None => {
            let bold = rpr.sibling_kind("b");
            insert_in_order(rpr, bold);
        }
    }

    let val_key = match rpr.prefix() {
        Some(prefix) => format!("{}:val", prefix),
        None => "val".to_string(),
    };
    match rpr.find_child_mut(W_NS, "color") {
        Some(existing) => {
            existing.remove_attr("val");
            existing.remove_attr("themeColor");
            existing.remove_attr("themeShade");
            existing.remove_attr("themeTint");
            existing.set_attr(&val_key, color);
        }
        None => {
            let mut element = rpr.sibling_kind("color");
            element.set_attr(&val_key, color);
            insert_in_order(rpr, element);
        }
    }
}

fn order_of(local: &str) -> usize {
    RPR_ORDER
        .iter()
        .position(|name| *name == local)
        .unwrap_or(RPR_ORDER.len())
}

fn insert_in_order(rpr: &mut XmlElement, element: XmlElement) {
    let rank = order_of(element.local_name());
    let index = rpr
        .children
        .iter()
        .position(|node| {
            node.as_element()
                .is_some_and(|el| order_of(el.local_name()) > rank)
        })
        .unwrap_or(rpr.children.len());
    rpr.children.insert(index, XmlNode::Element(element));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::segmenter::segment;
    use crate::test_support::{blocks_from, line, para, plain, underlined};

    fn plain_style() -> LabelStyle {
        LabelStyle {
            highlight: false,
            color: "0000FF".to_string(),
        }
    }

    #[test]
    fn test_relabel_question_in_single_run() {
        let mut blocks = blocks_from(&line("Câu 7. Tính đạo hàm"));
        assert!(relabel_question(&mut blocks[0], 2, &plain_style()));
        assert_eq!(blocks[0].visible_text(), "Câu 2. Tính đạo hàm");

        let mut blocks = blocks_from(&line("Câu 12: Tính"));
        assert!(relabel_question(&mut blocks[0], 3, &plain_style()));
        assert_eq!(blocks[0].visible_text(), "Câu 3. Tính");
    }

    #[test]
    fn test_relabel_question_keeps_leading_whitespace() {
        let mut blocks = blocks_from(&line("  Câu 7. x"));
        assert!(relabel_question(&mut blocks[0], 1, &plain_style()));
        let t = blocks[0].runs()[0].find_child(W_NS, "t").unwrap().text();
        assert_eq!(t, "  Câu 1. x");
    }

    #[test]
    fn test_relabel_question_absorbs_split_number() {
        let mut blocks = blocks_from(&para(&[plain("Câu "), plain("1"), plain("2"), plain(". Tính")]));
        assert!(relabel_question(&mut blocks[0], 5, &plain_style()));
        assert_eq!(blocks[0].visible_text(), "Câu 5. Tính");

        let mut blocks = blocks_from(&para(&[plain("Câu 1"), plain("2. Tính")]));
        assert!(relabel_question(&mut blocks[0], 4, &plain_style()));
        assert_eq!(blocks[0].visible_text(), "Câu 4. Tính");
    }

    #[test]
    fn test_relabel_is_idempotent() {
        let mut blocks = blocks_from(&line("Câu 3. x"));
        relabel_question(&mut blocks[0], 3, &plain_style());
        relabel_question(&mut blocks[0], 3, &plain_style());
        assert_eq!(blocks[0].visible_text(), "Câu 3. x");
    }

    #[test]
    fn test_relabel_options_by_position() {
        let mut segments = segment(blocks_from(
            &[
                line("Câu 1. x"),
                line("C. ba"),
                para(&[plain("A"), plain(") một")]),
                line("D. bốn"),
                line("B. hai"),
            ]
            .concat(),
        ));
        let group = &mut segments.groups[0];
        assert_eq!(relabel_options(group, LabelKind::McqOption, &plain_style()), 4);
        let texts: Vec<String> = group.blocks().iter().map(Block::visible_text).collect();
        assert_eq!(texts, vec!["Câu 1. x", "A. ba", "B. một", "C. bốn", "D. hai"]);
    }

    #[test]
    fn test_relabel_tf_options_keeps_paren() {
        let mut segments = segment(blocks_from(
            &[line("Câu 1. x"), line("c) ba"), line("a) một"), para(&[plain("d"), plain(") bốn")])]
                .concat(),
        ));
        let group = &mut segments.groups[0];
        relabel_options(group, LabelKind::TfOption, &plain_style());
        let texts: Vec<String> = group.blocks().iter().map(Block::visible_text).collect();
        assert_eq!(texts, vec!["Câu 1. x", "a) ba", "b) một", "c) bốn"]);
    }

    #[test]
    fn test_repeated_tf_letter_is_not_relabeled() {
        let mut segments = segment(blocks_from(
            &[line("Câu 1. x"), line("b) hai"), line("a) một"), line("b) lặp")].concat(),
        ));
        let group = &mut segments.groups[0];
        assert_eq!(relabel_options(group, LabelKind::TfOption, &plain_style()), 2);
        let texts: Vec<String> = group.blocks().iter().map(Block::visible_text).collect();
        assert_eq!(texts, vec!["Câu 1. x", "a) hai", "b) một", "b) lặp"]);
    }

    #[test]
    fn test_highlight_adds_bold_and_color_in_order() {
        let mut group = QuestionGroup::new(blocks_from(&line("Câu 1. x")).remove(0));
        group.push(blocks_from(&para(&[underlined("B. nội dung")])).remove(0));
        relabel_options(&mut group, LabelKind::McqOption, &LabelStyle::default());

        let option = &group.blocks()[1];
        let runs = option.runs();
        let rpr = runs[0].find_child(W_NS, "rPr").unwrap();
        let names: Vec<&str> = rpr.child_elements().map(XmlElement::local_name).collect();
        assert_eq!(names, vec!["b", "color", "u"]);
        assert_eq!(rpr.find_child(W_NS, "color").unwrap().attr("val"), Some("0000FF"));
        assert_eq!(option.visible_text(), "A. nội dung");
    }

    #[test]
    fn test_mismatched_block_is_left_untouched() {
        let mut blocks = blocks_from(&line("Ghi chú"));
        assert!(!relabel_question(&mut blocks[0], 1, &LabelStyle::default()));
        assert_eq!(blocks[0].visible_text(), "Ghi chú");
        assert!(blocks[0].runs()[0].find_child(W_NS, "rPr").is_none());
    }
}
