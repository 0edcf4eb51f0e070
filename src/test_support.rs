//! 单元测试用的 WordprocessingML 片段构造工具

use crate::infrastructure::xml_tree::XmlDocument;
use crate::models::block::{Block, BlockTree};

pub const W_DECL: &str =
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

/// 普通 run
pub fn plain(text: &str) -> String {
    format!(r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, text)
}

/// 带下划线的 run
pub fn underlined(text: &str) -> String {
    format!(
        r#"<w:r><w:rPr><w:u w:val="single"/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
        text
    )
}

pub fn para(runs: &[String]) -> String {
    format!("<w:p>{}</w:p>", runs.concat())
}

/// 单个普通 run 组成的段落
pub fn line(text: &str) -> String {
    para(&[plain(text)])
}

pub fn body_document(inner: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {}><w:body>{}</w:body></w:document>"#,
        W_DECL, inner
    )
}

pub fn blocks_from(inner: &str) -> Vec<Block> {
    let doc = XmlDocument::parse(&body_document(inner)).expect("测试文档应能解析");
    let mut tree = BlockTree::from_document(doc).expect("测试文档应有 body");
    tree.take_blocks()
}

pub fn texts(blocks: &[Block]) -> Vec<String> {
    blocks.iter().map(Block::visible_text).collect()
}
