//! 基础设施层：docx 归档与 XML 树，只暴露能力，不含业务判断

pub mod docx_package;
pub mod xml_tree;

pub use docx_package::{DocxPackage, DOCUMENT_PART};
pub use xml_tree::{XmlDocument, XmlElement, XmlNode, W_NS};
