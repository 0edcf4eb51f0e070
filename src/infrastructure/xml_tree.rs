//! 可变 XML 树 - 基础设施层
//!
//! 用 quick-xml 的事件流构建一棵可以原地修改的元素树，再按原样序列化回去。
//! 声明、注释、处理指令、CDATA、空白文本和属性顺序都会保留。
//!
//! 每个元素在解析时解析出命名空间 URI，后续一律按 (命名空间, 本地名) 匹配，
//! 这样公式里的 `m:t` 不会被当成正文的 `w:t`。

use crate::error::DocxError;
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// WordprocessingML 主命名空间
pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
/// `xml:` 前缀固定绑定的命名空间
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    DocType(String),
}

impl XmlNode {
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }

    /// 纯空白文本节点（元素之间的缩进换行）
    pub fn is_blank_text(&self) -> bool {
        matches!(self, XmlNode::Text(t) if t.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// 带前缀的限定名，例如 `w:p`
    pub name: String,
    /// 解析得到的命名空间 URI
    pub namespace: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>, namespace: Option<&str>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.map(str::to_string),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// 在与 `self` 相同的前缀和命名空间下创建一个新元素
    pub fn sibling_kind(&self, local: &str) -> Self {
        let name = match self.prefix() {
            Some(prefix) => format!("{}:{}", prefix, local),
            None => local.to_string(),
        };
        Self::new(name, self.namespace.as_deref())
    }

    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.local_name() == local
    }

    /// 按本地名查找属性（`w:val` 与 `val` 都能命中）
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| local_part(key) == local)
            .map(|(_, value)| value.as_str())
    }

    /// 设置属性，已存在则原位替换
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    /// 按本地名删除属性
    pub fn remove_attr(&mut self, local: &str) {
        self.attributes.retain(|(key, _)| local_part(key) != local);
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    pub fn find_child(&self, namespace: &str, local: &str) -> Option<&XmlElement> {
        self.child_elements().find(|el| el.is(namespace, local))
    }

    pub fn find_child_mut(&mut self, namespace: &str, local: &str) -> Option<&mut XmlElement> {
        self.children
            .iter_mut()
            .filter_map(XmlNode::as_element_mut)
            .find(|el| el.is(namespace, local))
    }

    /// 删除所有匹配的子元素，返回删除数量
    pub fn remove_children(&mut self, namespace: &str, local: &str) -> usize {
        let before = self.children.len();
        self.children
            .retain(|node| !matches!(node, XmlNode::Element(el) if el.is(namespace, local)));
        before - self.children.len()
    }

    /// 深度优先、文档顺序的所有后代元素（不含自身）
    pub fn descendants(&self) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        collect_descendants(self, &mut out);
        out
    }

    /// 满足条件的后代元素路径，路径为逐层的子节点下标
    pub fn descendant_paths<F>(&self, predicate: F) -> Vec<Vec<usize>>
    where
        F: Fn(&XmlElement) -> bool,
    {
        let mut out = Vec::new();
        let mut path = Vec::new();
        collect_paths(self, &predicate, &mut path, &mut out);
        out
    }

    pub fn at_path(&self, path: &[usize]) -> Option<&XmlElement> {
        let mut current = self;
        for &index in path {
            current = current.children.get(index)?.as_element()?;
        }
        Some(current)
    }

    pub fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut XmlElement> {
        let mut current = self;
        for &index in path {
            current = current.children.get_mut(index)?.as_element_mut()?;
        }
        Some(current)
    }

    /// 直接子文本节点的拼接（用于 `w:t` 这类叶子元素）
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(t) | XmlNode::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// 用一个文本节点替换全部子节点
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.children.clear();
        if !text.is_empty() {
            self.children.push(XmlNode::Text(text));
        }
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            write_node(child, out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

fn collect_descendants<'a>(element: &'a XmlElement, out: &mut Vec<&'a XmlElement>) {
    for child in element.child_elements() {
        out.push(child);
        collect_descendants(child, out);
    }
}

fn collect_paths<F>(
    element: &XmlElement,
    predicate: &F,
    path: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) where
    F: Fn(&XmlElement) -> bool,
{
    for (index, node) in element.children.iter().enumerate() {
        if let XmlNode::Element(child) = node {
            path.push(index);
            if predicate(child) {
                out.push(path.clone());
            }
            collect_paths(child, predicate, path, out);
            path.pop();
        }
    }
}

fn write_node(node: &XmlNode, out: &mut String) {
    match node {
        XmlNode::Element(el) => el.write_to(out),
        XmlNode::Text(text) => out.push_str(&partial_escape(text.as_str())),
        XmlNode::CData(text) => {
            out.push_str("<![CDATA[");
            out.push_str(text);
            out.push_str("]]>");
        }
        XmlNode::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        XmlNode::ProcessingInstruction(text) => {
            out.push_str("<?");
            out.push_str(text);
            out.push_str("?>");
        }
        XmlNode::DocType(text) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(text);
            out.push('>');
        }
    }
}

/// 完整的 XML 文档
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    /// `<?xml ...?>` 内部的原始内容
    pub declaration: Option<String>,
    /// 根元素之前的注释 / 处理指令
    pub prolog: Vec<XmlNode>,
    pub root: XmlElement,
}

impl XmlDocument {
    pub fn parse(xml: &str) -> Result<Self, DocxError> {
        let mut reader = Reader::from_str(xml);
        let mut builder = TreeBuilder::default();

        loop {
            match reader.read_event().map_err(DocxError::xml)? {
                Event::Decl(decl) => {
                    builder.declaration = Some(String::from_utf8_lossy(&decl).into_owned());
                }
                Event::Start(start) => {
                    let element = builder.open_element(&start)?;
                    builder.stack.push(element);
                }
                Event::Empty(start) => {
                    let element = builder.open_element(&start)?;
                    builder.scopes.pop();
                    builder.attach(XmlNode::Element(element));
                }
                Event::End(_) => {
                    let element = builder
                        .stack
                        .pop()
                        .ok_or_else(|| DocxError::xml("结束标签没有对应的开始标签"))?;
                    builder.scopes.pop();
                    builder.attach(XmlNode::Element(element));
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(DocxError::xml)?.into_owned();
                    builder.attach(XmlNode::Text(text));
                }
                Event::CData(data) => {
                    builder.attach(XmlNode::CData(String::from_utf8_lossy(&data).into_owned()));
                }
                Event::Comment(comment) => {
                    builder.attach(XmlNode::Comment(
                        String::from_utf8_lossy(&comment).into_owned(),
                    ));
                }
                Event::PI(pi) => {
                    builder.attach(XmlNode::ProcessingInstruction(
                        String::from_utf8_lossy(&pi).into_owned(),
                    ));
                }
                Event::DocType(doctype) => {
                    builder.attach(XmlNode::DocType(
                        String::from_utf8_lossy(&doctype).into_owned(),
                    ));
                }
                Event::Eof => break,
            }
        }

        if !builder.stack.is_empty() {
            return Err(DocxError::xml("文档在元素闭合之前结束"));
        }
        let root = builder
            .root
            .ok_or_else(|| DocxError::xml("文档没有根元素"))?;

        Ok(Self {
            declaration: builder.declaration,
            prolog: builder.prolog,
            root,
        })
    }

    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        if let Some(decl) = &self.declaration {
            out.push_str("<?");
            out.push_str(decl);
            out.push_str("?>");
        }
        for node in &self.prolog {
            write_node(node, &mut out);
        }
        self.root.write_to(&mut out);
        out
    }
}

/// 解析过程中的状态：元素栈 + 命名空间作用域栈
#[derive(Default)]
struct TreeBuilder {
    declaration: Option<String>,
    prolog: Vec<XmlNode>,
    root: Option<XmlElement>,
    stack: Vec<XmlElement>,
    /// 每个打开的元素对应一层 (前缀, URI) 绑定，默认命名空间的前缀为空串
    scopes: Vec<Vec<(String, String)>>,
}

impl TreeBuilder {
    /// 读取开始标签并压入命名空间作用域（调用方负责弹出）
    fn open_element(&mut self, start: &BytesStart) -> Result<XmlElement, DocxError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();

        let mut attributes = Vec::new();
        let mut bindings = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(DocxError::xml)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(DocxError::xml)?.into_owned();
            if key == "xmlns" {
                bindings.push((String::new(), value.clone()));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                bindings.push((prefix.to_string(), value.clone()));
            }
            attributes.push((key, value));
        }
        self.scopes.push(bindings);

        let prefix = name.split_once(':').map_or("", |(prefix, _)| prefix);
        let namespace = self.resolve(prefix);

        Ok(XmlElement {
            name,
            namespace,
            attributes,
            children: Vec::new(),
        })
    }

    fn resolve(&self, prefix: &str) -> Option<String> {
        if prefix == "xml" {
            return Some(XML_NS.to_string());
        }
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.clone())
            .filter(|uri| !uri.is_empty())
    }

    fn attach(&mut self, node: XmlNode) {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
            return;
        }
        match node {
            XmlNode::Element(element) if self.root.is_none() => self.root = Some(element),
            // 根元素之后的空白、注释不影响 Word 打开文件，直接丢弃
            _ if self.root.is_some() => {}
            XmlNode::Text(text) if text.trim().is_empty() => {}
            other => self.prolog.push(other),
        }
    }
}
