//! XML format implementation.
//!
//! Elements decode to mappings: attributes become `@name` keys, text next to
//! child elements becomes `#text`, repeated child tags collapse into a list
//! and leaf text is typed with [`Scalar::infer`].

use std::io::Write;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::{DecodeContext, Format, FormatError, FormatKind};
use crate::config::{ProcessingMode, XmlOptions};
use crate::tree::{Mapping, Scalar, TreeValue};

const TEXT_KEY: &str = "#text";
const ATTR_PREFIX: char = '@';

/// XML documents via the quick-xml event reader and writer.
#[derive(Debug, Clone, Default)]
pub struct XmlFormat {
    options: XmlOptions,
}

impl XmlFormat {
    pub fn new(options: XmlOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &XmlOptions {
        &self.options
    }
}

fn syntax(e: impl std::fmt::Display) -> FormatError {
    FormatError::Syntax(e.to_string())
}

/// An element being assembled while its children are read.
struct Node {
    tag: String,
    attrs: Vec<(String, TreeValue)>,
    children: Vec<(String, TreeValue)>,
    text: String,
}

impl Node {
    fn open(start: &BytesStart<'_>) -> Result<Self, FormatError> {
        let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(syntax)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&attr.value);
            let value = unescape(&raw).map_err(syntax)?;
            attrs.push((format!("{ATTR_PREFIX}{key}"), TreeValue::Scalar(Scalar::infer(&value))));
        }
        Ok(Self {
            tag,
            attrs,
            children: Vec::new(),
            text: String::new(),
        })
    }

    fn into_value(self) -> TreeValue {
        if self.attrs.is_empty() && self.children.is_empty() {
            return TreeValue::Scalar(Scalar::infer(self.text.trim()));
        }
        let mut map: Mapping = self.attrs.into_iter().collect();
        for (tag, value) in self.children {
            match map.get_mut(&tag) {
                Some(TreeValue::Sequence(items)) => items.push(value),
                Some(existing) => {
                    let first = std::mem::take(existing);
                    *existing = TreeValue::Sequence(vec![first, value]);
                }
                None => {
                    map.insert(tag, value);
                }
            }
        }
        let text = self.text.trim();
        if !text.is_empty() {
            map.insert(TEXT_KEY, TreeValue::Scalar(Scalar::infer(text)));
        }
        TreeValue::Mapping(map)
    }

    /// Children of the root as a list of records, in document order.
    fn into_rows(self) -> TreeValue {
        let rows = self
            .children
            .into_iter()
            .map(|(tag, value)| match value {
                TreeValue::Mapping(_) => value,
                other => {
                    let mut map = Mapping::new();
                    map.insert(tag, other);
                    TreeValue::Mapping(map)
                }
            })
            .collect();
        TreeValue::Sequence(rows)
    }
}

fn resolve_reference(name: &str) -> Result<String, FormatError> {
    if let Some(code) = name.strip_prefix('#') {
        let parsed = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => code.parse::<u32>(),
        };
        return parsed
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .ok_or_else(|| FormatError::Syntax(format!("invalid character reference '&{name};'")));
    }
    resolve_predefined_entity(name)
        .map(str::to_string)
        .ok_or_else(|| FormatError::Syntax(format!("unknown entity '&{name};'")))
}

/// Parse a document into its root element (closed) node.
fn parse_root(text: &str) -> Result<Node, FormatError> {
    let mut reader = Reader::from_str(text);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        match reader.read_event().map_err(syntax)? {
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err(FormatError::Syntax("document has more than one root element".into()));
                }
                stack.push(Node::open(&start)?);
            }
            Event::Empty(start) => {
                let node = Node::open(&start)?;
                match stack.last_mut() {
                    Some(parent) => {
                        let tag = node.tag.clone();
                        parent.children.push((tag, node.into_value()));
                    }
                    None if root.is_none() => root = Some(node),
                    None => {
                        return Err(FormatError::Syntax(
                            "document has more than one root element".into(),
                        ));
                    }
                }
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| FormatError::Syntax("unexpected closing tag".into()))?;
                match stack.last_mut() {
                    Some(parent) => {
                        let tag = node.tag.clone();
                        parent.children.push((tag, node.into_value()));
                    }
                    None => root = Some(node),
                }
            }
            Event::Text(t) => {
                let raw = String::from_utf8_lossy(&t);
                let value = unescape(&raw).map_err(syntax)?;
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&value);
                }
            }
            Event::CData(data) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::GeneralRef(reference) => {
                let name = String::from_utf8_lossy(&reference).into_owned();
                let resolved = resolve_reference(&name)?;
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(FormatError::Syntax(format!("unclosed element <{}>", open.tag)));
    }
    root.ok_or_else(|| FormatError::Syntax("document has no root element".into()))
}

/// Refuse names a reader could not parse back, such as `first name`.
fn check_name(name: &str) -> Result<(), FormatError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_alphabetic() || first == '_' || first == ':')
                && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.'))
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(FormatError::Shape(format!("'{name}' is not a valid XML name")))
    }
}

fn write_element<W: Write>(w: &mut Writer<W>, tag: &str, value: &TreeValue) -> Result<(), FormatError> {
    if !matches!(value, TreeValue::Sequence(_)) {
        check_name(tag)?;
    }
    match value {
        TreeValue::Scalar(Scalar::Null) => {
            w.write_event(Event::Empty(BytesStart::new(tag)))?;
        }
        TreeValue::Scalar(scalar) => {
            w.write_event(Event::Start(BytesStart::new(tag)))?;
            w.write_event(Event::Text(BytesText::new(&scalar.to_text())))?;
            w.write_event(Event::End(BytesEnd::new(tag)))?;
        }
        TreeValue::Sequence(items) => {
            for item in items {
                write_element(w, tag, item)?;
            }
        }
        TreeValue::Mapping(map) => {
            let mut start = BytesStart::new(tag);
            for (key, value) in map.iter() {
                if let Some(name) = key.strip_prefix(ATTR_PREFIX) {
                    check_name(name)?;
                    start.push_attribute((name, value.cell_text().as_str()));
                }
            }
            let mut body = map.iter().filter(|(key, _)| !key.starts_with(ATTR_PREFIX)).peekable();
            if body.peek().is_none() {
                w.write_event(Event::Empty(start))?;
                return Ok(());
            }
            w.write_event(Event::Start(start))?;
            for (key, value) in body {
                if key == TEXT_KEY {
                    w.write_event(Event::Text(BytesText::new(&value.cell_text())))?;
                } else {
                    write_element(w, key, value)?;
                }
            }
            w.write_event(Event::End(BytesEnd::new(tag)))?;
        }
    }
    Ok(())
}

impl Format for XmlFormat {
    fn kind(&self) -> FormatKind {
        FormatKind::Xml
    }

    /// Array mode yields the root's children as records; the other modes
    /// yield the root element's content.
    fn decode(&self, bytes: &[u8], ctx: &DecodeContext<'_>) -> Result<TreeValue, FormatError> {
        let root = parse_root(ctx.text(bytes)?)?;
        Ok(match ctx.mode {
            ProcessingMode::Array => root.into_rows(),
            ProcessingMode::Object | ProcessingMode::Multiline => root.into_value(),
        })
    }

    fn encode(
        &self,
        value: &TreeValue,
        mode: ProcessingMode,
        writer: &mut dyn Write,
    ) -> Result<(), FormatError> {
        let mut w = Writer::new_with_indent(writer, b' ', 2);
        w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        match (mode, value) {
            (ProcessingMode::Array, TreeValue::Sequence(rows)) => {
                check_name(&self.options.root_tag)?;
                w.write_event(Event::Start(BytesStart::new(self.options.root_tag.as_str())))?;
                for row in rows {
                    write_element(&mut w, &self.options.row_tag, row)?;
                }
                w.write_event(Event::End(BytesEnd::new(self.options.root_tag.as_str())))?;
            }
            (ProcessingMode::Array, other) => {
                return Err(FormatError::Shape(format!(
                    "array output requires a list of rows, found a {}",
                    other.type_name()
                )));
            }
            (_, TreeValue::Sequence(_)) => {
                return Err(FormatError::Shape(
                    "object output requires a single record, found a list".into(),
                ));
            }
            (_, record) => write_element(&mut w, &self.options.root_tag, record)?,
        }
        w.into_inner().write_all(b"\n")?;
        Ok(())
    }

    fn encode_lines(&self, records: &[TreeValue], writer: &mut dyn Write) -> Result<(), FormatError> {
        for record in records {
            let mut w = Writer::new(&mut *writer);
            write_element(&mut w, &self.options.row_tag, record)?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }
}
