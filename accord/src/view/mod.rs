//! Typed view tree rendered to HTML.
//!
//! Render functions build [`Node`] trees. Interactive elements carry
//! [`Handler`]s naming an [`Action`] and the record it targets; these are
//! emitted as `data-*` attributes for the host page to dispatch on, so no
//! callback code is ever embedded in markup.

pub mod labels;
pub mod render;

use crate::schema::{Entity, RecordId};
use std::fmt::{self, Write};

/// What a handler asks the host to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create(Entity),
    View(Entity),
    Edit(Entity),
    Delete(Entity),
    DuplicateEvent,
    PrintReceipt,
    ShowDay,
    GoToPage,
    ViewReport,
    DownloadReport,
    DeleteReport,
    DeleteSchedule,
}

impl Action {
    pub fn name(&self) -> String {
        match self {
            Action::Create(e) => format!("create-{e}"),
            Action::View(e) => format!("view-{e}"),
            Action::Edit(e) => format!("edit-{e}"),
            Action::Delete(e) => format!("delete-{e}"),
            Action::DuplicateEvent => "duplicate-event".into(),
            Action::PrintReceipt => "print-receipt".into(),
            Action::ShowDay => "show-day".into(),
            Action::GoToPage => "go-to-page".into(),
            Action::ViewReport => "view-report".into(),
            Action::DownloadReport => "download-report".into(),
            Action::DeleteReport => "delete-report".into(),
            Action::DeleteSchedule => "delete-schedule".into(),
        }
    }
}

/// An event binding on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handler {
    pub event: &'static str,
    pub action: Action,
    /// Record id, page number or date the action applies to.
    pub target: Option<String>,
}

impl Handler {
    pub fn click(action: Action) -> Self {
        Handler {
            event: "click",
            action,
            target: None,
        }
    }

    pub fn on_record(action: Action, id: RecordId) -> Self {
        Self::click(action).target(id.to_string())
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: &'static str,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, String)>,
    pub handlers: Vec<Handler>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Fragment(Vec<Node>),
}

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta", "link"];

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Element {
            tag,
            classes: Vec::new(),
            attrs: Vec::new(),
            handlers: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn on(mut self, handler: Handler) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children<I, N>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Text(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Text(s)
    }
}

/// Shorthand for `Element::new(tag).class(class)`.
pub fn el(tag: &'static str, class: &str) -> Element {
    let e = Element::new(tag);
    if class.is_empty() {
        e
    } else {
        e.class(class)
    }
}

pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;").replace('\'', "&#39;")
}

impl Node {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) -> fmt::Result {
        match self {
            Node::Text(text) => out.write_str(&escape_text(text)),
            Node::Fragment(nodes) => nodes.iter().try_for_each(|n| n.write_html(out)),
            Node::Element(e) => {
                write!(out, "<{}", e.tag)?;
                if !e.classes.is_empty() {
                    write!(out, " class=\"{}\"", escape_attr(&e.classes.join(" ")))?;
                }
                for (name, value) in &e.attrs {
                    write!(out, " {}=\"{}\"", name, escape_attr(value))?;
                }
                for h in &e.handlers {
                    write!(out, " data-event=\"{}\" data-action=\"{}\"", h.event, h.action.name())?;
                    if let Some(target) = &h.target {
                        write!(out, " data-id=\"{}\"", escape_attr(target))?;
                    }
                }
                out.write_char('>')?;
                if VOID_TAGS.contains(&e.tag) {
                    return Ok(());
                }
                for child in &e.children {
                    child.write_html(out)?;
                }
                write!(out, "</{}>", e.tag)
            }
        }
    }

    /// Concatenated text of this subtree.
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(t) => t.clone(),
            Node::Fragment(nodes) => nodes.iter().map(Node::text_content).collect(),
            Node::Element(e) => e.children.iter().map(Node::text_content).collect(),
        }
    }

    /// Every element in the subtree carrying `class`, in document order.
    pub fn find_class(&self, class: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_class(class, &mut found);
        found
    }

    fn collect_class<'a>(&'a self, class: &str, found: &mut Vec<&'a Element>) {
        match self {
            Node::Text(_) => {}
            Node::Fragment(nodes) => nodes.iter().for_each(|n| n.collect_class(class, found)),
            Node::Element(e) => {
                if e.has_class(class) {
                    found.push(e);
                }
                e.children.iter().for_each(|n| n.collect_class(class, found));
            }
        }
    }

    /// Every handler in the subtree, in document order.
    pub fn handlers(&self) -> Vec<&Handler> {
        match self {
            Node::Text(_) => Vec::new(),
            Node::Fragment(nodes) => nodes.iter().flat_map(Node::handlers).collect(),
            Node::Element(e) => e
                .handlers
                .iter()
                .chain(e.children.iter().flat_map(Node::handlers))
                .collect(),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_text_and_attributes() {
        let node: Node = el("p", "note")
            .attr("title", "\"quoted\" & <b>")
            .text("<script>alert('x')</script>")
            .into();
        assert_eq!(
            node.to_html(),
            concat!(
                "<p class=\"note\" title=\"&quot;quoted&quot; &amp; &lt;b&gt;\">",
                "&lt;script&gt;alert('x')&lt;/script&gt;</p>",
            )
        );
    }

    #[test]
    fn test_handlers_render_as_data_attributes() {
        let node: Node = el("button", "btn")
            .on(Handler::on_record(Action::Delete(Entity::Member), 42))
            .text("Delete")
            .into();
        assert_eq!(
            node.to_html(),
            concat!(
                "<button class=\"btn\" data-event=\"click\" ",
                "data-action=\"delete-member\" data-id=\"42\">Delete</button>",
            )
        );
        assert!(!node.to_html().contains("onclick"));
    }

    #[test]
    fn test_void_elements_and_fragments() {
        let node = Node::Fragment(vec![
            Element::new("meta").attr("charset", "utf-8").into(),
            "a".into(),
            Element::new("br").into(),
        ]);
        assert_eq!(node.to_html(), "<meta charset=\"utf-8\">a<br>");
    }

    #[test]
    fn test_queries() {
        let node: Node = el("div", "list")
            .child(el("span", "item").text("one"))
            .child(el("span", "item").text("two").on(Handler::click(Action::ShowDay)))
            .into();
        assert_eq!(node.find_class("item").len(), 2);
        assert_eq!(node.text_content(), "onetwo");
        assert_eq!(node.handlers().len(), 1);
    }
}
