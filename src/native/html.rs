//! Markup serialization of native subtrees, for inspection and tests.

use super::{Document, NativeId, NativeNode};

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

impl Document {
    /// Markup of `id` including its own tag.
    pub fn outer_html(&self, id: NativeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Markup of the children of `id`.
    ///
    /// An element carrying an `innerHTML` property serializes that raw markup
    /// in place of its children.
    pub fn inner_html(&self, id: NativeId) -> String {
        let mut out = String::new();
        self.write_children(id, &mut out);
        out
    }

    fn write_node(&self, id: NativeId, out: &mut String) {
        match self.node(id) {
            Some(NativeNode::Text(text)) => escape_into(text, false, out),
            Some(NativeNode::Element(el)) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attributes {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        escape_into(value, true, out);
                        out.push('"');
                    }
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&el.tag.as_str()) {
                    return;
                }
                self.write_children(id, out);
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
            Some(NativeNode::Root) => self.write_children(id, out),
            None => {}
        }
    }

    fn write_children(&self, id: NativeId, out: &mut String) {
        if let Some(html) = self.inner_html_property(id) {
            out.push_str(html);
            return;
        }
        for child in self.children(id) {
            self.write_node(child, out);
        }
    }
}

fn escape_into(s: &str, attribute: bool, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}
