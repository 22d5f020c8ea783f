// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::span::Span;

use super::ast::{HtmlDocument, HtmlIssue, HtmlNode, HtmlNodeKind};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const FOREIGN_ELEMENTS: &[&str] = &["svg", "math"];

/// Open elements beyond this depth are kept as childless siblings.
const MAX_OPEN_ELEMENTS: usize = 512;

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Elements whose end tag may be omitted.
const OPTIONAL_END_ELEMENTS: &[&str] = &[
    "html", "head", "body", "p", "li", "dt", "dd", "option", "optgroup", "tr", "td", "th",
    "thead", "tbody", "tfoot", "colgroup", "caption", "rt", "rp",
];

/// Parses an HTML document.
///
/// Parsing never fails: unclosed elements are closed at the end of their
/// parent or of the document, stray end tags are dropped, and each problem is
/// recorded in [`HtmlDocument::issues`].
pub fn parse_html(text: &str) -> HtmlDocument {
    let mut parser = HtmlParser {
        text,
        pos: 0,
        stack: Vec::new(),
        flattened: Vec::new(),
        root: Vec::new(),
        issues: Vec::new(),
    };
    parser.run();
    HtmlDocument {
        root: HtmlNode {
            span: Span::new(0, text.len()),
            kind: HtmlNodeKind::Document {
                children: parser.root,
            },
        },
        issues: parser.issues,
    }
}

struct OpenElement {
    name: String,
    start_tag: Span,
    attributes: Vec<HtmlNode>,
    children: Vec<HtmlNode>,
}

struct HtmlParser<'a> {
    text: &'a str,
    pos: usize,
    stack: Vec<OpenElement>,
    /// Names of start tags past the depth limit still waiting for their end tag.
    flattened: Vec<String>,
    root: Vec<HtmlNode>,
    issues: Vec<HtmlIssue>,
}

impl<'a> HtmlParser<'a> {
    fn run(&mut self) {
        while self.pos < self.text.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.parse_comment();
            } else if rest.starts_with("</") && starts_with_letter(&rest[2..]) {
                self.parse_end_tag();
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                self.parse_doctype();
            } else if rest.starts_with('<') && starts_with_letter(&rest[1..]) {
                self.parse_start_tag();
            } else {
                self.parse_text();
            }
        }
        let end = self.text.len();
        while !self.stack.is_empty() {
            self.report_unclosed_top();
            self.close_top(end, None);
        }
    }

    fn report_unclosed_top(&mut self) {
        let Some(element) = self.stack.last() else {
            return;
        };
        if OPTIONAL_END_ELEMENTS.contains(&element.name.as_str()) {
            return;
        }
        let message = format!("missing end tag for `<{}>`", element.name);
        let span = element.start_tag;
        self.issue(message, span);
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn parse_text(&mut self) {
        let start = self.pos;
        let first_len = self.rest().chars().next().map_or(1, char::len_utf8);
        let end = self.text[start + first_len..]
            .match_indices('<')
            .map(|(idx, _)| start + first_len + idx)
            .find(|&idx| is_markup_start(&self.text[idx..]))
            .unwrap_or(self.text.len());
        self.pos = end;
        self.push_node(HtmlNode {
            span: Span::new(start, end),
            kind: HtmlNodeKind::Text,
        });
    }

    fn parse_comment(&mut self) {
        let start = self.pos;
        let end = match self.text[start + 4..].find("-->") {
            Some(idx) => start + 4 + idx + 3,
            None => {
                self.issue("unterminated comment", Span::new(start, self.text.len()));
                self.text.len()
            }
        };
        self.pos = end;
        self.push_node(HtmlNode {
            span: Span::new(start, end),
            kind: HtmlNodeKind::Comment,
        });
    }

    fn parse_doctype(&mut self) {
        let start = self.pos;
        let end = self.find_tag_end(start);
        self.pos = end;
        self.push_node(HtmlNode {
            span: Span::new(start, end),
            kind: HtmlNodeKind::Doctype,
        });
    }

    /// Offset just past the next `>`, or the end of the text.
    fn find_tag_end(&self, from: usize) -> usize {
        self.text[from..]
            .find('>')
            .map_or(self.text.len(), |idx| from + idx + 1)
    }

    fn read_name(&mut self) -> String {
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
            .unwrap_or(self.rest().len());
        self.pos += len;
        self.text[start..self.pos].to_ascii_lowercase()
    }

    fn parse_end_tag(&mut self) {
        let start = self.pos;
        self.pos += 2;
        let name = self.read_name();
        let end = self.find_tag_end(self.pos);
        self.pos = end;
        let end_tag = Span::new(start, end);

        if self.flattened.last().is_some_and(|open| *open == name) {
            self.flattened.pop();
            return;
        }
        let Some(idx) = self.stack.iter().rposition(|element| element.name == name) else {
            self.issue(format!("unexpected end tag `</{name}>`"), end_tag);
            return;
        };
        self.flattened.clear();
        while self.stack.len() > idx + 1 {
            self.report_unclosed_top();
            self.close_top(start, None);
        }
        self.close_top(end, Some(end_tag));
    }

    fn parse_start_tag(&mut self) {
        let start = self.pos;
        self.pos += 1;
        let name = self.read_name();
        let mut attributes = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                self.issue(
                    format!("unterminated start tag `<{name}>`"),
                    Span::new(start, self.text.len()),
                );
                break;
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                self_closing = true;
                break;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }
            attributes.push(self.parse_attribute());
        }

        let start_tag = Span::new(start, self.pos);
        self.close_implied(&name, start);

        // `/>` only closes void and foreign elements, as in browsers.
        let foreign = FOREIGN_ELEMENTS.contains(&name.as_str())
            || self
                .stack
                .iter()
                .any(|element| FOREIGN_ELEMENTS.contains(&element.name.as_str()));
        if (self_closing && foreign) || VOID_ELEMENTS.contains(&name.as_str()) {
            self.push_leaf(name, start_tag, attributes);
            return;
        }
        if self.stack.len() >= MAX_OPEN_ELEMENTS && !RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            if self.flattened.is_empty() {
                self.issue(
                    format!("elements nested deeper than {MAX_OPEN_ELEMENTS} levels are flattened"),
                    start_tag,
                );
            }
            self.flattened.push(name.clone());
            self.push_leaf(name, start_tag, attributes);
            return;
        }

        self.stack.push(OpenElement {
            name,
            start_tag,
            attributes,
            children: Vec::new(),
        });

        let is_raw_text = self
            .stack
            .last()
            .is_some_and(|element| RAW_TEXT_ELEMENTS.contains(&element.name.as_str()));
        if is_raw_text {
            self.parse_raw_text();
        }
    }

    /// Body of `<script>` and friends runs up to the matching end tag.
    fn parse_raw_text(&mut self) {
        let Some(name) = self.stack.last().map(|element| element.name.clone()) else {
            return;
        };
        let closing = format!("</{name}");
        let body_start = self.pos;
        let body_end = self
            .rest()
            .to_ascii_lowercase()
            .find(&closing)
            .map_or(self.text.len(), |idx| body_start + idx);
        if body_end > body_start {
            self.push_node(HtmlNode {
                span: Span::new(body_start, body_end),
                kind: HtmlNodeKind::Text,
            });
        }
        self.pos = body_end;
        if body_end < self.text.len() {
            self.parse_end_tag();
        }
    }

    fn parse_attribute(&mut self) -> HtmlNode {
        let name_start = self.pos;
        let first_len = self.rest().chars().next().map_or(0, char::len_utf8);
        let len = self.rest()[first_len..]
            .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
            .map_or(self.rest().len(), |idx| first_len + idx);
        self.pos += len;
        let name_span = Span::new(name_start, self.pos);
        let name = self.text[name_start..self.pos].to_ascii_lowercase();

        let after_name = self.pos;
        self.skip_whitespace();
        if !self.rest().starts_with('=') {
            self.pos = after_name;
            return HtmlNode {
                span: name_span,
                kind: HtmlNodeKind::Attribute {
                    name,
                    name_span,
                    value: None,
                    value_span: None,
                },
            };
        }
        self.pos += 1;
        self.skip_whitespace();

        let rest = self.rest();
        let (value_span, end) = match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let value_start = self.pos + 1;
                match self.text[value_start..].find(quote) {
                    Some(idx) => (
                        Span::new(value_start, value_start + idx),
                        value_start + idx + 1,
                    ),
                    None => {
                        self.issue(
                            "unterminated attribute value",
                            Span::new(self.pos, self.text.len()),
                        );
                        (
                            Span::new(value_start, self.text.len()),
                            self.text.len(),
                        )
                    }
                }
            }
            _ => {
                let len = rest
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                (Span::new(self.pos, self.pos + len), self.pos + len)
            }
        };
        self.pos = end;
        HtmlNode {
            span: Span::new(name_start, end),
            kind: HtmlNodeKind::Attribute {
                name,
                name_span,
                value: Some(self.text[value_span.start..value_span.end].to_string()),
                value_span: Some(value_span),
            },
        }
    }

    /// `<li>` closes an open `<li>`, `<td>` an open `<td>` or `<th>`, and so on.
    fn close_implied(&mut self, name: &str, at: usize) {
        let closes = |open: &str| match name {
            "li" | "p" | "option" | "tr" => open == name,
            "td" | "th" => open == "td" || open == "th",
            "dt" | "dd" => open == "dt" || open == "dd",
            _ => false,
        };
        if self.stack.last().is_some_and(|element| closes(&element.name)) {
            self.close_top(at, None);
        }
    }

    fn close_top(&mut self, end: usize, end_tag: Option<Span>) {
        let Some(element) = self.stack.pop() else {
            return;
        };
        let span = Span::new(element.start_tag.start, end.max(element.start_tag.end));
        self.push_node(HtmlNode {
            span,
            kind: HtmlNodeKind::Element {
                name: element.name,
                start_tag: element.start_tag,
                attributes: element.attributes,
                children: element.children,
                end_tag,
            },
        });
    }

    fn push_leaf(&mut self, name: String, start_tag: Span, attributes: Vec<HtmlNode>) {
        self.push_node(HtmlNode {
            span: start_tag,
            kind: HtmlNodeKind::Element {
                name,
                start_tag,
                attributes,
                children: Vec::new(),
                end_tag: None,
            },
        });
    }

    fn push_node(&mut self, node: HtmlNode) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.push(node),
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn issue(&mut self, message: impl Into<String>, span: Span) {
        self.issues.push(HtmlIssue {
            message: message.into(),
            span,
        });
    }
}

fn starts_with_letter(text: &str) -> bool {
    text.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

fn is_markup_start(text: &str) -> bool {
    text.starts_with("<!")
        || text.starts_with("<?")
        || (text.starts_with("</") && starts_with_letter(&text[2..]))
        || (text.starts_with('<') && starts_with_letter(&text[1..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traverse::TreeNode;

    fn types(nodes: &[HtmlNode]) -> Vec<&'static str> {
        nodes.iter().map(TreeNode::node_type).collect()
    }

    #[test]
    fn parses_elements_attributes_and_comments() {
        let source = "<!DOCTYPE html><div id=\"a\" hidden class=x><p>Hi</p><!-- c --></div>";
        let document = parse_html(source);
        assert!(document.issues.is_empty());
        let children = document.root.children();
        assert_eq!(types(children), vec!["Doctype", "Element"]);

        let div = &children[1];
        assert_eq!(div.element_name(), Some("div"));
        assert_eq!(div.span, Span::new(15, source.len()));
        let names: Vec<_> = div
            .attributes()
            .iter()
            .map(|attr| match &attr.kind {
                HtmlNodeKind::Attribute { name, value, .. } => (name.as_str(), value.as_deref()),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(
            names,
            vec![("id", Some("a")), ("hidden", None), ("class", Some("x"))]
        );
        assert_eq!(types(div.children()), vec!["Element", "Comment"]);
        assert_eq!(div.children()[0].children()[0].text(source), "Hi");
    }

    #[test]
    fn reports_unclosed_and_stray_end_tags() {
        let source = "<div><span></div></p>";
        let document = parse_html(source);
        let messages: Vec<_> = document
            .issues
            .iter()
            .map(|issue| (issue.message.as_str(), issue.span))
            .collect();
        assert_eq!(
            messages,
            vec![
                ("missing end tag for `<span>`", Span::new(5, 11)),
                ("unexpected end tag `</p>`", Span::new(17, 21)),
            ]
        );
        let div = &document.root.children()[0];
        assert_eq!(div.span, Span::new(0, 17));
        assert_eq!(div.children()[0].span, Span::new(5, 11));
    }

    #[test]
    fn raw_text_elements_keep_markup_as_text() {
        let source = "<script>if (a < b && c<d) {}</script><p>x";
        let document = parse_html(source);
        let script = &document.root.children()[0];
        assert_eq!(types(script.children()), vec!["Text"]);
        assert_eq!(
            script.children()[0].text(source),
            "if (a < b && c<d) {}"
        );
        assert!(document.issues.is_empty());
    }

    #[test]
    fn optional_end_tags_are_implied() {
        let document = parse_html("<ul><li>a<li>b</ul><br><img src=x />");
        assert!(document.issues.is_empty());
        let list = &document.root.children()[0];
        assert_eq!(types(list.children()), vec!["Element", "Element"]);
        assert_eq!(types(document.root.children()), vec!["Element", "Element", "Element"]);
    }

    #[test]
    fn embedded_tag_comments_are_plain_attributes() {
        let document = parse_html("<div /*       */>x</div>");
        assert!(document.issues.is_empty());
        let div = &document.root.children()[0];
        assert_eq!(div.attributes().len(), 2);
        assert_eq!(div.children()[0].text("<div /*       */>x</div>"), "x");
    }

    #[test]
    fn self_closing_applies_to_foreign_elements_only() {
        let source = "<svg><path d=x /></svg><div/>y</div>";
        let document = parse_html(source);
        assert!(document.issues.is_empty());
        let svg = &document.root.children()[0];
        assert_eq!(types(svg.children()), vec!["Element"]);
        let div = &document.root.children()[1];
        assert_eq!(div.children()[0].text(source), "y");
    }

    #[test]
    fn deep_nesting_is_flattened_past_the_limit() {
        let depth = 5_000;
        let source = format!("{}x{}", "<div>".repeat(depth), "</div>".repeat(depth));
        let document = parse_html(&source);
        let messages: Vec<_> = document.issues.iter().map(|issue| issue.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["elements nested deeper than 512 levels are flattened"]
        );
        assert_eq!(
            document.issues[0].span,
            Span::new(MAX_OPEN_ELEMENTS * 5, MAX_OPEN_ELEMENTS * 5 + 5)
        );

        let mut deepest = 0;
        let mut node = &document.root;
        while let Some(first) = node.children().first() {
            deepest += 1;
            node = first;
        }
        assert_eq!(deepest, MAX_OPEN_ELEMENTS + 1);

        let mut elements = 0;
        let mut visitor = crate::traverse::EnterFn(|node: &HtmlNode, _parent: Option<&HtmlNode>| {
            if node.element_name().is_some() {
                elements += 1;
            }
            crate::traverse::VisitAction::Continue
        });
        crate::traverse::traverse(&document.root, crate::html::html_visitor_keys(), &mut visitor);
        assert_eq!(elements, depth);
    }
}
