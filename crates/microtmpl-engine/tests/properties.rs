// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::rc::Rc;

use microtmpl_engine::embed::{blank, build_micro_script, embed_interpolations};
use microtmpl_engine::{
    tokenize, Condition, MicroTemplateService, Span, TemplateSettings, TemplateTag,
};

const DOCUMENTS: &[&str] = &[
    "",
    "plain <b>html</b> only",
    "<%= a %>",
    "<%%><%    %><%\n%>",
    "<ul>\r\n<% for (var i = 0; i < n; i++) { %>\n  <li class=\"<%- cls[i] %>\">ä√😀</li>\r\n<% } %>\u{2028}</ul>",
    "<script>var x = <%= JSON.stringify(data) %>;</script>\n<% // trailing comment %><p><%= y %></p>",
    "<% if (a) { %>one<% } else if (b) { %>two<% } else { %>three<% } %>",
    "<% switch (mode) { case 'a': case 'b': %>ab<% break; case 'c': { %>c<% break; } default: %>d<% } %>",
    "<% switch (k) { case 1: %>\n  <% if (a) { %>\n    <% if (b) { %>x<% } else { %>y<% } %>\n  <% } else { %>z<% } %>\n<% break; default: %>w<% } %>",
];

fn tags(source: &str) -> Vec<TemplateTag> {
    tokenize(source, &TemplateSettings::default()).expect("documents tokenize")
}

#[test]
fn tags_reassemble_the_document() {
    for source in DOCUMENTS {
        let tags = tags(source);
        let mut rebuilt = String::new();
        let mut cursor = 0;
        for tag in &tags {
            assert!(tag.span.start >= cursor, "overlapping tags in {source:?}");
            assert_eq!(tag.open.end, tag.code.start);
            assert_eq!(tag.code.end, tag.close.start);
            rebuilt.push_str(&source[cursor..tag.span.start]);
            rebuilt.push_str(tag.open_text(source));
            rebuilt.push_str(tag.code_text(source));
            rebuilt.push_str(tag.close_text(source));
            cursor = tag.span.end;
        }
        rebuilt.push_str(&source[cursor..]);
        assert_eq!(&rebuilt, source);
    }
}

#[test]
fn every_view_preserves_length_and_line_breaks() {
    let line_breaks = |text: &str| -> Vec<(usize, char)> {
        text.char_indices()
            .filter(|(_, ch)| matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}'))
            .collect()
    };
    for source in DOCUMENTS {
        let tags = tags(source);
        let expected = line_breaks(source);
        let views = [
            blank(source),
            build_micro_script(source, &tags),
            embed_interpolations(source, &tags, &[]),
            embed_interpolations(source, &tags, &[Span::new(0, source.len())]),
        ];
        for view in &views {
            assert_eq!(view.len(), source.len(), "{source:?} -> {view:?}");
            for (offset, ch) in &expected {
                assert!(
                    view[*offset..].starts_with(*ch),
                    "{source:?}: line break at {offset} lost in {view:?}"
                );
            }
        }

        let service = MicroTemplateService::new(source, &TemplateSettings::default());
        assert!(service.parse_errors().is_empty(), "{source:?}: {:?}", service.parse_errors());
        for template in service.all_templates() {
            assert_eq!(template.template().len(), source.len());
        }
    }
}

#[test]
fn negation_is_an_involution() {
    let conditions = [
        Condition::simple("user && user.admin"),
        Condition::comparison("a", "<", "b").expect("comparison"),
        Condition::comparison("x.length", "!==", "0").expect("comparison"),
    ];
    for condition in conditions {
        let twice = condition.not().not();
        assert_eq!(twice.expressions(), condition.expressions());
        assert!(twice.same_constraint(&condition));
        assert!(!condition.not().same_constraint(&condition));
        assert!(Rc::ptr_eq(&condition.not(), &condition.not()));
    }
}

fn letters(template: &str) -> String {
    template.chars().filter(char::is_ascii_alphabetic).collect()
}

#[test]
fn else_if_chains_cover_every_branch() {
    let service = MicroTemplateService::new(DOCUMENTS[6], &TemplateSettings::default());
    let views: Vec<String> = service
        .all_templates()
        .iter()
        .map(|template| letters(template.template()))
        .collect();
    assert_eq!(views, vec!["one", "two", "three"]);
}

#[test]
fn switch_groups_are_disjoint() {
    let service = MicroTemplateService::new(DOCUMENTS[7], &TemplateSettings::default());
    let views: Vec<String> = service
        .all_templates()
        .iter()
        .map(|template| letters(template.template()))
        .collect();
    assert_eq!(views, vec!["ab", "c", "d"]);
}

#[test]
fn path_covered_templates_keep_every_visible_byte() {
    for source in DOCUMENTS {
        let service = MicroTemplateService::new(source, &TemplateSettings::default());
        let tags = service.template_tags();
        for template in service.all_templates() {
            let view = template.template();
            for (idx, byte) in source.bytes().enumerate() {
                if template.is_striped(idx) || tags.iter().any(|tag| tag.span.contains(idx)) {
                    continue;
                }
                assert_eq!(view.as_bytes()[idx], byte, "{source:?}: byte {idx} changed in {view:?}");
            }
        }
    }
}

#[test]
fn nested_branches_need_one_template_per_leaf() {
    let service = MicroTemplateService::new(DOCUMENTS[8], &TemplateSettings::default());
    let templates = service.all_templates();
    assert!(templates.len() <= 4, "{} templates", templates.len());
    let views: Vec<String> = templates
        .iter()
        .map(|template| letters(template.template()))
        .collect();
    assert_eq!(views, vec!["x", "y", "z", "w"]);
}
