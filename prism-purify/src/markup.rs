//! HTML detection and conversion.
//!
//! Two output modes: plain text (tags dropped, text content kept) and a
//! lightweight Markdown rendering that preserves headings, emphasis, links,
//! lists, and code blocks. Both modes re-escape `<` in text content so the
//! converted output never parses as markup again.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node};

static RE_MARKUP: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"</?[a-zA-Z][^>\n]{0,256}>|<!--").ok());

/// Content inside these elements is invisible in a rendered page and never
/// belongs in model context.
const SKIP_TAGS: [&str; 5] = ["script", "style", "noscript", "svg", "head"];

/// Elements that terminate a line in plain-text mode.
const BLOCK_TAGS: [&str; 19] = [
    "p", "div", "section", "article", "main", "header", "footer", "br", "hr", "li", "ul", "ol",
    "h1", "h2", "h3", "h4", "h5", "h6", "blockquote",
];

pub(crate) fn contains_markup(text: &str) -> bool {
    RE_MARKUP.as_ref().map_or(false, |re| re.is_match(text))
}

/// Convert HTML to plain text: tag structure is discarded, block elements
/// become line breaks, and whitespace is normalized.
pub(crate) fn to_plain_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut parts = Vec::new();
    collect_text(doc.root_element(), &mut parts);
    clean_whitespace(&parts.join(" "))
}

/// Convert HTML to Markdown, keeping the structural elements a model can
/// still make use of.
pub(crate) fn to_markdown(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut out = String::new();
    render_children(doc.root_element(), &mut out);
    finalize(&out)
}

fn collect_text(element: ElementRef<'_>, parts: &mut Vec<String>) {
    let tag = element.value().name();
    if SKIP_TAGS.contains(&tag) {
        return;
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    parts.push(escape_angle(trimmed));
                }
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, parts);
                }
            }
            _ => {}
        }
    }
    if BLOCK_TAGS.contains(&tag) {
        parts.push("\n".to_string());
    }
}

fn render_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_text(out, text),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    render_element(child_el, out);
                }
            }
            _ => {}
        }
    }
}

fn render_element(element: ElementRef<'_>, out: &mut String) {
    let tag = element.value().name();
    if SKIP_TAGS.contains(&tag) {
        return;
    }
    match tag {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = tag[1..].parse::<usize>().unwrap_or(1);
            let inner = render_inline(element);
            if !inner.is_empty() {
                out.push_str("\n\n");
                for _ in 0..level {
                    out.push('#');
                }
                out.push(' ');
                out.push_str(&inner);
                out.push_str("\n\n");
            }
        }
        "p" | "div" | "section" | "article" | "main" | "header" | "footer" | "figure"
        | "figcaption" | "table" | "tr" => {
            out.push_str("\n\n");
            render_children(element, out);
            out.push_str("\n\n");
        }
        "br" => out.push('\n'),
        "hr" => out.push_str("\n\n---\n\n"),
        "strong" | "b" => {
            let inner = render_inline(element);
            if !inner.is_empty() {
                out.push_str("**");
                out.push_str(&inner);
                out.push_str("**");
            }
        }
        "em" | "i" => {
            let inner = render_inline(element);
            if !inner.is_empty() {
                out.push('*');
                out.push_str(&inner);
                out.push('*');
            }
        }
        "a" => {
            let inner = render_inline(element);
            match element.value().attr("href") {
                Some(href) if !href.is_empty() && !inner.is_empty() => {
                    out.push('[');
                    out.push_str(&inner);
                    out.push_str("](");
                    out.push_str(href);
                    out.push(')');
                }
                _ => out.push_str(&inner),
            }
        }
        "code" => {
            let inner: String = element.text().collect();
            let inner = inner.trim();
            if !inner.is_empty() {
                out.push('`');
                out.push_str(&escape_angle(inner));
                out.push('`');
            }
        }
        "pre" => {
            let inner: String = element.text().collect();
            out.push_str("\n\n```\n");
            out.push_str(&escape_angle(inner.trim_matches('\n')));
            out.push_str("\n```\n\n");
        }
        "ul" => {
            out.push_str("\n\n");
            for item in list_items(element) {
                out.push_str("- ");
                out.push_str(&item);
                out.push('\n');
            }
            out.push('\n');
        }
        "ol" => {
            out.push_str("\n\n");
            for (n, item) in list_items(element).into_iter().enumerate() {
                out.push_str(&(n + 1).to_string());
                out.push_str(". ");
                out.push_str(&item);
                out.push('\n');
            }
            out.push('\n');
        }
        "li" => {
            // Stray list item without a surrounding list.
            let inner = render_inline(element);
            if !inner.is_empty() {
                out.push_str("\n- ");
                out.push_str(&inner);
                out.push('\n');
            }
        }
        "blockquote" => {
            let inner = render_inline(element);
            if !inner.is_empty() {
                out.push_str("\n\n> ");
                out.push_str(&inner);
                out.push_str("\n\n");
            }
        }
        "img" => {
            if let Some(alt) = element.value().attr("alt") {
                push_text(out, alt);
            }
        }
        _ => render_children(element, out),
    }
}

fn list_items(element: ElementRef<'_>) -> Vec<String> {
    let mut items = Vec::new();
    for child in element.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            if child_el.value().name() == "li" {
                let inner = render_inline(child_el);
                if !inner.is_empty() {
                    items.push(inner);
                }
            }
        }
    }
    items
}

/// Render an element's children and collapse the result onto one line.
fn render_inline(element: ElementRef<'_>) -> String {
    let mut tmp = String::new();
    render_children(element, &mut tmp);
    collapse_inline(&tmp)
}

/// Append a text node, collapsing internal whitespace while keeping a single
/// boundary space where the source had one.
fn push_text(out: &mut String, raw: &str) {
    if raw.is_empty() {
        return;
    }
    let collapsed = collapse_inline(raw);
    if collapsed.is_empty() {
        if !out.is_empty() && !out.ends_with(char::is_whitespace) {
            out.push(' ');
        }
        return;
    }
    if raw.starts_with(char::is_whitespace) && !out.is_empty() && !out.ends_with(char::is_whitespace)
    {
        out.push(' ');
    }
    out.push_str(&escape_angle(&collapsed));
    if raw.ends_with(char::is_whitespace) {
        out.push(' ');
    }
}

fn collapse_inline(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn escape_angle(text: &str) -> String {
    text.replace('<', "&lt;")
}

/// Collapse runs of blank lines to a single blank line and strip trailing
/// whitespace from every line.
fn finalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0u32;
    for line in raw.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if blank_run > 0 {
                out.push('\n');
            }
        }
        blank_run = 0;
        out.push_str(line);
    }
    out
}

fn clean_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newline_run = 0u32;
    let mut pending_space = false;
    for c in text.chars() {
        if c == '\n' {
            if newline_run < 2 {
                out.push('\n');
            }
            newline_run += 1;
            pending_space = false;
        } else if c.is_whitespace() {
            pending_space = true;
        } else {
            if pending_space && newline_run == 0 && !out.is_empty() {
                out.push(' ');
            }
            out.push(c);
            newline_run = 0;
            pending_space = false;
        }
    }
    out.trim_matches('\n').to_string()
}
