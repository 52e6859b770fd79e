//! Outline renderers.

use super::{BoxNode, Outline, OutputFormat};
use crate::error::Result;

pub fn render(outline: &Outline, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => text(outline),
        OutputFormat::Json => serde_json::to_string_pretty(outline)? + "\n",
        OutputFormat::Xml => xml(outline),
        OutputFormat::Html => html(outline),
    })
}

fn text(outline: &Outline) -> String {
    let mut out = format!("size: {} bytes\n", outline.size);
    if !outline.recognized {
        out.push_str("no ISO base media boxes found\n");
    }
    for node in &outline.boxes {
        text_node(&mut out, node, 0);
    }
    if outline.truncated {
        out.push_str("(outline truncated)\n");
    }
    out
}

fn text_node(out: &mut String, node: &BoxNode, depth: usize) {
    out.push_str(&format!(
        "{:indent$}{} @{} size {}",
        "",
        node.kind,
        node.offset,
        node.size,
        indent = depth * 2
    ));
    if let Some(detail) = &node.detail {
        out.push_str("  ");
        out.push_str(detail);
    }
    out.push('\n');
    for child in &node.children {
        text_node(out, child, depth + 1);
    }
}

fn xml(outline: &Outline) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!(
        "<outline size=\"{}\" recognized=\"{}\" truncated=\"{}\">\n",
        outline.size, outline.recognized, outline.truncated
    ));
    for node in &outline.boxes {
        xml_node(&mut out, node, 1);
    }
    out.push_str("</outline>\n");
    out
}

fn xml_node(out: &mut String, node: &BoxNode, depth: usize) {
    let pad = "  ".repeat(depth);
    out.push_str(&format!(
        "{pad}<box type=\"{}\" offset=\"{}\" size=\"{}\"",
        escape(&node.kind),
        node.offset,
        node.size
    ));
    if let Some(detail) = &node.detail {
        out.push_str(&format!(" detail=\"{}\"", escape(detail)));
    }
    if node.children.is_empty() {
        out.push_str("/>\n");
        return;
    }
    out.push_str(">\n");
    for child in &node.children {
        xml_node(out, child, depth + 1);
    }
    out.push_str(&format!("{pad}</box>\n"));
}

fn html(outline: &Outline) -> String {
    let mut out = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>byteseek outline</title></head>\n<body>\n",
    );
    out.push_str(&format!("<p>size: {} bytes</p>\n", outline.size));
    if !outline.recognized {
        out.push_str("<p>no ISO base media boxes found</p>\n");
    }
    html_list(&mut out, &outline.boxes);
    if outline.truncated {
        out.push_str("<p>(outline truncated)</p>\n");
    }
    out.push_str("</body>\n</html>\n");
    out
}

fn html_list(out: &mut String, nodes: &[BoxNode]) {
    if nodes.is_empty() {
        return;
    }
    out.push_str("<ul>\n");
    for node in nodes {
        out.push_str(&format!(
            "<li><code>{}</code> @{} size {}",
            escape(&node.kind),
            node.offset,
            node.size
        ));
        if let Some(detail) = &node.detail {
            out.push_str(&format!(" <em>{}</em>", escape(detail)));
        }
        out.push('\n');
        html_list(out, &node.children);
        out.push_str("</li>\n");
    }
    out.push_str("</ul>\n");
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
