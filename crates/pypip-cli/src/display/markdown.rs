//! Render markdown package descriptions for the terminal

use colored::*;
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Render markdown as styled plain text
///
/// Headings are bold (level 1 and 2 also underlined with the text color),
/// inline code is cyan, lists get bullets and code blocks are indented.
/// Raw HTML is dropped.
pub fn render_markdown(content: &str) -> String {
    let mut out = String::new();
    let mut lists: Vec<Option<u64>> = Vec::new();
    let mut heading: Option<HeadingLevel> = None;
    let mut emphasis = 0usize;
    let mut in_code_block = false;
    let mut pending_link: Option<String> = None;

    for event in Parser::new_ext(content, Options::all()) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                ensure_blank_line(&mut out);
                heading = Some(level);
            }
            Event::End(TagEnd::Heading(_)) => {
                heading = None;
                out.push('\n');
            }
            Event::Start(Tag::Paragraph) => {
                if lists.is_empty() {
                    ensure_blank_line(&mut out);
                }
            }
            Event::End(TagEnd::Paragraph) => {
                if lists.is_empty() {
                    out.push('\n');
                }
            }
            Event::Start(Tag::List(start)) => {
                if lists.is_empty() {
                    ensure_blank_line(&mut out);
                }
                lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                lists.pop();
            }
            Event::Start(Tag::Item) => {
                ensure_newline(&mut out);
                let depth = lists.len().saturating_sub(1);
                out.push_str(&"  ".repeat(depth));
                match lists.last_mut() {
                    Some(Some(n)) => {
                        out.push_str(&format!("{}. ", n));
                        *n += 1;
                    }
                    _ => out.push_str("• "),
                }
            }
            Event::End(TagEnd::Item) => ensure_newline(&mut out),
            Event::Start(Tag::CodeBlock(_)) => {
                ensure_blank_line(&mut out);
                in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => in_code_block = false,
            Event::Start(Tag::Emphasis) | Event::Start(Tag::Strong) => emphasis += 1,
            Event::End(TagEnd::Emphasis) | Event::End(TagEnd::Strong) => {
                emphasis = emphasis.saturating_sub(1)
            }
            Event::Start(Tag::Link { dest_url, .. }) => pending_link = Some(dest_url.to_string()),
            Event::End(TagEnd::Link) => {
                if let Some(url) = pending_link.take() {
                    out.push_str(&format!(" ({})", url.bright_black()));
                }
            }
            Event::Text(text) if in_code_block => {
                for line in text.lines() {
                    out.push_str(&format!("    {}\n", line.cyan()));
                }
            }
            Event::Text(text) => {
                let styled = match heading {
                    Some(HeadingLevel::H1) | Some(HeadingLevel::H2) => text.bold().underline().to_string(),
                    Some(_) => text.bold().to_string(),
                    None if emphasis > 0 => text.bold().to_string(),
                    None => text.to_string(),
                };
                out.push_str(&styled);
            }
            Event::Code(code) => out.push_str(&code.cyan().to_string()),
            Event::SoftBreak => out.push(' '),
            Event::HardBreak => out.push('\n'),
            Event::Rule => {
                ensure_blank_line(&mut out);
                out.push_str(&"─".repeat(40));
                out.push('\n');
            }
            _ => {}
        }
    }

    out.trim().to_string()
}

fn ensure_newline(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn ensure_blank_line(out: &mut String) {
    if out.is_empty() {
        return;
    }
    ensure_newline(out);
    if !out.ends_with("\n\n") {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_markdown_plain() {
        colored::control::set_override(false);
        let rendered = render_markdown(
            "# Requests\n\n**Requests** is a simple `HTTP` library.\n\n- one\n- two\n\n```python\nimport requests\n```\n\nSee [docs](https://requests.readthedocs.io).\n<img src=\"logo.png\">\n",
        );
        assert_eq!(
            rendered,
            "Requests\n\nRequests is a simple HTTP library.\n\n• one\n• two\n\n    import requests\n\nSee docs (https://requests.readthedocs.io)."
        );
    }

    #[test]
    fn test_render_ordered_list() {
        colored::control::set_override(false);
        assert_eq!(render_markdown("1. first\n2. second\n"), "1. first\n2. second");
    }
}
