//! Rendering of the single question page.

const TEMPLATE: &str = include_str!("../../templates/chat.html");

/// Fill the page template, HTML-escaping both values
#[inline]
pub fn render_page(answer: &str, context: &str) -> String {
    let mut out = String::with_capacity(TEMPLATE.len() + answer.len() + context.len());
    let mut rest = TEMPLATE;

    while let Some((before, after)) = rest.split_once("{{") {
        out.push_str(before);
        let Some((name, tail)) = after.split_once("}}") else {
            out.push_str("{{");
            rest = after;
            continue;
        };
        match name.trim() {
            "answer" => escape_into(&mut out, answer),
            "context" => escape_into(&mut out, context),
            _ => {
                out.push_str("{{");
                out.push_str(name);
                out.push_str("}}");
            }
        }
        rest = tail;
    }
    out.push_str(rest);

    out
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}
