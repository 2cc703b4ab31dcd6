//! Renderers for model-produced markdown.

use pulldown_cmark::{html, Event, Options, Parser};

pub struct Renderer;

impl Renderer {
    /// Renders markdown to an HTML fragment. Embedded HTML is escaped.
    pub fn to_html(markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);

        let events = Parser::new_ext(markdown, options).map(|event| match event {
            Event::Html(raw) => Event::Text(raw),
            other => other,
        });

        let mut output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut output, events);
        output
    }
}
