//! Server-rendered page for a session.
//!
//! One page per state: the input affordances are always present, the rest
//! depends on where the session's controller is.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use finsight_core::{PromptOutcome, TriggerPolicy, ACCESS_HINT, ANALYSIS_FAILED_MESSAGE};
use finsight_logging::redact_sensitive_data;
use finsight_markdown::Renderer;

use crate::controller::SessionState;
use crate::pipeline::{CycleReport, SpeechOutcome};

pub const TITLE: &str = "Fish Species Identifier";
pub const SUBTITLE: &str = "Take a picture or upload an image to identify fish species!";
pub const PREVIEW_CAPTION: &str = "Uploaded Image";
pub const BUSY_TEXT: &str = "Analyzing image...";
pub const RESULT_HEADING: &str = "Analysis Result:";

/// Seconds between reloads while a cycle is in flight.
const REFRESH_SECS: u32 = 2;

const STYLE: &str = "body{font-family:sans-serif;max-width:46rem;margin:2rem auto;padding:0 1rem}\
figure{margin:1rem 0}img{max-width:100%}figcaption{color:#666;text-align:center}\
.error{background:#fde8e8;color:#8a1c1c;padding:.6rem 1rem;border-radius:.3rem;margin:.5rem 0}\
.warning{background:#fff6db;color:#6b4e00;padding:.6rem 1rem;border-radius:.3rem;margin:.5rem 0}\
.busy{color:#0b5cad;font-weight:bold}";

const SHOW_BUSY: &str = "document.getElementById('busy').hidden=false";

pub struct PageView<'a> {
    pub session_id: &'a str,
    pub state: &'a SessionState,
    pub trigger: TriggerPolicy,
    /// One-off error for this response, e.g. an unreadable upload.
    pub notice: Option<&'a str>,
}

pub fn render_page(view: &PageView<'_>) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    if matches!(view.state, SessionState::Analyzing { .. }) {
        html.push_str(&format!(
            "<meta http-equiv=\"refresh\" content=\"{REFRESH_SECS};url=/?session={}\">\n",
            attr(view.session_id)
        ));
    }
    html.push_str(&format!("<title>{TITLE}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n"));
    html.push_str(&format!("<h1>{TITLE}</h1>\n<p>{SUBTITLE}</p>\n"));

    render_capture_form(&mut html, view);

    if let Some(notice) = view.notice {
        error_banner(&mut html, notice);
    }

    if let Some(image) = view.state.image() {
        html.push_str(&format!(
            "<figure><img src=\"{}\" alt=\"{PREVIEW_CAPTION}\"><figcaption>{PREVIEW_CAPTION}</figcaption></figure>\n",
            attr(&image.preview_data_uri())
        ));
    }

    match view.state {
        SessionState::Idle => {}
        SessionState::ImageAcquired { .. } => render_analyze_button(&mut html, view),
        SessionState::Analyzing { .. } => {
            html.push_str(&format!("<p class=\"busy\">{BUSY_TEXT}</p>\n"));
        }
        SessionState::Displaying { report, .. } => {
            render_report(&mut html, report);
            render_analyze_button(&mut html, view);
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_capture_form(html: &mut String, view: &PageView<'_>) {
    let submit = "this.form.requestSubmit()";
    html.push_str(&format!(
        "<form id=\"capture\" action=\"/capture\" method=\"post\" enctype=\"multipart/form-data\"{}>\n",
        match view.trigger {
            TriggerPolicy::Automatic => format!(" onsubmit=\"{SHOW_BUSY}\""),
            TriggerPolicy::Manual => String::new(),
        }
    ));
    hidden_session(html, view.session_id);
    html.push_str(&format!(
        "<p><label>Take a picture <input type=\"file\" name=\"camera\" accept=\"image/*\" capture=\"environment\" onchange=\"{submit}\"></label></p>\n"
    ));
    html.push_str(&format!(
        "<p><label>Or upload an image <input type=\"file\" name=\"upload\" accept=\".jpg,.jpeg,.png\" onchange=\"{submit}\"></label></p>\n"
    ));
    html.push_str("<noscript><button type=\"submit\">Use image</button></noscript>\n</form>\n");
    html.push_str(&format!("<p id=\"busy\" class=\"busy\" hidden>{BUSY_TEXT}</p>\n"));
}

fn render_analyze_button(html: &mut String, view: &PageView<'_>) {
    if view.trigger != TriggerPolicy::Manual {
        return;
    }
    html.push_str(&format!(
        "<form action=\"/analyze\" method=\"post\" onsubmit=\"{SHOW_BUSY}\">\n"
    ));
    hidden_session(html, view.session_id);
    html.push_str("<button type=\"submit\">Analyze Image</button>\n</form>\n");
}

fn render_report(html: &mut String, report: &CycleReport) {
    let analysis = match &report.analysis {
        Ok(analysis) => analysis,
        Err(e) => {
            error_banner(html, &format!("Error analyzing image: {e}"));
            return;
        }
    };

    let body = match &analysis.report.result {
        Ok(markdown) => Renderer::to_html(markdown),
        Err(_) => {
            inference_error(html, &analysis.report);
            format!("<p>{ANALYSIS_FAILED_MESSAGE}</p>\n")
        }
    };
    html.push_str(&format!(
        "<section id=\"result\">\n<h3>{RESULT_HEADING}</h3>\n{body}</section>\n"
    ));

    match &analysis.summary {
        Some(outcome @ PromptOutcome { result: Err(_), .. }) => inference_error(html, outcome),
        Some(PromptOutcome { result: Ok(summary), .. }) => {
            html.push_str(&format!("<p id=\"summary\"><em>{}</em></p>\n", text(summary)));
        }
        None => {}
    }

    match &report.speech {
        SpeechOutcome::Ready(clip) => html.push_str(&format!(
            "<audio id=\"speech\" controls autoplay src=\"{}\"></audio>\n",
            attr(&clip.data_uri())
        )),
        SpeechOutcome::Failed(reason) => html.push_str(&format!(
            "<div class=\"warning\">Could not play the spoken summary: {}</div>\n",
            text(reason)
        )),
        SpeechOutcome::NotRequested | SpeechOutcome::Skipped => {}
    }
}

fn inference_error(html: &mut String, outcome: &PromptOutcome) {
    if let Err(e) = &outcome.result {
        error_banner(html, &format!("Error analyzing image: {e}"));
        error_banner(html, ACCESS_HINT);
    }
}

fn error_banner(html: &mut String, message: &str) {
    html.push_str(&format!(
        "<div class=\"error\">{}</div>\n",
        text(&redact_sensitive_data(message))
    ));
}

fn hidden_session(html: &mut String, session_id: &str) {
    html.push_str(&format!(
        "<input type=\"hidden\" name=\"session_id\" value=\"{}\">\n",
        attr(session_id)
    ));
}
