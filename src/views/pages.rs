//! HTML page rendering.
//!
//! Templates are compiled into the binary and filled by placeholder
//! substitution. Every interpolated value goes through [`escape_html`].

use crate::models::session::is_sentinel;
use crate::services::gate::SessionView;

const SESSION_TEMPLATE: &str = include_str!("../../templates/session.html");
const EXPIRED_TEMPLATE: &str = include_str!("../../templates/expired.html");
const ERROR_TEMPLATE: &str = include_str!("../../templates/error.html");

/// Escapes text for use in HTML bodies and double-quoted attributes.
///
/// Braces are escaped too so user text can never form a `{{PLACEHOLDER}}`.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            c => out.push(c),
        }
    }
    out
}

/// Escaped button target: sentinels and `http(s)` URLs pass, anything else
/// becomes empty and the button does nothing.
fn button_target(url: &str) -> String {
    let lowered = url.trim_start().to_ascii_lowercase();
    if is_sentinel(url) || lowered.starts_with("https://") || lowered.starts_with("http://") {
        escape_html(url)
    } else {
        String::new()
    }
}

/// Renders the active class page.
#[must_use]
pub fn render_session(view: &SessionView) -> String {
    let session = &view.session;

    let greeting = match session.user_first_name.as_deref() {
        Some(name) if !name.trim().is_empty() => {
            format!(r#"<p class="greeting">Hi {}!</p>"#, escape_html(name))
        }
        _ => String::new(),
    };

    let offline_marker = if session.is_offline { " (Offline)" } else { "" };

    let countdown = match view.time_left {
        Some(left) => format!(
            r#"<p id="countdown" class="countdown" data-seconds="{}">Link expires in {}</p>"#,
            left.total_seconds(),
            left
        ),
        None => String::new(),
    };

    let watch_button = match view.watch_url.as_deref() {
        Some(url) => format!(
            r#"<button class="action" data-target="{}">CLICK TO WATCH CLASS</button>"#,
            button_target(url)
        ),
        None => String::new(),
    };

    SESSION_TEMPLATE
        .replace("{{GREETING}}", &greeting)
        .replace("{{OFFLINE_MARKER}}", offline_marker)
        .replace("{{COUNTDOWN}}", &countdown)
        .replace("{{WATCH_BUTTON}}", &watch_button)
        .replace("{{THUMBNAIL_URL}}", &escape_html(&session.thumbnail_url))
        .replace("{{TEACHER_NAME}}", &escape_html(&session.teacher_name))
        .replace("{{CLASS_NAME}}", &escape_html(&session.class_name))
        .replace("{{LIVE_DATE}}", &escape_html(&view.formatted_date))
        .replace("{{CLASS_MEDIA_URL}}", &button_target(&session.class_media_url))
        .replace("{{SLIDES_URL}}", &button_target(&session.slides_url))
}

/// Renders the expired-link notice.
#[must_use]
pub fn render_expired(marketing_url: &str) -> String {
    EXPIRED_TEMPLATE.replace("{{MARKETING_URL}}", &escape_html(marketing_url))
}

/// Renders the friendly error page.
#[must_use]
pub fn render_error(message: &str) -> String {
    ERROR_TEMPLATE.replace("{{MESSAGE}}", &escape_html(message))
}
