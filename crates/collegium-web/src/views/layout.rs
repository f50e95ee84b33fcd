use std::fmt::Write as _;

use axum::response::Html;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::state::Flash;

/// Escape text for use in HTML element content and quoted attributes.
pub fn esc(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
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
    out
}

/// Characters escaped in a path segment or query value: everything except
/// RFC 3986 unreserved characters.
const URL_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode one URL path segment or query value.
pub fn url_encode(text: &str) -> String {
    utf8_percent_encode(text, URL_COMPONENT).to_string()
}

/// Numbers with thousands separators, as shown on the metric cards.
pub fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Top-level page sections, used to highlight the active nav entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Home,
    Colleges,
    Files,
    Stats,
}

const NAV: [(Section, &str, &str); 4] = [
    (Section::Home, "/", "Home"),
    (Section::Colleges, "/colleges", "Colleges"),
    (Section::Files, "/files", "Files"),
    (Section::Stats, "/stats", "Statistics"),
];

fn flash_html(flashes: &[Flash]) -> String {
    let mut out = String::new();
    for f in flashes {
        let _ = write!(
            out,
            r#"<div class="flash {}">{}</div>"#,
            f.kind.css_class(),
            esc(&f.text)
        );
    }
    out
}

/// Full page for a logged-in user.
pub fn page(
    title: &str,
    section: Section,
    username: &str,
    flashes: &[Flash],
    body: &str,
) -> Html<String> {
    let mut nav = String::new();
    for (entry, href, label) in NAV {
        let class = if entry == section { " class=\"active\"" } else { "" };
        let _ = write!(nav, r#"<a href="{href}"{class}>{label}</a>"#);
    }

    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} · College Management</title>
<link rel="stylesheet" href="/static/app.css">
</head>
<body>
<header class="topbar no-print">
  <span class="brand">College Management</span>
  <nav>{nav}</nav>
  <form method="post" action="/logout" class="logout">
    <span>{user}</span>
    <button type="submit">Log out</button>
  </form>
</header>
<main>
{flash}
<h1>{title}</h1>
{body}
</main>
</body>
</html>"#,
        title = esc(title),
        user = esc(username),
        flash = flash_html(flashes),
    ))
}

/// Page without navigation, for the login form and the print view.
pub fn bare_page(title: &str, flashes: &[Flash], body: &str) -> Html<String> {
    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} · College Management</title>
<link rel="stylesheet" href="/static/app.css">
</head>
<body class="bare">
<main>
{flash}
<h1>{title}</h1>
{body}
</main>
</body>
</html>"#,
        title = esc(title),
        flash = flash_html(flashes),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_esc() {
        assert_eq!(esc(r#"<b>"A&B"</b>'"#), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;&#39;");
        assert_eq!(esc("كلية"), "كلية");
    }

    #[test]
    fn test_url_encode() {
        assert_eq!(url_encode("plan v2.pdf"), "plan%20v2.pdf");
        assert_eq!(url_encode("ب"), "%D8%A8");
        assert_eq!(url_encode("a/b?c&d~e"), "a%2Fb%3Fc%26d~e");
    }

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1000), "1,000");
        assert_eq!(group_digits(1_234_567), "1,234,567");
    }
}
