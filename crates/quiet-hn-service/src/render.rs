use std::fmt::Write;

use quiet_hn_api::{Story, TopStoriesPage};

const HEAD: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Quiet Hacker News</title>
    <style>
      body { padding: 20px; font-family: sans-serif; }
      body, a { color: #333; }
      li { padding: 4px 0; }
      .host { color: #888; }
      .meta { color: #888; font-size: 0.8em; }
      .time { color: #888; padding: 10px; }
      .footer, .footer a { color: #888; }
    </style>
  </head>
  <body>
    <h1>Quiet Hacker News</h1>
    <ol>
"#;

pub fn page(page: &TopStoriesPage) -> String {
    let mut html = String::from(HEAD);
    for story in &page.stories {
        story_item(&mut html, story);
    }
    let _ = write!(
        html,
        "    </ol>\n    <p class=\"time\">This page was rendered in {:.2?}</p>\n    \
         <p class=\"footer\">Stories from <a href=\"https://news.ycombinator.com\">Hacker News</a>, \
         without the comments.</p>\n  </body>\n</html>\n",
        page.latency
    );
    html
}

fn story_item(html: &mut String, story: &Story) {
    let record = &story.record;
    let title = record.title.as_deref().unwrap_or("(untitled)");
    let url = record.url.as_deref().unwrap_or_default();
    let _ = write!(html, "      <li><a href=\"{}\">{}</a>", escape(url), escape(title));
    if let Some(host) = &story.host {
        let _ = write!(html, " <span class=\"host\">({})</span>", escape(host));
    }
    let by = record.by.as_deref().unwrap_or("unknown");
    let _ = writeln!(
        html,
        "<br><span class=\"meta\">{} points by {}</span></li>",
        record.score,
        escape(by)
    );
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
