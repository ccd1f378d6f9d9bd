//! HTML for the board page.
//!
//! Rendering is a pure function of the items and the render time; the time
//! zone of `now` is also the zone item timestamps are shown in.

use std::fmt;

use chrono::{DateTime, TimeZone};

use crate::models::announcement::{Announcement, TEXT_MAX_CHARS, TITLE_MAX_CHARS};

const STYLE: &str = r#"
    body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 24px; }
    .row { display: flex; gap: 12px; align-items: center; flex-wrap: wrap; }
    .card { border: 1px solid #ddd; border-radius: 12px; padding: 14px; margin: 12px 0; }
    .muted { color: #666; font-size: 0.92rem; }
    input, textarea { width: 100%; padding: 10px; border-radius: 10px; border: 1px solid #ccc; box-sizing: border-box; }
    textarea { min-height: 90px; resize: vertical; }
    button { padding: 10px 14px; border-radius: 10px; border: 1px solid #333; background: #111; color: #fff; cursor: pointer; }
    button.secondary { background: #fff; color: #111; border: 1px solid #ccc; }
    .grid { display: grid; grid-template-columns: 1fr; gap: 12px; max-width: 900px; }
    .top { display: flex; justify-content: space-between; align-items: baseline; gap: 12px; flex-wrap: wrap; }
    .badge { display: inline-block; padding: 2px 10px; border-radius: 999px; border: 1px solid #ddd; font-size: 0.85rem; }
    .title { font-size: 1.05rem; font-weight: 650; margin: 0 0 6px 0; }
    .text { white-space: pre-wrap; margin: 0; }
    form { margin: 0; }
"#;

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// `2024-05-01 14:03:07 +02:00`, in the zone of `tz`.
pub fn human_time<Tz>(at: &DateTime<chrono::Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    at.with_timezone(tz).format("%Y-%m-%d %H:%M:%S %Z").to_string()
}

pub fn index_page<Tz>(items: &[Announcement], now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let tz = now.timezone();
    let mut cards = String::new();
    if items.is_empty() {
        cards.push_str(
            r#"      <div class="card">
        <div class="muted">No announcements yet. Add the first one above.</div>
      </div>
"#,
        );
    }
    for item in items {
        cards.push_str(&format!(
            r#"      <div class="card">
        <div class="title">{title}</div>
        <div class="muted">{when}</div>
        <p class="text">{text}</p>
      </div>
"#,
            title = escape_html(&item.title),
            when = human_time(&item.created_at, &tz),
            text = escape_html(&item.text),
        ));
    }

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width,initial-scale=1" />
  <meta http-equiv="refresh" content="60" />
  <title>Announcements Board</title>
  <style>{STYLE}  </style>
</head>
<body>
  <div class="grid">
    <div class="top">
      <div>
        <h1 style="margin:0;">Announcements Board</h1>
        <div class="muted">Auto-refreshes every minute • Last render: {now_human}</div>
      </div>
      <div class="row">
        <span class="badge">{count} item(s)</span>
        <button class="secondary" onclick="window.location.reload()">Refresh now</button>
      </div>
    </div>

    <div class="card">
      <h2 style="margin:0 0 10px 0; font-size:1rem;">Add announcement</h2>
      <form method="post" action="/add">
        <div style="margin-bottom:10px;">
          <label class="muted">Title</label>
          <input name="title" maxlength="{TITLE_MAX_CHARS}" required placeholder="Short title..." />
        </div>
        <div style="margin-bottom:10px;">
          <label class="muted">Text</label>
          <textarea name="text" maxlength="{TEXT_MAX_CHARS}" required placeholder="Write your announcement..."></textarea>
        </div>
        <div class="row">
          <button type="submit">Add</button>
          <span class="muted">Tip: page refreshes automatically every 60s.</span>
        </div>
      </form>
    </div>

{cards}  </div>
</body>
</html>
"#,
        now_human = now.format("%Y-%m-%d %H:%M:%S"),
        count = items.len(),
    )
}
