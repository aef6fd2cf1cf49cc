//! HTML rendering for the triage table view.

use crate::pipeline::TriageOutput;

/// Escape text for safe embedding in HTML.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Render the triage output as an HTML table page.
///
/// Each non-orphan row carries a delete button that calls `POST
/// /delete/{id}`, removes the row, and decrements the displayed count.
pub fn render_triage_page(output: &TriageOutput) -> String {
    let mut rows = String::new();
    for entry in &output.analyzed_emails {
        let action = if entry.ai_mismatch {
            String::new()
        } else {
            format!(
                r#"<button onclick="deleteEmail('{}', this)">Delete</button>"#,
                escape(&entry.email_id)
            )
        };
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(&entry.subject),
            escape(&entry.from),
            entry.importance.label(),
            if entry.needs_response { "yes" } else { "no" },
            if entry.time_sensitive { "yes" } else { "no" },
            escape(&entry.topics.join(", ")),
            action,
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Email Triage</title>
<style>
body {{ font-family: sans-serif; margin: 2em; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ border: 1px solid #ccc; padding: 6px 10px; text-align: left; }}
th {{ background: #f0f0f0; }}
</style>
</head>
<body>
<h1>Email Triage</h1>
<p><span id="email-count">{count}</span> emails analyzed — last updated {updated}</p>
<table>
<thead>
<tr><th>Subject</th><th>From</th><th>Importance</th><th>Needs response</th><th>Time-sensitive</th><th>Topics</th><th></th></tr>
</thead>
<tbody>
{rows}</tbody>
</table>
<script>
async function deleteEmail(id, button) {{
  const response = await fetch('/delete/' + encodeURIComponent(id), {{ method: 'POST' }});
  if (response.ok) {{
    button.closest('tr').remove();
    const count = document.getElementById('email-count');
    count.textContent = Math.max(0, parseInt(count.textContent, 10) - 1);
  }} else {{
    const body = await response.json().catch(() => ({{}}));
    alert('Delete failed: ' + (body.details || response.status));
  }}
}}
</script>
</body>
</html>
"#,
        count = output.num_emails,
        updated = output.last_updated.format("%Y-%m-%d %H:%M:%S UTC"),
        rows = rows,
    )
}
