//! HTML components for the similarity-search page. Plain string rendering,
//! no template engine.

use crate::similarity::StoredEmbedding;

const STYLE: &str = "
body { font-family: sans-serif; max-width: 640px; margin: 3em auto; }
textarea { width: 100%; height: 6em; }
.result { margin-top: 2em; padding: 1em; background: #f0f4f8; }
.error { color: #a00; }
";

fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>Clinical Trial Matcher</title>\n\
         <style>{STYLE}</style>\n</head>\n<body>\n{body}\n</body>\n</html>"
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// The search form, optionally with the best match or an error message.
pub fn render_index(result: Option<&StoredEmbedding>, error: Option<&str>) -> String {
    let mut body = String::from(
        "<h1>Find a matching clinical trial</h1>\n\
         <form method=\"post\" action=\"/result\">\n\
         <textarea name=\"sentence\" placeholder=\"Describe the patient or condition...\"></textarea>\n\
         <p><button type=\"submit\">Search</button></p>\n\
         </form>",
    );

    if let Some(row) = result {
        body.push_str(&format!(
            "\n<div class=\"result\"><strong>{}</strong><br>{}</div>",
            escape_html(&row.nct_id),
            escape_html(&row.brief_title)
        ));
    }
    if let Some(message) = error {
        body.push_str(&format!(
            "\n<p class=\"error\">{}</p>",
            escape_html(message)
        ));
    }

    page(&body)
}

/// Landing page when the store has no embeddings yet.
pub fn render_no_data() -> String {
    page(
        "<h1>No data available</h1>\n\
         <p>The embeddings table is empty or missing. Run the pipeline first.</p>",
    )
}
