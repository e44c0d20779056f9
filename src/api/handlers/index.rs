use crate::api::error::AppError;
use crate::services::storage::StoredEntry;
use axum::{extract::State, response::Html};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Cloud Files</title>
</head>
<body>
  <h1>Cloud Files</h1>
  <form action="/upload" method="post" enctype="multipart/form-data">
    <input type="file" name="file" multiple>
    <button type="submit">Upload</button>
  </form>
  <h2>Files</h2>
  {{files}}
</body>
</html>
"#;

pub fn render_listing(files: &[StoredEntry]) -> String {
    let list = if files.is_empty() {
        "<p>No files uploaded yet.</p>".to_string()
    } else {
        let items: String = files
            .iter()
            .map(|f| {
                format!(
                    "    <li><a href=\"/download?file={}\">{}</a> ({} bytes)</li>\n",
                    utf8_percent_encode(&f.name, NON_ALPHANUMERIC),
                    html_escape::encode_text(&f.name),
                    f.size
                )
            })
            .collect();
        format!("<ul>\n{}  </ul>", items)
    };

    PAGE.replace("{{files}}", &list)
}

pub async fn index(State(state): State<crate::AppState>) -> Result<Html<String>, AppError> {
    let files = state
        .storage
        .list()
        .await
        .map_err(|e| AppError::io("Failed to read upload directory", e))?;

    Ok(Html(render_listing(&files)))
}
