//! HTML for the single-page classification form.
//!
//! One URL textbox in, a "Predicted Label" field and a "Class Probabilities"
//! JSON block out. Rendered with plain `format!`; every interpolated value
//! goes through [`escape_html`].

use crate::output::Prediction;

pub const TITLE: &str = "PDF Classifier";
pub const INPUT_LABEL: &str = "Enter PDF URL";
pub const INPUT_PLACEHOLDER: &str = "Paste the URL of the PDF here...";
pub const LABEL_HEADING: &str = "Predicted Label";
pub const PROBABILITIES_HEADING: &str = "Class Probabilities";

/// Name of the form field carrying the URL.
pub const URL_FIELD: &str = "pdf_url";

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;max-width:46rem;margin:2rem auto;padding:0 1rem;color:#222}\
h1{margin-bottom:.25rem}\
p.description{color:#555;margin-top:0}\
label{display:block;font-weight:600;margin:1rem 0 .25rem}\
input[type=url]{width:100%;padding:.5rem;box-sizing:border-box}\
button{margin-top:.75rem;padding:.5rem 1.25rem}\
output,pre{display:block;background:#f4f4f4;padding:.75rem;border-radius:4px;white-space:pre-wrap}\
output.error{color:#a00}";

/// One-line description listing the known labels.
pub fn description(labels: &[String]) -> String {
    format!(
        "Upload a PDF URL to classify it into one of the {} categories: {}.",
        labels.len(),
        join_labels(labels)
    )
}

/// `a, b, c, or d` style enumeration.
fn join_labels(labels: &[String]) -> String {
    match labels {
        [] => String::new(),
        [only] => only.clone(),
        [a, b] => format!("{a} or {b}"),
        [rest @ .., last] => format!("{}, or {last}", rest.join(", ")),
    }
}

/// Full page: the empty form, or the form followed by a result.
pub fn render_page(labels: &[String], url: &str, prediction: Option<&Prediction>) -> String {
    let result = prediction.map(render_result).unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
<h1>{title}</h1>
<p class="description">{description}</p>
<form method="post" action="/">
<label for="{URL_FIELD}">{INPUT_LABEL}</label>
<input type="text" id="{URL_FIELD}" name="{URL_FIELD}" placeholder="{placeholder}" value="{url}">
<button type="submit">Submit</button>
</form>
{result}</body>
</html>
"#,
        title = escape_html(TITLE),
        description = escape_html(&description(labels)),
        placeholder = escape_html(INPUT_PLACEHOLDER),
        url = escape_html(url),
    )
}

fn render_result(prediction: &Prediction) -> String {
    let class = if prediction.is_classified() { "label" } else { "label error" };
    let json = serde_json::to_string_pretty(&prediction.probabilities())
        .unwrap_or_else(|_| "{}".to_string());
    format!(
        "<section>\n<h2>{LABEL_HEADING}</h2>\n<output class=\"{class}\">{label}</output>\n\
<h2>{PROBABILITIES_HEADING}</h2>\n<pre>{json}</pre>\n</section>\n",
        label = escape_html(&prediction.label_text()),
        json = escape_html(&json),
    )
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;
    use crate::output::{Classification, LabelProbabilities};

    fn labels() -> Vec<String> {
        ["Lighting", "Fuses", "Cables", "Others"].map(String::from).to_vec()
    }

    #[test]
    fn description_lists_labels() {
        assert_eq!(
            description(&labels()),
            "Upload a PDF URL to classify it into one of the 4 categories: \
             Lighting, Fuses, Cables, or Others."
        );
        assert_eq!(join_labels(&["A".into(), "B".into()]), "A or B");
    }

    #[test]
    fn empty_form_has_input_and_no_result() {
        let html = render_page(&labels(), "", None);
        assert!(html.contains("<title>PDF Classifier</title>"));
        assert!(html.contains(r#"name="pdf_url""#));
        assert!(html.contains("Paste the URL of the PDF here..."));
        assert!(!html.contains(LABEL_HEADING));
    }

    #[test]
    fn url_box_accepts_any_text() {
        let html = render_page(&labels(), "not a url", None);
        assert!(html.contains(r#"<input type="text" id="pdf_url""#));
        assert!(html.contains(r#"value="not a url""#));
        assert!(!html.contains("required"));
        assert!(!html.contains(r#"type="url""#));
    }

    #[test]
    fn classified_result_shows_label_and_json() {
        let prediction = Prediction::Classified(Classification {
            label: "Fuses".into(),
            probabilities: LabelProbabilities::new(vec![
                ("Fuses".into(), 0.9),
                ("Others".into(), 0.1),
            ]),
        });
        let html = render_page(&labels(), "https://x/y.pdf", Some(&prediction));
        assert!(html.contains(r#"<output class="label">Fuses</output>"#));
        assert!(html.contains("&quot;Fuses&quot;: 0.9"));
        assert!(html.contains(r#"value="https://x/y.pdf""#));
    }

    #[test]
    fn user_input_is_escaped() {
        let prediction = Prediction::ExtractionFailed(ExtractionError::DownloadFailed {
            url: "<script>".into(),
            reason: "bad".into(),
        });
        let html = render_page(&labels(), "\"><script>alert(1)</script>", Some(&prediction));
        assert!(!html.contains("<script>"));
        assert!(html.contains("Error processing PDF"));
        assert!(html.contains("<pre>{}</pre>"));
    }
}
