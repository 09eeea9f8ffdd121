//! HTML rendering for the prediction page.
//!
//! The page has a sidebar with one control per schema field, a preview of the raw
//! selections that is always visible, and a result region that is only filled after
//! the user presses Predict.

use crate::predictor::{PredictionOutcome, Verdict};
use finclusion_core::{EncodedRecord, FeatureSchema, FieldKind, FieldSpec, RawRecord, RawValue};

const STYLE: &str = "\
body{font-family:sans-serif;margin:0;display:flex;min-height:100vh}\
aside{background:#f0f2f6;padding:1.5rem;width:20rem}\
main{padding:1.5rem 2rem;flex:1}\
label{display:block;margin-top:.75rem;font-size:.9rem}\
select,input{width:100%;padding:.3rem;margin-top:.25rem;box-sizing:border-box}\
button{margin-top:1rem;margin-right:.5rem;padding:.4rem 1rem}\
table{border-collapse:collapse;margin:.5rem 0 1.5rem}\
th,td{border:1px solid #ccc;padding:.25rem .5rem;font-size:.85rem}\
.banner{padding:.75rem 1rem;border-radius:.4rem;margin:.5rem 0}\
.success{background:#dff5e1;color:#1b5e20}\
.warning{background:#fff4d6;color:#7a5b00}\
.error{background:#fde2e2;color:#8a1c1c}";

/// Everything needed to render the interactive page.
#[derive(Debug)]
pub struct PageContext<'a> {
    /// Page title.
    pub title: &'a str,
    /// Feature schema driving the controls.
    pub schema: &'a FeatureSchema,
    /// Current raw selections.
    pub raw: &'a RawRecord,
    /// Prediction result, present only after the trigger fired.
    pub outcome: Option<&'a PredictionOutcome>,
}

/// Escapes text for use in HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
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

/// Renders the interactive page.
pub fn render_page(ctx: &PageContext<'_>) -> String {
    let mut body = String::new();

    body.push_str("<aside>\n<h2>📋 Enter Individual Information</h2>\n");
    body.push_str("<form method=\"post\" action=\"/predict\">\n");
    for (field, value) in ctx.schema.fields().iter().zip(ctx.raw.values()) {
        body.push_str(&render_control(field, value));
    }
    body.push_str(
        "<button type=\"submit\" formaction=\"/\" formmethod=\"get\">Preview</button>\
         <button type=\"submit\" name=\"action\" value=\"predict\">🔮 Predict</button>\n",
    );
    body.push_str("</form>\n</aside>\n");

    body.push_str("<main>\n");
    body.push_str(&format!("<h1>🏦 {}</h1>\n", escape_html(ctx.title)));
    body.push_str("<div class=\"banner success\">✅ Model loaded successfully!</div>\n");

    body.push_str("<p>🔍 Preview of Input Data (before encoding):</p>\n");
    body.push_str(&render_raw_table(ctx.raw));

    if let Some(outcome) = ctx.outcome {
        body.push_str("<section id=\"result\">\n");
        body.push_str(&render_outcome(outcome));
        body.push_str("</section>\n");
    }
    body.push_str("</main>\n");

    document(ctx.title, &body)
}

/// Renders the halted page shown when the model artifact could not be loaded.
///
/// Contains no input controls.
pub fn render_halted(title: &str, model_file_name: &str) -> String {
    let body = format!(
        "<main>\n<h1>🏦 {}</h1>\n<div class=\"banner error\">❌ {}</div>\n</main>\n",
        escape_html(title),
        escape_html(&load_failure_message(model_file_name)),
    );
    document(title, &body)
}

/// The fixed message shown when the artifact cannot be loaded.
pub fn load_failure_message(model_file_name: &str) -> String {
    format!(
        "Could not load model file. Make sure '{}' is in the same folder.",
        model_file_name
    )
}

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(title),
        STYLE,
        body
    )
}

fn render_control(field: &FieldSpec, value: &RawValue) -> String {
    let name = escape_html(&field.name);
    let label = escape_html(&field.label);
    match &field.kind {
        FieldKind::Categorical { options } => {
            let current = value.as_text();
            let mut html = format!(
                "<label for=\"{name}\">{label}</label>\n<select id=\"{name}\" name=\"{name}\">\n"
            );
            for option in options {
                let selected = if current == Some(option.label.as_str()) {
                    " selected"
                } else {
                    ""
                };
                let text = escape_html(&option.label);
                html.push_str(&format!(
                    "<option value=\"{text}\"{selected}>{text}</option>\n"
                ));
            }
            html.push_str("</select>\n");
            html
        }
        FieldKind::Numeric { min, .. } => {
            let min_attr = min.map(|m| format!(" min=\"{m}\"")).unwrap_or_default();
            format!(
                "<label for=\"{name}\">{label}</label>\n\
                 <input type=\"number\" id=\"{name}\" name=\"{name}\" step=\"1\"{min_attr} value=\"{}\">\n",
                escape_html(&value.to_string())
            )
        }
    }
}

fn render_table<I>(columns: &[String], cells: I) -> String
where
    I: Iterator<Item = String>,
{
    let mut html = String::from("<table>\n<tr><th></th>");
    for column in columns {
        html.push_str(&format!("<th>{}</th>", escape_html(column)));
    }
    html.push_str("</tr>\n<tr><td>0</td>");
    for cell in cells {
        html.push_str(&format!("<td>{}</td>", escape_html(&cell)));
    }
    html.push_str("</tr>\n</table>\n");
    html
}

fn render_raw_table(raw: &RawRecord) -> String {
    render_table(raw.columns(), raw.values().iter().map(ToString::to_string))
}

fn render_encoded_table(encoded: &EncodedRecord) -> String {
    render_table(encoded.columns(), encoded.values().iter().map(ToString::to_string))
}

fn render_outcome(outcome: &PredictionOutcome) -> String {
    let mut html = String::new();
    if let Some(encoded) = outcome.encoded() {
        html.push_str("<p>✅ Encoded Input Data (ready for model):</p>\n");
        html.push_str(&render_encoded_table(encoded));
    }
    match outcome {
        PredictionOutcome::Success { verdict, .. } => {
            html.push_str("<h3>📊 Prediction Result</h3>\n");
            let (class, icon) = match verdict {
                Verdict::LikelyBanked => ("success", "✅"),
                Verdict::UnlikelyBanked => ("warning", "⚠️"),
            };
            html.push_str(&format!(
                "<div class=\"banner {class}\">{icon} {}</div>\n",
                verdict.message()
            ));
        }
        PredictionOutcome::Failure { reason, .. } => {
            html.push_str(&format!(
                "<div class=\"banner error\">Prediction failed: {}</div>\n",
                escape_html(reason)
            ));
        }
    }
    html
}
