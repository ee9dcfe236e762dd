// src/curate/html.rs
use html_escape::{encode_single_quoted_attribute, encode_text};
use once_cell::sync::OnceCell;
use regex::Regex;

/// Replace the first occurrence of `abstract_token` in `link` with `document_token`.
pub fn document_link(link: &str, abstract_token: &str, document_token: &str) -> String {
    link.replacen(abstract_token, document_token, 1)
}

/// Matches a trailing `(<prefix>:<id>)` annotation such as `(arXiv:2301.00001v2)`.
pub fn annotation_pattern(source_prefix: &str) -> Regex {
    let pattern = format!(r"\(\s*{}:[^()]*\)\s*$", regex::escape(source_prefix));
    // the prefix is escaped, so the pattern always compiles
    Regex::new(&pattern).unwrap()
}

/// Strip the annotation matched by `annotation`, collapse whitespace, trim.
pub fn clean_title_with(title: &str, annotation: &Regex) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    let stripped = annotation.replace(title, "");
    re_ws.replace_all(&stripped, " ").trim().to_string()
}

pub fn clean_title(title: &str, source_prefix: &str) -> String {
    clean_title_with(title, &annotation_pattern(source_prefix))
}

/// One gallery image: public URL plus display size.
#[derive(Debug, Clone)]
pub struct GalleryImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Single-row table with one linked thumbnail per image.
pub fn gallery_table(images: &[GalleryImage]) -> String {
    let mut out = String::from("<table>\n<tr>\n");
    for img in images {
        let url = encode_single_quoted_attribute(&img.url);
        out.push_str(&format!(
            "<td><a href='{url}'><img src='{url}' width='{}' height='{}'></a></td>\n",
            img.width, img.height
        ));
    }
    out.push_str("</tr>\n</table>");
    out
}

/// Item body: linked title, matched keywords, original description, gallery.
pub fn build_description(
    link: &str,
    title: &str,
    matches: &[String],
    description: &str,
    images: &[GalleryImage],
) -> String {
    let mut out = format!(
        "<b> <a href='{}'>{}</a></b><br><br>",
        encode_single_quoted_attribute(link),
        encode_text(title)
    );
    out.push_str("<b>Keywords: </b>");
    out.push_str(&encode_text(&matches.join(", ")));
    out.push_str("<br>");
    out.push_str(description);
    out.push_str(&gallery_table(images));
    out
}
