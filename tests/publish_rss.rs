// tests/publish_rss.rs
use arxiv_curator::curate::{ChannelImage, CuratedItem, OutputChannel};
use arxiv_curator::feed::parse_feed;
use arxiv_curator::publish::{render_rss, FeedPublisher};
use chrono::{TimeZone, Utc};

fn channel(items: Vec<CuratedItem>) -> OutputChannel {
    OutputChannel {
        title: "arXiv cs.CV watch".into(),
        link: "https://feeds.example.test".into(),
        description: "Filtered cs.CV papers".into(),
        generated_at: Utc.with_ymd_and_hms(2023, 1, 23, 12, 0, 0).unwrap(),
        image: ChannelImage {
            title: "arXiv cs.CV watch".into(),
            url: "https://feeds.example.test/resources/logo.png".into(),
            link: "https://feeds.example.test/resources/logo.png".into(),
        },
        items,
    }
}

fn item(id: &str, title: &str) -> CuratedItem {
    CuratedItem {
        title: title.into(),
        link: format!("http://arxiv.org/abs/{id}"),
        description_html: format!(
            "<b> <a href='http://arxiv.org/abs/{id}'>{title}</a></b><br><br><table>\n<tr>\n</tr>\n</table>"
        ),
        published: "2023-01-23T08:00:00Z".into(),
    }
}

#[test]
fn document_shape() {
    let xml = render_rss(&channel(vec![item("2301.1", "Pose & Shape")])).unwrap();

    assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert!(xml.contains(r#"<rss version="2.0">"#));
    assert!(xml.contains("<title>arXiv cs.CV watch</title>"));
    assert!(xml.contains("<pubDate>Mon, 23 Jan 2023 12:00:00 +0000</pubDate>"));
    assert!(xml.contains("<url>https://feeds.example.test/resources/logo.png</url>"));
    assert!(xml.contains("<title>Pose &amp; Shape</title>"));
    assert!(xml.contains("<![CDATA[<b> <a href='http://arxiv.org/abs/2301.1'>"));
    assert!(xml.contains("<pubDate>Mon, 23 Jan 2023 08:00:00 +0000</pubDate>"));
    assert!(xml.trim_end().ends_with("</rss>"));
}

#[test]
fn output_parses_back_as_rss() {
    let xml = render_rss(&channel(vec![item("2301.1", "One"), item("2301.2", "Two")])).unwrap();
    let entries = parse_feed(&xml).unwrap();

    let titles: Vec<&str> = entries.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["One", "Two"]);
    assert!(entries[1].description.contains("<table>"));
}

#[test]
fn empty_channel_is_still_valid() {
    let xml = render_rss(&channel(vec![])).unwrap();
    assert!(xml.contains("<channel>"));
    assert!(!xml.contains("<item>"));
    assert!(parse_feed(&xml).unwrap().is_empty());
}

#[tokio::test]
async fn publish_replaces_previous_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("site").join("arxiv.xml");
    let publisher = FeedPublisher::new(&out);

    publisher
        .publish(&channel(vec![item("2301.1", "First run")]))
        .await
        .unwrap();
    let written = publisher
        .publish(&channel(vec![item("2301.2", "Second run")]))
        .await
        .unwrap();

    assert_eq!(written, out.as_path());
    let body = std::fs::read_to_string(&out).unwrap();
    assert!(body.contains("Second run"));
    assert!(!body.contains("First run"));
    assert!(!out.with_extension("xml.tmp").exists());
}
