// src/feed/mod.rs
pub mod atom;
pub mod rss;
pub mod source;
pub mod types;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::CurateError;
use crate::feed::types::FeedEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Atom,
    Rss,
}

/// Identify the syndication format from the document's root element.
pub fn detect_format(xml: &str) -> Result<FeedFormat, CurateError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return match e.local_name().as_ref() {
                    b"feed" => Ok(FeedFormat::Atom),
                    b"rss" => Ok(FeedFormat::Rss),
                    other => Err(CurateError::FeedParse(format!(
                        "unsupported root element <{}>",
                        String::from_utf8_lossy(other)
                    ))),
                };
            }
            Ok(Event::Eof) => return Err(CurateError::FeedParse("empty document".into())),
            Ok(_) => continue,
            Err(e) => return Err(CurateError::FeedParse(e.to_string())),
        }
    }
}

/// Parse an Atom or RSS 2.0 document into entries, preserving document order.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>, CurateError> {
    match detect_format(xml)? {
        FeedFormat::Atom => atom::parse_atom(xml),
        FeedFormat::Rss => rss::parse_rss(xml),
    }
}
