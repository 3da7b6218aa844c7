//  Tyriabot - A Guild Wars 2 and moderation bot for Discord.
//  Copyright (C) 2020 Nick Samson

//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.

//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.

//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Reading the news RSS feed and scraping the ArcDPS download page.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use roxmltree::{Document, Node};

/// A news post from the RSS feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    /// The first paragraph, with markup removed.
    pub description: String,
}

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").unwrap());

const ARCDPS_MARKER: &str = "x64: current</a>";

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "hellip" => '\u{2026}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "laquo" => '\u{AB}',
        "raquo" => '\u{BB}',
        "copy" => '\u{A9}',
        "reg" => '\u{AE}',
        "trade" => '\u{2122}',
        _ => return None
    };
    Some(c)
}

/// Decodes the HTML character references left in descriptions once the XML layer is gone.
/// Unknown names are kept as they are.
pub fn decode_entities(s: &str) -> Cow<str> {
    ENTITY.replace_all(s, |c: &Captures| {
        let body = &c[1];
        let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
            u32::from_str_radix(hex, 16).ok().and_then(std::char::from_u32)
        } else if let Some(dec) = body.strip_prefix('#') {
            dec.parse::<u32>().ok().and_then(std::char::from_u32)
        } else {
            named_entity(body)
        };
        decoded.map_or_else(|| c[0].to_string(), |ch| ch.to_string())
    })
}

fn child_text<'a>(item: Node<'a, '_>, name: &str) -> Option<&'a str> {
    item.children()
        .find(|c| c.has_tag_name(name))
        .and_then(|c| c.text())
}

fn first_paragraph(html: &str) -> String {
    let first = html.split("</p>").next().unwrap_or_default();
    decode_entities(&TAG.replace_all(first, "")).trim().to_string()
}

/// Pulls every post out of the feed, in feed order. Posts missing a title or link are skipped.
pub fn parse_news(feed: &str) -> Result<Vec<NewsItem>, roxmltree::Error> {
    let doc = Document::parse(feed)?;
    let items = doc.descendants()
        .filter(|n| n.has_tag_name("item"))
        .filter_map(|item| {
            let title = child_text(item, "title")?.trim();
            let link = child_text(item, "link")?.trim();
            let description = child_text(item, "description")
                .map(first_paragraph)
                .unwrap_or_default();
            Some(NewsItem { title: title.to_string(), link: link.to_string(), description })
        })
        .collect();
    Ok(items)
}

/// Posts whose titles weren't seen last time. Nothing is new when there was no last time.
pub fn new_posts<'a>(items: &'a [NewsItem], seen: Option<&[String]>) -> Vec<&'a NewsItem> {
    match seen {
        None => Vec::new(),
        Some(seen) => items.iter()
            .filter(|i| !seen.contains(&i.title))
            .collect()
    }
}

/// Reads the current x64 ArcDPS version off the download page.
pub fn arcdps_version(page: &str) -> Option<String> {
    let start = page.find(ARCDPS_MARKER)? + ARCDPS_MARKER.len();
    let rest = page[start..].trim_start();
    let end = rest.find(|c: char| c == '<' || c == '(' || c == '\n').unwrap_or_else(|| rest.len());
    let version = rest[..end].trim();
    if version.is_empty() {
        None
    } else {
        Some(crate::util::truncate_with_ellipsis(version, 40).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
<title>Guild Wars 2</title>
<item>
  <title>Patch Notes &amp; More</title>
  <link>https://www.guildwars2.com/en/news/patch/</link>
  <description><![CDATA[<p>The <b>latest</b> update is here.</p><p>Second paragraph.</p>]]></description>
</item>
<item>
  <title>Festival Returns</title>
  <link>https://www.guildwars2.com/en/news/festival/</link>
  <description>&lt;p&gt;Come celebrate.&lt;/p&gt;&lt;p&gt;More.&lt;/p&gt;</description>
</item>
<item>
  <title>No link here</title>
</item>
</channel></rss>"#;

    #[test]
    fn parses_feed() {
        let items = parse_news(FEED).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Patch Notes & More");
        assert_eq!(items[0].link, "https://www.guildwars2.com/en/news/patch/");
        assert_eq!(items[0].description, "The latest update is here.");
        assert_eq!(items[1].description, "Come celebrate.");
    }

    #[test]
    fn only_unseen_posts_are_new() {
        let items = parse_news(FEED).unwrap();
        assert!(new_posts(&items, None).is_empty());
        let seen = vec!["Patch Notes & More".to_string()];
        let fresh = new_posts(&items, Some(&seen));
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].title, "Festival Returns");
    }

    #[test]
    fn character_references_are_decoded() {
        let feed = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/"><channel>
<item xml:lang="en">
  <title>Season 5 &#8211; &#8220;Champions&#8221;</title>
  <link>https://www.guildwars2.com/en/news/champions/</link>
  <dc:creator>ArenaNet</dc:creator>
  <description><![CDATA[<p class="lead">It&#8217;s here&hellip; finally &amp; at last&nbsp;&bogus;</p>]]></description>
</item>
</channel></rss>"#;
        let items = parse_news(feed).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Season 5 \u{2013} \u{201C}Champions\u{201D}");
        assert_eq!(items[0].description, "It\u{2019}s here\u{2026} finally & at last &bogus;");
    }

    #[test]
    fn broken_feeds_are_errors() {
        assert!(parse_news("<rss><channel><item><title>Unclosed").is_err());
        assert_eq!(decode_entities("&#x41;&#66;&unknown;"), "AB&unknown;");
    }

    #[test]
    fn arcdps() {
        let page = r#"<a href="x64/d3d9.dll">x64: current</a> mar.25.2020 (<a href="x64/d3d9.dll.md5sum">md5</a>)"#;
        assert_eq!(arcdps_version(page).as_deref(), Some("mar.25.2020"));
        assert_eq!(arcdps_version("nothing to see"), None);
    }
}
