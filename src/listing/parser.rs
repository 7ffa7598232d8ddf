//! Extraction of child entries from a directory index page.

use super::entry::{as_directory, is_strict_descendant, RemoteEntry};

use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector is valid"));

/// Extract the children listed on a directory index page.
///
/// Every anchor is resolved against `page_url`; only links that land strictly
/// below the page survive, which drops parent links, self links, sort links
/// and links to other hosts. Entries come back in document order with
/// duplicates removed (fancy indexes link every file twice, icon and name).
///
/// Broken markup yields whatever links the HTML parser could recover.
///
/// ```rust
/// use dirmirror::listing::{parse_listing, EntryKind};
/// use url::Url;
///
/// let page = Url::parse("http://h/a/b/").unwrap();
/// let body = r#"<a href="../">Parent</a><a href="sub/">sub/</a><a href="f.txt">f.txt</a>"#;
/// let entries = parse_listing(body, &page);
/// assert_eq!(entries.len(), 2);
/// assert_eq!(entries[0].kind, EntryKind::Directory);
/// ```
pub fn parse_listing(body: &str, page_url: &Url) -> Vec<RemoteEntry> {
    let base = as_directory(page_url);
    let document = Html::parse_document(body);

    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for link in document.select(&LINK_SELECTOR) {
        let Some(href) = link.value().attr("href").map(str::trim) else {
            continue;
        };
        if href.is_empty() || href.starts_with('?') || href.starts_with('#') {
            continue;
        }

        let mut resolved = match base.join(href) {
            Ok(u) => u,
            Err(e) => {
                debug!("Skipping unparsable link {:?} on {}: {}", href, base, e);
                continue;
            }
        };
        resolved.set_query(None);
        resolved.set_fragment(None);

        if !is_strict_descendant(&resolved, &base) {
            continue;
        }
        if seen.insert(resolved.clone()) {
            entries.push(RemoteEntry::from_url(resolved));
        }
    }

    entries
}
