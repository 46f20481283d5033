//! Fixtures shared by the application tests.

use std::path::Path;

use super::metadata::TagReader;

/// Treats a file whose content is `TITLE:<name>` as tagged with `<name>`;
/// anything else is unreadable.
pub struct ContentTitleReader;

impl TagReader for ContentTitleReader {
    fn read_title(&self, path: &Path) -> Result<Option<String>, String> {
        let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        content
            .strip_prefix("TITLE:")
            .map(|title| Some(title.to_string()))
            .ok_or_else(|| "no tag header".to_string())
    }
}

/// Album page with one track row per entry; `None` renders a row without href.
pub fn album_page(rows: &[Option<&str>]) -> String {
    let rows: String = rows
        .iter()
        .enumerate()
        .map(|(i, href)| match href {
            Some(href) => format!(
                r#"<tr><td>{}</td><td class="playlistDownloadSong"><a href="{}">get</a></td></tr>"#,
                i + 1,
                href
            ),
            None => format!(
                r#"<tr><td>{}</td><td class="playlistDownloadSong"><a>get</a></td></tr>"#,
                i + 1
            ),
        })
        .collect();

    format!(
        r#"<html><body><table id="songlist">{}</table></body></html>"#,
        rows
    )
}

/// Track download page listing `assets` after an unrelated navigation link.
pub fn track_page(assets: &[&str]) -> String {
    let links: String = assets
        .iter()
        .map(|href| format!(r#"<p><a href="{}">Click here to download</a></p>"#, href))
        .collect();

    format!(
        r#"<html><body><div id="EchoTopic"><p><a href="/game-soundtracks">Back</a></p>{}</div></body></html>"#,
        links
    )
}
