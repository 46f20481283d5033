use regex::Regex;
use url::Url;

/// Extension used when an asset URL does not carry one.
pub const DEFAULT_EXTENSION: &str = "mp3";

/// Sanitize filename to remove invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .trim_matches(|c| c == '.' || c == ' ')
        .to_string()
}

/// Lowercased extension of the last path segment of `url`, percent-decoded.
pub fn extension_from_url(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    let decoded = urlencoding::decode(segment).ok()?;

    let re = Regex::new(r"\.([A-Za-z0-9]{1,5})$").ok()?;
    let caps = re.captures(&decoded)?;
    Some(caps[1].to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("test/file.mp3"), "test_file.mp3");
        assert_eq!(sanitize_filename("normal-name.mp3"), "normal-name.mp3");
        assert_eq!(sanitize_filename(" Final Fantasy: VI... "), "Final Fantasy_ VI");
    }

    #[test]
    fn test_extension_from_url() {
        let url = Url::parse("https://eta.vgmsite.com/soundtracks/x/01%20Opening.FLAC").unwrap();
        assert_eq!(extension_from_url(&url).as_deref(), Some("flac"));

        let url = Url::parse("https://eta.vgmsite.com/soundtracks/x/01%2E%20Theme.mp3").unwrap();
        assert_eq!(extension_from_url(&url).as_deref(), Some("mp3"));

        let url = Url::parse("https://eta.vgmsite.com/download?id=7").unwrap();
        assert_eq!(extension_from_url(&url), None);
    }
}
