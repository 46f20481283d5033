use std::io::{BufRead, Write};

use crate::domain::{AlbumCandidate, AppError};

/// Number of albums listed per page of the picker.
const PAGE_SIZE: usize = 10;

/// Line-based prompts on a terminal (or anything readable and writable).
pub struct ConsoleView<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleView<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask for the title to search for; blank answers are asked again.
    pub fn ask_title(&mut self) -> Result<String, AppError> {
        loop {
            let line = self.ask("Game Title: ")?;
            if !line.is_empty() {
                return Ok(line);
            }
        }
    }

    /// Let the operator pick one album, returning its index in `albums`.
    ///
    /// Answers are 1-based. An empty answer shows the next page of results.
    pub fn select_album(&mut self, albums: &[AlbumCandidate]) -> Result<usize, AppError> {
        if albums.is_empty() {
            return Err(AppError::InvalidInput("nothing to select".to_string()));
        }

        let mut page = 0;
        loop {
            let start = page * PAGE_SIZE;
            for (i, album) in albums.iter().enumerate().skip(start).take(PAGE_SIZE) {
                self.say(&format!("{:>3}) {}", i + 1, album.title))?;
            }

            let answer = self.ask(&format!("Select Album [1-{}]: ", albums.len()))?;
            if answer.is_empty() {
                page = if start + PAGE_SIZE < albums.len() { page + 1 } else { 0 };
                continue;
            }

            match answer.parse::<usize>() {
                Ok(n) if (1..=albums.len()).contains(&n) => return Ok(n - 1),
                _ => self.say(&format!("\"{}\" is not one of the listed albums", answer))?,
            }
        }
    }

    fn say(&mut self, line: &str) -> Result<(), AppError> {
        writeln!(self.output, "{}", line).map_err(|e| AppError::Prompt(e.to_string()))
    }

    fn ask(&mut self, label: &str) -> Result<String, AppError> {
        write!(self.output, "{}", label)
            .and_then(|_| self.output.flush())
            .map_err(|e| AppError::Prompt(e.to_string()))?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| AppError::Prompt(e.to_string()))?;
        if read == 0 {
            return Err(AppError::Prompt("input closed".to_string()));
        }

        Ok(line.trim().to_string())
    }
}

/// Pick an album without prompting, from a 1-based position.
pub fn select_by_position(albums: &[AlbumCandidate], position: usize) -> Result<usize, AppError> {
    if position == 0 || position > albums.len() {
        return Err(AppError::InvalidInput(format!(
            "album {} requested but {} found",
            position,
            albums.len()
        )));
    }
    Ok(position - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn albums(count: usize) -> Vec<AlbumCandidate> {
        (1..=count)
            .map(|i| AlbumCandidate {
                title: format!("Album {}", i),
                source_path: format!("/album/{}", i),
            })
            .collect()
    }

    fn view(input: &str) -> ConsoleView<Cursor<Vec<u8>>, Vec<u8>> {
        ConsoleView::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_ask_title_skips_blank_lines() {
        let mut view = view("\n   \nchrono trigger\n");
        assert_eq!(view.ask_title().unwrap(), "chrono trigger");
    }

    #[test]
    fn test_ask_title_on_closed_input() {
        let mut view = view("");
        assert!(matches!(view.ask_title(), Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_select_album_retries_invalid_answers() {
        let mut view = view("0\nabc\n3\n");
        assert_eq!(view.select_album(&albums(3)).unwrap(), 2);

        let shown = String::from_utf8(view.output).unwrap();
        assert!(shown.contains("  1) Album 1"));
        assert!(shown.contains("\"abc\" is not one of the listed albums"));
    }

    #[test]
    fn test_select_album_pages() {
        let mut view = view("\n12\n");
        assert_eq!(view.select_album(&albums(12)).unwrap(), 11);

        let shown = String::from_utf8(view.output).unwrap();
        assert!(shown.contains(" 11) Album 11"));
    }

    #[test]
    fn test_select_by_position() {
        let list = albums(2);
        assert_eq!(select_by_position(&list, 2).unwrap(), 1);
        assert!(select_by_position(&list, 0).is_err());
        assert!(select_by_position(&list, 3).is_err());
    }
}
