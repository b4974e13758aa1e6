//! Token-quota refusal detection: a substring scan over a bounded
//! recent-output window.

/// A bounded window of the most recent output, scanned for the
/// configured marker. Kept small and append-with-cap rather than
/// accumulating the whole command's output, since only the marker's
/// recent presence matters.
pub struct RecentOutputWindow {
    buf: String,
    cap_bytes: usize,
}

impl RecentOutputWindow {
    pub fn new(cap_bytes: usize) -> Self {
        Self { buf: String::new(), cap_bytes }
    }

    pub fn push(&mut self, chunk: &str) {
        self.buf.push_str(chunk);
        if self.buf.len() > self.cap_bytes {
            let drop_to = self.buf.len() - self.cap_bytes;
            // Drop from the front at a char boundary so the window never
            // holds a truncated UTF-8 sequence.
            let boundary = (drop_to..self.buf.len())
                .find(|&i| self.buf.is_char_boundary(i))
                .unwrap_or(self.buf.len());
            self.buf.drain(..boundary);
        }
    }

    pub fn contains(&self, marker: &str) -> bool {
        self.buf.contains(marker)
    }
}

/// Scan `window` for `marker`. Returns `true` on a match, meaning the
/// termination reason should be tagged `token_limit` and an
/// `error.token_limit_exceeded` notification emitted.
pub fn detect(window: &RecentOutputWindow, marker: &str) -> bool {
    !marker.is_empty() && window.contains(marker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_marker_across_chunk_boundary() {
        let mut window = RecentOutputWindow::new(1024);
        window.push("...token lim");
        window.push("it exceeded...");
        assert!(detect(&window, "token limit exceeded"));
    }

    #[test]
    fn no_match_when_marker_absent() {
        let mut window = RecentOutputWindow::new(1024);
        window.push("all good here");
        assert!(!detect(&window, "token limit exceeded"));
    }

    #[test]
    fn empty_marker_never_matches() {
        let mut window = RecentOutputWindow::new(1024);
        window.push("anything");
        assert!(!detect(&window, ""));
    }

    #[test]
    fn window_is_capped_and_drops_oldest_bytes() {
        let mut window = RecentOutputWindow::new(8);
        window.push("12345678");
        window.push("90");
        assert_eq!(window.buf, "34567890");
    }
}
