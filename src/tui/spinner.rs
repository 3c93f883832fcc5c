const BRAILLE_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub fn frame(idx: usize) -> char {
    BRAILLE_FRAMES[idx % BRAILLE_FRAMES.len()]
}

/// `text` prefixed with the spinner frame for `idx`.
pub fn with_frame(idx: usize, text: &str) -> String {
    format!("{} {text}", frame(idx))
}
