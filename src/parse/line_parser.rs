/// Error type for splitting a command line into words
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    #[error("unterminated quote starting at {0}")]
    UnterminatedQuote(usize),
}

/// Whether a script line carries no command (blank or `//` comment)
pub fn is_blank_or_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with("//")
}

/// Split a command line into words.
///
/// Words are separated by whitespace. Double quotes group a word and may
/// contain `\"` and `\\`; quotes can abut other text (`a"b c"` is `ab c`).
pub fn split_words(line: &str) -> Result<Vec<String>, LineError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.char_indices();

    while let Some((pos, c)) = chars.next() {
        match c {
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((_, '\\')) => match chars.next() {
                            Some((_, escaped @ ('"' | '\\'))) => current.push(escaped),
                            Some((_, other)) => {
                                current.push('\\');
                                current.push(other);
                            }
                            None => return Err(LineError::UnterminatedQuote(pos)),
                        },
                        Some((_, other)) => current.push(other),
                        None => return Err(LineError::UnterminatedQuote(pos)),
                    }
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            other => {
                in_word = true;
                current.push(other);
            }
        }
    }
    if in_word {
        words.push(current);
    }

    Ok(words)
}
