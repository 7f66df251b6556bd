use crate::error::RleError;

/// Expand run-length encoded board text.
///
/// A run of digits repeats whatever follows it: either a single character
/// (`3#` is `###`) or a parenthesized group, which may itself contain counts
/// and groups (`2(1(a)b)` is `abab`). A group without a count is emitted once.
/// Digits at the very end of the text have nothing to repeat and are dropped.
pub fn decode(text: &str) -> Result<String, RleError> {
    let chars: Vec<char> = text.chars().collect();
    let mut decoder = Decoder { chars, pos: 0 };
    let output = decoder.sequence(None)?;
    Ok(output)
}

/// Longest expansion of a single line. Real boards are a few dozen cells
/// wide; anything near this is a typo in a count.
const MAX_DECODED_LEN: usize = 1 << 16;

/// Fails when appending `count` copies of `len` bytes would push `output`
/// past [`MAX_DECODED_LEN`].
fn reserve(output: &str, len: usize, count: usize, column: usize) -> Result<(), RleError> {
    let total = len
        .checked_mul(count)
        .and_then(|added| added.checked_add(output.len()));
    match total {
        Some(total) if total <= MAX_DECODED_LEN => Ok(()),
        _ => Err(RleError::CountTooLarge { column }),
    }
}

struct Decoder {
    chars: Vec<char>,
    pos: usize,
}

impl Decoder {
    /// Decode until the end of input, or until the `)` closing the group that
    /// was opened at `open`.
    fn sequence(&mut self, open: Option<usize>) -> Result<String, RleError> {
        let mut output = String::new();

        while let Some(&ch) = self.chars.get(self.pos) {
            match ch {
                ')' => {
                    if open.is_none() {
                        return Err(RleError::UnexpectedClose { column: self.pos });
                    }
                    self.pos += 1;
                    return Ok(output);
                }
                '(' => {
                    let column = self.pos;
                    self.pos += 1;
                    let group = self.sequence(Some(column))?;
                    reserve(&output, group.len(), 1, column)?;
                    output.push_str(&group);
                }
                '0'..='9' => {
                    let column = self.pos;
                    let count = self.count();
                    match self.chars.get(self.pos) {
                        Some('(') => {
                            let open = self.pos;
                            self.pos += 1;
                            let group = self.sequence(Some(open))?;
                            reserve(&output, group.len(), count, column)?;
                            output.push_str(&group.repeat(count));
                        }
                        Some(')') => {
                            // A count directly before a close has nothing to
                            // repeat; let the loop handle the close.
                        }
                        Some(&next) => {
                            self.pos += 1;
                            reserve(&output, next.len_utf8(), count, column)?;
                            output.extend(std::iter::repeat_n(next, count));
                        }
                        None => {}
                    }
                }
                _ => {
                    self.pos += 1;
                    output.push(ch);
                }
            }
        }

        match open {
            Some(column) => Err(RleError::UnbalancedGroup { column }),
            None => Ok(output),
        }
    }

    fn count(&mut self) -> usize {
        let mut count: usize = 0;
        while let Some(digit) = self.chars.get(self.pos).and_then(|ch| ch.to_digit(10)) {
            count = count.saturating_mul(10).saturating_add(digit as usize);
            self.pos += 1;
        }
        count
    }
}
