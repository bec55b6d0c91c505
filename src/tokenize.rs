/// A maximal substring produced by splitting text at boundaries between
/// ASCII-letter runs and everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub is_word: bool,
}

/// Splits `text` into an ordered, lossless sequence of tokens.
///
/// Letter runs come out with `is_word = true`; whitespace, punctuation,
/// digits, and non-ASCII text come out verbatim with `is_word = false`.
/// Concatenating the tokens in order reproduces the input exactly.
pub fn tokenize(text: &str) -> Tokens<'_> {
    Tokens { rest: text }
}

/// Lazy token iterator returned by [`tokenize`].
pub struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if self.rest.is_empty() {
            return None;
        }
        // The first byte decides the class of the run; a non-ASCII lead
        // byte is never a letter, so indexing the byte is safe here.
        let is_word = self.rest.as_bytes()[0].is_ascii_alphabetic();
        let end = self
            .rest
            .char_indices()
            .find(|&(_, ch)| ch.is_ascii_alphabetic() != is_word)
            .map(|(idx, _)| idx)
            .unwrap_or(self.rest.len());
        let (text, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(Token { text, is_word })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(text: &str) -> Vec<(&str, bool)> {
        tokenize(text).map(|t| (t.text, t.is_word)).collect()
    }

    #[test]
    fn classifies_words_and_punctuation() {
        assert_eq!(
            parts("mi li moku!"),
            vec![
                ("mi", true),
                (" ", false),
                ("li", true),
                (" ", false),
                ("moku", true),
                ("!", false),
            ]
        );
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert_eq!(parts(""), Vec::<(&str, bool)>::new());
    }

    #[test]
    fn digits_are_not_words() {
        assert_eq!(
            parts("ante2li"),
            vec![("ante", true), ("2", false), ("li", true)]
        );
    }

    #[test]
    fn case_is_preserved() {
        assert_eq!(parts("Toki Ma"), vec![
            ("Toki", true),
            (" ", false),
            ("Ma", true),
        ]);
    }

    #[test]
    fn non_ascii_passes_through() {
        assert_eq!(
            parts("kili🍎kili"),
            vec![("kili", true), ("🍎", false), ("kili", true)]
        );
    }

    #[test]
    fn round_trip_is_lossless() {
        let inputs = [
            "",
            "mi li moku!",
            "  leading and trailing  ",
            "a1b2c3",
            "«toki» — ma; 2024?",
            "sina li lukin e kili.",
        ];
        for input in inputs {
            let rebuilt: String = tokenize(input).map(|t| t.text).collect();
            assert_eq!(rebuilt, input);
        }
    }
}
