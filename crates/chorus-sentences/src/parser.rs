//! Sentence line parser and path expansion.
//!
//! A sentence line is tokenized, parsed into a small tree of [`Node`]s and
//! then expanded into every concrete path of [`PatternElement`]s it can
//! produce. Errors carry only a reason; the compiler adds file and line.

use std::collections::HashSet;

use crate::model::PatternElement;

/// Maximum group nesting depth.
const MAX_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Word(String),
    Capture(String),
    Choice {
        alternatives: Vec<Vec<Node>>,
        optional: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ExpandError {
    Syntax(String),
    TooManyAlternatives,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Capture(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Pipe,
    Question,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Word(w) => format!("'{w}'"),
            Self::Capture(c) => format!("'.{c}.'"),
            Self::LParen => "'('".into(),
            Self::RParen => "')'".into(),
            Self::LBracket => "'['".into(),
            Self::RBracket => "']'".into(),
            Self::Pipe => "'|'".into(),
            Self::Question => "'?'".into(),
        }
    }
}

// Must agree with utterance tokenization, which splits on everything else.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '\''
}

// Same folding as utterance tokens: edge apostrophes dropped, whole-word
// lowercase so context-sensitive letters fold identically.
fn normalize_word(raw: &str) -> String {
    raw.trim_matches('\'').to_lowercase()
}

/// Whether `name` is a valid section or capture identifier.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn tokenize(line: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' | ')' | '[' | ']' | '|' | '?' => {
                chars.next();
                tokens.push(match c {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    '|' => Token::Pipe,
                    _ => Token::Question,
                });
            }
            '.' => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for ch in chars.by_ref() {
                    if ch == '.' {
                        closed = true;
                        break;
                    }
                    name.push(ch);
                }
                if !closed {
                    return Err(format!("unterminated capture '.{name}'"));
                }
                if !is_identifier(&name) {
                    return Err(format!("invalid capture name '{name}'"));
                }
                tokens.push(Token::Capture(name));
            }
            c if is_word_char(c) => {
                let mut raw = String::new();
                while let Some(&ch) = chars.peek() {
                    if !is_word_char(ch) {
                        break;
                    }
                    raw.push(ch);
                    chars.next();
                }
                let word = normalize_word(&raw);
                if !word.is_empty() {
                    tokens.push(Token::Word(word));
                }
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    /// `alts := seq ('|' seq)*`
    fn parse_alternatives(&mut self, depth: usize) -> Result<Vec<Vec<Node>>, String> {
        let mut alternatives = vec![self.parse_sequence(depth)?];
        while self.peek() == Some(&Token::Pipe) {
            self.pos += 1;
            alternatives.push(self.parse_sequence(depth)?);
        }
        if alternatives.iter().any(Vec::is_empty) {
            return Err("empty alternative".into());
        }
        Ok(alternatives)
    }

    fn parse_sequence(&mut self, depth: usize) -> Result<Vec<Node>, String> {
        let mut nodes = Vec::new();
        loop {
            match self.peek() {
                None | Some(Token::RParen | Token::RBracket | Token::Pipe) => return Ok(nodes),
                Some(_) => nodes.push(self.parse_item(depth)?),
            }
        }
    }

    fn parse_item(&mut self, depth: usize) -> Result<Node, String> {
        match self.bump() {
            Some(Token::Word(w)) => Ok(Node::Word(w)),
            Some(Token::Capture(c)) => Ok(Node::Capture(c)),
            Some(Token::LParen) => {
                let alternatives = self.parse_group(depth, Token::RParen, "'('")?;
                let optional = if self.peek() == Some(&Token::Question) {
                    self.pos += 1;
                    true
                } else {
                    false
                };
                Ok(Node::Choice {
                    alternatives,
                    optional,
                })
            }
            Some(Token::LBracket) => {
                let alternatives = self.parse_group(depth, Token::RBracket, "'['")?;
                Ok(Node::Choice {
                    alternatives,
                    optional: true,
                })
            }
            Some(Token::Question) => Err("'?' must follow a '(...)' group".into()),
            Some(other) => Err(format!("unexpected {}", other.describe())),
            None => Err("unexpected end of sentence".into()),
        }
    }

    fn parse_group(
        &mut self,
        depth: usize,
        close: Token,
        open_desc: &str,
    ) -> Result<Vec<Vec<Node>>, String> {
        if depth >= MAX_DEPTH {
            return Err(format!("groups nested deeper than {MAX_DEPTH}"));
        }
        let alternatives = self.parse_alternatives(depth + 1)?;
        match self.bump() {
            Some(ref t) if *t == close => Ok(alternatives),
            _ => Err(format!("unbalanced {open_desc}")),
        }
    }
}

/// Parse one sentence line into a node sequence.
pub(crate) fn parse_sentence(line: &str) -> Result<Vec<Node>, String> {
    let tokens = tokenize(line)?;
    let mut parser = Parser { tokens, pos: 0 };

    let mut alternatives = parser.parse_alternatives(0)?;
    if let Some(stray) = parser.peek() {
        return Err(format!("unbalanced {}", stray.describe()));
    }

    Ok(if alternatives.len() == 1 {
        alternatives.remove(0)
    } else {
        vec![Node::Choice {
            alternatives,
            optional: false,
        }]
    })
}

fn expand_sequence(
    nodes: &[Node],
    limit: usize,
) -> Result<Vec<Vec<PatternElement>>, ExpandError> {
    let mut paths: Vec<Vec<PatternElement>> = vec![Vec::new()];

    for node in nodes {
        match node {
            Node::Word(w) => paths
                .iter_mut()
                .for_each(|p| p.push(PatternElement::Word(w.clone()))),
            Node::Capture(c) => paths
                .iter_mut()
                .for_each(|p| p.push(PatternElement::Capture(c.clone()))),
            Node::Choice {
                alternatives,
                optional,
            } => {
                let mut options = Vec::new();
                for alt in alternatives {
                    options.extend(expand_sequence(alt, limit)?);
                }
                if *optional {
                    options.push(Vec::new());
                }
                if paths.len().saturating_mul(options.len()) > limit {
                    return Err(ExpandError::TooManyAlternatives);
                }
                paths = paths
                    .iter()
                    .flat_map(|prefix| {
                        options.iter().map(move |option| {
                            let mut path = prefix.clone();
                            path.extend(option.iter().cloned());
                            path
                        })
                    })
                    .collect();
            }
        }
    }

    Ok(paths)
}

/// Expand a parsed sentence into its distinct concrete paths, in order.
pub(crate) fn expand(nodes: &[Node], limit: usize) -> Result<Vec<Vec<PatternElement>>, ExpandError> {
    let paths = expand_sequence(nodes, limit)?;

    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(paths.len());
    for path in paths {
        if path.is_empty() {
            return Err(ExpandError::Syntax("sentence can match empty input".into()));
        }
        let mut captures = HashSet::new();
        for element in &path {
            if let PatternElement::Capture(name) = element
                && !captures.insert(name.as_str())
            {
                return Err(ExpandError::Syntax(format!(
                    "capture '.{name}.' used twice in one sentence"
                )));
            }
        }
        if seen.insert(path.clone()) {
            unique.push(path);
        }
    }
    Ok(unique)
}

#[cfg(test)]
mod tests {
    use super::*;
    use PatternElement::{Capture, Word};

    fn w(s: &str) -> PatternElement {
        Word(s.into())
    }

    fn c(s: &str) -> PatternElement {
        Capture(s.into())
    }

    fn paths(line: &str) -> Vec<Vec<PatternElement>> {
        expand(&parse_sentence(line).unwrap(), 1024).unwrap()
    }

    #[test]
    fn plain_words_are_lowercased() {
        assert_eq!(paths("What Time is it"), vec![vec![w("what"), w("time"), w("is"), w("it")]]);
    }

    #[test]
    fn choice_and_capture() {
        assert_eq!(
            paths("(call|phone) .who."),
            vec![vec![w("call"), c("who")], vec![w("phone"), c("who")]]
        );
    }

    #[test]
    fn optional_group_present_first() {
        assert_eq!(
            paths("[please] stop"),
            vec![vec![w("please"), w("stop")], vec![w("stop")]]
        );
        assert_eq!(
            paths("(a|b)? c"),
            vec![vec![w("a"), w("c")], vec![w("b"), w("c")], vec![w("c")]]
        );
    }

    #[test]
    fn top_level_alternatives() {
        assert_eq!(paths("yes|sure"), vec![vec![w("yes")], vec![w("sure")]]);
    }

    #[test]
    fn duplicate_paths_removed() {
        assert_eq!(paths("[a] [a] b").len(), 3);
    }

    #[test]
    fn apostrophes_are_word_chars() {
        assert_eq!(paths("what's up"), vec![vec![w("what's"), w("up")]]);
        assert!(parse_sentence("up-to-date").is_err());
    }

    #[test]
    fn words_fold_like_utterance_tokens() {
        assert_eq!(paths("'Tis ΟΔΟΣ"), vec![vec![w("tis"), w("οδος")]]);
        assert_eq!(paths("rock 'n' roll"), vec![vec![w("rock"), w("n"), w("roll")]]);
    }

    #[test]
    fn syntax_errors() {
        assert!(parse_sentence("(call .who.").unwrap_err().contains("unbalanced"));
        assert!(parse_sentence("call) me").unwrap_err().contains("unbalanced"));
        assert!(parse_sentence("(a|) b").unwrap_err().contains("empty alternative"));
        assert!(parse_sentence("call .who").unwrap_err().contains("unterminated"));
        assert!(parse_sentence("call .Who.").unwrap_err().contains("invalid capture"));
        assert!(parse_sentence("a ? b").unwrap_err().contains("'?'"));
        assert!(parse_sentence("hello, world").unwrap_err().contains("unexpected character"));
    }

    #[test]
    fn empty_match_rejected() {
        let nodes = parse_sentence("[hello]").unwrap();
        assert!(matches!(expand(&nodes, 1024), Err(ExpandError::Syntax(_))));
    }

    #[test]
    fn duplicate_capture_rejected() {
        let nodes = parse_sentence(".a. and .a.").unwrap();
        assert!(matches!(expand(&nodes, 1024), Err(ExpandError::Syntax(_))));
    }

    #[test]
    fn expansion_limit_enforced() {
        // 2^11 = 2048 paths
        let line = "(a|b) ".repeat(11);
        let nodes = parse_sentence(&line).unwrap();
        assert_eq!(expand(&nodes, 1024), Err(ExpandError::TooManyAlternatives));
    }

    #[test]
    fn nesting_limit_enforced() {
        let line = format!("{}x{}", "(".repeat(20), ")".repeat(20));
        assert!(parse_sentence(&line).unwrap_err().contains("nested"));
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("current_time"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier("Time"));
        assert!(!is_identifier(""));
    }
}
