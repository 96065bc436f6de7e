//! Synthetic parse units for exercising the pool.
//!
//! Each unit lexes a small build file and folds the tokens into call nodes,
//! allocating every intermediate through the given [`Allocator`] the way the
//! real parser does.

use aspheap_pool::{Allocator, Obj, Seq};

/// Build file every unit parses.
pub const SOURCE: &str = r#"
go_library(
    name = "asp",
    srcs = ["builtins.go", "interpreter.go", "lexer.go", "parser.go"],
    visibility = ["PUBLIC"],
    deps = ["//src/cli", "//src/core", "//src/fs"],
)

go_test(
    name = "asp_test",
    srcs = ["interpreter_test.go", "lexer_test.go"],
    data = ["test_data"],
    deps = [":asp", "//src/core"],
)
"#;

/// Token classes the lexer recognises.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier.
    #[default]
    Ident,
    /// Quoted string.
    Str,
    /// Single punctuation character.
    Punct,
}

/// A token as a byte span into the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Token {
    /// Token class.
    pub kind: TokenKind,
    /// Byte offset of the first character.
    pub start: usize,
    /// Length in bytes.
    pub len: usize,
}

/// A top-level call such as `go_library(...)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallNode {
    /// Index of the callee token.
    pub callee: usize,
    /// Number of keyword arguments.
    pub kwargs: usize,
    /// Number of string literals anywhere in the arguments.
    pub strings: usize,
}

/// Root of a parsed file.
#[derive(Debug, Default)]
pub struct FileNode<'a> {
    /// Top-level calls in source order.
    pub calls: Seq<'a, CallNode>,
}

/// Summary of one parsed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitSummary {
    /// Tokens lexed.
    pub tokens: usize,
    /// Top-level calls found.
    pub calls: usize,
    /// String literals found.
    pub strings: usize,
}

/// Split `src` into tokens.
#[must_use]
pub fn lex<'a>(alloc: Allocator<'a>, src: &str) -> Seq<'a, Token> {
    let bytes = src.as_bytes();
    let mut tokens = alloc.make_slice(0, 4);
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        let (kind, len) = if c.is_ascii_whitespace() {
            i += 1;
            continue;
        } else if c == b'"' {
            let end = bytes[i + 1..]
                .iter()
                .position(|&b| b == b'"')
                .map_or(bytes.len(), |p| i + 1 + p + 1);
            (TokenKind::Str, end - i)
        } else if c.is_ascii_alphanumeric() || c == b'_' {
            let len = bytes[i..]
                .iter()
                .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
                .count();
            (TokenKind::Ident, len)
        } else {
            (TokenKind::Punct, src[i..].chars().next().map_or(1, char::len_utf8))
        };
        tokens = alloc.append(tokens, [Token { kind, start: i, len }]);
        i += len;
    }
    tokens
}

/// Group tokens into top-level calls.
#[must_use]
pub fn parse<'a>(alloc: Allocator<'a>, src: &str, tokens: &[Token]) -> Obj<'a, FileNode<'a>> {
    let mut file: Obj<'a, FileNode<'a>> = alloc.new_object();
    let mut calls: Seq<'a, CallNode> = alloc.make_slice(0, 1);
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        let text = &src[token.start..token.start + token.len];
        match (token.kind, text) {
            (TokenKind::Punct, "(" | "[") => depth += 1,
            (TokenKind::Punct, ")" | "]") => depth = depth.saturating_sub(1),
            (TokenKind::Punct, "=") if depth == 1 => {
                if let Some(call) = calls.last_mut() {
                    call.kwargs += 1;
                }
            }
            (TokenKind::Ident, _) if depth == 0 => {
                let call = CallNode {
                    callee: i,
                    ..CallNode::default()
                };
                calls = alloc.append(calls, [call]);
            }
            (TokenKind::Str, _) => {
                if let Some(call) = calls.last_mut() {
                    call.strings += 1;
                }
            }
            _ => {}
        }
    }
    file.calls = calls;
    file
}

/// Lex and parse one unit of [`SOURCE`].
#[must_use]
pub fn run_unit(alloc: Allocator<'_>) -> UnitSummary {
    let tokens = lex(alloc, SOURCE);
    let file = parse(alloc, SOURCE, &tokens);
    UnitSummary {
        tokens: tokens.len(),
        calls: file.calls.len(),
        strings: file.calls.iter().map(|call| call.strings).sum(),
    }
}

#[cfg(test)]
mod tests {
    use aspheap_pool::{HeapPool, PoolConfig};

    use super::*;

    #[test]
    fn lex_splits_identifiers_strings_and_punctuation() {
        let src = r#"f(name = "x")"#;
        let tokens = lex(Allocator::Heap, src);
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident,
                TokenKind::Punct,
                TokenKind::Ident,
                TokenKind::Punct,
                TokenKind::Str,
                TokenKind::Punct,
            ]
        );
        assert_eq!(&src[tokens[4].start..tokens[4].start + tokens[4].len], "\"x\"");
    }

    #[test]
    fn unterminated_string_runs_to_end() {
        let tokens = lex(Allocator::Heap, "\"abc");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].len, 4);
    }

    #[test]
    fn multibyte_punctuation_stays_on_char_boundaries() {
        let src = "rule(name = \"x\") § é";
        let tokens = lex(Allocator::Heap, src);
        let texts: Vec<&str> = tokens
            .iter()
            .map(|t| &src[t.start..t.start + t.len])
            .collect();
        assert_eq!(texts[texts.len() - 2..], ["§", "é"]);
        let file = parse(Allocator::Heap, src, &tokens);
        assert_eq!(file.calls.len(), 1);
        assert_eq!(file.calls[0].strings, 1);
    }

    #[test]
    fn source_has_two_calls() {
        let summary = run_unit(Allocator::Heap);
        assert_eq!(summary.calls, 2);
        assert_eq!(summary.strings, 15);
    }

    #[test]
    fn keyword_arguments_are_counted_per_call() {
        let tokens = lex(Allocator::Heap, SOURCE);
        let file = parse(Allocator::Heap, SOURCE, &tokens);
        let kwargs: Vec<usize> = file.calls.iter().map(|call| call.kwargs).collect();
        assert_eq!(kwargs, vec![4, 4]);
        let callee = &file.calls[0];
        let token = tokens[callee.callee];
        assert_eq!(&SOURCE[token.start..token.start + token.len], "go_library");
    }

    #[test]
    fn arena_and_heap_agree() {
        let pool = HeapPool::new(
            PoolConfig::new(1)
                .with_usages_before_free(None)
                .with_idle_time_until_free(None),
        )
        .unwrap();
        let heap = run_unit(Allocator::Heap);
        let arena = pool.with_heap(run_unit);
        assert_eq!(heap, arena);
    }
}
