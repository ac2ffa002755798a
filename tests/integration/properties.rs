//! Property tests: the front end never panics on arbitrary input

use proptest::prelude::*;

use etch::frontend::config::CompilerConfig;
use etch::frontend::lexer::{tokenize, TokenKind};
use etch::frontend::Compiler;
use etch::util::span::SourceFile;

/// Fragments that keep random programs close to the real grammar
const FRAGMENTS: &[&str] = &[
    "function", "endfunction", "while", "endwhile", "for", "endfor", "in", "if", "elseif",
    "else", "endif", "var", "return", "break", "continue", "use", "as", "any", "contract",
    "endcontract", "struct", "endstruct", "persistent", "x", "main", "Int32", "Array", "<",
    ">", "(", ")", "[", "]", "{", "}", ",", ";", ":", ".", "=", "+=", "+", "-", "*", "/", "%",
    "==", "!=", "&&", "||", "!", "++", "--", "1", "2.5", "7u8", "'s'", "\"t\"", "@tag", "\n",
];

fn program() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(FRAGMENTS), 0..64).prop_map(|parts| parts.join(" "))
}

proptest! {
    #[test]
    fn tokenize_always_ends_with_end_of_input(source in "\\PC{0,200}") {
        let tokens = tokenize(&source);
        prop_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::EndOfInput));
    }

    #[test]
    fn parse_arbitrary_text_without_panicking(source in "\\PC{0,200}") {
        let compiler = Compiler::new(CompilerConfig::default());
        let result = compiler.parse(&[SourceFile::new("fuzz.etch", source)]);
        if let Err(errors) = result {
            prop_assert!(!errors.is_empty());
        }
    }

    #[test]
    fn parse_token_soup_reports_lines_inside_the_file(source in program()) {
        let lines = source.lines().count().max(1) as u16;
        let compiler = Compiler::new(CompilerConfig::default());
        match compiler.parse(&[SourceFile::new("soup.etch", source.as_str())]) {
            Ok(root) => prop_assert_eq!(root.block_children.len(), 1),
            Err(errors) => {
                prop_assert!(!errors.is_empty());
                for error in &errors {
                    prop_assert!(error.line <= lines + 1, "{}", error);
                }
            }
        }
    }
}
