//! Lexer unit tests

use crate::frontend::lexer::{keyword_from_str, numeric_body, tokenize, unquote, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source).into_iter().map(|t| t.kind).collect()
}

mod lexer_basic_tests {
    use super::*;

    #[test]
    fn test_empty_source() {
        let tokens = tokenize("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::EndOfInput);
    }

    #[test]
    fn test_whitespace_and_comments() {
        assert_eq!(
            kinds("  \t\n // line comment\n /* block\n comment */ \r\n"),
            vec![TokenKind::EndOfInput]
        );
    }

    #[test]
    fn test_identifier_text() {
        let tokens = tokenize("my_variable test123");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text, "my_variable");
        assert_eq!(tokens[1].text, "test123");
    }

    #[test]
    fn test_annotation_identifier() {
        let tokens = tokenize("@action @");
        assert_eq!(tokens[0].kind, TokenKind::AnnotationIdentifier);
        assert_eq!(tokens[0].text, "@action");
        assert_eq!(tokens[1].kind, TokenKind::Unknown);
    }

    #[test]
    fn test_line_numbers() {
        let tokens = tokenize("a\n\nb\n/* x\n y */ c");
        assert_eq!(tokens[0].line(), 1);
        assert_eq!(tokens[1].line(), 3);
        assert_eq!(tokens[2].line(), 5);
    }
}

mod lexer_keyword_tests {
    use super::*;

    #[test]
    fn test_block_keywords() {
        assert_eq!(
            kinds("function endfunction while endwhile for in endfor"),
            vec![
                TokenKind::Function,
                TokenKind::EndFunction,
                TokenKind::While,
                TokenKind::EndWhile,
                TokenKind::For,
                TokenKind::In,
                TokenKind::EndFor,
                TokenKind::EndOfInput,
            ]
        );
        assert_eq!(
            kinds("if elseif else endif contract endcontract struct endstruct"),
            vec![
                TokenKind::If,
                TokenKind::ElseIf,
                TokenKind::Else,
                TokenKind::EndIf,
                TokenKind::Contract,
                TokenKind::EndContract,
                TokenKind::Struct,
                TokenKind::EndStruct,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_statement_keywords() {
        assert_eq!(
            kinds("var return break continue use as persistent true false null"),
            vec![
                TokenKind::Var,
                TokenKind::Return,
                TokenKind::Break,
                TokenKind::Continue,
                TokenKind::Use,
                TokenKind::As,
                TokenKind::Persistent,
                TokenKind::True,
                TokenKind::False,
                TokenKind::Null,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        assert_eq!(keyword_from_str("endwhile"), Some(TokenKind::EndWhile));
        assert_eq!(keyword_from_str("whiles"), None);
        assert_eq!(kinds("iff")[0], TokenKind::Identifier);
        assert_eq!(kinds("sharded")[0], TokenKind::Identifier);
    }
}

mod lexer_operator_tests {
    use super::*;

    #[test]
    fn test_arithmetic_and_assignment() {
        assert_eq!(
            kinds("+ - * / % = += -= *= /= %= ++ --"),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Multiply,
                TokenKind::Divide,
                TokenKind::Modulo,
                TokenKind::Assign,
                TokenKind::InplaceAdd,
                TokenKind::InplaceSubtract,
                TokenKind::InplaceMultiply,
                TokenKind::InplaceDivide,
                TokenKind::InplaceModulo,
                TokenKind::Inc,
                TokenKind::Dec,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_comparison_and_logic() {
        assert_eq!(
            kinds("== != < <= > >= && || !"),
            vec![
                TokenKind::Equal,
                TokenKind::NotEqual,
                TokenKind::LessThan,
                TokenKind::LessThanOrEqual,
                TokenKind::GreaterThan,
                TokenKind::GreaterThanOrEqual,
                TokenKind::And,
                TokenKind::Or,
                TokenKind::Not,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(
            kinds("()[]{},;:."),
            vec![
                TokenKind::LeftParenthesis,
                TokenKind::RightParenthesis,
                TokenKind::LeftSquareBracket,
                TokenKind::RightSquareBracket,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Comma,
                TokenKind::SemiColon,
                TokenKind::Colon,
                TokenKind::Dot,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_single_ampersand_and_pipe_are_unknown() {
        assert_eq!(kinds("& |")[..2], [TokenKind::Unknown, TokenKind::Unknown]);
    }
}

mod lexer_literal_tests {
    use super::*;

    #[test]
    fn test_integer_suffixes() {
        assert_eq!(
            kinds("1 2i8 3u8 4i16 5u16 6i32 7u32 8i64 9u64"),
            vec![
                TokenKind::Integer32,
                TokenKind::Integer8,
                TokenKind::UnsignedInteger8,
                TokenKind::Integer16,
                TokenKind::UnsignedInteger16,
                TokenKind::Integer32,
                TokenKind::UnsignedInteger32,
                TokenKind::Integer64,
                TokenKind::UnsignedInteger64,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_real_suffixes() {
        assert_eq!(
            kinds("1.5 2.5f 3.0fp32 4fp64 5.25fp128 1e3 2.5E-2"),
            vec![
                TokenKind::Float64,
                TokenKind::Float32,
                TokenKind::Fixed32,
                TokenKind::Fixed64,
                TokenKind::Fixed128,
                TokenKind::Float64,
                TokenKind::Float64,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_bad_suffixes_are_unknown() {
        assert_eq!(kinds("1.5i32")[0], TokenKind::Unknown);
        assert_eq!(kinds("12xyz")[0], TokenKind::Unknown);
    }

    #[test]
    fn test_literal_text_keeps_suffix() {
        let tokens = tokenize("42u64 1.5fp64");
        assert_eq!(tokens[0].text, "42u64");
        assert_eq!(numeric_body(&tokens[0].text), "42");
        assert_eq!(numeric_body(&tokens[1].text), "1.5");
        assert_eq!(numeric_body("2.5e-3f"), "2.5e-3");
    }

    #[test]
    fn test_member_access_on_integer_is_not_real() {
        assert_eq!(
            kinds("1.x"),
            vec![
                TokenKind::Integer32,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_strings() {
        let tokens = tokenize(r#""hello" 'world' "a\"b""#);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "\"hello\"");
        assert_eq!(tokens[1].text, "'world'");
        assert_eq!(tokens[2].kind, TokenKind::String);
        assert_eq!(unquote(&tokens[2].text), "a\"b");
        assert_eq!(unquote("'tab\\there'"), "tab\there");
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = tokenize("\"open\nx");
        assert_eq!(tokens[0].kind, TokenKind::Unknown);
        assert_eq!(tokens[0].text, "\"open");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_bad_escape() {
        assert_eq!(kinds(r#""a\qb""#)[0], TokenKind::Unknown);
    }

    #[test]
    fn test_unterminated_comment() {
        let tokens = tokenize("a /* never closed");
        assert_eq!(tokens[1].kind, TokenKind::Unknown);
        assert!(tokens[1].text.starts_with("/*"));
        assert_eq!(tokens[2].kind, TokenKind::EndOfInput);
    }

    #[test]
    fn test_slash_beside_comments() {
        let tokens = tokenize("a / b // rest\n/* c */ d /= e");
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::Divide,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::InplaceDivide,
                TokenKind::Identifier,
                TokenKind::EndOfInput,
            ]
        );
        assert_eq!(tokens[3].text, "d");
        assert_eq!(tokens[3].line(), 2);
    }
}
