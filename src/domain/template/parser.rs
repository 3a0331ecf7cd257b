// Template parser using recursive descent

use anyhow::{bail, Result};

use super::ast::{Template, TemplatePart};

pub struct TemplateParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> TemplateParser<'a> {
    pub fn parse(template: &'a str) -> Result<Template> {
        if template.is_empty() {
            bail!("Template cannot be empty");
        }
        let mut parser = Self {
            input: template,
            pos: 0,
        };
        parser.parse_template()
    }

    fn parse_template(&mut self) -> Result<Template> {
        let mut parts = Vec::new();
        let mut literal_buf = String::new();

        while let Some(ch) = self.peek_char() {
            match ch {
                '{' => {
                    // Start of token - flush literal buffer first
                    if !literal_buf.is_empty() {
                        parts.push(TemplatePart::Literal(std::mem::take(&mut literal_buf)));
                    }
                    let name = self.parse_token()?;
                    parts.push(TemplatePart::Token(name));
                }
                '}' => bail!("Unexpected closing brace at position {}", self.pos),
                _ => literal_buf.push(self.consume_char()?),
            }
        }

        if !literal_buf.is_empty() {
            parts.push(TemplatePart::Literal(literal_buf));
        }

        Ok(Template::new(self.input, parts))
    }

    fn parse_token(&mut self) -> Result<String> {
        self.expect_char('{')?;
        self.skip_whitespace();

        let name = self.parse_identifier()?;

        self.skip_whitespace();
        self.expect_char('}')?;

        Ok(name)
    }

    fn parse_identifier(&mut self) -> Result<String> {
        let mut ident = String::new();

        while let Some(ch) = self.peek_char() {
            if ch.is_alphanumeric() || ch == '_' {
                ident.push(self.consume_char()?);
            } else if ch == '}' || ch.is_whitespace() {
                break;
            } else {
                bail!(
                    "Invalid character '{}' in token name at position {}",
                    ch,
                    self.pos
                );
            }
        }

        if ident.is_empty() {
            bail!("Expected token name at position {}", self.pos);
        }

        Ok(ident)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.pos += ch.len_utf8();
            } else {
                break;
            }
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn consume_char(&mut self) -> Result<char> {
        let ch = self
            .peek_char()
            .ok_or_else(|| anyhow::anyhow!("Unexpected end of input at position {}", self.pos))?;
        self.pos += ch.len_utf8();
        Ok(ch)
    }

    fn expect_char(&mut self, expected: char) -> Result<()> {
        match self.peek_char() {
            Some(ch) if ch == expected => {
                self.consume_char()?;
                Ok(())
            }
            Some(ch) => bail!(
                "Expected '{}' but found '{}' at position {}",
                expected,
                ch,
                self.pos
            ),
            None => bail!("Expected '{}' but found end of input", expected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_token() {
        let template = TemplateParser::parse("dummy://{host}").unwrap();
        assert_eq!(template.parts.len(), 2);

        match &template.parts[0] {
            TemplatePart::Literal(s) => assert_eq!(s, "dummy://"),
            _ => panic!("Expected literal"),
        }

        match &template.parts[1] {
            TemplatePart::Token(name) => assert_eq!(name, "host"),
            _ => panic!("Expected token"),
        }
    }

    #[test]
    fn test_parse_multiple_tokens() {
        let template = TemplateParser::parse("{schema}://{user}:{password}@{host}").unwrap();
        assert_eq!(template.tokens(), vec!["schema", "user", "password", "host"]);
        assert_eq!(template.source, "{schema}://{user}:{password}@{host}");
    }

    #[test]
    fn test_parse_adjacent_tokens() {
        let template = TemplateParser::parse("{schema}://{host}{fullpath}{token}").unwrap();
        assert_eq!(template.tokens(), vec!["schema", "host", "fullpath", "token"]);
        assert_eq!(template.parts.len(), 5);
    }

    #[test]
    fn test_parse_whitespace_inside_braces() {
        let template = TemplateParser::parse("x://{ host }").unwrap();
        assert_eq!(template.tokens(), vec!["host"]);
    }

    #[test]
    fn test_parse_literal_only() {
        let template = TemplateParser::parse("test://test/test").unwrap();
        assert!(template.tokens().is_empty());
    }

    #[test]
    fn test_parse_empty_fails() {
        assert!(TemplateParser::parse("").is_err());
    }

    #[test]
    fn test_parse_unclosed_token_fails() {
        let result = TemplateParser::parse("x://{host");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("end of input"));
    }

    #[test]
    fn test_parse_stray_closing_brace_fails() {
        let result = TemplateParser::parse("x://host}");
        assert!(result.unwrap_err().to_string().contains("Unexpected closing brace"));
    }

    #[test]
    fn test_parse_empty_token_fails() {
        let result = TemplateParser::parse("x://{}");
        assert!(result.unwrap_err().to_string().contains("Expected token name"));
    }

    #[test]
    fn test_parse_invalid_token_character_fails() {
        let result = TemplateParser::parse("x://{host:port}");
        assert!(result.unwrap_err().to_string().contains("Invalid character ':'"));
    }

    #[test]
    fn test_substitute() {
        let template = TemplateParser::parse("{schema}://{host}/{token}").unwrap();
        let url = template.substitute(|name| name.to_uppercase());
        assert_eq!(url, "SCHEMA://HOST/TOKEN");
    }
}
