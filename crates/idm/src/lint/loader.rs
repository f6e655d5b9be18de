//! Rule file loader
//!
//! ```text
//! load "cluster-definitions/onoff.xml";
//! all endpoints { require global attribute featureMap = 0xFFFC; }
//! endpoint 0 { require server cluster Descriptor; reject server cluster 6; }
//! rule "unique-codes";
//! ```

use std::path::Path;

use tracing::debug;

use super::rules::{self, ClusterRef, ClusterRejectionRule, ClusterRequirementRule};
use super::{LintRule, MandatoryElementsRule, RequiredGlobalAttributeRule};
use crate::error::{IdlError, Result};
use crate::lexer::{Lexer, Token};
use crate::parser::Parser;
use crate::xml::{self, XmlSource};

struct RuleFileParser<'a> {
    parser: Parser<'a>,
    base_dir: &'a Path,
}

impl<'a> RuleFileParser<'a> {
    fn parse(&mut self) -> Result<Vec<Box<dyn LintRule>>> {
        let mut rules: Vec<Box<dyn LintRule>> = Vec::new();

        while !self.parser.at_eof() {
            if self.parser.eat_word("load") {
                let path = self.parser.expect_string()?;
                self.parser.expect(&Token::Semicolon)?;
                rules.push(Box::new(self.load_xml(&path)?));
            } else if self.parser.eat_word("all") {
                self.parser.expect_word("endpoints")?;
                self.parse_all_endpoints(&mut rules)?;
            } else if self.parser.eat_word("endpoint") {
                let number = self.parser.expect_integer()?;
                let number = u16::try_from(number)
                    .map_err(|_| self.parser.error(format!("endpoint number {} out of range", number)))?;
                self.parse_endpoint(number, &mut rules)?;
            } else if self.parser.eat_word("rule") {
                let name = self.parser.expect_string()?;
                let rule = rules::builtin_rule(&name).ok_or_else(|| {
                    self.parser.error(format!(
                        "unknown rule `{}` (known rules: {})",
                        name,
                        rules::BUILTIN_RULES.join(", ")
                    ))
                })?;
                self.parser.expect(&Token::Semicolon)?;
                rules.push(rule);
            } else {
                return Err(self.parser.unexpected("`load`, `all`, `endpoint` or `rule`"));
            }
        }

        Ok(rules)
    }

    fn load_xml(&self, path: &str) -> Result<MandatoryElementsRule> {
        let source = XmlSource::from_file(self.base_dir.join(path))?;
        let clusters = xml::read_requirements(&source)?;
        debug!(path, clusters = clusters.len(), "loaded mandatory elements");
        Ok(MandatoryElementsRule::new(path, clusters))
    }

    fn parse_all_endpoints(&mut self, rules: &mut Vec<Box<dyn LintRule>>) -> Result<()> {
        self.parser.expect(&Token::LBrace)?;
        while !self.parser.eat(&Token::RBrace) {
            self.parser.expect_word("require")?;
            self.parser.expect_word("global")?;
            self.parser.expect_word("attribute")?;
            let name = self.parser.expect_ident()?;
            self.parser.expect(&Token::Equals)?;
            let code = self.parser.expect_u32()?;
            self.parser.expect(&Token::Semicolon)?;
            rules.push(Box::new(RequiredGlobalAttributeRule::new(name, code)));
        }
        Ok(())
    }

    fn parse_endpoint(&mut self, number: u16, rules: &mut Vec<Box<dyn LintRule>>) -> Result<()> {
        self.parser.expect(&Token::LBrace)?;
        while !self.parser.eat(&Token::RBrace) {
            let require = if self.parser.eat_word("require") {
                true
            } else if self.parser.eat_word("reject") {
                false
            } else {
                return Err(self.parser.unexpected("`require` or `reject`"));
            };
            self.parser.expect_word("server")?;
            self.parser.expect_word("cluster")?;
            let cluster = match self.parser.current() {
                Token::Integer(_) | Token::HexInteger(_) => ClusterRef::Code(self.parser.expect_u32()?),
                _ => ClusterRef::Name(self.parser.expect_ident()?),
            };
            self.parser.expect(&Token::Semicolon)?;

            if require {
                rules.push(Box::new(ClusterRequirementRule::new(number, cluster)));
            } else {
                rules.push(Box::new(ClusterRejectionRule::new(number, cluster)));
            }
        }
        Ok(())
    }
}

/// Load the rules of a rule file
///
/// `load` paths are relative to `base_dir`.
pub fn load_rules(text: &str, file_name: &str, base_dir: &Path) -> Result<Vec<Box<dyn LintRule>>> {
    let tokens = Lexer::new(text, file_name).tokenize()?;
    let mut parser = RuleFileParser {
        parser: Parser::new(&tokens, text, file_name),
        base_dir,
    };
    let rules = parser.parse()?;
    debug!(file = file_name, rules = rules.len(), "loaded lint rules");
    Ok(rules)
}
