//! CSS Syntax Module Level 3 - Parsing and tokenization.
//! Spec: <https://www.w3.org/TR/css-syntax-3/>
//!
//! Produces raw rules (prelude text plus declarations) for the orchestrator to
//! turn into selector-bearing style rules. Only qualified rules and `@media`
//! blocks are kept; every other at-rule is skipped with its block.
use cssparser::AtRuleParser as CssAtRuleParser;
use cssparser::BasicParseErrorKind;
use cssparser::CowRcStr;
use cssparser::DeclarationParser as CssDeclarationParser;
use cssparser::ParseError;
use cssparser::Parser;
use cssparser::ParserInput;
use cssparser::ParserState;
use cssparser::QualifiedRuleParser as CssQualifiedRuleParser;
use cssparser::RuleBodyItemParser as CssRuleBodyItemParser;
use cssparser::RuleBodyParser as CssRuleBodyParser;
use cssparser::StyleSheetParser;

/// A single CSS declaration (property: value [!important]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// Lowercased property name.
    pub name: String,
    /// Raw value text (without trailing !important).
    pub value: String,
    /// Whether the declaration was marked as `!important`.
    pub important: bool,
}

/// A single style rule with a raw prelude and parsed declarations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleRule {
    /// Raw prelude text (typically the selector list).
    pub prelude: String,
    /// Declarations within the rule block.
    pub declarations: Vec<Declaration>,
    /// Media query lists of the enclosing `@media` blocks, outermost first.
    /// The rule applies only when every list matches.
    pub media: Vec<String>,
}

/// A parsed stylesheet consisting of style rules.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stylesheet {
    /// Top-level style rules in source order, `@media` contents flattened in place.
    pub rules: Vec<StyleRule>,
}

/// Split `!important` off the end of a value, returning (`value_without_important`, `important_flag`).
/// Accepts any ASCII case and whitespace between `!` and `important`.
fn split_important_tail(value: &str) -> (String, bool) {
    let trimmed = value.trim();
    let keyword = "important";
    if trimmed.len() >= keyword.len() {
        let split_at = trimmed.len() - keyword.len();
        if let (Some(head), Some(tail)) = (trimmed.get(..split_at), trimmed.get(split_at..))
            && tail.eq_ignore_ascii_case(keyword)
            && let Some(before_bang) = head.trim_end().strip_suffix('!')
        {
            return (before_bang.trim_end().to_owned(), true);
        }
    }
    (trimmed.to_owned(), false)
}

/// A declaration parser that records property name and its raw value.
struct BodyDeclParser;

impl<'input> CssDeclarationParser<'input> for BodyDeclParser {
    type Declaration = Declaration;
    type Error = ();

    fn parse_value<'token>(
        &mut self,
        name: CowRcStr<'input>,
        input: &mut Parser<'input, 'token>,
        _decl_start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'input, Self::Error>> {
        let start = input.position();
        // Consume until end of the declaration item.
        while input.next_including_whitespace_and_comments().is_ok() {}
        let raw = input.slice_from(start);
        let (value, important) = split_important_tail(raw);
        if value.is_empty() {
            return Err(input.new_error(BasicParseErrorKind::EndOfInput));
        }
        Ok(Declaration {
            name: name.to_ascii_lowercase(),
            value,
            important,
        })
    }
}

impl<'input> CssAtRuleParser<'input> for BodyDeclParser {
    type Prelude = ();
    type AtRule = Declaration; // Not produced
    type Error = ();

    #[inline]
    fn parse_prelude<'token>(
        &mut self,
        name: CowRcStr<'input>,
        input: &mut Parser<'input, 'token>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        Err(input.new_error(BasicParseErrorKind::AtRuleInvalid(name)))
    }
}

impl<'input> CssQualifiedRuleParser<'input> for BodyDeclParser {
    type Prelude = ();
    type QualifiedRule = Declaration; // Not produced
    type Error = ();

    #[inline]
    fn parse_prelude<'token>(
        &mut self,
        input: &mut Parser<'input, 'token>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        Err(input.new_error(BasicParseErrorKind::QualifiedRuleInvalid))
    }
}

impl CssRuleBodyItemParser<'_, Declaration, ()> for BodyDeclParser {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Item produced by the rule-list parser: a plain rule, or the flattened
/// contents of an `@media` block.
enum RuleListItem {
    Style(StyleRule),
    Media(Vec<StyleRule>),
}

/// Rule-list parser that builds `StyleRule` items for qualified rules and
/// `@media` blocks. `media` holds the query lists of the enclosing blocks.
struct RuleListParser {
    media: Vec<String>,
}

impl<'input> CssAtRuleParser<'input> for RuleListParser {
    type Prelude = String;
    type AtRule = RuleListItem;
    type Error = ();

    fn parse_prelude<'token>(
        &mut self,
        name: CowRcStr<'input>,
        input: &mut Parser<'input, 'token>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        if !name.eq_ignore_ascii_case("media") {
            return Err(input.new_error(BasicParseErrorKind::AtRuleInvalid(name)));
        }
        let start = input.position();
        while input.next_including_whitespace_and_comments().is_ok() {}
        Ok(input.slice_from(start).trim().to_owned())
    }

    fn parse_block<'token>(
        &mut self,
        prelude: Self::Prelude,
        _state: &ParserState,
        input: &mut Parser<'input, 'token>,
    ) -> Result<Self::AtRule, ParseError<'input, Self::Error>> {
        // Query lists are kept apart; joining their text would rescope comma lists.
        let mut media = self.media.clone();
        if !prelude.is_empty() {
            media.push(prelude);
        }
        let mut nested = Self { media };
        Ok(RuleListItem::Media(parse_rule_list(input, &mut nested)))
    }
}

impl<'input> CssQualifiedRuleParser<'input> for RuleListParser {
    type Prelude = String; // raw selector/prelude
    type QualifiedRule = RuleListItem;
    type Error = ();

    #[inline]
    fn parse_prelude<'token>(
        &mut self,
        input: &mut Parser<'input, 'token>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        let start = input.state();
        while input.next_including_whitespace_and_comments().is_ok() {}
        Ok(input.slice_from(start.position()).trim().to_owned())
    }

    #[inline]
    fn parse_block<'token>(
        &mut self,
        prelude: Self::Prelude,
        _state: &ParserState,
        input: &mut Parser<'input, 'token>,
    ) -> Result<Self::QualifiedRule, ParseError<'input, Self::Error>> {
        let decls = parse_declarations_from_block(input);
        Ok(RuleListItem::Style(StyleRule {
            prelude,
            declarations: decls,
            media: self.media.clone(),
        }))
    }
}

/// Parse a list of rules, flattening `@media` contents in source order.
fn parse_rule_list(input: &mut Parser, top: &mut RuleListParser) -> Vec<StyleRule> {
    let mut rules = Vec::new();
    for item in StyleSheetParser::new(input, top).flatten() {
        match item {
            RuleListItem::Style(rule) => rules.push(rule),
            RuleListItem::Media(nested) => rules.extend(nested),
        }
    }
    rules
}

/// Parse declarations from a rule block using `cssparser` body parser.
fn parse_declarations_from_block(block: &mut Parser) -> Vec<Declaration> {
    let mut body = BodyDeclParser;
    CssRuleBodyParser::new(block, &mut body).flatten().collect()
}

/// Parse a full stylesheet into a `Stylesheet` using cssparser.
/// Invalid rules and declarations are dropped, as CSS error recovery requires.
pub fn parse_stylesheet(css: &str) -> Stylesheet {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut top = RuleListParser { media: Vec::new() };
    Stylesheet {
        rules: parse_rule_list(&mut parser, &mut top),
    }
}

/// Parse a bare declaration list, as found in a `style` attribute.
pub fn parse_declaration_list(text: &str) -> Vec<Declaration> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    parse_declarations_from_block(&mut parser)
}
