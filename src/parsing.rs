use crate::{
    IProduction, ImplementationError, ParseResult, Parser, TokenImpl, TokenSpec, Tokenizer, Tokens,
    Visitor,
};
use std::collections::HashSet;
use std::rc::Rc;

impl<TL: TokenImpl, V> Parser<TL, V> {
    /// Assemble a parser from a token specification and a start production.
    ///
    /// The whole production graph reachable from the start symbol is
    /// validated: unsupported left recursion, ambiguous token choices,
    /// invalid list flags, empty operator sets, and unset `init`-ed
    /// productions are construction-time errors.
    pub fn new(
        spec: Rc<TokenSpec<TL>>,
        start: Rc<dyn IProduction<Token = TL, Value = V>>,
    ) -> Result<Self, ImplementationError> {
        let parser = Self { spec, start };
        parser.validate()?;
        Ok(parser)
    }

    pub fn validate(&self) -> Result<(), ImplementationError> {
        self.start.validate(&mut Vec::new(), &mut HashSet::new())
    }

    /// Parse an input buffer, routing matched constructs and diagnostics to
    /// the visitor.
    pub fn parse<'i, VI: Visitor<TL, Value = V>>(
        &self,
        input: &'i [u8],
        visitor: &mut VI,
    ) -> ParseResult<V> {
        let mut tokenizer = Tokenizer::new(&self.spec, input);
        self.start.parse(&mut tokenizer, visitor)
    }

    /// Parse from an existing tokenizer position, leaving the tokenizer at
    /// the first unconsumed token.
    pub fn parse_with<VI: Visitor<TL, Value = V>>(
        &self,
        tokenizer: &mut Tokenizer<'_, TL>,
        visitor: &mut VI,
    ) -> ParseResult<V> {
        self.start.parse(tokenizer, visitor)
    }

    /// Lazily tokenize an input buffer against the parser's specification.
    pub fn tokenize<'i>(&self, input: &'i [u8]) -> Tokens<'i, TL> {
        Tokenizer::new(&self.spec, input).tokens()
    }

    pub fn spec(&self) -> &Rc<TokenSpec<TL>> {
        &self.spec
    }

    pub fn start(&self) -> &Rc<dyn IProduction<Token = TL, Value = V>> {
        &self.start
    }

    /// Write the grammar of the production graph followed by the token
    /// fragment listing.
    pub fn grammar(&self) -> Result<String, std::fmt::Error> {
        let mut writer = String::new();
        self.start.impl_grammar(&mut writer, &mut HashSet::new())?;
        writer.push_str(&self.spec.build_grammar()?);
        Ok(writer)
    }
}
