use crate::util::{Code, Log};
use crate::{
    ILexeme, ImplementationError, LiteralTrie, MatchResult, TokenImpl, TokenSpec, TokenSpecBuilder,
    Tokenizer, Tokens,
};
use once_cell::unsync::OnceCell;
use std::fmt::Write;
use std::rc::Rc;

/// The composite rule formed from the identifier lexeme and the keyword
/// spellings: a keyword wins only when it spans the whole identifier match.
struct KeywordIdentifier<TL: TokenImpl> {
    identifier: Rc<dyn ILexeme<Token = TL>>,
    keywords: LiteralTrie<TL>,
}

impl<TL: TokenImpl> ILexeme for KeywordIdentifier<TL> {
    type Token = TL;

    fn try_match(&self, code: &Code, pointer: usize) -> MatchResult<TL> {
        match self.identifier.try_match(code, pointer) {
            MatchResult::Success { kind, bump } => {
                let span = &code.value[pointer..pointer + bump];
                match self.keywords.find_longest(span) {
                    // A prefix-only keyword match does not count.
                    Some((keyword, length, _)) if length == bump => {
                        MatchResult::Success {
                            kind: keyword,
                            bump,
                        }
                    }
                    _ => MatchResult::Success { kind, bump },
                }
            }
            other => other,
        }
    }

    fn token(&self) -> TL {
        self.identifier.token()
    }

    fn conflicting_literals(&self) -> &[TL] {
        self.identifier.conflicting_literals()
    }

    fn grammar_field(&self) -> (TL, String) {
        self.identifier.grammar_field()
    }
}

impl<TL: TokenImpl> TokenSpec<TL> {
    pub fn builder() -> TokenSpecBuilder<TL> {
        TokenSpecBuilder {
            literals: Vec::new(),
            rules: Vec::new(),
            identifier: None,
            keywords: Vec::new(),
            whitespace: Vec::new(),
        }
    }

    /// Run the match engine at a byte position of the input.
    ///
    /// Literal dispatch is longest-match through the trie; a rule that
    /// declared a conflict with the winning literal is re-checked and wins
    /// when it consumes at least as many bytes. Without a literal match the
    /// rules are tried in declaration order: the first success wins and the
    /// first reported error run is kept as the fallback. An unrecognizable
    /// byte is consumed as `Error(1)`.
    pub fn try_match(&self, code: &Code, pointer: usize) -> MatchResult<TL> {
        if pointer == code.value.len() {
            return MatchResult::Eof;
        }

        if let Some((token, length, conflicts)) = self.trie.find_longest(&code.value[pointer..]) {
            for &rule_index in conflicts {
                if let MatchResult::Success { kind, bump } =
                    self.rules[rule_index].try_match(code, pointer)
                {
                    if bump >= length {
                        return MatchResult::Success { kind, bump };
                    }
                }
            }
            return MatchResult::Success {
                kind: token,
                bump: length,
            };
        }

        let mut fallback = None;
        for rule in &self.rules {
            match rule.try_match(code, pointer) {
                success @ MatchResult::Success { .. } => return success,
                MatchResult::Error { bump } => {
                    if fallback.is_none() {
                        fallback = Some(bump);
                    }
                }
                _ => {}
            }
        }

        match fallback {
            Some(bump) => MatchResult::Error { bump },
            None => MatchResult::error(1),
        }
    }

    /// Whether the given kind is marked whitespace and auto-skipped by the
    /// tokenizer.
    pub fn is_whitespace(&self, kind: TL) -> bool {
        self.whitespace.binary_search(&kind).is_ok()
    }

    pub(crate) fn has_whitespace(&self) -> bool {
        !self.whitespace.is_empty()
    }

    pub(crate) fn debugger(&self) -> Option<&Log<&'static str>> {
        self.debug.get()
    }

    /// Set a log label to debug tokenization against this specification.
    pub fn set_log(&self, log: Log<&'static str>) -> Result<(), String> {
        self.debug
            .set(log)
            .map_err(|err| format!("Log label {} is already assigned.", err))
    }

    /// Lazily tokenize an input buffer against this specification.
    pub fn tokenize<'i>(spec: &Rc<Self>, input: &'i [u8]) -> Tokens<'i, TL> {
        Tokenizer::new(spec, input).tokens()
    }

    /// Write the token fragment listing of this specification.
    pub fn build_grammar(&self) -> Result<String, std::fmt::Error> {
        let mut writer = String::new();
        writeln!(writer, "fragment {{")?;
        for (s, t) in &self.literals {
            writeln!(writer, "{:>6}{:?} : {:?} ,", "", t, s)?;
        }
        for (s, t) in &self.keywords {
            writeln!(writer, "{:>6}{:?} : {:?} ,", "", t, s)?;
        }
        for fields in self.rules.iter().map(|l| l.grammar_field()) {
            writeln!(writer, "{:>6}{:?} : {} ,", "", fields.0, fields.1)?;
        }
        writeln!(writer, "}}")?;
        Ok(writer)
    }

    /// Print the literal dispatch trie for debugging.
    pub fn print_trie(&self) -> Result<(), std::io::Error> {
        self.trie.print()
    }
}

impl<TL: TokenImpl + 'static> TokenSpecBuilder<TL> {
    /// Add a literal token with a fixed spelling.
    pub fn literal(mut self, spelling: &str, token: TL) -> Self {
        self.literals.push((spelling.to_string(), token));
        self
    }

    /// Add a rule token. Rules are tried in declaration order; rules must be
    /// mutually exclusive at any given cursor.
    pub fn rule(mut self, lexeme: Rc<dyn ILexeme<Token = TL>>) -> Self {
        self.rules.push(lexeme);
        self
    }

    /// Add the identifier rule. At most one identifier is allowed; keywords
    /// interact with it.
    pub fn identifier(mut self, lexeme: Rc<dyn ILexeme<Token = TL>>) -> Self {
        if self.identifier.is_none() {
            self.identifier = Some(self.rules.len());
        } else {
            // Surfaced as an error at build.
            self.identifier = Some(usize::MAX);
        }
        self.rules.push(lexeme);
        self
    }

    /// Add a keyword: a literal spelling which must also match the identifier
    /// rule and wins over it on a whole-span match.
    pub fn keyword(mut self, spelling: &str, token: TL) -> Self {
        self.keywords.push((spelling.to_string(), token));
        self
    }

    /// Mark a token kind as whitespace; the tokenizer silently skips matches
    /// of that kind.
    pub fn whitespace(mut self, token: TL) -> Self {
        self.whitespace.push(token);
        self
    }

    pub fn build(self) -> Result<TokenSpec<TL>, ImplementationError> {
        let TokenSpecBuilder {
            literals,
            mut rules,
            identifier,
            keywords,
            mut whitespace,
        } = self;

        let mut trie = LiteralTrie::new();
        for (spelling, token) in &literals {
            if spelling.is_empty() {
                return Err(ImplementationError::new(
                    "EmptyLiteral".to_string(),
                    format!("Literal for token {:?} has an empty spelling.", token),
                ));
            }
            trie.insert(spelling.as_bytes(), *token).map_err(|existing| {
                ImplementationError::new(
                    "DuplicateLiteral".to_string(),
                    format!(
                        "Literal '{}' is already added with token {:?}.",
                        spelling, existing
                    ),
                )
            })?;
        }

        match identifier {
            Some(usize::MAX) => {
                return Err(ImplementationError::new(
                    "DuplicateIdentifier".to_string(),
                    "At most one identifier rule is allowed.".to_string(),
                ));
            }
            Some(index) => {
                let identifier_rule = rules[index].clone();
                let mut keyword_trie = LiteralTrie::new();
                for (spelling, token) in &keywords {
                    let keyword_code = Code::from(spelling.as_str());
                    match identifier_rule.try_match(&keyword_code, 0) {
                        MatchResult::Success { bump, .. } if bump == spelling.len() => {}
                        _ => {
                            return Err(ImplementationError::new(
                                "KeywordMismatch".to_string(),
                                format!(
                                    "Keyword '{}' does not match the identifier rule.",
                                    spelling
                                ),
                            ));
                        }
                    }
                    keyword_trie
                        .insert(spelling.as_bytes(), *token)
                        .map_err(|existing| {
                            ImplementationError::new(
                                "DuplicateKeyword".to_string(),
                                format!(
                                    "Keyword '{}' is already added with token {:?}.",
                                    spelling, existing
                                ),
                            )
                        })?;
                }
                rules[index] = Rc::new(KeywordIdentifier {
                    identifier: identifier_rule,
                    keywords: keyword_trie,
                });
            }
            None => {
                if !keywords.is_empty() {
                    return Err(ImplementationError::new(
                        "MissingIdentifier".to_string(),
                        "Keywords require an identifier rule.".to_string(),
                    ));
                }
            }
        }

        for (index, rule) in rules.iter().enumerate() {
            let conflicts = rule.conflicting_literals();
            if !conflicts.is_empty() {
                trie.attach_conflicts(index, conflicts);
            }
        }

        whitespace.sort();
        whitespace.dedup();

        Ok(TokenSpec {
            trie,
            rules,
            whitespace,
            literals,
            keywords,
            debug: OnceCell::new(),
        })
    }
}
