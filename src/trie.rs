use crate::{LiteralTrie, TokenImpl};
use ptree::TreeItem;
use std::borrow::Cow;

impl<TToken> LiteralTrie<TToken> {
    pub fn new() -> Self {
        Self {
            token: None,
            children: Vec::new(),
            conflicts: Vec::new(),
        }
    }

    /// Insert a literal spelling. A duplicate terminal at the same path
    /// returns the clashing token.
    pub fn insert(&mut self, value: &[u8], token: TToken) -> Result<(), TToken> {
        if value.len() > 0 {
            match self
                .children
                .binary_search_by_key(&value[0], |child| child.0)
            {
                Ok(index) => self.children[index].1.insert(&value[1..], token),
                Err(index) => {
                    let mut field = LiteralTrie::new();
                    field.insert(&value[1..], token)?;
                    self.children.insert(index, (value[0], field));
                    Ok(())
                }
            }
        } else {
            match self.token.replace(token) {
                Some(t) => Err(t),
                None => Ok(()),
            }
        }
    }
}

impl<TToken: Copy> LiteralTrie<TToken> {
    /// Descend the trie over `code_part`, returning the last terminal passed
    /// with its byte length and conflict rule indices.
    pub fn find_longest(&self, code_part: &[u8]) -> Option<(TToken, usize, &[usize])> {
        let mut current = self;
        let mut index = 0;
        let mut last_terminal = None;

        loop {
            if code_part.len() > index {
                match current
                    .children
                    .binary_search_by_key(&code_part[index], |s| s.0)
                {
                    Ok(i) => {
                        index += 1;
                        current = &current.children[i].1;
                        if let Some(token) = current.token {
                            last_terminal = Some((token, index, current.conflicts.as_slice()));
                        }
                    }
                    Err(_) => break last_terminal,
                }
            } else {
                break last_terminal;
            }
        }
    }
}

impl<TToken: Copy + PartialEq> LiteralTrie<TToken> {
    /// Attach `rule_index` as a re-check at every terminal whose token is one
    /// of `kinds`.
    pub fn attach_conflicts(&mut self, rule_index: usize, kinds: &[TToken]) {
        if let Some(token) = self.token {
            if kinds.contains(&token) {
                self.conflicts.push(rule_index);
            }
        }
        for (_, child) in &mut self.children {
            child.attach_conflicts(rule_index, kinds);
        }
    }
}

#[derive(Clone)]
pub(crate) struct TriePrintItem {
    label: String,
    children: Vec<TriePrintItem>,
}

impl TreeItem for TriePrintItem {
    type Child = Self;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _: &ptree::Style) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::from(&self.children)
    }
}

impl<TToken: TokenImpl> LiteralTrie<TToken> {
    pub(crate) fn print_item(&self, label: String) -> TriePrintItem {
        let label = match self.token {
            Some(token) => format!("{} # {}", label, token.name()),
            None => label,
        };
        TriePrintItem {
            label,
            children: self
                .children
                .iter()
                .map(|(byte, child)| child.print_item(format!("'{}'", *byte as char)))
                .collect(),
        }
    }

    /// Print the dispatch structure of the trie for debugging.
    pub fn print(&self) -> Result<(), std::io::Error> {
        ptree::print_tree(&self.print_item("<trie>".to_string()))
    }
}
