//! Stack-driven parser building a [`DecisionTree`] from text.
//!
//! Grammar: `subtree := '{' VALUE subtree? subtree? '}'`, one subtree per
//! document. The parser is lenient about structure it can recover from:
//! an empty `{}` creates no node, a third child is dropped, and a node with
//! a single child is kept. Each of these is reported as a [`Diagnostic`].
//! Anything else that does not fit the grammar is a `MalformedInput` error.

use std::fmt;

use tracing::{debug, instrument, warn};

use crate::domain::error::{DomainError, TreeResult};
use crate::domain::token::{Token, Tokenizer};
use crate::domain::tree::{alloc_value, Branch, DecisionTree, Node, NodeId};

pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Recoverable structural anomaly found while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A third subtree under `parent`; `dropped` values were discarded.
    SurplusChild {
        parent: String,
        offset: usize,
        dropped: usize,
    },
    /// `{}` without a value.
    EmptySubtree { offset: usize },
    /// An internal node with only one child.
    SingleChild { value: String, offset: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::SurplusChild {
                parent,
                offset,
                dropped,
            } => write!(
                f,
                "byte {offset}: {parent:?} already has two children, dropped a subtree of {dropped} value(s)"
            ),
            Diagnostic::EmptySubtree { offset } => {
                write!(f, "byte {offset}: empty subtree ignored")
            }
            Diagnostic::SingleChild { value, offset } => {
                write!(f, "byte {offset}: {value:?} has only one child")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum brace nesting accepted.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Successfully parsed tree plus everything that was tolerated on the way.
#[derive(Debug)]
pub struct Parsed {
    pub tree: DecisionTree,
    pub diagnostics: Vec<Diagnostic>,
}

impl Parsed {
    pub fn into_tree(self) -> DecisionTree {
        self.tree
    }
}

pub fn parse(input: &str) -> TreeResult<Parsed> {
    parse_with(input, ParseOptions::default())
}

/// Parses raw bytes, which must be UTF-8.
pub fn parse_bytes(input: &[u8]) -> TreeResult<Parsed> {
    parse_bytes_with(input, ParseOptions::default())
}

pub fn parse_bytes_with(input: &[u8], options: ParseOptions) -> TreeResult<Parsed> {
    let text = std::str::from_utf8(input)
        .map_err(|e| DomainError::malformed(e.valid_up_to(), "input is not valid UTF-8"))?;
    parse_with(text, options)
}

#[instrument(level = "debug", skip(input), fields(len = input.len()))]
pub fn parse_with(input: &str, options: ParseOptions) -> TreeResult<Parsed> {
    let parsed = Parser::new(input, options).run()?;
    debug!(
        "parsed {} nodes with {} diagnostic(s)",
        parsed.tree.len(),
        parsed.diagnostics.len()
    );
    Ok(parsed)
}

impl DecisionTree {
    /// Replaces the contents of this tree with the tree parsed from `input`.
    ///
    /// On error the current contents are left untouched.
    pub fn load(&mut self, input: &str, options: ParseOptions) -> TreeResult<Vec<Diagnostic>> {
        let parsed = parse_with(input, options)?;
        self.clear();
        *self = parsed.tree;
        Ok(parsed.diagnostics)
    }
}

/// Where the node of the subtree being parsed goes.
#[derive(Debug, Clone, Copy)]
enum Slot {
    /// First flush of the parse.
    Root,
    Child(NodeId, Branch),
    /// Surplus subtree: checked for syntax, never allocated.
    Discard,
}

/// A subtree whose value has been read and whose `}` is still pending.
struct Frame<'a> {
    slot: Slot,
    /// Node created for the subtree, `None` when discarded.
    id: Option<NodeId>,
    value: &'a str,
    value_offset: usize,
    /// Offset of the opening `{`.
    open: usize,
    /// Values seen in this subtree, discarded ones included.
    seen: usize,
}

struct Parser<'a> {
    tokens: Tokenizer<'a>,
    tree: DecisionTree,
    diagnostics: Vec<Diagnostic>,
    options: ParseOptions,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, options: ParseOptions) -> Self {
        Self {
            tokens: Tokenizer::new(input),
            tree: DecisionTree::new(),
            diagnostics: Vec::new(),
            options,
        }
    }

    fn run(mut self) -> TreeResult<Parsed> {
        loop {
            match self.tokens.next_token() {
                Token::OpenBrace { offset } if self.tree.is_empty() => {
                    self.subtree(offset)?;
                }
                Token::EndOfInput { offset } if self.tree.is_empty() => {
                    return Err(DomainError::malformed(offset, "input contains no value"));
                }
                Token::EndOfInput { .. } => break,
                Token::CloseBrace { offset } => {
                    return Err(DomainError::malformed(offset, "unmatched '}'"));
                }
                Token::Value { offset, .. } if self.tree.is_empty() => {
                    return Err(DomainError::malformed(offset, "expected '{' before value"));
                }
                token => {
                    return Err(DomainError::malformed(
                        token.offset(),
                        "unexpected content after the root subtree",
                    ));
                }
            }
        }
        Ok(Parsed {
            tree: self.tree,
            diagnostics: self.diagnostics,
        })
    }

    /// Parses the root subtree whose `{` at `open` was just consumed.
    ///
    /// Nesting is tracked on an explicit stack of frames, one per open brace,
    /// so input depth never turns into call depth.
    fn subtree(&mut self, open: usize) -> TreeResult<()> {
        let mut stack: Vec<Frame<'a>> = Vec::new();
        // An opened subtree whose value has not been read yet
        let mut pending = Some((Slot::Root, open));

        loop {
            if let Some((slot, open)) = pending.take() {
                if stack.len() >= self.options.max_depth {
                    return Err(DomainError::malformed(
                        open,
                        format!("nesting deeper than {} levels", self.options.max_depth),
                    ));
                }
                match self.tokens.next_token() {
                    Token::Value { text, offset } => {
                        if text.is_empty() {
                            return Err(DomainError::malformed(offset, "empty value"));
                        }
                        let id = self.flush(slot, text)?;
                        stack.push(Frame {
                            slot,
                            id,
                            value: text,
                            value_offset: offset,
                            open,
                            seen: 1,
                        });
                    }
                    Token::CloseBrace { .. } if matches!(slot, Slot::Root) => {
                        return Err(DomainError::malformed(open, "root subtree has no value"));
                    }
                    Token::CloseBrace { .. } => {
                        self.report(Diagnostic::EmptySubtree { offset: open });
                        self.close_child(&mut stack, slot, open, 0);
                    }
                    Token::OpenBrace { offset } => {
                        return Err(DomainError::malformed(offset, "expected a value before '{'"));
                    }
                    Token::EndOfInput { offset } => {
                        return Err(DomainError::malformed(offset, "missing '}'"));
                    }
                }
                continue;
            }

            let Some(frame) = stack.last() else {
                return Ok(());
            };
            match self.tokens.next_token() {
                Token::OpenBrace { offset } => {
                    let child = match frame.id {
                        None => Slot::Discard,
                        Some(parent) => match self.tree.free_branch(parent)? {
                            Some(branch) => Slot::Child(parent, branch),
                            None => Slot::Discard,
                        },
                    };
                    pending = Some((child, offset));
                }
                Token::CloseBrace { .. } => {
                    let Some(frame) = stack.pop() else {
                        return Ok(());
                    };
                    if let Some(id) = frame.id {
                        let node = self.tree.get(id)?;
                        if node.left().is_some() != node.right().is_some() {
                            self.report(Diagnostic::SingleChild {
                                value: frame.value.to_string(),
                                offset: frame.value_offset,
                            });
                        }
                    }
                    self.close_child(&mut stack, frame.slot, frame.open, frame.seen);
                }
                Token::Value { text, offset } => {
                    return Err(DomainError::malformed(
                        offset,
                        format!("unexpected value {text:?} after a child of {:?}", frame.value),
                    ));
                }
                Token::EndOfInput { offset } => {
                    return Err(DomainError::malformed(offset, "missing '}'"));
                }
            }
        }
    }

    /// Adds a finished child subtree of `seen` values to the frame on top.
    fn close_child(&mut self, stack: &mut [Frame<'a>], slot: Slot, open: usize, seen: usize) {
        let Some(parent) = stack.last_mut() else {
            return;
        };
        parent.seen += seen;
        if parent.id.is_some() && matches!(slot, Slot::Discard) {
            let diagnostic = Diagnostic::SurplusChild {
                parent: parent.value.to_string(),
                offset: open,
                dropped: seen,
            };
            self.report(diagnostic);
        }
    }

    fn flush(&mut self, slot: Slot, value: &str) -> TreeResult<Option<NodeId>> {
        match slot {
            Slot::Discard => Ok(None),
            Slot::Root => {
                let node = Node::new(alloc_value(value)?);
                Ok(Some(self.tree.set_root(node)))
            }
            Slot::Child(parent, branch) => {
                let node = Node::new(alloc_value(value)?);
                self.tree.attach(parent, branch, node).map(Some)
            }
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}
