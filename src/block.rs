use crate::node::Node;
use crate::symtable::ScopeId;

/// What a block does with its statements when evaluated. Plain blocks run
/// them once, conditionals gate them on a condition, loops repeat them.
#[derive(Debug, PartialEq)]
pub enum BlockControl {
    Plain,
    Cond {
        condition: Box<Node>,
        else_branch: Option<Box<BlockData>>,
        /// Set once the parser sees `else`; later statements route into the
        /// else branch until the enclosing `end`.
        routing_to_else: bool,
    },
    Loop {
        condition: Box<Node>,
    },
}

/// Represents a block: a scope plus the statements bound into it.
#[derive(Debug, PartialEq)]
pub struct BlockData {
    pub scope: ScopeId,
    pub statements: Vec<Node>,
    pub control: BlockControl,
}

impl BlockData {
    /// Creates a plain `begin ... end` block.
    pub fn new(scope: ScopeId) -> Self {
        BlockData {
            scope,
            statements: vec![],
            control: BlockControl::Plain,
        }
    }

    /// Creates an `if` block.
    pub fn conditional(scope: ScopeId, condition: Node) -> Self {
        BlockData {
            scope,
            statements: vec![],
            control: BlockControl::Cond {
                condition: Box::new(condition),
                else_branch: None,
                routing_to_else: false,
            },
        }
    }

    /// Creates a `while` block.
    pub fn looping(scope: ScopeId, condition: Node) -> Self {
        BlockData {
            scope,
            statements: vec![],
            control: BlockControl::Loop {
                condition: Box::new(condition),
            },
        }
    }

    /// The list currently accepting statements: the else branch once the
    /// parser has routed to it, the block's own statements otherwise.
    fn active_statements(&mut self) -> &mut Vec<Node> {
        match &mut self.control {
            BlockControl::Cond {
                else_branch: Some(else_branch),
                routing_to_else: true,
                ..
            } => &mut else_branch.statements,
            _ => &mut self.statements,
        }
    }

    /// The scope new names currently bind into.
    pub fn active_scope(&self) -> ScopeId {
        match &self.control {
            BlockControl::Cond {
                else_branch: Some(else_branch),
                routing_to_else: true,
                ..
            } => else_branch.scope,
            _ => self.scope,
        }
    }

    pub fn push_statement(&mut self, statement: Node) {
        self.active_statements().push(statement);
    }

    pub fn pop_statement(&mut self) -> Option<Node> {
        self.active_statements().pop()
    }

    pub fn statement_count(&self) -> usize {
        match &self.control {
            BlockControl::Cond {
                else_branch: Some(else_branch),
                routing_to_else: true,
                ..
            } => else_branch.statements.len(),
            _ => self.statements.len(),
        }
    }
}
