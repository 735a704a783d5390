use super::trees::*;

/// A read-only traversal of IR trees.
///
/// Every method defaults to recursing into the node's children; an
/// implementation overrides only the nodes it cares about and calls
/// `recurse` to keep descending.
pub trait Visitor: Sized {
    fn visit_tree(&mut self, tree: &Tree) {
        tree.recurse(self);
    }

    fn visit_apply(&mut self, apply: &Apply) {
        apply.recurse(self);
    }

    fn visit_apply_statically(&mut self, apply: &ApplyStatically) {
        apply.recurse(self);
    }
}

impl Tree {
    /// Dispatches to the visitor method for this node kind.
    pub fn recurse<V: Visitor>(&self, visitor: &mut V) {
        match self {
            Self::Block(block) => {
                for stat in &block.stats {
                    visitor.visit_tree(stat);
                }
            }

            Self::If(if_) => {
                visitor.visit_tree(&if_.cond);
                visitor.visit_tree(&if_.thenp);
                visitor.visit_tree(&if_.elsep);
            }

            Self::While(while_) => {
                visitor.visit_tree(&while_.cond);
                visitor.visit_tree(&while_.body);
            }

            Self::Assign(assign) => {
                visitor.visit_tree(&assign.lhs);
                visitor.visit_tree(&assign.rhs);
            }

            Self::Select(select) => visitor.visit_tree(&select.receiver),

            Self::Apply(apply) => visitor.visit_apply(apply),

            Self::ApplyStatically(apply) => visitor.visit_apply_statically(apply),

            Self::Return(return_) => visitor.visit_tree(&return_.expr),

            Self::VarRef(_)
            | Self::New(_)
            | Self::BooleanLit(_)
            | Self::CharLit(_)
            | Self::IntLit(_)
            | Self::LongLit(_)
            | Self::FloatLit(_)
            | Self::DoubleLit(_)
            | Self::StringLit(_)
            | Self::Null => {}
        }
    }
}

impl Apply {
    pub fn recurse<V: Visitor>(&self, visitor: &mut V) {
        visitor.visit_tree(&self.receiver);

        for arg in &self.args {
            visitor.visit_tree(arg);
        }
    }
}

impl ApplyStatically {
    pub fn recurse<V: Visitor>(&self, visitor: &mut V) {
        visitor.visit_tree(&self.receiver);

        for arg in &self.args {
            visitor.visit_tree(arg);
        }
    }
}
