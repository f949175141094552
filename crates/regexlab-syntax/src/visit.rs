//! AST visitor pattern (grounded on the teacher's `query::visitor`): implement
//! [`Visitor`] and override the `visit_*` methods you care about, calling the
//! matching `walk_*` to continue recursion (or omitting it to stop).
//!
//! ```ignore
//! impl Visitor for MyPass {
//!     fn visit_group(&mut self, node: &GroupNode) {
//!         // pre-order logic
//!         walk_group(self, node);
//!         // post-order logic
//!     }
//! }
//! ```

use crate::ast::*;

pub trait Visitor: Sized {
    fn visit_node(&mut self, node: &Node) {
        walk_node(self, node);
    }

    fn visit_regex(&mut self, n: &RegexNode) {
        walk_regex(self, n);
    }
    fn visit_sequence(&mut self, n: &SequenceNode) {
        walk_sequence(self, n);
    }
    fn visit_alternation(&mut self, n: &AlternationNode) {
        walk_alternation(self, n);
    }
    fn visit_group(&mut self, n: &GroupNode) {
        walk_group(self, n);
    }
    fn visit_quantifier(&mut self, n: &QuantifierNode) {
        walk_quantifier(self, n);
    }
    fn visit_literal(&mut self, _n: &LiteralNode) {}
    fn visit_char_literal(&mut self, _n: &CharLiteralNode) {}
    fn visit_char_type(&mut self, _n: &CharTypeNode) {}
    fn visit_dot(&mut self, _n: &DotNode) {}
    fn visit_anchor(&mut self, _n: &AnchorNode) {}
    fn visit_assertion(&mut self, _n: &AssertionNode) {}
    fn visit_keep(&mut self, _n: &KeepNode) {}
    fn visit_comment(&mut self, _n: &CommentNode) {}
    fn visit_char_class(&mut self, n: &CharClassNode) {
        walk_char_class(self, n);
    }
    fn visit_range(&mut self, n: &RangeNode) {
        walk_range(self, n);
    }
    fn visit_posix_class(&mut self, _n: &PosixClassNode) {}
    fn visit_unicode_prop(&mut self, _n: &UnicodePropNode) {}
    fn visit_class_operation(&mut self, n: &ClassOperationNode) {
        walk_class_operation(self, n);
    }
    fn visit_backref(&mut self, _n: &BackrefNode) {}
    fn visit_subroutine(&mut self, _n: &SubroutineNode) {}
    fn visit_conditional(&mut self, n: &ConditionalNode) {
        walk_conditional(self, n);
    }
    fn visit_define(&mut self, n: &DefineNode) {
        walk_define(self, n);
    }
    fn visit_callout(&mut self, _n: &CalloutNode) {}
    fn visit_pcre_verb(&mut self, _n: &PcreVerbNode) {}
    fn visit_limit_match(&mut self, _n: &LimitMatchNode) {}
    fn visit_version_condition(&mut self, _n: &VersionConditionNode) {}
    fn visit_script_run(&mut self, n: &ScriptRunNode) {
        walk_script_run(self, n);
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, node: &Node) {
    match node {
        Node::Regex(n) => visitor.visit_regex(n),
        Node::Sequence(n) => visitor.visit_sequence(n),
        Node::Alternation(n) => visitor.visit_alternation(n),
        Node::Group(n) => visitor.visit_group(n),
        Node::Quantifier(n) => visitor.visit_quantifier(n),
        Node::Literal(n) => visitor.visit_literal(n),
        Node::CharLiteral(n) => visitor.visit_char_literal(n),
        Node::CharType(n) => visitor.visit_char_type(n),
        Node::Dot(n) => visitor.visit_dot(n),
        Node::Anchor(n) => visitor.visit_anchor(n),
        Node::Assertion(n) => visitor.visit_assertion(n),
        Node::Keep(n) => visitor.visit_keep(n),
        Node::Comment(n) => visitor.visit_comment(n),
        Node::CharClass(n) => visitor.visit_char_class(n),
        Node::Range(n) => visitor.visit_range(n),
        Node::PosixClass(n) => visitor.visit_posix_class(n),
        Node::UnicodeProp(n) => visitor.visit_unicode_prop(n),
        Node::ClassOperation(n) => visitor.visit_class_operation(n),
        Node::Backref(n) => visitor.visit_backref(n),
        Node::Subroutine(n) => visitor.visit_subroutine(n),
        Node::Conditional(n) => visitor.visit_conditional(n),
        Node::Define(n) => visitor.visit_define(n),
        Node::Callout(n) => visitor.visit_callout(n),
        Node::PcreVerb(n) => visitor.visit_pcre_verb(n),
        Node::LimitMatch(n) => visitor.visit_limit_match(n),
        Node::VersionCondition(n) => visitor.visit_version_condition(n),
        Node::ScriptRun(n) => visitor.visit_script_run(n),
    }
}

pub fn walk_regex<V: Visitor>(visitor: &mut V, n: &RegexNode) {
    visitor.visit_node(&n.pattern);
}

pub fn walk_sequence<V: Visitor>(visitor: &mut V, n: &SequenceNode) {
    for child in &n.children {
        visitor.visit_node(child);
    }
}

pub fn walk_alternation<V: Visitor>(visitor: &mut V, n: &AlternationNode) {
    for branch in &n.branches {
        visitor.visit_node(branch);
    }
}

pub fn walk_group<V: Visitor>(visitor: &mut V, n: &GroupNode) {
    visitor.visit_node(&n.child);
}

pub fn walk_quantifier<V: Visitor>(visitor: &mut V, n: &QuantifierNode) {
    visitor.visit_node(&n.inner);
}

pub fn walk_char_class<V: Visitor>(visitor: &mut V, n: &CharClassNode) {
    for item in &n.items {
        visitor.visit_node(item);
    }
}

pub fn walk_range<V: Visitor>(visitor: &mut V, n: &RangeNode) {
    visitor.visit_node(&n.start);
    visitor.visit_node(&n.end);
}

pub fn walk_class_operation<V: Visitor>(visitor: &mut V, n: &ClassOperationNode) {
    visitor.visit_node(&n.left);
    visitor.visit_node(&n.right);
}

pub fn walk_conditional<V: Visitor>(visitor: &mut V, n: &ConditionalNode) {
    visitor.visit_node(&n.condition);
    visitor.visit_node(&n.yes);
    if let Some(no) = &n.no {
        visitor.visit_node(no);
    }
}

pub fn walk_define<V: Visitor>(visitor: &mut V, n: &DefineNode) {
    visitor.visit_node(&n.definitions);
}

pub fn walk_script_run<V: Visitor>(visitor: &mut V, n: &ScriptRunNode) {
    visitor.visit_node(&n.child);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[derive(Default)]
    struct Counter {
        groups: u32,
        literals: u32,
    }

    impl Visitor for Counter {
        fn visit_group(&mut self, n: &GroupNode) {
            self.groups += 1;
            walk_group(self, n);
        }
        fn visit_literal(&mut self, _n: &LiteralNode) {
            self.literals += 1;
        }
    }

    #[test]
    fn counts_groups_and_literals() {
        let ast = parse("/a(bc)(d(e)f)/").expect("valid pattern");
        let mut counter = Counter::default();
        counter.visit_node(&ast);
        assert_eq!(counter.groups, 3);
        assert_eq!(counter.literals, 5);
    }
}
