use std::fmt;

use crate::tree::ProgramTree;

enum Token {
    Node(u32),
    Separator,
    Close,
}

impl<A> ProgramTree<A> {
    /// One-line rendering of the category structure, e.g. `R(A(T), A(T))`.
    /// Empty when nothing is built.
    pub fn format_compact(&self) -> String {
        let Some(arena) = &self.arena else {
            return String::new();
        };

        let mut out = String::new();
        let mut stack = vec![Token::Node(0)];
        while let Some(token) = stack.pop() {
            match token {
                Token::Node(index) => {
                    let slot = arena.slot(index);
                    out.push_str(slot.category.as_str());
                    if slot.children.is_empty() {
                        continue;
                    }
                    out.push('(');
                    stack.push(Token::Close);
                    for (position, &child) in slot.children.iter().enumerate().rev() {
                        stack.push(Token::Node(child));
                        if position > 0 {
                            stack.push(Token::Separator);
                        }
                    }
                }
                Token::Separator => out.push_str(", "),
                Token::Close => out.push(')'),
            }
        }
        out
    }
}

/// Indented rendering, one node per line, two spaces per level. Nodes with
/// a label show it in parentheses after the category.
impl<A> fmt::Display for ProgramTree<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(arena) = &self.arena else {
            return write!(f, "ProgramTree({})", self.status);
        };

        for (i, slot) in arena.slots().iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            let indent = slot.depth as usize * 2;
            write!(f, "{:indent$}{}", "", slot.category)?;
            if let Some(label) = slot.behavior.label() {
                write!(f, " ({label})")?;
            }
        }
        Ok(())
    }
}
