use std::fmt;

use crate::category::Category;

/// One expansion alternative: the ordered child categories a node receives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Production {
    children: Vec<Category>,
}

impl Production {
    pub fn new<I, C>(children: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Category>,
    {
        Self {
            children: children.into_iter().map(Into::into).collect(),
        }
    }

    pub fn children(&self) -> &[Category] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn matches<'a, I>(&self, categories: I) -> bool
    where
        I: IntoIterator<Item = &'a Category>,
    {
        let mut given = categories.into_iter();
        for expected in &self.children {
            match given.next() {
                Some(category) if category == expected => {}
                _ => return false,
            }
        }
        given.next().is_none()
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.children.iter().map(Category::as_str).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
