//! Backend-neutral card model built by the block renderer. `V` is the
//! backend's value type, used for children that were rendered earlier.

/// One piece of a roleplay card, in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum Body<V> {
    /// Consecutive text lines, joined with single spaces.
    Paragraph(String),
    Choice { text: String, children: Vec<V> },
    /// A rendered child with no choice to hang from.
    Child(V),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Roleplay<V> {
    pub title: Option<String>,
    pub body: Vec<Body<V>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event<V> {
    /// `win` or `lose`.
    pub on: String,
    pub children: Vec<V>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Combat<V> {
    pub enemies: Vec<String>,
    pub events: Vec<Event<V>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub text: String,
}
