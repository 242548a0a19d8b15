pub type MarkdownText = Vec<MarkdownInline>;

#[derive(Clone, Debug, PartialEq)]
pub enum Markdown {
    Heading(usize, MarkdownText),
    List(Vec<ListItem>),
    Paragraph(Vec<MarkdownText>),
    Codeblock(String, Vec<String>),
    Blockquote(Vec<Markdown>),
    HorizontalRule,
    Blank(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListKind {
    Unordered,
    Ordered,
}

/// One list line. `markers` holds the kind of every enclosing level,
/// outermost first, ending with the item's own kind.
#[derive(Clone, Debug, PartialEq)]
pub struct ListItem {
    pub markers: Vec<ListKind>,
    pub text: MarkdownText,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MarkdownInline {
    Link(MarkdownText, String),
    Image(String, String),
    InlineCode(String),
    BoldItalic(MarkdownText),
    Bold(MarkdownText),
    Italic(MarkdownText),
    Strike(MarkdownText),
    Plaintext(String),
}
