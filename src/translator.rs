use crate::entity::{ListItem, ListKind, Markdown, MarkdownInline, MarkdownText};
use crate::parser;

/// Converts GitHub-flavored markdown to Jira wiki markup.
///
/// Conversion never fails: anything the parser does not recognise is passed
/// through unchanged.
pub fn convert(markdown: &str) -> String {
    translate(parser::parse_markdown(markdown))
}

pub fn translate(blocks: impl Iterator<Item = Markdown>) -> String {
    blocks.map(translate_block).collect::<Vec<_>>().join("\n")
}

fn translate_block(block: Markdown) -> String {
    match block {
        Markdown::Heading(level, text) if text.is_empty() => format!("h{}.", level),
        Markdown::Heading(level, text) => format!("h{}. {}", level, translate_text(text)),
        Markdown::List(items) => items
            .into_iter()
            .map(translate_list_item)
            .collect::<Vec<_>>()
            .join("\n"),
        Markdown::Paragraph(lines) => lines
            .into_iter()
            .map(translate_text)
            .collect::<Vec<_>>()
            .join("\n"),
        Markdown::Codeblock(language, code) => translate_codeblock(language, code),
        Markdown::Blockquote(inner) => {
            format!("{{quote}}\n{}\n{{quote}}", translate(inner.into_iter()))
        }
        Markdown::HorizontalRule => String::from("----"),
        Markdown::Blank(line) => line,
    }
}

fn translate_codeblock(language: String, code: Vec<String>) -> String {
    let open = if language.is_empty() {
        String::from("{code}")
    } else {
        format!("{{code:{}}}", language)
    };
    let mut lines = Vec::with_capacity(code.len() + 2);
    lines.push(open);
    lines.extend(code);
    lines.push(String::from("{code}"));
    lines.join("\n")
}

fn translate_list_item(item: ListItem) -> String {
    let markers: String = item
        .markers
        .iter()
        .map(|kind| match kind {
            ListKind::Unordered => '*',
            ListKind::Ordered => '#',
        })
        .collect();
    format!("{} {}", markers, translate_text(item.text))
}

fn translate_text(text: MarkdownText) -> String {
    text.into_iter().map(translate_inline).collect()
}

fn translate_inline(inline: MarkdownInline) -> String {
    match inline {
        MarkdownInline::Link(text, url) => format!("[{}|{}]", translate_text(text), url),
        MarkdownInline::Image(alt, url) if alt.is_empty() => format!("!{}!", url),
        MarkdownInline::Image(alt, url) => format!("!{}|alt={}!", url, alt),
        MarkdownInline::InlineCode(code) => format!("{{{{{}}}}}", code),
        MarkdownInline::BoldItalic(text) => format!("*_{}_*", translate_text(text)),
        MarkdownInline::Bold(text) => format!("*{}*", translate_text(text)),
        MarkdownInline::Italic(text) => format!("_{}_", translate_text(text)),
        MarkdownInline::Strike(text) => format!("-{}-", translate_text(text)),
        MarkdownInline::Plaintext(text) => text,
    }
}

#[cfg(test)]
mod tests {
    use crate::translator::convert;

    macro_rules! assert_convert {
        ($markdown:expr, $jira:expr) => {
            assert_eq!(convert($markdown), String::from($jira));
        };
    }

    #[test]
    fn test_convert_headings() {
        assert_convert!("# Title", "h1. Title");
        assert_convert!("## h2", "h2. h2");
        assert_convert!("###### h6 ######", "h6. h6");
        assert_convert!("####### seven", "####### seven");
        assert_convert!("#hashtag", "#hashtag");
        assert_convert!("#", "h1.");
        assert_convert!("# ", "h1.");
        assert_convert!("## ##", "h2.");
    }

    #[test]
    fn test_convert_inline() {
        assert_convert!("**bold**", "*bold*");
        assert_convert!("__bold__", "*bold*");
        assert_convert!("*italic*", "_italic_");
        assert_convert!("_italic_", "_italic_");
        assert_convert!("***both***", "*_both_*");
        assert_convert!("~~gone~~", "-gone-");
        assert_convert!("`code`", "{{code}}");
        assert_convert!("[text](http://x)", "[text|http://x]");
        assert_convert!("![diagram](http://x/d.png)", "!http://x/d.png|alt=diagram!");
        assert_convert!("![](http://x/d.png)", "!http://x/d.png!");
        assert_convert!(
            "see **the [docs](http://x)** now",
            "see *the [docs|http://x]* now"
        );
    }

    #[test]
    fn test_convert_nested_emphasis_outer_first() {
        assert_convert!("**a *b* c**", "*a _b_ c*");
        assert_convert!("*a **b** c*", "_a *b* c_");
    }

    #[test]
    fn test_convert_literal_passthrough() {
        assert_convert!("a single * star", "a single * star");
        assert_convert!("**unclosed bold", "**unclosed bold");
        assert_convert!("snake_case_identifier", "snake_case_identifier");
        assert_convert!("[a [b] c](http://x)", "[a [b] c](http://x)");
        assert_convert!("\\*not italic\\*", "\\*not italic\\*");
        assert_convert!("`**opaque**`", "{{**opaque**}}");
    }

    #[test]
    fn test_convert_code_block() {
        assert_convert!(
            "```rust\nlet x = **y**;\n```",
            "{code:rust}\nlet x = **y**;\n{code}"
        );
        assert_convert!("```\n# not a heading\n```\n", "{code}\n# not a heading\n{code}\n");
        assert_convert!("~~~\nunterminated", "{code}\nunterminated\n{code}");
        assert_convert!("```\nunterminated\n", "{code}\nunterminated\n{code}\n");
    }

    #[test]
    fn test_convert_lists() {
        assert_convert!("- a\n- b\n- c", "* a\n* b\n* c");
        assert_convert!("1. a\n2. b", "# a\n# b");
        assert_convert!(
            "- a\n  - b\n    - c\n- d",
            "* a\n** b\n*** c\n* d"
        );
        assert_convert!("1. a\n    - b\n2. c", "# a\n#* b\n# c");
        assert_convert!("- a\n\t- tabbed", "* a\n** tabbed");
        assert_convert!("* **bold** item", "* *bold* item");
    }

    #[test]
    fn test_convert_blockquote_and_rule() {
        assert_convert!("> quoted *text*\n> more", "{quote}\nquoted _text_\nmore\n{quote}");
        assert_convert!("> # inside", "{quote}\nh1. inside\n{quote}");
        assert_convert!("> outer\n> > inner", "{quote}\nouter\ninner\n{quote}");
        assert_convert!("---", "----");
        assert_convert!("above\n\n***\n\nbelow", "above\n\n----\n\nbelow");
    }

    #[test]
    fn test_convert_document() {
        let markdown = "## Steps\n\n1. Run `make`\n2. Open [the page](https://example.com)\n\n**Expected**: it works.\n";
        let jira = "h2. Steps\n\n# Run {{make}}\n# Open [the page|https://example.com]\n\n*Expected*: it works.\n";
        assert_convert!(markdown, jira);
    }

    #[test]
    fn test_convert_plain_text_is_unchanged() {
        for text in [
            "",
            "\n",
            "Just a sentence.",
            "Two lines\nof text\n",
            "  indented line\n\n\ttabbed, with punctuation: (a), {b}; c?",
            "The description with some {{code}}",
            "ünïcödé text",
        ] {
            assert_eq!(convert(text), text);
        }
    }

    #[test]
    fn test_convert_deeply_nested_quote() {
        assert_convert!(&">".repeat(10_000), "{quote}\n\n{quote}");
        let markdown = format!("{}text", "> ".repeat(10_000));
        assert_convert!(&markdown, "{quote}\ntext\n{quote}");
    }

    #[test]
    fn test_convert_is_deterministic() {
        let markdown = "# T\n- *a*\n  - __b__\n> `c`\n```\nd\n";
        assert_eq!(convert(markdown), convert(markdown));
    }
}
