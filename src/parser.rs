use crate::entity::{ListItem, ListKind, Markdown, MarkdownInline, MarkdownText};

use std::collections::VecDeque;
use std::iter::Peekable;
use std::str::Split;

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take, take_until, take_while, take_while1, take_while_m_n},
    character::complete::{char, digit1, one_of, space0, space1},
    combinator::{all_consuming, eof, map, opt, recognize, rest, verify},
    error::{Error, ErrorKind},
    multi::{many0, many1, many_m_n},
    sequence::{delimited, pair, preceded, terminated, tuple},
    Err, IResult,
};

/// Splits `i` into block nodes, one at a time.
///
/// Every input line ends up in exactly one block, so joining the rendered
/// blocks with `\n` keeps the line structure of the input.
pub fn parse_markdown(i: &str) -> Blocks<'_> {
    Blocks::new(i)
}

pub struct Blocks<'a> {
    lines: Peekable<Split<'a, char>>,
    pending: VecDeque<Markdown>,
}

impl<'a> Blocks<'a> {
    pub fn new(i: &'a str) -> Self {
        Blocks {
            lines: i.split('\n').peekable(),
            pending: VecDeque::new(),
        }
    }

    fn code_block(&mut self, fence: &str, language: &str) -> Markdown {
        let mut code = Vec::new();
        let mut closed = false;
        for line in self.lines.by_ref() {
            if is_fence_close(line, fence) {
                closed = true;
                break;
            }
            code.push(line.to_string());
        }
        // an unterminated fence closes at end of input, before any trailing blank lines
        if !closed {
            while code.last().map_or(false, |line| is_blank(line)) {
                if let Some(line) = code.pop() {
                    self.pending.push_front(Markdown::Blank(line));
                }
            }
        }
        Markdown::Codeblock(language.to_string(), code)
    }

    fn list(&mut self, first: (usize, ListKind, MarkdownText)) -> Markdown {
        let mut levels: Vec<(usize, ListKind)> = Vec::new();
        let mut items = Vec::new();
        let mut next = Some(first);
        while let Some((indent, kind, text)) = next.take() {
            // an item at the same indent replaces the open level
            while levels.last().map_or(false, |&(open, _)| open >= indent) {
                levels.pop();
            }
            levels.push((indent, kind));
            items.push(ListItem {
                markers: levels.iter().map(|&(_, kind)| kind).collect(),
                text,
            });
            next = match self.lines.peek().copied() {
                Some(line) if parse_horizontal_rule(line).is_err() => {
                    parse_list_item(line).ok().map(|(_, item)| item)
                }
                _ => None,
            };
            if next.is_some() {
                self.lines.next();
            }
        }
        Markdown::List(items)
    }

    fn blockquote(&mut self, first: &'a str) -> Markdown {
        let mut inner = vec![first];
        while let Some((_, text)) = self
            .lines
            .peek()
            .copied()
            .and_then(|line| parse_blockquote_tag(line).ok())
        {
            inner.push(text);
            self.lines.next();
        }
        Markdown::Blockquote(Blocks::new(&inner.join("\n")).collect())
    }

    fn paragraph(&mut self, first: &'a str) -> Markdown {
        let mut lines = vec![parse_inline(first)];
        while let Some(line) = self.lines.peek().copied() {
            if starts_block(line) {
                break;
            }
            lines.push(parse_inline(line));
            self.lines.next();
        }
        Markdown::Paragraph(lines)
    }
}

impl Iterator for Blocks<'_> {
    type Item = Markdown;

    fn next(&mut self) -> Option<Markdown> {
        if let Some(block) = self.pending.pop_front() {
            return Some(block);
        }
        let line = self.lines.next()?;
        let block = if is_blank(line) {
            Markdown::Blank(line.to_string())
        } else if let Ok((_, (fence, language))) = parse_fence_open(line) {
            self.code_block(fence, language)
        } else if parse_horizontal_rule(line).is_ok() {
            Markdown::HorizontalRule
        } else if let Ok((_, (level, text))) = parse_header(line) {
            Markdown::Heading(level, text)
        } else if let Ok((_, item)) = parse_list_item(line) {
            self.list(item)
        } else if let Ok((_, text)) = parse_blockquote_tag(line) {
            self.blockquote(text)
        } else {
            self.paragraph(line)
        };
        Some(block)
    }
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn starts_block(line: &str) -> bool {
    is_blank(line)
        || parse_fence_open(line).is_ok()
        || parse_horizontal_rule(line).is_ok()
        || parse_header_tag(line).is_ok()
        || pair(space0, parse_list_tag)(line).is_ok()
        || parse_blockquote_tag(line).is_ok()
}

fn parse_rule_of<'a>(marker: char) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    recognize(tuple((
        space0,
        many_m_n(3, usize::MAX, terminated(char(marker), space0)),
        eof,
    )))
}

fn parse_horizontal_rule(i: &str) -> IResult<&str, &str> {
    alt((parse_rule_of('-'), parse_rule_of('*'), parse_rule_of('_')))(i)
}

fn parse_header_tag(i: &str) -> IResult<&str, usize> {
    map(
        terminated(take_while_m_n(1, 6, |c| c == '#'), alt((space1, eof))),
        |s: &str| s.len(),
    )(i)
}

fn strip_closing_hashes(text: &str) -> &str {
    let trimmed = text.trim_end();
    let stripped = trimmed.trim_end_matches('#');
    if stripped.is_empty() || stripped.ends_with(|c: char| c == ' ' || c == '\t') {
        stripped.trim_end()
    } else {
        trimmed
    }
}

fn parse_header(i: &str) -> IResult<&str, (usize, MarkdownText)> {
    tuple((
        parse_header_tag,
        map(rest, |s: &str| parse_inline(strip_closing_hashes(s))),
    ))(i)
}

fn parse_list_tag(i: &str) -> IResult<&str, ListKind> {
    terminated(
        alt((
            map(one_of("-*+"), |_| ListKind::Unordered),
            map(terminated(digit1, one_of(".)")), |_| ListKind::Ordered),
        )),
        space1,
    )(i)
}

// tabs count as four columns
fn indent_width(s: &str) -> usize {
    s.chars().map(|c| if c == '\t' { 4 } else { 1 }).sum()
}

fn parse_list_item(i: &str) -> IResult<&str, (usize, ListKind, MarkdownText)> {
    tuple((map(space0, indent_width), parse_list_tag, map(rest, parse_inline)))(i)
}

// Jira's {quote} does not nest, so every leading marker of a line is
// consumed and nested quotes flatten into one level.
fn parse_blockquote_tag(i: &str) -> IResult<&str, &str> {
    preceded(many1(tuple((space0, char('>'), opt(char(' '))))), rest)(i)
}

fn parse_fence_open(i: &str) -> IResult<&str, (&str, &str)> {
    let (remaining, (_, fence, _, info)) = tuple((
        space0,
        alt((
            verify(take_while1(|c| c == '`'), |s: &str| s.len() >= 3),
            verify(take_while1(|c| c == '~'), |s: &str| s.len() >= 3),
        )),
        space0,
        rest,
    ))(i)?;
    // "```x```" on one line is an inline code span, not a fence
    if fence.starts_with('`') && info.contains('`') {
        return Err(Err::Error(Error::new(i, ErrorKind::Verify)));
    }
    let language = info.split_whitespace().next().unwrap_or("");
    Ok((remaining, (fence, language)))
}

fn is_fence_close(line: &str, fence: &str) -> bool {
    let marker = match fence.chars().next() {
        Some(marker) => marker,
        None => return false,
    };
    let trimmed = line.trim();
    let run = trimmed.chars().take_while(|&c| c == marker).count();
    run >= fence.len() && run == trimmed.len()
}

fn parse_inline_code(i: &str) -> IResult<&str, &str> {
    let (remaining, ticks) = take_while1(|c| c == '`')(i)?;
    let (remaining, code) = verify(take_until(ticks), |s: &str| !s.is_empty())(remaining)?;
    let (remaining, _) = tag(ticks)(remaining)?;
    Ok((remaining, code))
}

fn parse_link(i: &str) -> IResult<&str, (&str, &str)> {
    pair(
        delimited(tag("["), is_not("[]"), tag("]")),
        delimited(tag("("), is_not(")"), tag(")")),
    )(i)
}

fn parse_image(i: &str) -> IResult<&str, (&str, &str)> {
    pair(
        delimited(tag("!["), take_while(|c| c != '[' && c != ']'), tag("]")),
        delimited(tag("("), is_not(")"), tag(")")),
    )(i)
}

// Finds the closer for `delim` in `s`: a delimiter run of exactly the same
// length, preceded by non-whitespace. Code spans and escapes are skipped.
fn find_closing(s: &str, delim: &str) -> Option<usize> {
    let marker = *delim.as_bytes().first()?;
    let bytes = s.as_bytes();
    let mut j = 0;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'`' => match parse_inline_code(&s[j..]) {
                Ok((remaining, _)) => j = s.len() - remaining.len(),
                Err(_) => j += 1,
            },
            b if b == marker => {
                let run = bytes[j..].iter().take_while(|&&b| b == marker).count();
                let before = s[..j].chars().next_back();
                let after = s[j + run..].chars().next();
                let closes = run == delim.len()
                    && before.map_or(false, |c| !c.is_whitespace())
                    && !(marker == b'_' && after.map_or(false, char::is_alphanumeric));
                if closes {
                    return Some(j);
                }
                j += run;
            }
            _ => j += 1,
        }
    }
    None
}

fn parse_delimited<'a>(delim: &'static str) -> impl Fn(&'a str) -> IResult<&'a str, &'a str> {
    move |i: &'a str| {
        let (after, _) = tag(delim)(i)?;
        let opens = after
            .chars()
            .next()
            .map_or(false, |c| !c.is_whitespace() && !delim.starts_with(c));
        if !opens {
            return Err(Err::Error(Error::new(i, ErrorKind::Verify)));
        }
        match find_closing(after, delim) {
            Some(end) => Ok((&after[end + delim.len()..], &after[..end])),
            None => Err(Err::Error(Error::new(i, ErrorKind::TakeUntil))),
        }
    }
}

// Consumes text up to the next character that may start an inline span.
// An underscore inside a word is plain text, and a backslash escape keeps
// the escaped character from acting as a delimiter.
fn parse_plaintext(i: &str) -> IResult<&str, &str> {
    let mut end = 0;
    let mut prev: Option<char> = None;
    while let Some(c) = i[end..].chars().next() {
        let remaining = &i[end..];
        let len = match c {
            '*' | '`' | '[' | '~' => break,
            '!' if remaining[1..].starts_with('[') => break,
            '_' if !prev.map_or(false, char::is_alphanumeric) => break,
            '_' => remaining.bytes().take_while(|&b| b == b'_').count(),
            '\\' => match remaining[1..].chars().next() {
                Some(escaped) if escaped.is_ascii_punctuation() => 2,
                _ => 1,
            },
            _ => c.len_utf8(),
        };
        end += len;
        prev = i[..end].chars().next_back();
    }
    if end == 0 {
        Err(Err::Error(Error::new(i, ErrorKind::Tag)))
    } else {
        Ok((&i[end..], &i[..end]))
    }
}

// Anything no other inline parser accepted passes through as-is. Delimiter
// runs are taken whole so a stray `**` is not split into two `*`.
fn parse_literal(i: &str) -> IResult<&str, &str> {
    alt((
        take_while1(|c| c == '*'),
        take_while1(|c| c == '_'),
        take_while1(|c| c == '~'),
        take_while1(|c| c == '`'),
        take(1usize),
    ))(i)
}

fn parse_markdown_inline(i: &str) -> IResult<&str, MarkdownInline> {
    alt((
        map(parse_inline_code, |s: &str| {
            MarkdownInline::InlineCode(s.to_string())
        }),
        map(parse_image, |(alt, url): (&str, &str)| {
            MarkdownInline::Image(alt.to_string(), url.to_string())
        }),
        map(parse_link, |(text, url): (&str, &str)| {
            MarkdownInline::Link(parse_inline(text), url.to_string())
        }),
        map(alt((parse_delimited("***"), parse_delimited("___"))), |s| {
            MarkdownInline::BoldItalic(parse_inline(s))
        }),
        map(alt((parse_delimited("**"), parse_delimited("__"))), |s| {
            MarkdownInline::Bold(parse_inline(s))
        }),
        map(alt((parse_delimited("*"), parse_delimited("_"))), |s| {
            MarkdownInline::Italic(parse_inline(s))
        }),
        map(parse_delimited("~~"), |s| {
            MarkdownInline::Strike(parse_inline(s))
        }),
        map(parse_plaintext, |s: &str| {
            MarkdownInline::Plaintext(s.to_string())
        }),
        map(parse_literal, |s: &str| {
            MarkdownInline::Plaintext(s.to_string())
        }),
    ))(i)
}

fn merge_plaintext(spans: Vec<MarkdownInline>) -> MarkdownText {
    let mut merged: MarkdownText = Vec::with_capacity(spans.len());
    for span in spans {
        if let MarkdownInline::Plaintext(s) = &span {
            if let Some(MarkdownInline::Plaintext(prev)) = merged.last_mut() {
                prev.push_str(s);
                continue;
            }
        }
        merged.push(span);
    }
    merged
}

pub fn parse_markdown_text(i: &str) -> IResult<&str, MarkdownText> {
    map(many0(parse_markdown_inline), merge_plaintext)(i)
}

fn parse_inline(i: &str) -> MarkdownText {
    match all_consuming(parse_markdown_text)(i) {
        Ok((_, text)) => text,
        Err(_) => vec![MarkdownInline::Plaintext(i.to_string())],
    }
}
