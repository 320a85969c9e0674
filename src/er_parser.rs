use winnow::prelude::*;
use winnow::ascii::multispace0;
use winnow::combinator::{eof, opt, peek, preceded, repeat_till, terminated};
use winnow::token::{any, take_till, take_while};

use crate::er_ast::{Attribute, AttributeKind};
use crate::error::ParseError;

pub fn parse_attribute(definition: &str) -> Result<Attribute, ParseError> {
    let (head, subs) =
        composite
            .parse(definition)
            .map_err(|_| ParseError::AmbiguousComposite {
                definition: definition.to_string(),
            })?;

    let (sigils, name, multivalued) =
        attribute_token
            .parse(head)
            .map_err(|_| ParseError::InvalidToken {
                definition: definition.to_string(),
            })?;

    let kind = if sigils.contains('*') {
        AttributeKind::Key
    } else if sigils.contains('+') {
        AttributeKind::WeakKey
    } else if multivalued {
        AttributeKind::Multivalued
    } else if sigils.contains('~') {
        AttributeKind::Derived
    } else {
        AttributeKind::Plain
    };

    let subattributes = match subs {
        Some(subs) => parse_attributes(subs.split_whitespace())?,
        None => Vec::new(),
    };

    Ok(Attribute::new(name, kind).with_subattributes(subattributes))
}

pub fn parse_attributes<'a>(
    definitions: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<Attribute>, ParseError> {
    definitions.into_iter().map(parse_attribute).collect()
}

// a second `:` is left unconsumed, which fails the parse
fn composite<'s>(input: &mut &'s str) -> winnow::Result<(&'s str, Option<&'s str>)> {
    (
        take_till(0.., ':'),
        opt(preceded(':', take_till(0.., ':'))),
    )
        .parse_next(input)
}

fn attribute_token<'s>(input: &mut &'s str) -> winnow::Result<(&'s str, &'s str, bool)> {
    (
        preceded(
            multispace0,
            take_while(0.., |c: char| matches!(c, '*' | '+' | '~')),
        ),
        preceded(multispace0, attribute_name),
        name_end,
    )
        .parse_next(input)
}

fn attribute_name<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    repeat_till(0.., any, peek(name_end))
        .map(|((), _): ((), bool)| ())
        .take()
        .verify(|name: &str| !name.is_empty())
        .parse_next(input)
}

// optional `[]`, then trailing whitespace up to the end
fn name_end(input: &mut &str) -> winnow::Result<bool> {
    terminated(
        opt((multispace0, '[', multispace0, ']')).map(|suffix| suffix.is_some()),
        (multispace0, eof),
    )
    .parse_next(input)
}
