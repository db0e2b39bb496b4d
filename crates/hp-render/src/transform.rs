//! SVG `transform` attribute → `kurbo::Affine`.
//!
//! A transform list composes left to right: `translate(10) scale(2)` scales
//! first, then translates, so the list folds as `acc * next`.

use hp_core::{Document, NodeIndex};
use kurbo::{Affine, Vec2};
use winnow::ascii::{float, multispace0};
use winnow::combinator::{opt, separated};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take_while;

/// Parse a transform list. An empty list is the identity.
pub fn parse_transform(input: &str) -> Result<Affine, String> {
    let mut rest = input;
    let mut acc = Affine::IDENTITY;
    loop {
        skip_separators(&mut rest);
        if rest.is_empty() {
            return Ok(acc);
        }
        let next = parse_function
            .parse_next(&mut rest)
            .map_err(|e| format!("Invalid transform `{input}`: {e}"))?;
        acc *= next;
    }
}

/// The element's own `transform`, identity when absent. Invalid lists are
/// logged and ignored.
pub fn element_transform(doc: &Document, node: NodeIndex) -> Affine {
    let Some(raw) = doc.attr(node, "transform") else {
        return Affine::IDENTITY;
    };
    parse_transform(raw).unwrap_or_else(|e| {
        log::warn!("{e}");
        Affine::IDENTITY
    })
}

/// Current transformation matrix: element user space → root user space,
/// including the element's own transform.
pub fn ctm(doc: &Document, node: NodeIndex) -> Affine {
    let mut chain: Vec<NodeIndex> = doc.ancestors(node).collect();
    chain.reverse();
    chain.push(node);
    chain
        .into_iter()
        .fold(Affine::IDENTITY, |acc, n| acc * element_transform(doc, n))
}

// ─── Parsers ─────────────────────────────────────────────────────────────

fn skip_space(input: &mut &str) {
    let _: Result<&str, ErrMode<ContextError>> = multispace0.parse_next(input);
}

/// Whitespace and commas between functions or arguments.
fn skip_separators(input: &mut &str) {
    let _ = take_while::<_, _, ContextError>(0.., |c: char| c.is_whitespace() || c == ',')
        .parse_next(input);
}

fn parse_number(input: &mut &str) -> ModalResult<f64> {
    float.parse_next(input)
}

fn parse_args(input: &mut &str) -> ModalResult<Vec<f64>> {
    let _ = '('.parse_next(input)?;
    skip_space(input);
    let args: Vec<f64> = opt(separated(
        1..,
        parse_number,
        take_while(1.., |c: char| c.is_whitespace() || c == ','),
    ))
    .map(Option::unwrap_or_default)
    .parse_next(input)?;
    skip_space(input);
    let _ = ')'.parse_next(input)?;
    Ok(args)
}

fn parse_function(input: &mut &str) -> ModalResult<Affine> {
    let name: &str = take_while(1.., |c: char| c.is_ascii_alphabetic()).parse_next(input)?;
    skip_space(input);
    let args = parse_args.parse_next(input)?;
    let affine = match (name, args.as_slice()) {
        ("matrix", &[a, b, c, d, e, f]) => Affine::new([a, b, c, d, e, f]),
        ("translate", &[tx]) => Affine::translate((tx, 0.0)),
        ("translate", &[tx, ty]) => Affine::translate((tx, ty)),
        ("scale", &[s]) => Affine::scale(s),
        ("scale", &[sx, sy]) => Affine::scale_non_uniform(sx, sy),
        ("rotate", &[deg]) => Affine::rotate(deg.to_radians()),
        ("rotate", &[deg, cx, cy]) => {
            let centre = Vec2::new(cx, cy);
            Affine::translate(centre) * Affine::rotate(deg.to_radians()) * Affine::translate(-centre)
        }
        ("skewX", &[deg]) => Affine::skew(deg.to_radians().tan(), 0.0),
        ("skewY", &[deg]) => Affine::skew(0.0, deg.to_radians().tan()),
        _ => return Err(ErrMode::Cut(ContextError::new())),
    };
    Ok(affine)
}
