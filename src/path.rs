//! Namespace-aware path expressions over a [`SourceDocument`].
//!
//! Expressions are a small XPath subset, compiled once against a
//! [`NamespaceRegistry`] and evaluated many times:
//!
//! ```text
//! expression  := alternative ('|' alternative)*
//! alternative := ('/' | '//')? step (('/' | '//') step)*
//! step        := '.' | 'text()' | '@' qname | nametest predicate*
//! nametest    := '*' | prefix ':' (local | '*') | local
//! predicate   := '[' integer ']' | '[' relative ('=' quoted)? ']'
//! ```
//!
//! Alternatives are tried in declared order and the first one yielding a
//! non-empty result wins, which is how ISO 19139's optional encodings of the
//! same concept (`gco:CharacterString` vs `gmx:Anchor`, `gco:Date` vs
//! `gco:DateTime`) are expressed.
//!
//! # Examples
//!
//! ```ignore
//! use geodcat::path::PathExpr;
//! use geodcat::namespaces::NamespaceRegistry;
//!
//! let registry = NamespaceRegistry::iso19139();
//! let title = PathExpr::compile(
//!     "gmd:identificationInfo/*/gmd:citation/*/gmd:title/gco:CharacterString",
//!     &registry,
//! )?;
//! for value in title.resolve(&doc, doc.root()) {
//!     println!("{}", value.text());
//! }
//! ```

use std::borrow::Cow;
use std::fmt;

use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while1};
use nom::character::complete::{char, digit1, multispace0};
use nom::combinator::{all_consuming, map, map_res, opt, recognize};
use nom::multi::{many0, separated_list1};
use nom::sequence::{delimited, pair, preceded, terminated};
use nom::IResult;
use smallvec::SmallVec;

use crate::document::{Element, SourceDocument};
use crate::error::{ConversionError, Result};
use crate::namespaces::NamespaceRegistry;

/// One match produced by a path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedValue<'a> {
    /// An element subtree.
    Element(&'a Element),
    /// An attribute value.
    Attribute(&'a str),
    /// Text selected with `text()`.
    Text(String),
}

impl<'a> ResolvedValue<'a> {
    /// Returns the textual value of the match, trimmed.
    #[must_use]
    pub fn text(&self) -> Cow<'a, str> {
        match self {
            Self::Element(el) => Cow::Owned(el.text()),
            Self::Attribute(value) => {
                let value: &'a str = value;
                Cow::Borrowed(value.trim())
            },
            Self::Text(value) => Cow::Owned(value.trim().to_string()),
        }
    }

    /// Returns the value that identifies this match.
    ///
    /// Leaves identify by their text; an element with children identifies by
    /// its [canonical form](Element::canonical_form), so two subtrees with
    /// the same text but different structure or attributes stay distinct.
    #[must_use]
    pub fn identity(&self) -> Cow<'a, str> {
        match self {
            Self::Element(el) if el.child_elements().next().is_some() => {
                Cow::Owned(el.canonical_form())
            },
            _ => self.text(),
        }
    }

    /// Returns the element if this match is a subtree.
    #[must_use]
    pub const fn as_element(&self) -> Option<&'a Element> {
        match *self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    fn is_absent(&self) -> bool {
        match self {
            Self::Element(el) => el.is_empty_leaf(),
            Self::Attribute(value) => value.trim().is_empty(),
            Self::Text(value) => value.trim().is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NsTest {
    Any,
    Unqualified,
    Prefix { prefix: String, uris: Vec<String> },
}

impl NsTest {
    fn matches(&self, namespace: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::Unqualified => namespace.is_none(),
            Self::Prefix { uris, .. } => namespace.is_some_and(|ns| uris.iter().any(|u| u == ns)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NameTest {
    ns: NsTest,
    local: Option<String>,
}

impl NameTest {
    fn matches(&self, element: &Element) -> bool {
        self.ns.matches(element.namespace.as_deref())
            && self.local.as_ref().map_or(true, |l| *l == element.local_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StepTest {
    SelfNode,
    Text,
    Attribute(NameTest),
    Element(NameTest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    Exists(LocationPath),
    Equals(LocationPath, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: StepTest,
    predicates: SmallVec<[Predicate; 1]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LocationPath {
    absolute: bool,
    steps: Vec<Step>,
}

/// A compiled path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    source: String,
    alternatives: Vec<LocationPath>,
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl PathExpr {
    /// Parses `source` and binds its prefixes against `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Configuration`] on a syntax error, an
    /// unknown prefix, or an attribute/`text()` step that is not last.
    pub fn compile(source: &str, registry: &NamespaceRegistry) -> Result<Self> {
        let trimmed = source.trim();
        let (_, mut alternatives) = all_consuming(expression)(trimmed).map_err(|e| {
            ConversionError::Configuration(format!("invalid path expression '{source}': {e}"))
        })?;
        for path in &mut alternatives {
            bind_path(path, registry, source)?;
        }
        Ok(Self {
            source: trimmed.to_string(),
            alternatives,
        })
    }

    /// The expression text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluates the expression relative to `context`.
    ///
    /// Absolute alternatives start from the document root instead. Blank
    /// values and empty leaf elements are dropped, so an empty result always
    /// means "absent".
    #[must_use]
    pub fn resolve<'a>(
        &self,
        document: &'a SourceDocument,
        context: &'a Element,
    ) -> Vec<ResolvedValue<'a>> {
        for path in &self.alternatives {
            let values = eval_path(path, document.root(), context);
            if !values.is_empty() {
                log::trace!("{} resolved {} value(s)", self.source, values.len());
                return values;
            }
        }
        Vec::new()
    }

    /// Returns true if the expression resolves to at least one value.
    #[must_use]
    pub fn exists(&self, document: &SourceDocument, context: &Element) -> bool {
        !self.resolve(document, context).is_empty()
    }
}

/// Evaluates `expr` against the document root.
#[must_use]
pub fn resolve<'a>(document: &'a SourceDocument, expr: &PathExpr) -> Vec<ResolvedValue<'a>> {
    expr.resolve(document, document.root())
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn ws<'a, O>(
    inner: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> impl FnMut(&'a str) -> IResult<&'a str, O> {
    delimited(multispace0, inner, multispace0)
}

fn ncname(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || matches!(c, '_' | '-' | '.')),
    ))(input)
}

fn prefixed(prefix: &str) -> NsTest {
    NsTest::Prefix {
        prefix: prefix.to_string(),
        uris: Vec::new(),
    }
}

fn name_test(input: &str) -> IResult<&str, NameTest> {
    alt((
        map(char('*'), |_| NameTest {
            ns: NsTest::Any,
            local: None,
        }),
        map(
            pair(
                terminated(ncname, char(':')),
                alt((map(char('*'), |_| None), map(ncname, Some))),
            ),
            |(prefix, local)| NameTest {
                ns: prefixed(prefix),
                local: local.map(String::from),
            },
        ),
        map(ncname, |local| NameTest {
            ns: NsTest::Unqualified,
            local: Some(local.to_string()),
        }),
    ))(input)
}

fn attribute_test(input: &str) -> IResult<&str, NameTest> {
    preceded(
        char('@'),
        map(
            pair(opt(terminated(ncname, char(':'))), ncname),
            |(prefix, local)| NameTest {
                ns: prefix.map_or(NsTest::Unqualified, prefixed),
                local: Some(local.to_string()),
            },
        ),
    )(input)
}

fn quoted(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('\''), take_while(|c| c != '\''), char('\'')),
        delimited(char('"'), take_while(|c| c != '"'), char('"')),
    ))(input)
}

fn predicate(input: &str) -> IResult<&str, Predicate> {
    delimited(
        char('['),
        ws(alt((
            map_res(digit1, |digits: &str| {
                digits
                    .parse::<usize>()
                    .map_err(|e| e.to_string())
                    .and_then(|n| {
                        if n == 0 {
                            Err("positions are 1-based".to_string())
                        } else {
                            Ok(Predicate::Position(n))
                        }
                    })
            }),
            map(
                pair(relative_path, opt(preceded(ws(char('=')), quoted))),
                |(path, value)| match value {
                    Some(v) => Predicate::Equals(path, v.to_string()),
                    None => Predicate::Exists(path),
                },
            ),
        ))),
        char(']'),
    )(input)
}

fn step(input: &str) -> IResult<&str, (StepTest, SmallVec<[Predicate; 1]>)> {
    alt((
        map(tag("text()"), |_| (StepTest::Text, SmallVec::new())),
        map(char('.'), |_| (StepTest::SelfNode, SmallVec::new())),
        map(attribute_test, |t| (StepTest::Attribute(t), SmallVec::new())),
        map(pair(name_test, many0(predicate)), |(t, preds)| {
            (StepTest::Element(t), SmallVec::from_vec(preds))
        }),
    ))(input)
}

fn separator(input: &str) -> IResult<&str, Axis> {
    alt((
        map(tag("//"), |_| Axis::Descendant),
        map(tag("/"), |_| Axis::Child),
    ))(input)
}

fn steps_from(first_axis: Axis, input: &str) -> IResult<&str, Vec<Step>> {
    let (input, (test, predicates)) = step(input)?;
    let (input, rest) = many0(pair(separator, step))(input)?;
    let mut steps = vec![Step {
        axis: first_axis,
        test,
        predicates,
    }];
    steps.extend(rest.into_iter().map(|(axis, (test, predicates))| Step {
        axis,
        test,
        predicates,
    }));
    Ok((input, steps))
}

fn relative_path(input: &str) -> IResult<&str, LocationPath> {
    let (input, steps) = steps_from(Axis::Child, input)?;
    Ok((
        input,
        LocationPath {
            absolute: false,
            steps,
        },
    ))
}

fn location_path(input: &str) -> IResult<&str, LocationPath> {
    let (input, lead) = opt(separator)(input)?;
    let (input, steps) = steps_from(lead.unwrap_or(Axis::Child), input)?;
    Ok((
        input,
        LocationPath {
            absolute: lead.is_some(),
            steps,
        },
    ))
}

fn expression(input: &str) -> IResult<&str, Vec<LocationPath>> {
    separated_list1(ws(char('|')), location_path)(input)
}

fn bind_test(test: &mut NameTest, registry: &NamespaceRegistry, source: &str) -> Result<()> {
    if let NsTest::Prefix { prefix, uris } = &mut test.ns {
        let bound = registry.lookup(prefix).ok_or_else(|| {
            ConversionError::Configuration(format!(
                "unknown namespace prefix '{prefix}' in path '{source}'"
            ))
        })?;
        *uris = bound.to_vec();
    }
    Ok(())
}

fn bind_path(path: &mut LocationPath, registry: &NamespaceRegistry, source: &str) -> Result<()> {
    let last = path.steps.len().saturating_sub(1);
    for (i, step) in path.steps.iter_mut().enumerate() {
        match &mut step.test {
            StepTest::Element(test) => bind_test(test, registry, source)?,
            StepTest::Attribute(test) => {
                if i != last {
                    return Err(ConversionError::Configuration(format!(
                        "attribute step must be last in path '{source}'"
                    )));
                }
                bind_test(test, registry, source)?;
            },
            StepTest::Text => {
                if i != last {
                    return Err(ConversionError::Configuration(format!(
                        "text() must be last in path '{source}'"
                    )));
                }
            },
            StepTest::SelfNode => {},
        }
        for predicate in &mut step.predicates {
            match predicate {
                Predicate::Position(_) => {},
                Predicate::Exists(inner) | Predicate::Equals(inner, _) => {
                    bind_path(inner, registry, source)?;
                },
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

fn push_unique<'a>(out: &mut Vec<&'a Element>, element: &'a Element) {
    if !out.iter().any(|e| std::ptr::eq(*e, element)) {
        out.push(element);
    }
}

/// Collects matching descendants of `element` in document order. Predicates
/// are applied to each parent's matching children separately, so positions
/// count per parent.
fn descendants<'a>(
    element: &'a Element,
    test: &NameTest,
    predicates: &[Predicate],
    root: &'a Element,
    out: &mut Vec<&'a Element>,
) {
    let siblings = element.child_elements().filter(|c| test.matches(c)).collect();
    let kept = apply_predicates(siblings, predicates, root);
    for child in element.child_elements() {
        if kept.iter().any(|k| std::ptr::eq(*k, child)) {
            out.push(child);
        }
        descendants(child, test, predicates, root, out);
    }
}

fn apply_predicates<'a>(
    candidates: Vec<&'a Element>,
    predicates: &[Predicate],
    root: &'a Element,
) -> Vec<&'a Element> {
    let mut current = candidates;
    for predicate in predicates {
        current = match predicate {
            Predicate::Position(n) => current.get(n - 1).copied().into_iter().collect(),
            Predicate::Exists(path) => current
                .into_iter()
                .filter(|el| !eval_path(path, root, *el).is_empty())
                .collect(),
            Predicate::Equals(path, expected) => current
                .into_iter()
                .filter(|el| {
                    eval_path(path, root, *el)
                        .iter()
                        .any(|v| v.text() == expected.as_str())
                })
                .collect(),
        };
    }
    current
}

fn eval_path<'a>(
    path: &LocationPath,
    root: &'a Element,
    context: &'a Element,
) -> Vec<ResolvedValue<'a>> {
    let mut current: Vec<&'a Element> = Vec::new();
    let mut steps = path.steps.iter();

    if path.absolute {
        // The first step is evaluated from a virtual document node whose only
        // child is the root element.
        let Some(first) = steps.next() else {
            return Vec::new();
        };
        let StepTest::Element(test) = &first.test else {
            return Vec::new();
        };
        let top = if test.matches(root) { vec![root] } else { Vec::new() };
        current = apply_predicates(top, &first.predicates, root);
        if first.axis == Axis::Descendant {
            descendants(root, test, &first.predicates, root, &mut current);
        }
    } else {
        current.push(context);
    }

    for step in steps {
        match &step.test {
            StepTest::SelfNode => {
                current = apply_predicates(current, &step.predicates, root);
            },
            StepTest::Element(test) => {
                let mut next = Vec::new();
                for &el in &current {
                    let matches = match step.axis {
                        Axis::Child => {
                            let children = el.child_elements().filter(|c| test.matches(c)).collect();
                            apply_predicates(children, &step.predicates, root)
                        },
                        Axis::Descendant => {
                            let mut found = Vec::new();
                            descendants(el, test, &step.predicates, root, &mut found);
                            found
                        },
                    };
                    for matched in matches {
                        push_unique(&mut next, matched);
                    }
                }
                current = next;
            },
            StepTest::Attribute(test) => {
                let local = test.local.as_deref().unwrap_or_default();
                return current
                    .into_iter()
                    .filter_map(|el| {
                        el.attributes
                            .iter()
                            .find(|a| test.ns.matches(a.namespace.as_deref()) && a.local_name == local)
                    })
                    .map(|a| ResolvedValue::Attribute(a.value.as_str()))
                    .filter(|v| !v.is_absent())
                    .collect();
            },
            StepTest::Text => {
                return current
                    .into_iter()
                    .map(|el| ResolvedValue::Text(el.text()))
                    .filter(|v| !v.is_absent())
                    .collect();
            },
        }
        if current.is_empty() {
            return Vec::new();
        }
    }

    current
        .into_iter()
        .map(ResolvedValue::Element)
        .filter(|v| !v.is_absent())
        .collect()
}
