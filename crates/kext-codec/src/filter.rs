//! Fluent builders for filters and header value sequences.
//!
//! A [`FilterBuilder`] is nested under whatever owns the filter list: a
//! frame kind builder, a matcher, or a [`Detached`] target for standalone
//! filters. The builder takes its parent by value and hands it back from
//! [`build`](FilterBuilder::build) with the finished filter appended, so
//! no two builders ever alias the same state.

use bytes::Bytes;

use kext_core::{CodecError, Header, NullableBytes};

use crate::condition::{Condition, Filter, Negatable, SkipKind, ValueMatch, ValueMatches};

/// Owner of a filter list that a [`FilterBuilder`] appends to.
pub trait FilterTarget {
    /// Append a finished filter.
    fn push_filter(&mut self, filter: Filter);

    /// Record a construction error to be reported by the owner's final build.
    fn record_error(&mut self, error: CodecError);
}

/// Target for filters built on their own.
#[derive(Debug, Default)]
pub struct Detached {
    filter: Option<Filter>,
    error: Option<CodecError>,
}

impl FilterTarget for Detached {
    fn push_filter(&mut self, filter: Filter) {
        self.filter = Some(filter);
    }

    fn record_error(&mut self, error: CodecError) {
        self.error.get_or_insert(error);
    }
}

impl Filter {
    /// Start building a standalone filter; finish with
    /// [`FilterBuilder::finish`].
    pub fn builder() -> FilterBuilder<Detached> {
        FilterBuilder::new(Detached::default())
    }
}

/// Appends conditions to one filter, then returns to the parent.
#[derive(Debug)]
#[must_use = "call build() to append the filter to its parent"]
pub struct FilterBuilder<P: FilterTarget> {
    parent: P,
    conditions: Vec<Condition>,
    error: Option<CodecError>,
}

impl<P: FilterTarget> FilterBuilder<P> {
    /// Start a new, empty filter under `parent`.
    pub fn new(parent: P) -> Self {
        Self {
            parent,
            conditions: Vec::new(),
            error: None,
        }
    }

    /// Append an already-built condition.
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Require the record key to equal `value`.
    pub fn key(self, value: impl Into<NullableBytes>) -> Self {
        self.condition(Condition::Key(value.into()))
    }

    /// Require some header `name` to have `value`.
    pub fn header(self, name: impl AsRef<[u8]>, value: impl Into<NullableBytes>) -> Self {
        self.condition(Condition::Header(Header::new(name, value)))
    }

    /// Require the record key not to equal `value`.
    pub fn key_not(self, value: impl Into<NullableBytes>) -> Self {
        self.condition(Condition::Not(Negatable::Key(value.into())))
    }

    /// Require no header `name` to have `value`.
    pub fn header_not(self, name: impl AsRef<[u8]>, value: impl Into<NullableBytes>) -> Self {
        self.condition(Condition::Not(Negatable::Header(Header::new(name, value))))
    }

    /// Start a value sequence over every header called `name`.
    pub fn headers(self, name: impl AsRef<[u8]>) -> HeaderValuesBuilder<P> {
        HeaderValuesBuilder {
            filter: self,
            name: Bytes::copy_from_slice(name.as_ref()),
            values: ValueMatches::new(),
            ambiguous: false,
        }
    }

    /// Append the filter to the parent and return it.
    pub fn build(self) -> P {
        let Self {
            mut parent,
            conditions,
            error,
        } = self;
        if let Some(error) = error {
            parent.record_error(error);
        }
        parent.push_filter(Filter::new(conditions));
        parent
    }
}

impl FilterBuilder<Detached> {
    /// Finish a standalone filter.
    pub fn finish(self) -> Result<Filter, CodecError> {
        let detached = self.build();
        if let Some(error) = detached.error {
            return Err(error);
        }
        Ok(detached.filter.unwrap_or_default())
    }
}

/// Appends value patterns to one `Headers` condition.
///
/// Consecutive [`skip_many`](Self::skip_many) calls collapse into one
/// marker. A second, separate skip-many marker makes the sequence
/// ambiguous and fails the owning frame's build with
/// [`CodecError::AmbiguousWildcard`].
#[derive(Debug)]
#[must_use = "call build() to append the condition to its filter"]
pub struct HeaderValuesBuilder<P: FilterTarget> {
    filter: FilterBuilder<P>,
    name: Bytes,
    values: ValueMatches,
    ambiguous: bool,
}

impl<P: FilterTarget> HeaderValuesBuilder<P> {
    /// Append one exact value per item.
    pub fn sequence<V: Into<NullableBytes>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.values
            .extend(values.into_iter().map(|v| ValueMatch::Value(v.into())));
        self
    }

    /// Append one exact value.
    pub fn value(mut self, value: impl Into<NullableBytes>) -> Self {
        self.values.push(ValueMatch::Value(value.into()));
        self
    }

    /// Append `count` single-value wildcards.
    pub fn skip(mut self, count: usize) -> Self {
        self.values
            .extend(std::iter::repeat_n(ValueMatch::Skip(SkipKind::Skip), count));
        self
    }

    /// Append a wildcard matching zero or more values.
    pub fn skip_many(mut self) -> Self {
        const MANY: ValueMatch = ValueMatch::Skip(SkipKind::SkipMany);
        if self.values.last() == Some(&MANY) {
            return self;
        }
        if self.values.contains(&MANY) {
            self.ambiguous = true;
        }
        self.values.push(MANY);
        self
    }

    /// Append the `Headers` condition to the filter and return it.
    pub fn build(self) -> FilterBuilder<P> {
        let Self {
            mut filter,
            name,
            values,
            ambiguous,
        } = self;
        if ambiguous {
            filter.error.get_or_insert(CodecError::AmbiguousWildcard {
                name: String::from_utf8_lossy(&name).into_owned(),
            });
        }
        filter.condition(Condition::Headers { name, values })
    }
}
