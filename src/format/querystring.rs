use std::fmt;

/// Flat key/value mapping parsed from (or written to) a query string such as
/// the location fragment `site=example.com&period=201203&page=top10`.
///
/// Insertion order is preserved and drives serialization. A key may carry no
/// value at all (`"flag"`), which is kept distinct from an empty value
/// (`"flag="`). Nothing is URL-decoded or encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryString {
    pairs: Vec<(String, Option<String>)>,
}

impl QueryString {
    pub const fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Parse a query string. `None` and `""` both yield an empty mapping.
    ///
    /// Groups are split on the first `=`; groups with an empty key (including
    /// the one produced by a trailing `&`) are skipped.
    pub fn parse<'a>(input: impl Into<Option<&'a str>>) -> Self {
        let mut qs = Self::new();
        let Some(input) = input.into() else {
            return qs;
        };
        for group in input.split('&') {
            let (key, value) = match group.split_once('=') {
                Some((key, value)) => (key, Some(value.to_string())),
                None => (group, None),
            };
            if key.is_empty() {
                continue;
            }
            qs.insert(key, value);
        }
        qs
    }

    /// Insert a key, replacing the value of an existing key in place.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    /// The value of `key`, if the key is present and carries a value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Join `key=value` pairs with `&`, in insertion order.
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for QueryString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            f.write_str(key)?;
            if let Some(value) = value {
                write!(f, "={value}")?;
            }
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryString {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut qs = Self::new();
        for (key, value) in iter {
            qs.insert(key, Some(value.into()));
        }
        qs
    }
}
