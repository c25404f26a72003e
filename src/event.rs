/// Field carrying the message text.
pub const MSG_FIELD: &str = "msg";
/// Field carrying the resolved host.
pub const HOST_FIELD: &str = "host";
/// Field carrying the capture time in epoch milliseconds.
pub const TIME_FIELD: &str = "dt";
/// Field present (as `"1"`) only on error events.
pub const ERROR_FIELD: &str = "error";

/// A single captured log call.
///
/// Fields keep insertion order, which is also the order they are serialized
/// in. Setting a key that already exists replaces its value in place.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Event {
    fields: Vec<(String, String)>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`. Last writer wins; an existing key keeps its
    /// position.
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn message(&self) -> Option<&str> {
        self.get(MSG_FIELD)
    }

    pub fn is_error(&self) -> bool {
        self.get(ERROR_FIELD) == Some("1")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Event {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut event = Event::new();
        for (k, v) in iter {
            event.set(k, v);
        }
        event
    }
}
