use crate::compressor;
use crate::error::Error;
use crate::event::Event;
use crate::transport::Mode;
use percent_encoding::percent_decode_str;

/// Collector-side view of a dispatched request.
///
/// Decodes a request target back into its mode, token and events, expanding
/// a compressed `c` parameter on the way.
///
/// # Examples
///
/// ```
/// # use cloudpelican::reader::DecodedRequest;
/// # use cloudpelican::transport::Mode;
/// let req = DecodedRequest::parse(
///     "https://collector.test/push/bulk?js=1&t=abc&f[0][msg]=hello%20there&f[1][msg]=bye",
/// ).unwrap();
/// assert_eq!(req.mode, Mode::Bulk);
/// assert_eq!(req.token, "abc");
/// assert_eq!(req.events[0].message(), Some("hello there"));
/// assert_eq!(req.events[1].message(), Some("bye"));
/// ```
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct DecodedRequest {
    pub mode: Mode,
    pub token: String,
    /// Whether the fields arrived as a compressed `c` parameter.
    pub compressed: bool,
    pub events: Vec<Event>,
}

impl DecodedRequest {
    pub fn parse(target: &str) -> Result<Self, Error> {
        let (path, query) = target
            .split_once('?')
            .ok_or_else(|| Error::malformed("missing query string"))?;
        let mode = match path.rsplit('/').next() {
            Some("single") => Mode::Single,
            Some("bulk") => Mode::Bulk,
            _ => return Err(Error::malformed(format!("unknown endpoint '{path}'"))),
        };

        let mut token = None;
        let mut compressed = None;
        let mut field_params = String::new();
        for param in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = param.split_once('=').unwrap_or((param, ""));
            match key {
                "js" => {}
                "t" => token = Some(unescape(value)?),
                "c" => compressed = Some(compressor::decode(value)?),
                _ if key.starts_with("f[") => {
                    field_params.push('&');
                    field_params.push_str(param);
                }
                _ => return Err(Error::malformed(format!("unexpected parameter '{key}'"))),
            }
        }

        let token = token.ok_or_else(|| Error::malformed("missing token"))?;
        let is_compressed = compressed.is_some();
        let fields = compressed.unwrap_or(field_params);
        let events = read_events(&fields, mode)?;

        Ok(Self {
            mode,
            token,
            compressed: is_compressed,
            events,
        })
    }
}

/// Rebuilds events from `&f[..]` parameters.
fn read_events(fields: &str, mode: Mode) -> Result<Vec<Event>, Error> {
    let mut events: Vec<Event> = Vec::new();
    for param in fields.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = param
            .split_once('=')
            .ok_or_else(|| Error::malformed(format!("field without value '{param}'")))?;
        let rest = key
            .strip_prefix("f[")
            .ok_or_else(|| Error::malformed(format!("not a field '{key}'")))?;

        let (index, name) = match mode {
            Mode::Single => (0, bracketed(rest)?),
            Mode::Bulk => {
                let (index, rest) = rest
                    .split_once("][")
                    .ok_or_else(|| Error::malformed(format!("missing index in '{key}'")))?;
                let index = index
                    .parse::<usize>()
                    .map_err(|_| Error::malformed(format!("bad index in '{key}'")))?;
                (index, bracketed(rest)?)
            }
        };

        if index > events.len() {
            return Err(Error::malformed(format!("index {index} out of order")));
        }
        if index == events.len() {
            events.push(Event::new());
        }
        events[index].set(unescape(name)?, unescape(value)?);
    }
    Ok(events)
}

fn bracketed(rest: &str) -> Result<&str, Error> {
    rest.strip_suffix(']')
        .ok_or_else(|| Error::malformed(format!("unterminated field key '{rest}'")))
}

fn unescape(s: &str) -> Result<String, Error> {
    percent_decode_str(s)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| Error::malformed("escaped text is not UTF-8"))
}
