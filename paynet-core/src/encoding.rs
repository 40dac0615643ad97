//! Field flattening, form encoding and markup escaping.
//!
//! The signer and the hosted form share the same recursive flattening of
//! nested fields into `name[key]` pairs; they differ only in how the flat
//! pairs are escaped afterwards.

use std::{collections::HashSet, fmt::Write};

use url::form_urlencoded;

use crate::{
    errors::{EncodingError, ProtocolError},
    types::{FieldMap, FieldValue},
};

/// Flatten one field into `(name, text)` pairs.
///
/// Maps expand to `name[key]` and lists to `name[index]`, recursively.
/// Empty maps and lists produce no pairs. Names are not checked for
/// collisions; see [`ensure_unique`].
///
/// ```
/// use paynet_core::{encoding::flatten, types::{FieldMap, FieldValue}};
///
/// let address = FieldMap::new().with("city", "A&B").with("zip", "<01>");
/// let pairs = flatten("addr", &FieldValue::Map(address));
///
/// assert_eq!(pairs, [
///     ("addr[city]".to_owned(), "A&B".to_owned()),
///     ("addr[zip]".to_owned(), "<01>".to_owned()),
/// ]);
/// ```
pub fn flatten(name: &str, value: &FieldValue) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    flatten_into(name.to_owned(), value, &mut pairs);
    pairs
}

/// Flatten every field of `fields`, in map order.
///
/// Fails if two fields end up with the same flattened name.
pub fn flatten_map(fields: &FieldMap) -> Result<Vec<(String, String)>, EncodingError> {
    let mut pairs = Vec::with_capacity(fields.len());
    for (name, value) in fields {
        flatten_into(name.clone(), value, &mut pairs);
    }
    ensure_unique(&pairs)?;
    Ok(pairs)
}

/// Reject flattened pairs that repeat a name.
pub fn ensure_unique(pairs: &[(String, String)]) -> Result<(), EncodingError> {
    let mut seen = HashSet::with_capacity(pairs.len());
    match pairs.iter().find(|(name, _)| !seen.insert(name.as_str())) {
        Some((name, _)) => Err(EncodingError::DuplicateField(name.clone())),
        None => Ok(()),
    }
}

fn flatten_into(name: String, value: &FieldValue, pairs: &mut Vec<(String, String)>) {
    match value {
        FieldValue::Map(map) => {
            for (key, nested) in map {
                flatten_into(format!("{name}[{key}]"), nested, pairs);
            }
        }
        FieldValue::List(items) => {
            for (index, nested) in items.iter().enumerate() {
                flatten_into(format!("{name}[{index}]"), nested, pairs);
            }
        }
        FieldValue::Text(text) => pairs.push((name, text.clone())),
        FieldValue::Integer(number) => pairs.push((name, number.to_string())),
        FieldValue::Boolean(flag) => pairs.push((name, if *flag { "1" } else { "0" }.to_owned())),
    }
}

/// Form-encode a single name or value the way the gateway does.
///
/// ASCII alphanumerics and `-`, `_`, `.` stay literal, space becomes `+` and
/// every other byte becomes uppercase `%XX`.
pub fn encode_component(text: &str) -> String {
    form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('*', "%2A")
}

/// Join flat pairs into a `name=value&...` query string.
pub fn encode_query<I>(pairs: I) -> String
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut query = String::new();
    for (name, value) in pairs {
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(&encode_component(&name));
        query.push('=');
        query.push_str(&encode_component(&value));
    }
    query
}

/// Escape text for use inside a double-quoted HTML attribute.
///
/// `&`, `<`, `>` and `"` become entities and control characters
/// (U+0000 to U+001F) become numeric references. `'` is left alone.
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            c if u32::from(c) < 0x20 => {
                let _ = write!(escaped, "&#{};", u32::from(c));
            }
            c => escaped.push(c),
        }
    }
    escaped
}

/// Flatten `fields` and escape names and values for hidden form inputs.
pub fn hidden_fields(fields: &FieldMap) -> Result<Vec<(String, String)>, EncodingError> {
    Ok(flatten_map(fields)?
        .into_iter()
        .map(|(name, value)| (escape_markup(&name), escape_markup(&value)))
        .collect())
}

/// Decode a form-encoded gateway reply into a nested [`FieldMap`].
///
/// Bracketed names are rebuilt into nested maps (`a[b][c]=1`); an empty
/// segment (`a[]=x`) appends under the next free index, one past the largest
/// numeric key so far. A later duplicate of a plain value replaces the
/// earlier one.
///
/// ```
/// use paynet_core::encoding::decode_query;
///
/// let fields = decode_query("responseCode=0&card%5Btype%5D=Visa").unwrap();
/// assert_eq!(fields.get_text("responseCode"), Some("0"));
/// assert_eq!(
///     fields.get("card").and_then(|card| card.as_map()).and_then(|card| card.get_text("type")),
///     Some("Visa")
/// );
/// ```
pub fn decode_query(body: &str) -> Result<FieldMap, ProtocolError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(ProtocolError::EmptyResponse);
    }

    let mut fields = FieldMap::new();
    for (name, value) in form_urlencoded::parse(body.as_bytes()) {
        let path = split_name(&name)?;
        insert_path(&mut fields, &name, &path, value.into_owned())?;
    }

    if fields.is_empty() {
        return Err(ProtocolError::EmptyResponse);
    }
    Ok(fields)
}

fn split_name(name: &str) -> Result<Vec<String>, ProtocolError> {
    let malformed = || ProtocolError::MalformedKey(name.to_owned());

    let (base, mut rest) = match name.find('[') {
        Some(open) => name.split_at(open),
        None => (name, ""),
    };
    if base.is_empty() {
        return Err(malformed());
    }

    let mut path = vec![base.to_owned()];
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[').ok_or_else(malformed)?;
        let (segment, tail) = inner.split_once(']').ok_or_else(malformed)?;
        path.push(segment.to_owned());
        rest = tail;
    }
    Ok(path)
}

fn insert_path(
    fields: &mut FieldMap,
    name: &str,
    path: &[String],
    value: String,
) -> Result<(), ProtocolError> {
    let Some((head, rest)) = path.split_first() else {
        return Err(ProtocolError::MalformedKey(name.to_owned()));
    };
    let key = if head.is_empty() {
        next_index(fields).to_string()
    } else {
        head.clone()
    };

    if rest.is_empty() {
        if matches!(fields.get(&key), Some(FieldValue::Map(_))) {
            return Err(ProtocolError::ConflictingKey(name.to_owned()));
        }
        fields.insert(key, value);
        return Ok(());
    }

    if !fields.contains_key(&key) {
        fields.insert(key.clone(), FieldMap::new());
    }
    match fields.get_mut(&key) {
        Some(FieldValue::Map(nested)) => insert_path(nested, name, rest, value),
        _ => Err(ProtocolError::ConflictingKey(name.to_owned())),
    }
}

fn next_index(fields: &FieldMap) -> u64 {
    fields
        .keys()
        .filter_map(|key| key.parse::<u64>().ok())
        .max()
        .map_or(0, |largest| largest + 1)
}
