//! Typed query-string state.
//!
//! A [`ParameterSet`] is a flat record of named values that is decoded from,
//! and encoded back into, a URL query string. The caller supplies a set of
//! defaults once; the *variant* of each default fixes how that key is decoded,
//! so a key declared as a number always comes back as a number (NaN when the
//! text does not parse) and never as text.
//!
//! Neither [`decode`] nor [`encode`] can fail. Malformed input degrades to a
//! correctly typed but empty or invalid value.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, warn};

use crate::navigation::{Navigator, PopState};

/// A single typed parameter value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    /// `None` is an invalid timestamp, produced when the URL text is not a date.
    Timestamp(Option<DateTime<Utc>>),
    TextList(Vec<String>),
    NumberList(Vec<f64>),
    Absent,
}

impl ParamValue {
    /// Decode the URL occurrences of a key using `self` as the declared type.
    /// `values` holds every occurrence in URL order and is never empty.
    fn decode_as(&self, values: &[String]) -> ParamValue {
        let first = values[0].as_str();
        match self {
            Self::TextList(_) => Self::TextList(values.to_vec()),
            Self::NumberList(_) => {
                Self::NumberList(values.iter().map(|v| parse_number(v)).collect())
            }
            Self::Number(_) => Self::Number(parse_number(first)),
            Self::Boolean(_) => Self::Boolean(first.to_lowercase() == "true"),
            Self::Timestamp(_) => Self::Timestamp(parse_timestamp(first)),
            Self::Text(_) | Self::Absent => Self::Text(first.to_string()),
        }
    }

    /// Whether the value survives encoding. Empty text, zero, NaN, false,
    /// absent values, invalid timestamps and empty lists are dropped.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Text(s) => !s.is_empty(),
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Boolean(b) => *b,
            Self::Timestamp(ts) => ts.is_some(),
            Self::TextList(items) => !items.is_empty(),
            Self::NumberList(items) => !items.is_empty(),
            Self::Absent => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Structural equality: NaN equals NaN and timestamps compare by instant, so
/// re-decoding an unchanged URL always compares equal to the held state.
impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => same_number(*a, *b),
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::TextList(a), Self::TextList(b)) => a == b,
            (Self::NumberList(a), Self::NumberList(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_number(*x, *y))
            }
            (Self::Absent, Self::Absent) => true,
            _ => false,
        }
    }
}

fn same_number(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<DateTime<Utc>> for ParamValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(Some(value))
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        Self::TextList(value)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(value: Vec<&str>) -> Self {
        Self::TextList(value.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<f64>> for ParamValue {
    fn from(value: Vec<f64>) -> Self {
        Self::NumberList(value)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

/// Named parameter values. Keys are kept in lexicographic order, which is also
/// the order pairs appear in an encoded query string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeMap<String, ParamValue>);

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; returns a new set with `key` set to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(ParamValue::as_bool)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParamValue::as_str)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(ParamValue::as_number)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Decode `query` (with or without the leading `?`) against `defaults`.
///
/// Every key of `defaults` appears in the result. Keys missing from the query
/// keep their default; present keys are decoded from their first occurrence,
/// or from all occurrences when the default is a list. Query keys that have no
/// default are ignored.
pub fn decode(query: &str, defaults: &ParameterSet) -> ParameterSet {
    let query = query.strip_prefix('?').unwrap_or(query);

    let mut occurrences: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        occurrences
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }

    defaults
        .iter()
        .map(|(key, default)| {
            let value = match occurrences.get(key) {
                Some(values) if !values.is_empty() => default.decode_as(values),
                _ => default.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Emit lists as one `key=a,b,c` pair instead of one pair per element.
    /// [`decode`] does not split on commas, so callers using this mode must
    /// split the decoded text themselves.
    pub comma_join_arrays: bool,
}

/// Encode `params` as `?k=v&k=v`, or the empty string when nothing survives
/// the falsy filter. Keys and values are percent-encoded.
pub fn encode(params: &ParameterSet, options: EncodeOptions) -> String {
    let pairs: Vec<String> = params
        .iter()
        .filter(|(_, value)| value.is_truthy())
        .flat_map(|(key, value)| encode_pairs(key, value, options))
        .collect();

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

fn encode_pairs(key: &str, value: &ParamValue, options: EncodeOptions) -> Vec<String> {
    let items: Vec<String> = match value {
        ParamValue::Text(s) => vec![s.clone()],
        ParamValue::Number(n) => vec![format_number(*n)],
        ParamValue::Boolean(b) => vec![b.to_string()],
        ParamValue::Timestamp(Some(ts)) => vec![ts.to_rfc3339_opts(SecondsFormat::Millis, true)],
        ParamValue::TextList(list) => list.clone(),
        ParamValue::NumberList(list) => list.iter().map(|n| format_number(*n)).collect(),
        ParamValue::Timestamp(None) | ParamValue::Absent => Vec::new(),
    };

    let is_list = matches!(value, ParamValue::TextList(_) | ParamValue::NumberList(_));
    let items = if is_list && options.comma_join_arrays {
        vec![items.join(",")]
    } else {
        items
    };

    items
        .iter()
        .map(|item| format!("{}={}", encode_component(key), encode_component(item)))
        .collect()
}

/// Bytes escaped in a URL component: everything except ASCII alphanumerics
/// and `-_.!~*'()`, the same set a browser's `encodeURIComponent` keeps.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn encode_component(text: &str) -> String {
    utf8_percent_encode(text, COMPONENT).to_string()
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        // exponent form with an explicit sign on positive exponents: 1e+21
        let exp = format!("{n:e}");
        match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
            _ => exp,
        }
    } else {
        n.to_string()
    }
}

/// Numeric text as a browser's `Number(text)` reads it: whitespace is trimmed,
/// empty text is zero, `0x`/`0o`/`0b` prefixes select a radix and anything
/// else that does not parse is NaN.
pub fn parse_number(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }
    match text {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix = match text.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return parse_radix_digits(&text[2..], radix);
    }

    // f64::from_str also accepts "inf", "nan" and friends
    if text
        .bytes()
        .any(|b| b.is_ascii_alphabetic() && !matches!(b, b'e' | b'E'))
    {
        return f64::NAN;
    }
    text.parse().unwrap_or(f64::NAN)
}

/// Digits after a `0x`/`0o`/`0b` prefix. No sign is allowed and there is no
/// width limit; very long literals lose precision like any large float.
fn parse_radix_digits(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }
    digits
        .chars()
        .try_fold(0.0_f64, |acc, c| {
            c.to_digit(radix)
                .map(|d| acc * f64::from(radix) + f64::from(d))
        })
        .unwrap_or(f64::NAN)
}

/// ISO-8601 date-time or date, in the forms a browser's `Date` accepts:
/// full RFC 3339, date-times without seconds (with `Z`, an offset, or no
/// zone), and the date-only forms `YYYY-MM-DD`, `YYYY-MM` and `YYYY`.
/// Date-times without a zone and all date-only forms are taken as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M%:z") {
        return Some(ts.with_timezone(&Utc));
    }

    let local = text.strip_suffix('Z').unwrap_or(text);
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(local, format) {
            return Some(naive.and_utc());
        }
    }

    parse_date(text)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `YYYY-MM-DD`, or a month or year taken as its first day.
fn parse_date(text: &str) -> Option<NaiveDate> {
    let is_year = |year: &str| year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit());
    let full = match text.len() {
        4 if is_year(text) => format!("{text}-01-01"),
        7 if text.get(..4).is_some_and(is_year) && text.as_bytes()[4] == b'-' => format!("{text}-01"),
        10 => text.to_string(),
        _ => return None,
    };
    NaiveDate::parse_from_str(&full, "%Y-%m-%d").ok()
}

/// Whether a [`QueryParams`] has read the URL yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotYetLoaded,
    Loaded,
}

/// A [`ParameterSet`] kept in sync with the URL of a [`Navigator`].
///
/// Created in [`LoadState::NotYetLoaded`] holding the defaults; [`mount`]
/// reads the URL and moves to [`LoadState::Loaded`] for the rest of its life.
/// The held set is only ever replaced as a whole, never edited in place.
///
/// [`mount`]: QueryParams::mount
pub struct QueryParams {
    navigator: Arc<dyn Navigator>,
    defaults: ParameterSet,
    params: ParameterSet,
    state: LoadState,
    options: EncodeOptions,
    pop_events: Option<broadcast::Receiver<PopState>>,
}

impl QueryParams {
    /// The defaults are captured here and never re-derived.
    pub fn new(navigator: Arc<dyn Navigator>, defaults: ParameterSet) -> Self {
        Self {
            navigator,
            params: defaults.clone(),
            defaults,
            state: LoadState::NotYetLoaded,
            options: EncodeOptions::default(),
            pop_events: None,
        }
    }

    pub fn with_options(mut self, options: EncodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Read the current URL and start listening for back/forward navigation.
    /// Calling it again after the first time does nothing.
    pub fn mount(&mut self) {
        if self.state == LoadState::Loaded {
            return;
        }
        self.pop_events = Some(self.navigator.subscribe());
        self.reload();
        self.state = LoadState::Loaded;
    }

    /// Stop listening for navigation events. Dropping the handle does the same.
    pub fn unmount(&mut self) {
        self.pop_events = None;
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn defaults(&self) -> &ParameterSet {
        &self.defaults
    }

    pub fn load_state(&self) -> LoadState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    /// Replace the held set and push a history entry for it on the current path.
    pub fn set_params(&mut self, params: ParameterSet) {
        let url = format!(
            "{}{}",
            self.navigator.pathname(),
            encode(&params, self.options)
        );
        debug!(url = %url, "Pushing query parameters");
        self.navigator.push_state(&url);
        self.params = params;
    }

    /// Handle any pending back/forward events. Every decode reads the URL as
    /// it is now, so a burst of events collapses into a single decode.
    /// Returns true when the held set was replaced.
    pub fn sync_navigation(&mut self) -> bool {
        let Some(events) = self.pop_events.as_mut() else {
            return false;
        };

        let mut pending = false;
        let mut closed = false;
        loop {
            match events.try_recv() {
                Ok(_) => pending = true,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Navigation listener lagged behind");
                    pending = true;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Closed) => {
                    closed = true;
                    break;
                }
            }
        }
        if closed {
            self.pop_events = None;
        }

        pending && self.reload()
    }

    /// Decode the URL and replace the held set only if something changed.
    fn reload(&mut self) -> bool {
        let decoded = decode(&self.navigator.search(), &self.defaults);
        if decoded == self.params {
            debug!("Query parameters unchanged, keeping current state");
            return false;
        }
        self.params = decoded;
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::navigation::InMemoryHistory;

    fn column_defaults() -> ParameterSet {
        ParameterSet::new()
            .with("showGuests", true)
            .with("showPartners", false)
    }

    #[test]
    fn test_scalar_round_trip() {
        let ts = Utc.with_ymd_and_hms(2024, 10, 15, 16, 0, 0).unwrap();
        let params = ParameterSet::new()
            .with("name", "Emma Hansen & co")
            .with("page", 3.5)
            .with("open", true)
            .with("from", ts);
        let defaults = ParameterSet::new()
            .with("name", "")
            .with("page", 0.0)
            .with("open", false)
            .with("from", ParamValue::Timestamp(None));

        let query = encode(&params, EncodeOptions::default());
        assert_eq!(decode(&query, &defaults), params);
    }

    #[test]
    fn test_list_round_trip_keeps_order() {
        let params = ParameterSet::new().with("tags", vec!["b", "a", "c"]);
        let defaults = ParameterSet::new().with("tags", Vec::<String>::new());

        let query = encode(&params, EncodeOptions::default());
        assert_eq!(query, "?tags=b&tags=a&tags=c");
        assert_eq!(decode(&query, &defaults), params);
    }

    #[test]
    fn test_number_list_decodes_numbers() {
        let defaults = ParameterSet::new().with("ids", Vec::<f64>::new());
        let decoded = decode("?ids=3&ids=1&ids=x", &defaults);
        match decoded.get("ids") {
            Some(ParamValue::NumberList(ids)) => {
                assert_eq!(ids[..2], [3.0, 1.0]);
                assert!(ids[2].is_nan());
            }
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn test_falsy_values_are_omitted() {
        let params = ParameterSet::new()
            .with("showX", false)
            .with("name", "")
            .with("count", 0.0)
            .with("items", Vec::<String>::new())
            .with("missing", ParamValue::Absent)
            .with("when", ParamValue::Timestamp(None))
            .with("ratio", f64::NAN);
        assert_eq!(encode(&params, EncodeOptions::default()), "");
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let defaults = ParameterSet::new().with("a", "x").with("b", "y");
        let decoded = decode("?b=2", &defaults);
        assert_eq!(decoded, ParameterSet::new().with("a", "x").with("b", "2"));
    }

    #[test]
    fn test_unknown_query_keys_are_ignored() {
        let decoded = decode("?showGuests=false&utm_source=mail", &column_defaults());
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded.bool("showGuests"), Some(false));
        assert!(!decoded.contains_key("utm_source"));
    }

    #[test]
    fn test_boolean_is_case_insensitive() {
        let defaults = ParameterSet::new().with("flag", false);
        assert_eq!(decode("?flag=TRUE", &defaults).bool("flag"), Some(true));
        assert_eq!(decode("?flag=True", &defaults).bool("flag"), Some(true));
        assert_eq!(decode("?flag=yes", &defaults).bool("flag"), Some(false));
        assert_eq!(decode("?flag=", &defaults).bool("flag"), Some(false));
    }

    #[test]
    fn test_malformed_number_is_nan() {
        let defaults = ParameterSet::new().with("count", 0.0);
        let count = decode("?count=abc", &defaults).number("count");
        assert!(count.is_some_and(f64::is_nan));
    }

    #[test]
    fn test_parse_number_follows_browser_rules() {
        assert_eq!(parse_number(" 42 "), 42.0);
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("1e3"), 1000.0);
        assert_eq!(parse_number("0x1F"), 31.0);
        assert_eq!(parse_number("-Infinity"), f64::NEG_INFINITY);
        assert!(parse_number("inf").is_nan());
        assert!(parse_number("NaN").is_nan());
        assert!(parse_number("12px").is_nan());
    }

    #[test]
    fn test_radix_literals_take_digits_only() {
        assert_eq!(parse_number("0b101"), 5.0);
        assert_eq!(parse_number("0o17"), 15.0);
        assert!(parse_number("0x+1F").is_nan());
        assert!(parse_number("0x-1F").is_nan());
        assert!(parse_number("0x").is_nan());
        assert!(parse_number("0b102").is_nan());
        // wider than u64
        assert_eq!(parse_number("0x10000000000000000"), 2f64.powi(64));
    }

    #[test]
    fn test_numbers_encode_like_a_browser() {
        let encoded = |n: f64| encode(&ParameterSet::new().with("n", n), EncodeOptions::default());
        assert_eq!(encoded(1e21), "?n=1e%2B21");
        assert_eq!(encoded(-2.5e22), "?n=-2.5e%2B22");
        assert_eq!(encoded(1.5e-7), "?n=1.5e-7");
        assert_eq!(encoded(0.000001), "?n=0.000001");
        assert_eq!(encoded(123456789.5), "?n=123456789.5");
        assert_eq!(encoded(1e20), "?n=100000000000000000000");

        let defaults = ParameterSet::new().with("n", 0.0);
        assert_eq!(decode("?n=1e%2B21", &defaults).number("n"), Some(1e21));
    }

    #[test]
    fn test_timestamp_forms() {
        let utc = |y, mo, d, h, mi| Some(Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap());
        assert_eq!(parse_timestamp("2024-10-15T16:00:00Z"), utc(2024, 10, 15, 16, 0));
        assert_eq!(parse_timestamp("2024-10-15T16:00Z"), utc(2024, 10, 15, 16, 0));
        assert_eq!(parse_timestamp("2024-10-15T16:00+02:00"), utc(2024, 10, 15, 14, 0));
        assert_eq!(parse_timestamp("2024-10-15T16:00:00-01:30"), utc(2024, 10, 15, 17, 30));
        assert_eq!(parse_timestamp("2024-10-15T16:00"), utc(2024, 10, 15, 16, 0));
        assert_eq!(parse_timestamp("2024-10-15"), utc(2024, 10, 15, 0, 0));
        assert_eq!(parse_timestamp("2024-10"), utc(2024, 10, 1, 0, 0));
        assert_eq!(parse_timestamp("2024"), utc(2024, 1, 1, 0, 0));
        assert_eq!(
            parse_timestamp("2024-10-15T16:00:00.123456Z").map(|ts| ts.timestamp_subsec_micros()),
            Some(123456)
        );

        assert_eq!(parse_timestamp("2024-13"), None);
        assert_eq!(parse_timestamp("20x4"), None);
        assert_eq!(parse_timestamp("2024-1"), None);
        assert_eq!(parse_timestamp("ø24-10"), None);
    }

    #[test]
    fn test_invalid_timestamp_keeps_type() {
        let defaults = ParameterSet::new().with("from", Utc::now());
        assert_eq!(
            decode("?from=tomorrow", &defaults).get("from"),
            Some(&ParamValue::Timestamp(None))
        );
        let decoded = decode("?from=2024-10-22", &defaults);
        assert_eq!(
            decoded.get("from"),
            Some(&ParamValue::Timestamp(Some(
                Utc.with_ymd_and_hms(2024, 10, 22, 0, 0, 0).unwrap()
            )))
        );
    }

    #[test]
    fn test_absent_default_decodes_as_text() {
        let defaults = ParameterSet::new().with("q", ParamValue::Absent);
        assert_eq!(decode("", &defaults).get("q"), Some(&ParamValue::Absent));
        assert_eq!(decode("q=7", &defaults).text("q"), Some("7"));
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let params = ParameterSet::new().with("guest name", "Nygårdsgaten 45/4");
        let query = encode(&params, EncodeOptions::default());
        assert_eq!(query, "?guest%20name=Nyg%C3%A5rdsgaten%2045%2F4");

        let defaults = ParameterSet::new().with("guest name", "");
        assert_eq!(decode(&query, &defaults), params);
    }

    #[test]
    fn test_component_safe_marks_stay_literal() {
        let params = ParameterSet::new().with("q", "it's (ok)!*~_.-");
        let query = encode(&params, EncodeOptions::default());
        assert_eq!(query, "?q=it's%20(ok)!*~_.-");

        let defaults = ParameterSet::new().with("q", "");
        assert_eq!(decode(&query, &defaults), params);
    }

    #[test]
    fn test_comma_joined_lists() {
        let params = ParameterSet::new()
            .with("status", vec!["pending", "confirmed"])
            .with("page", 2.0);
        let options = EncodeOptions {
            comma_join_arrays: true,
        };
        assert_eq!(encode(&params, options), "?page=2&status=pending%2Cconfirmed");
    }

    #[test]
    fn test_nan_compares_equal_for_change_suppression() {
        let defaults = ParameterSet::new().with("count", 0.0);
        let first = decode("?count=abc", &defaults);
        let second = decode("?count=abc", &defaults);
        assert_eq!(first, second);
    }

    #[test]
    fn test_mount_reads_current_url() {
        let history = Arc::new(InMemoryHistory::new("/dashboard?showPartners=true"));
        let mut query = QueryParams::new(history.clone(), column_defaults());
        assert_eq!(query.load_state(), LoadState::NotYetLoaded);
        assert_eq!(query.params(), &column_defaults());

        query.mount();

        assert!(query.is_loaded());
        assert_eq!(query.params().bool("showPartners"), Some(true));
        assert_eq!(query.params().bool("showGuests"), Some(true));
        assert_eq!(history.listener_count(), 1);
    }

    #[test]
    fn test_set_params_pushes_history_entry() {
        let history = Arc::new(InMemoryHistory::new("/dashboard"));
        let mut query = QueryParams::new(history.clone(), column_defaults());
        query.mount();

        let next = query.params().clone().with("showGuests", false).with("showPartners", true);
        query.set_params(next.clone());

        assert_eq!(query.params(), &next);
        assert_eq!(history.current_url(), "/dashboard?showPartners=true");
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_back_navigation_replaces_state() {
        let history = Arc::new(InMemoryHistory::new("/dashboard"));
        let mut query = QueryParams::new(history.clone(), column_defaults());
        query.mount();
        query.set_params(query.params().clone().with("showPartners", true));

        assert!(history.back());
        assert!(query.sync_navigation());
        assert_eq!(query.params(), &column_defaults());

        assert!(history.forward());
        assert!(query.sync_navigation());
        assert_eq!(query.params().bool("showPartners"), Some(true));
    }

    #[test]
    fn test_navigation_to_equivalent_url_is_suppressed() {
        let history = Arc::new(InMemoryHistory::new("/dashboard?showGuests=true"));
        let mut query = QueryParams::new(history.clone(), column_defaults());
        query.mount();
        history.push_state("/dashboard");

        // both entries decode to the defaults
        assert!(history.back());
        assert!(!query.sync_navigation());
        assert!(!query.sync_navigation());
    }

    #[test]
    fn test_unmount_detaches_listener() {
        let history = Arc::new(InMemoryHistory::new("/dashboard"));
        {
            let mut query = QueryParams::new(history.clone(), column_defaults());
            query.mount();
            assert_eq!(history.listener_count(), 1);
            query.unmount();
            assert_eq!(history.listener_count(), 0);
            query.mount();
            assert!(!query.sync_navigation());
        }
        assert_eq!(history.listener_count(), 0);
    }
}
